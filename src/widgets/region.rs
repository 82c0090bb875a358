use crate::theme::Theme;
use crate::widgets::chrome::panel_block;
use crate::widgets::html_view::{html_to_lines, html_to_text};
use ratatui::prelude::*;
use ratatui::widgets::*;

/// One display region. Content is always replaced as a whole.
pub struct Region {
    title: String,
    html: String,
    lines: Vec<Line<'static>>,
    scroll_y: u16,
    last_viewport_h: u16,
    // Inner width at the last render; 0 before the first draw
    last_inner_w: u16,
    // Rows after wrapping at `last_inner_w`
    rows: usize,
}

impl Region {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            html: String::new(),
            lines: Vec::new(),
            scroll_y: 0,
            last_viewport_h: 0,
            last_inner_w: 0,
            rows: 0,
        }
    }

    pub fn set_html(&mut self, html: &str, theme: &Theme) {
        self.html = html.to_string();
        self.lines = html_to_lines(html, theme);
        self.refresh_rows();
    }

    pub fn clear(&mut self) {
        self.html.clear();
        self.lines.clear();
        self.rows = 0;
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn text(&self) -> String {
        html_to_text(&self.html)
    }

    pub fn scroll_y(&self) -> u16 {
        self.scroll_y
    }

    pub fn viewport_h(&self) -> u16 {
        self.last_viewport_h
    }

    fn paragraph(&self) -> Paragraph<'static> {
        Paragraph::new(self.lines.clone()).wrap(Wrap { trim: false })
    }

    fn refresh_rows(&mut self) {
        self.rows = if self.last_inner_w == 0 {
            self.lines.len()
        } else {
            self.paragraph().line_count(self.last_inner_w)
        };
    }

    fn max_scroll(&self) -> u16 {
        u16::try_from(self.rows)
            .unwrap_or(u16::MAX)
            .saturating_sub(self.last_viewport_h)
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_y = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_y = self.max_scroll();
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll_y as i32).saturating_add(delta).max(0);
        self.scroll_y = (next.min(u16::MAX as i32) as u16).min(self.max_scroll());
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, theme: &Theme) {
        self.last_viewport_h = area.height.saturating_sub(2);
        let inner_w = area.width.saturating_sub(2);
        if inner_w != self.last_inner_w {
            self.last_inner_w = inner_w;
            self.refresh_rows();
        }
        if self.scroll_y > self.max_scroll() {
            self.scroll_y = self.max_scroll();
        }
        let block = panel_block(&self.title, focused, theme);
        let p = self.paragraph().block(block).scroll((self.scroll_y, 0));
        f.render_widget(p, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn set_html_replaces_previous_content() {
        let th = Theme::default();
        let mut r = Region::new("Middle");
        r.set_html("<p>one</p>", &th);
        r.set_html("<p>two</p>", &th);
        assert_eq!(r.html(), "<p>two</p>");
        assert_eq!(r.text(), "two");
        r.clear();
        assert_eq!(r.html(), "");
    }

    #[test]
    fn scrolling_is_clamped_to_content() {
        let th = Theme::default();
        let mut r = Region::new("Middle");
        let body: String = (0..30).map(|i| format!("<p>line {i}</p>")).collect();
        r.set_html(&body, &th);
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal
            .draw(|f| r.render(f, f.area(), true, &th))
            .unwrap();
        assert_eq!(r.viewport_h(), 10);
        r.scroll_by(-5);
        assert_eq!(r.scroll_y(), 0);
        r.scroll_by(3);
        assert_eq!(r.scroll_y(), 3);
        r.scroll_by(10_000);
        assert_eq!(r.scroll_y(), r.max_scroll());
        r.scroll_to_top();
        assert_eq!(r.scroll_y(), 0);
    }

    fn visible_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let area = buf.area;
        (area.y..area.y + area.height)
            .flat_map(|y| (area.x..area.x + area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn long_paragraph_scrolls_through_wrapped_rows() {
        let th = Theme::default();
        let mut r = Region::new("Middle");
        let words: Vec<String> = (0..400).map(|i| format!("word{i}")).collect();
        r.set_html(&format!("<p>{}</p>", words.join(" ")), &th);
        assert_eq!(r.lines.len(), 1);
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal
            .draw(|f| r.render(f, f.area(), true, &th))
            .unwrap();
        assert!(r.rows > 60);
        r.scroll_by(50);
        assert_eq!(r.scroll_y(), 50);
        r.scroll_to_bottom();
        terminal
            .draw(|f| r.render(f, f.area(), true, &th))
            .unwrap();
        assert!(visible_text(&terminal).contains("word399"));
    }

    #[test]
    fn scroll_limit_saturates_for_huge_content() {
        let mut r = Region::new("Middle");
        r.lines = vec![Line::raw("x"); 70_000];
        r.refresh_rows();
        assert_eq!(r.rows, 70_000);
        assert_eq!(r.max_scroll(), u16::MAX);
        r.last_viewport_h = 10;
        assert_eq!(r.max_scroll(), u16::MAX - 10);
    }

    #[test]
    fn render_shows_title_and_text() {
        let th = Theme::default();
        let mut r = Region::new("Right");
        r.set_html("Setup steps", &th);
        let mut terminal = Terminal::new(TestBackend::new(30, 5)).unwrap();
        terminal
            .draw(|f| r.render(f, f.area(), false, &th))
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        let row: String = (0..30).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("Setup steps"));
        let top: String = (0..30).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(top.contains("Right"));
    }
}
