use ratatui::prelude::*;
use scraper::{ElementRef, Html, Node};
use std::sync::OnceLock;

// syntect setup (lazy)
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style as SynStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

/// Minimal HTML-to-terminal renderer for region contents.
/// - Block elements start a new line; headings bold
/// - `li` bulleted, nested lists indented
/// - `pre` kept verbatim, highlighted from a `language-*` class
/// - `.error` elements use the error color
pub fn html_to_lines(html: &str, theme: &crate::theme::Theme) -> Vec<Line<'static>> {
    let doc = Html::parse_fragment(html);
    let mut r = Renderer {
        theme,
        lines: Vec::new(),
        current: Vec::new(),
        indent: 0,
        pending_blank: false,
    };
    r.walk(doc.root_element(), Style::default());
    r.flush();
    while r
        .lines
        .last()
        .map(|l| l.spans.iter().all(|s| s.content.trim().is_empty()))
        .unwrap_or(false)
    {
        r.lines.pop();
    }
    r.lines
}

/// Plain text of an HTML snippet, used for clipboard copies.
pub fn html_to_text(html: &str) -> String {
    html_to_lines(html, &crate::theme::Theme::default())
        .iter()
        .map(|l| {
            l.spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Renderer<'t> {
    theme: &'t crate::theme::Theme,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    indent: usize,
    pending_blank: bool,
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "section"
            | "article"
            | "aside"
            | "header"
            | "footer"
            | "main"
            | "nav"
            | "blockquote"
            | "ul"
            | "ol"
            | "li"
            | "table"
            | "tr"
            | "dl"
            | "dt"
            | "dd"
            | "figure"
            | "figcaption"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "hr"
    )
}

impl Renderer<'_> {
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.current.len() + 1);
        if self.indent > 0 {
            spans.push(Span::raw("  ".repeat(self.indent)));
        }
        spans.append(&mut self.current);
        // drop trailing space left by whitespace collapsing
        if let Some(last) = spans.last_mut() {
            let trimmed = last.content.trim_end().to_string();
            last.content = trimmed.into();
        }
        self.lines.push(Line::from(spans));
    }

    fn break_block(&mut self, blank: bool) {
        self.flush();
        if blank {
            self.pending_blank = true;
        }
    }

    fn start_text(&mut self) {
        if self.current.is_empty() && self.pending_blank && !self.lines.is_empty() {
            self.lines.push(Line::raw(""));
        }
        self.pending_blank = false;
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !self.current.is_empty() && text.chars().any(char::is_whitespace) {
                self.push_space();
            }
            return;
        }
        self.start_text();
        let lead = text.starts_with(char::is_whitespace) && !self.current.is_empty();
        let trail = text.ends_with(char::is_whitespace);
        let mut s = String::new();
        if lead && !self.ends_with_space() {
            s.push(' ');
        }
        s.push_str(&collapsed);
        if trail {
            s.push(' ');
        }
        self.current.push(Span::styled(s, style));
    }

    fn push_space(&mut self) {
        if !self.ends_with_space() {
            self.current.push(Span::raw(" "));
        }
    }

    fn ends_with_space(&self) -> bool {
        self.current
            .last()
            .map(|s| s.content.ends_with(' '))
            .unwrap_or(true)
    }

    fn walk(&mut self, el: ElementRef, style: Style) {
        for child in el.children() {
            match child.value() {
                Node::Text(t) => {
                    let s: &str = &t.text;
                    self.push_text(s, style);
                }
                Node::Element(_) => {
                    if let Some(c) = ElementRef::wrap(child) {
                        self.element(c, style);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef, inherited: Style) {
        let name = el.value().name();
        let mut style = inherited;
        if el.value().classes().any(|c| c == "error") {
            style = style.fg(self.theme.error);
        }
        match name {
            "script" | "style" | "template" | "head" => {}
            "br" => self.flush(),
            "hr" => {
                self.break_block(false);
                self.lines
                    .push(Line::styled("─".repeat(40), self.theme.text_muted()));
            }
            "pre" => {
                self.break_block(true);
                self.start_text();
                let lang = code_language(el);
                let code = el.text().collect::<String>();
                let code = code.trim_end_matches('\n');
                let mut hl = highlight_code(code, lang.as_deref(), self.indent);
                self.lines.append(&mut hl);
                self.pending_blank = true;
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.break_block(true);
                let s = style.fg(self.theme.accent).add_modifier(Modifier::BOLD);
                self.walk(el, s);
                self.break_block(true);
            }
            "li" => {
                self.flush();
                self.start_text();
                self.current
                    .push(Span::styled("• ", Style::default().fg(self.theme.primary)));
                self.walk(el, style);
                self.flush();
            }
            "ul" | "ol" => {
                self.break_block(self.indent == 0);
                self.indent += 1;
                self.walk(el, style);
                self.flush();
                self.indent -= 1;
                if self.indent == 0 {
                    self.pending_blank = true;
                }
            }
            "strong" | "b" => self.walk(el, style.add_modifier(Modifier::BOLD)),
            "em" | "i" => self.walk(el, style.add_modifier(Modifier::ITALIC)),
            "code" | "kbd" | "samp" => self.walk(el, style.fg(self.theme.secondary)),
            "a" => self.walk(el, style.add_modifier(Modifier::UNDERLINED)),
            "td" | "th" => {
                self.push_space();
                self.walk(el, style);
                self.push_space();
            }
            "img" => {
                if let Some(alt) = el.value().attr("alt").filter(|a| !a.is_empty()) {
                    self.start_text();
                    self.current
                        .push(Span::styled(format!("[{alt}]"), self.theme.text_muted()));
                }
            }
            _ if is_block(name) => {
                self.break_block(matches!(name, "p" | "blockquote" | "table" | "figure"));
                self.walk(el, style);
                self.break_block(matches!(name, "p" | "blockquote" | "table" | "figure"));
            }
            _ => self.walk(el, style),
        }
    }
}

fn code_language(pre: ElementRef) -> Option<String> {
    let classes = std::iter::once(pre).chain(
        pre.children()
            .filter_map(ElementRef::wrap)
            .filter(|c| c.value().name() == "code"),
    );
    for el in classes {
        for c in el.value().classes() {
            if let Some(lang) = c
                .strip_prefix("language-")
                .or_else(|| c.strip_prefix("lang-"))
            {
                return Some(lang.to_string());
            }
        }
    }
    None
}

// ---------------- Syntax highlighting helpers ----------------
static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
static THEME: OnceLock<Theme> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}
fn get_theme() -> &'static Theme {
    THEME.get_or_init(|| {
        let ts = THEME_SET.get_or_init(ThemeSet::load_defaults);
        ts.themes
            .get("base16-ocean.dark")
            .cloned()
            .unwrap_or_else(|| ts.themes.values().next().cloned().unwrap_or_default())
    })
}

fn syn_to_tui_color(c: syntect::highlighting::Color) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

fn highlight_code(code: &str, lang: Option<&str>, indent: usize) -> Vec<Line<'static>> {
    let pad = "  ".repeat(indent + 1);
    let Some(lang) = lang.filter(|l| !l.is_empty()) else {
        return code
            .split('\n')
            .map(|l| {
                Line::from(Span::styled(
                    format!("{pad}{l}"),
                    Style::default().fg(Color::Gray),
                ))
            })
            .collect();
    };
    let ps = get_syntax_set();
    let syn: &SyntaxReference = ps
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let mut high = HighlightLines::new(syn, get_theme());
    let mut out: Vec<Line<'static>> = Vec::new();
    for line in code.split('\n') {
        let regions: Vec<(SynStyle, &str)> = high.highlight_line(line, ps).unwrap_or_default();
        let mut spans: Vec<Span<'static>> = vec![Span::raw(pad.clone())];
        for (st, seg) in regions {
            let mut style = Style::default().fg(syn_to_tui_color(st.foreground));
            if st
                .font_style
                .contains(syntect::highlighting::FontStyle::BOLD)
            {
                style = style.add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(seg.to_string(), style));
        }
        out.push(Line::from(spans));
    }
    out
}
