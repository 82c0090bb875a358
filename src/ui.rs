use crate::app::load::ERROR_HTML;
use crate::app::{update, AppMsg, Effect};
use crate::model::{validate_app_config, AppConfig};
use crate::nav::links::{parse_nav_markup, NavTree};
use crate::services::fetcher::{open_source, FragmentSource, LoadError};
use crate::widgets::region::Region;
use crate::widgets::sidebar::{draw_sidebar, row_at};
use crate::widgets::status_bar::draw_footer;
use anyhow::{anyhow, Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CONFIG_FILE: &str = "frag-index.yaml";
const TICKS_PER_SECOND: u64 = 5; // ~200ms tick

pub(crate) struct AppState {
    pub(crate) config: AppConfig,
    pub(crate) nav: NavTree,
    // Sidebar cursor row and scroll offset
    pub(crate) cursor: usize,
    pub(crate) nav_offset: usize,
    pub(crate) nav_viewport_h: u16,
    pub(crate) active_link: Option<usize>,
    pub(crate) middle: Region,
    pub(crate) right: Region,
    pub(crate) focus: Focus,
    // Ticket of the most recently started load
    pub(crate) latest_ticket: u64,
    // Page of the latest load while its fetch is in flight
    pub(crate) loading: Option<String>,
    pub(crate) loads_started: u64,
    pub(crate) loads_applied: u64,
    pub(crate) tick: u64,
    pub(crate) toast: Option<Toast>,
    pub(crate) theme: crate::theme::Theme,
    pub(crate) source: Option<Arc<dyn FragmentSource>>,
    pub(crate) tx: Option<Sender<LoadMsg>>,
    pub(crate) rx: Option<Receiver<LoadMsg>>,
    // Last drawn areas, used for mouse hit-testing
    pub(crate) nav_area: Rect,
    pub(crate) middle_area: Rect,
    pub(crate) right_area: Rect,
    pub(crate) boot_done: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            nav: NavTree::default(),
            cursor: 0,
            nav_offset: 0,
            nav_viewport_h: 0,
            active_link: None,
            middle: Region::new("Content"),
            right: Region::new("Aside"),
            focus: Focus::Nav,
            latest_ticket: 0,
            loading: None,
            loads_started: 0,
            loads_applied: 0,
            tick: 0,
            toast: None,
            theme: crate::theme::Theme::default(),
            source: None,
            tx: None,
            rx: None,
            nav_area: Rect::default(),
            middle_area: Rect::default(),
            right_area: Rect::default(),
            boot_done: false,
        }
    }
}

impl AppState {
    pub(crate) fn region_mut(&mut self, id: RegionId) -> &mut Region {
        match id {
            RegionId::Middle => &mut self.middle,
            RegionId::Right => &mut self.right,
        }
    }

    pub(crate) fn active_page(&self) -> Option<&str> {
        self.active_link
            .and_then(|li| self.nav.links.get(li))
            .and_then(|l| l.page.as_deref())
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    #[default]
    Nav,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegionId {
    Middle,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub expires_at_tick: u64,
}

/// Result of one fetch, posted back from a loader thread.
pub(crate) struct LoadMsg {
    pub(crate) ticket: u64,
    pub(crate) page: String,
    pub(crate) outcome: Result<String, LoadError>,
}

fn run_effects(state: &mut AppState, effects: Vec<Effect>) {
    for eff in effects {
        match eff {
            Effect::LoadPage { page, ticket } => {
                if let (Some(src), Some(tx)) = (&state.source, &state.tx) {
                    crate::services::loader::spawn_load_page(
                        src.clone(),
                        page,
                        ticket,
                        tx.clone(),
                    );
                } else {
                    log::warn!("no fragment source; dropping load of {page}");
                }
            }
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => {
                let exp = state
                    .tick
                    .saturating_add(seconds.saturating_mul(TICKS_PER_SECOND));
                state.toast = Some(Toast {
                    text,
                    level,
                    expires_at_tick: exp,
                });
            }
        }
    }
}

fn dispatch(state: &mut AppState, msg: AppMsg) {
    let effects = update(state, msg);
    run_effects(state, effects);
}

// Apply loader results in arrival order
fn pump_loads(state: &mut AppState) {
    let mut drained: Vec<LoadMsg> = Vec::new();
    if let Some(rx) = &state.rx {
        while let Ok(msg) = rx.try_recv() {
            drained.push(msg);
        }
    }
    for msg in drained {
        dispatch(state, AppMsg::Loaded(msg));
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

pub fn run() -> Result<()> {
    crate::log_buffer::init(crate::log_buffer::level_from_env());
    let (cfg, config_dir) = load_config()?;
    validate_app_config(&cfg).map_err(|e| anyhow!("invalid {CONFIG_FILE}: {e}"))?;
    let source = open_source(&cfg, &config_dir)?;
    log::info!("site root: {}", source.describe());
    let nav = load_navigation(&cfg, source.as_ref());
    let mut state = AppState {
        config: cfg,
        nav,
        source: Some(source),
        ..Default::default()
    };
    let (tx, rx) = mpsc::channel::<LoadMsg>();
    state.tx = Some(tx);
    state.rx = Some(rx);
    if env_flag("FRAG_TUI_HEADLESS") {
        return run_headless(&mut state);
    }
    // Setup terminal (interactive)
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    let res = loop {
        if !state.boot_done {
            dispatch(&mut state, AppMsg::Startup);
            state.boot_done = true;
        }
        if let Err(e) = terminal.draw(|f| ui(f, &mut state)) {
            break Err(e.into());
        }
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::from_millis(0));
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if !handle_key(&mut state, key) {
                        break Ok(());
                    }
                }
                Ok(Event::Mouse(m)) => handle_mouse(&mut state, m),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }
        pump_loads(&mut state);
        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            last_tick = Instant::now();
        }
    };
    // Restore
    disable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    res
}

// Smoke mode: drive a few ticks against a TestBackend, optionally click a page
fn run_headless(state: &mut AppState) -> Result<()> {
    let ticks: u64 = std::env::var("FRAG_TUI_TICKS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(10);
    let click_page: Option<String> = std::env::var("FRAG_TUI_HEADLESS_CLICK").ok();
    let summary = env_flag("FRAG_TUI_SMOKE_SUMMARY");
    let backend = ratatui::backend::TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    let tick_rate = Duration::from_millis(200);
    let mut click_done = false;
    for _ in 0..ticks {
        if !state.boot_done {
            dispatch(state, AppMsg::Startup);
            state.boot_done = true;
        } else if !click_done {
            if let Some(page) = click_page.as_deref() {
                let row = state
                    .nav
                    .find_page(page)
                    .and_then(|li| state.nav.row_of_link(li));
                if row.is_some() {
                    dispatch(state, AppMsg::NavClick { row });
                    click_done = true;
                }
            }
        }
        terminal.draw(|f| ui(f, state))?;
        pump_loads(state);
        state.tick = state.tick.wrapping_add(1);
        std::thread::sleep(tick_rate);
    }
    if summary {
        let summary = serde_json::json!({
            "ok": state.middle.html() != ERROR_HTML,
            "active_page": state.active_page(),
            "middle_present": !state.middle.html().is_empty(),
            "right_present": !state.right.html().is_empty(),
            "loads_started": state.loads_started,
            "loads_applied": state.loads_applied,
            "click_done": click_done,
        });
        println!("{summary}");
    }
    Ok(())
}

/// Returns false when the app should quit.
fn handle_key(state: &mut AppState, key: KeyEvent) -> bool {
    let region = match state.focus {
        Focus::Middle => Some(RegionId::Middle),
        Focus::Right => Some(RegionId::Right),
        Focus::Nav => None,
    };
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            copy_focused(state);
        }
        KeyCode::Tab => dispatch(state, AppMsg::FocusNext),
        KeyCode::Char('r') => dispatch(state, AppMsg::Reload),
        KeyCode::Enter if region.is_none() => {
            let row = Some(state.cursor);
            dispatch(state, AppMsg::NavClick { row });
        }
        KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => {
            let step: i32 = match (key.code, region) {
                (KeyCode::PageUp | KeyCode::PageDown, Some(r)) => {
                    state.region_mut(r).viewport_h().max(1) as i32
                }
                (KeyCode::PageUp | KeyCode::PageDown, None) => state.nav_viewport_h.max(1) as i32,
                _ => 1,
            };
            let delta = if matches!(key.code, KeyCode::Up | KeyCode::PageUp) {
                -step
            } else {
                step
            };
            match region {
                Some(region) => dispatch(state, AppMsg::Scroll { region, delta }),
                None => dispatch(state, AppMsg::MoveCursor(delta)),
            }
        }
        KeyCode::Home | KeyCode::End => {
            if let Some(region) = region {
                let top = key.code == KeyCode::Home;
                dispatch(state, AppMsg::ScrollEdge { region, top });
            }
        }
        _ => {}
    }
    true
}

fn handle_mouse(state: &mut AppState, m: MouseEvent) {
    let pos = Position::new(m.column, m.row);
    let target = if state.nav_area.contains(pos) {
        None
    } else if state.middle_area.contains(pos) {
        Some(RegionId::Middle)
    } else if state.right_area.contains(pos) {
        Some(RegionId::Right)
    } else {
        return;
    };
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => match target {
            None => {
                state.focus = Focus::Nav;
                // Single delegated handler for the whole navigation container
                let row = row_at(
                    state.nav_area,
                    state.nav_offset,
                    state.nav.rows.len(),
                    m.column,
                    m.row,
                );
                dispatch(state, AppMsg::NavClick { row });
            }
            Some(RegionId::Middle) => state.focus = Focus::Middle,
            Some(RegionId::Right) => state.focus = Focus::Right,
        },
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
            let down = matches!(m.kind, MouseEventKind::ScrollDown);
            match target {
                Some(region) => {
                    let delta = if down { 3 } else { -3 };
                    dispatch(state, AppMsg::Scroll { region, delta });
                }
                None => dispatch(state, AppMsg::MoveCursor(if down { 1 } else { -1 })),
            }
        }
        _ => {}
    }
}

fn copy_focused(state: &mut AppState) {
    let content = match state.focus {
        Focus::Right => state.right.text(),
        _ => state.middle.text(),
    };
    if content.is_empty() {
        run_effects(
            state,
            vec![Effect::ShowToast {
                text: "Nothing to copy".into(),
                level: ToastLevel::Info,
                seconds: 2,
            }],
        );
        return;
    }
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(content)) {
        Ok(()) => run_effects(
            state,
            vec![Effect::ShowToast {
                text: "Copied to clipboard!".into(),
                level: ToastLevel::Success,
                seconds: 2,
            }],
        ),
        Err(e) => log::warn!("clipboard: {e}"),
    }
}

/// Sidebar rows from inline config or from the shell document's nav markup.
/// Failures leave the sidebar empty; the app stays usable.
fn load_navigation(cfg: &AppConfig, source: &dyn FragmentSource) -> NavTree {
    if !cfg.nav.is_empty() {
        return NavTree::from_entries(&cfg.nav);
    }
    let shell = match source.get(&cfg.shell) {
        Ok(s) => s,
        Err(e) => {
            log::error!("loading navigation shell: {e}");
            return NavTree::default();
        }
    };
    match parse_nav_markup(&shell, &cfg.nav_selector) {
        Ok(tree) => {
            log::info!("navigation: {} links", tree.links.len());
            tree
        }
        Err(e) => {
            log::error!("{}: {e}", cfg.shell);
            NavTree::default()
        }
    }
}

fn read_config(path: &std::path::Path) -> Result<AppConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    serde_yaml::from_str(&s).with_context(|| format!("parsing {path:?}"))
}

/// Config plus the directory relative site roots resolve against.
fn load_config() -> Result<(AppConfig, PathBuf)> {
    // 1) If FRAG_TUI_CONFIG_DIR is set, expect frag-index.yaml inside it
    if let Ok(base) = std::env::var("FRAG_TUI_CONFIG_DIR") {
        let base_dir = PathBuf::from(&base);
        let cfg = read_config(&base_dir.join(CONFIG_FILE))?;
        return Ok((cfg, base_dir));
    }

    // 2) Discover from CWD and upwards
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidates = [cwd.join(CONFIG_FILE), cwd.join(".tui").join(CONFIG_FILE)];
    for p in &candidates {
        if p.exists() {
            let base_dir = p.parent().unwrap_or(&cwd).to_path_buf();
            return Ok((read_config(p)?, base_dir));
        }
    }
    let mut cur = cwd.as_path();
    while let Some(parent) = cur.parent() {
        let p = parent.join(".tui").join(CONFIG_FILE);
        if p.exists() {
            let base_dir = p.parent().unwrap_or(parent).to_path_buf();
            return Ok((read_config(&p)?, base_dir));
        }
        cur = parent;
    }
    if let Some(home) = std::env::var("HOME")
        .ok()
        .or_else(|| std::env::var("USERPROFILE").ok())
        .map(PathBuf::from)
    {
        let p = home.join(".tui").join(CONFIG_FILE);
        if p.exists() {
            let base_dir = p.parent().unwrap_or(&home).to_path_buf();
            return Ok((read_config(&p)?, base_dir));
        }
    }

    // 3) Built-in defaults, site served from CWD
    Ok((AppConfig::default(), cwd))
}

fn ui(f: &mut Frame, state: &mut AppState) {
    // Clear expired toast
    if let Some(t) = &state.toast {
        if state.tick >= t.expires_at_tick {
            state.toast = None;
        }
    }

    let screen = f.area();
    f.render_widget(Block::default().style(state.theme.base_style()), screen);

    const DEBUG_H: u16 = 4;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(DEBUG_H),
            Constraint::Length(1),
        ])
        .split(screen);

    draw_header(f, chunks[0], state);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(24),
            Constraint::Percentage(52),
            Constraint::Percentage(24),
        ])
        .split(chunks[1]);
    state.nav_area = cols[0];
    state.middle_area = cols[1];
    state.right_area = cols[2];
    state.nav_viewport_h = cols[0].height.saturating_sub(2);

    draw_sidebar(f, cols[0], state);
    let theme = state.theme.clone();
    let focus = state.focus;
    state
        .middle
        .render(f, cols[1], matches!(focus, Focus::Middle), &theme);
    state
        .right
        .render(f, cols[2], matches!(focus, Focus::Right), &theme);

    draw_debug(f, chunks[2], state);
    let help_text = match state.focus {
        Focus::Nav => "↑/↓ select  Enter open  Tab focus  r reload  q quit",
        _ => "↑/↓ scroll  PgUp/PgDn  Home/End  Tab focus  Ctrl+C copy  q quit",
    };
    draw_footer(f, chunks[3], state, help_text);
}

fn draw_header(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![Span::styled(
        format!(" {} ", state.config.title),
        Style::default()
            .fg(state.theme.primary)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(src) = &state.source {
        spans.push(Span::styled(
            format!(" {}", src.describe()),
            state.theme.text_muted(),
        ));
    }
    if let Some(page) = state.active_page() {
        spans.push(Span::styled(
            format!("  ›  {page}"),
            Style::default().fg(state.theme.secondary),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_debug(f: &mut Frame, area: Rect, state: &AppState) {
    let b = Block::default()
        .borders(Borders::TOP)
        .border_style(state.theme.text_muted())
        .title(Span::styled(
            "Debug",
            state.theme.text_muted().add_modifier(Modifier::BOLD),
        ));
    // Take last `area.height` lines
    let h = area.height.saturating_sub(1) as usize;
    let lines: Vec<Line> = crate::log_buffer::tail(h)
        .into_iter()
        .map(Line::raw)
        .collect();
    let p = Paragraph::new(lines)
        .style(Style::default().fg(Color::Gray))
        .block(b)
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fetcher::mock::MockSource;
    use ratatui::backend::TestBackend;

    fn shell_state(shell: &str) -> AppState {
        let src = MockSource::default().with_doc("index.html", shell);
        let cfg = AppConfig::default();
        let nav = load_navigation(&cfg, &src);
        AppState {
            config: cfg,
            nav,
            ..Default::default()
        }
    }

    #[test]
    fn navigation_comes_from_shell_markup() {
        let st = shell_state(
            r#"<nav class="panel-left-nav"><a data-page="01_introduction">Intro</a></nav>"#,
        );
        assert_eq!(st.nav.links.len(), 1);
    }

    #[test]
    fn missing_shell_leaves_sidebar_empty() {
        let src = MockSource::default();
        let nav = load_navigation(&AppConfig::default(), &src);
        assert!(nav.rows.is_empty());
        assert_eq!(src.requested(), vec!["index.html".to_string()]);
    }

    #[test]
    fn draw_records_hit_areas_and_shows_links() {
        let mut st = shell_state(
            r#"<nav class="panel-left-nav"><h3>Guide</h3><a data-page="01_introduction">Intro</a></nav>"#,
        );
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| ui(f, &mut st)).unwrap();
        assert!(st.nav_area.width > 0);
        assert!(st.middle_area.x > st.nav_area.x);
        assert!(st.right_area.x > st.middle_area.x);
        let buf = terminal.backend().buffer().clone();
        let row: String = (0..st.nav_area.width)
            .map(|x| buf[(x, st.nav_area.y + 2)].symbol().to_string())
            .collect();
        assert!(row.contains("Intro"));
    }

    #[test]
    fn mouse_click_on_heading_row_is_ignored() {
        let mut st = shell_state(
            r#"<nav class="panel-left-nav"><h3>Guide</h3><a data-page="01_introduction">Intro</a></nav>"#,
        );
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| ui(f, &mut st)).unwrap();
        let area = st.nav_area;
        let click = |row: u16| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: area.x + 2,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut st, click(area.y + 1));
        assert!(st.active_link.is_none());
        assert_eq!(st.loads_started, 0);
        handle_mouse(&mut st, click(area.y + 2));
        assert_eq!(st.active_link, Some(0));
        assert_eq!(st.loads_started, 1);
    }

    #[test]
    fn toast_effect_expires_after_its_ticks() {
        let mut st = AppState::default();
        run_effects(
            &mut st,
            vec![Effect::ShowToast {
                text: "x".into(),
                level: ToastLevel::Info,
                seconds: 1,
            }],
        );
        assert_eq!(st.toast.as_ref().unwrap().expires_at_tick, TICKS_PER_SECOND);
        st.tick = TICKS_PER_SECOND;
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| ui(f, &mut st)).unwrap();
        assert!(st.toast.is_none());
    }
}
