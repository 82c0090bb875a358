use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::nav::links::NavRow;
use crate::ui::{AppState, Focus};
use crate::widgets::chrome::panel_block;

/// First visible row so that `selected` stays inside a window of `inner_h` rows.
pub(crate) fn compute_scroll_window(total: usize, selected: usize, inner_h: u16) -> (usize, usize) {
    if inner_h == 0 || total == 0 {
        return (0, 0);
    }
    let sel = selected.min(total.saturating_sub(1));
    let ih = inner_h as usize;
    let start = sel.saturating_sub(ih - 1);
    let end = (start + ih).min(total);
    (start, end)
}

pub fn draw_sidebar(f: &mut Frame, area: Rect, state: &AppState) {
    let nav = &state.nav;
    let inner_h = area.height.saturating_sub(2); // account for borders
    let total = nav.rows.len();
    let ih = inner_h as usize;
    let max_start = total.saturating_sub(ih);
    let start = state.nav_offset.min(max_start);
    let end = (start + ih).min(total);
    let focused = matches!(state.focus, Focus::Nav);
    let items: Vec<ListItem> = nav
        .rows
        .iter()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(idx, row)| {
            let is_cursor = idx == state.cursor;
            let sel = if is_cursor { "> " } else { "  " };
            let item = match row {
                NavRow::Heading(title) => {
                    ListItem::new(format!("{sel}{title}")).style(state.theme.text_heading())
                }
                NavRow::Link(li) => {
                    let label = nav.links.get(*li).map(|l| l.label.as_str()).unwrap_or("");
                    let active = state.active_link == Some(*li);
                    let mut spans = vec![Span::raw(format!("{sel}  {label}"))];
                    if active && state.loading.is_some() {
                        let spinner = ["⠋", "⠙", "⠸", "⠴", "⠦", "⠇"][state.tick as usize % 6];
                        spans.push(Span::styled(
                            format!(" {spinner}"),
                            state.theme.text_muted(),
                        ));
                    }
                    let mut item = ListItem::new(Line::from(spans));
                    if active {
                        item = item.style(state.theme.text_active_bold());
                    }
                    item
                }
            };
            if is_cursor && focused {
                item.style(state.theme.list_cursor_style())
            } else {
                item
            }
        })
        .collect();
    let title = format!("Pages ({})", nav.links.len());
    let list = List::new(items).block(panel_block(&title, focused, &state.theme));
    f.render_widget(list, area);
}

/// Row index under a terminal cell, if the cell lies on a drawn row.
pub(crate) fn row_at(area: Rect, offset: usize, total: usize, x: u16, y: u16) -> Option<usize> {
    let inner_top = area.y.saturating_add(1);
    let inner_bottom = area.y.saturating_add(area.height.saturating_sub(1));
    let inside_x = x > area.x && x < area.x.saturating_add(area.width.saturating_sub(1));
    if !inside_x || y < inner_top || y >= inner_bottom {
        return None;
    }
    let ih = area.height.saturating_sub(2) as usize;
    let start = offset.min(total.saturating_sub(ih));
    let row = start + (y - inner_top) as usize;
    (row < total).then_some(row)
}
