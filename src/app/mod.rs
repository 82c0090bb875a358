use crate::ui::{AppState, Focus, LoadMsg, RegionId, ToastLevel};
use crate::widgets::sidebar::compute_scroll_window;
use thiserror::Error;

pub mod load;

pub enum AppMsg {
    /// Synthesize a click on the default page's link.
    Startup,
    /// Click delegated from the navigation container; `row` is the sidebar
    /// row under the pointer (or cursor), `None` when it hit no row.
    NavClick {
        row: Option<usize>,
    },
    Reload,
    MoveCursor(i32),
    FocusNext,
    Scroll {
        region: RegionId,
        delta: i32,
    },
    ScrollEdge {
        region: RegionId,
        top: bool,
    },
    Loaded(LoadMsg),
}

pub enum Effect {
    LoadPage {
        page: String,
        ticket: u64,
    },
    ShowToast {
        text: String,
        level: ToastLevel,
        seconds: u64,
    },
}

#[derive(Debug, Error)]
pub enum ClickError {
    #[error("Link '{label}' is missing data-page attribute.")]
    MissingPageIdentifier { label: String },
}

pub fn update(state: &mut AppState, msg: AppMsg) -> Vec<Effect> {
    use AppMsg::*;
    let mut effects: Vec<Effect> = Vec::new();
    match msg {
        Startup => {
            let default_page = state.config.default_page.clone();
            let row = state
                .nav
                .find_page(&default_page)
                .and_then(|li| state.nav.row_of_link(li));
            match row {
                Some(row) => return update(state, NavClick { row: Some(row) }),
                None => log::info!("default page '{default_page}' not in navigation"),
            }
        }
        NavClick { row } => {
            let Some(link_idx) = row.and_then(|r| state.nav.closest_link(r)) else {
                return effects;
            };
            // The click is consumed here; the link's href is never followed.
            let link = &state.nav.links[link_idx];
            let Some(page) = link.page.clone() else {
                let err = ClickError::MissingPageIdentifier {
                    label: link.label.clone(),
                };
                log::error!("{err}");
                return effects;
            };
            if let Some(href) = &link.href {
                log::debug!("link navigation to '{href}' suppressed");
            }
            if let Some(prev) = state.active_link.replace(link_idx) {
                if prev != link_idx {
                    log::debug!("deactivate link #{prev}");
                }
            }
            if let Some(r) = state.nav.row_of_link(link_idx) {
                set_cursor(state, r);
            }
            effects.extend(load::begin_load(state, page));
        }
        Reload => {
            let row = state.active_link.and_then(|li| state.nav.row_of_link(li));
            if row.is_some() {
                return update(state, NavClick { row });
            }
        }
        MoveCursor(delta) => {
            let total = state.nav.rows.len();
            if total > 0 {
                let next = (state.cursor as i64 + delta as i64).clamp(0, total as i64 - 1);
                set_cursor(state, next as usize);
            }
        }
        FocusNext => {
            state.focus = match state.focus {
                Focus::Nav => Focus::Middle,
                Focus::Middle => Focus::Right,
                Focus::Right => Focus::Nav,
            };
        }
        Scroll { region, delta } => state.region_mut(region).scroll_by(delta),
        ScrollEdge { region, top } => {
            let r = state.region_mut(region);
            if top {
                r.scroll_to_top();
            } else {
                r.scroll_to_bottom();
            }
        }
        Loaded(msg) => effects.extend(load::finish_load(state, msg)),
    }
    effects
}

fn set_cursor(state: &mut AppState, row: usize) {
    state.cursor = row;
    let ih = state.nav_viewport_h as usize;
    if row < state.nav_offset {
        state.nav_offset = row;
    } else if ih > 0 && row >= state.nav_offset + ih {
        let (start, _end) = compute_scroll_window(state.nav.rows.len(), row, state.nav_viewport_h);
        state.nav_offset = start;
    }
}
