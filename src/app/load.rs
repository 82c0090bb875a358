use super::Effect;
use crate::services::extractor::{extract, Extracted};
use crate::ui::{AppState, LoadMsg, ToastLevel};

pub const LOADING_HTML: &str = "<p>Loading...</p>";
pub const NOT_FOUND_HTML: &str = "<p>Content for middle panel not found.</p>";
pub const ERROR_HTML: &str =
    r#"<p class="error">Error loading content. Please check the file path and console.</p>"#;

/// First step of a load sequence: visible feedback, then hand the fetch off.
pub(crate) fn begin_load(state: &mut AppState, page: String) -> Vec<Effect> {
    state.middle.set_html(LOADING_HTML, &state.theme);
    state.right.clear();
    state.middle.scroll_to_top();
    state.right.scroll_to_top();
    state.latest_ticket += 1;
    let ticket = state.latest_ticket;
    state.loading = Some(page.clone());
    state.loads_started += 1;
    log::info!("load {page} (#{ticket})");
    vec![Effect::LoadPage { page, ticket }]
}

/// Apply a fetch outcome. Results of superseded loads are dropped when
/// `discard_stale` is set; otherwise the last result to arrive wins.
pub(crate) fn finish_load(state: &mut AppState, msg: LoadMsg) -> Vec<Effect> {
    let latest = msg.ticket == state.latest_ticket;
    if latest {
        state.loading = None;
    } else if state.config.discard_stale {
        log::debug!(
            "discarding stale result for {} (#{}, latest #{})",
            msg.page,
            msg.ticket,
            state.latest_ticket
        );
        return Vec::new();
    }
    match msg.outcome {
        Ok(raw) => {
            let extracted = extract(&raw);
            if extracted.middle.is_none() {
                log::warn!("{}: no .content-middle section", msg.page);
            }
            render(state, extracted);
            state.loads_applied += 1;
            log::debug!("loaded {} (#{})", msg.page, msg.ticket);
            Vec::new()
        }
        Err(e) => {
            log::error!("Fetch Error: {e}");
            state.middle.set_html(ERROR_HTML, &state.theme);
            state.middle.scroll_to_top();
            vec![Effect::ShowToast {
                text: e.to_string(),
                level: ToastLevel::Error,
                seconds: 4,
            }]
        }
    }
}

/// Panel injection: replace both regions and scroll them to the top.
pub(crate) fn render(state: &mut AppState, extracted: Extracted) {
    match extracted.middle {
        Some(html) => state.middle.set_html(&html, &state.theme),
        None => state.middle.set_html(NOT_FOUND_HTML, &state.theme),
    }
    match extracted.right {
        Some(html) => state.right.set_html(&html, &state.theme),
        None => state.right.clear(),
    }
    state.middle.scroll_to_top();
    state.right.scroll_to_top();
}
