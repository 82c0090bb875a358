use crate::services::fetcher::{fetch, FragmentSource};
use crate::ui::LoadMsg;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

/// Fetch one page off the UI thread and report back with its ticket.
pub fn spawn_load_page(
    source: Arc<dyn FragmentSource>,
    page: String,
    ticket: u64,
    tx: Sender<LoadMsg>,
) {
    thread::spawn(move || {
        let outcome = fetch(source.as_ref(), &page);
        let _ = tx.send(LoadMsg {
            ticket,
            page,
            outcome,
        });
    });
}
