//! History view: fetch persisted posture records on demand.

mod store;
mod view;

pub use store::{HistoryStore, RestHistoryStore, RestHistoryStoreBuilder};
pub use view::HistoryView;
