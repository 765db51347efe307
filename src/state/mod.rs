//! Session state management modules.

mod fetch;
#[cfg(not(target_arch = "wasm32"))]
mod fetch_worker;
mod session;
mod snapshot;

pub use fetch::{FetchKind, FetchOutcome, FetchRequest, FetchResult, FetchTag};
#[cfg(not(target_arch = "wasm32"))]
pub use fetch_worker::{FetchWorker, SharedService};
pub use session::{LoadTarget, LoadTicket, SessionState, SubmitMode};
pub use snapshot::LabelSnapshot;
