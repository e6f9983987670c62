//! Infrastructure layer - in-memory ledgers, event sinks and state files

pub mod events;
pub mod ledger;
pub mod state_store;

pub use events::{FanoutEventSink, RecordingEventSink, TracingEventSink};
pub use ledger::{AssetLedgerSnapshot, InMemoryAsset};
pub use state_store::{PersistedState, StateStore};
