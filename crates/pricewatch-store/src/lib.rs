//! File-backed persistence for the target list, price history and activity
//! log, plus the optional external record sink.

pub mod activity;
pub mod error;
pub mod history;
pub mod sink;
pub mod targets;

pub use activity::tail_lines;
pub use error::{SinkError, StoreError};
pub use history::{HistoryLog, HistorySummary};
pub use sink::{NullSink, RecordSink, WebhookSink};
pub use targets::{MergePolicy, TargetListStore};
