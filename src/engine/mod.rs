//! Pure computation engine: trade classification and average-cost P&L.

pub mod aggregator;
pub mod classifier;
pub mod position;
pub mod summary;

pub use aggregator::{
    aggregate, aggregate_records, aggregate_with, prepare_record, AggregateOptions, Aggregation,
    PositionAccumulator, RecordError, RejectedRecord,
};
pub use classifier::{classify, Classification, Classifier, LabelPrecedence, UnclassifiedReason};
pub use position::{Position, PositionKey, TradeHistoryEntry};
pub use summary::{summarize_wallet, top_tokens, TokenPerformance, WalletSummary};
