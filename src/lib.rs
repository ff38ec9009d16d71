pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ingest;

pub use config::Config;
pub use domain::{
    Address, BlockTime, Decimal, Direction, Mint, RawTradeRecord, TokenSymbol, TradeEvent,
};
pub use engine::{
    aggregate, aggregate_records, aggregate_with, classify, summarize_wallet, top_tokens,
    AggregateOptions, Aggregation, Classification, Classifier, LabelPrecedence, Position,
    PositionKey, UnclassifiedReason, WalletSummary,
};
pub use error::AppError;
