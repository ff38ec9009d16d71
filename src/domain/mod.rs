//! Domain types for wallet trade accounting.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: Address, Mint, TokenSymbol, BlockTime, Direction
//! - Raw upstream records and classified trade events
//! - Stable event ordering for deterministic aggregation

pub mod decimal;
pub mod ordering;
pub mod primitives;
pub mod trade_event;

pub use decimal::Decimal;
pub use ordering::EventOrderingKey;
pub use primitives::{
    Address, AddressParseError, BlockTime, BlockTimeParseError, Direction, Mint, TokenSymbol,
    WRAPPED_SOL_MINT,
};
pub use trade_event::{RawTradeRecord, TradeEvent};
