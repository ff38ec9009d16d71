//! Folds trade events into one average-cost position per (wallet, mint).

use crate::domain::ordering::{is_chronological, sort_events_chronological};
use crate::domain::{
    Address, BlockTime, Decimal, Direction, Mint, RawTradeRecord, TokenSymbol, TradeEvent,
};
use crate::engine::classifier::{Classification, Classifier, UnclassifiedReason};
use crate::engine::position::{Position, PositionKey, Totals, TradeHistoryEntry};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

/// Caller-supplied inputs that are not part of the event stream.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Current prices by mint. Overrides the last observed event price.
    pub current_prices: HashMap<Mint, Decimal>,
}

impl AggregateOptions {
    pub fn with_current_price(mut self, mint: Mint, price: Decimal) -> Self {
        self.current_prices.insert(mint, price);
        self
    }
}

/// Why a single raw record was left out of aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("unclassifiable: {0}")]
    Unclassified(UnclassifiedReason),
}

/// A record rejected during aggregation, with enough context to review it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    /// Position of the record in the input.
    pub index: usize,
    pub signature: Option<String>,
    pub reason: String,
}

/// Output of the raw-record path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub positions: BTreeMap<PositionKey, Position>,
    pub rejected: Vec<RejectedRecord>,
}

/// Accumulates the events of one (wallet, mint) group.
///
/// Events must be fed in chronological order; [`Position::from_events`]
/// takes care of that for callers.
pub struct PositionAccumulator {
    key: PositionKey,
    totals: Totals,
    sell_count: u32,
    symbol: Option<TokenSymbol>,
    last_observed_price: Decimal,
    market_cap_usd: Option<Decimal>,
    first_trade_time: Option<BlockTime>,
    first_buy_time: Option<BlockTime>,
    last_sell_time: Option<BlockTime>,
    trades: Vec<TradeHistoryEntry>,
}

impl PositionAccumulator {
    pub fn new(key: PositionKey) -> Self {
        Self {
            key,
            totals: Totals::default(),
            sell_count: 0,
            symbol: None,
            last_observed_price: Decimal::zero(),
            market_cap_usd: None,
            first_trade_time: None,
            first_buy_time: None,
            last_sell_time: None,
            trades: Vec::new(),
        }
    }

    pub fn process_event(&mut self, event: &TradeEvent) {
        let amount = event.token_amount.abs();
        let value = amount * event.unit_price_usd;

        match event.direction {
            Direction::Buy => {
                self.totals.total_bought += amount;
                self.totals.total_buy_value_usd += value;
                self.totals.buy_count += 1;
                self.first_buy_time.get_or_insert(event.block_time);
            }
            Direction::Sell => {
                self.totals.total_sold += amount;
                self.totals.total_sell_value_usd += value;
                self.sell_count += 1;
                self.last_sell_time = Some(event.block_time);
            }
        }

        self.first_trade_time.get_or_insert(event.block_time);
        if !event.unit_price_usd.is_zero() {
            self.last_observed_price = event.unit_price_usd;
        }
        if event.market_cap_usd.is_some() {
            self.market_cap_usd = event.market_cap_usd;
        }
        if !event.token_symbol.as_str().is_empty() && event.token_symbol != TokenSymbol::unknown()
        {
            self.symbol = Some(event.token_symbol.clone());
        }

        self.trades.push(TradeHistoryEntry {
            signature: event.signature.clone(),
            direction: event.direction,
            token_amount: amount,
            unit_price_usd: event.unit_price_usd,
            value_usd: value,
            pnl_usd: None,
            block_time: event.block_time,
        });
    }

    /// Apply the average-cost formulas. `current_price` overrides the last
    /// observed non-zero event price.
    pub fn finish(self, current_price: Option<Decimal>) -> Position {
        let current_price_usd = current_price.unwrap_or(self.last_observed_price);
        let settled = self.totals.settle(current_price_usd);

        let mut trades = self.trades;
        if !settled.cost_basis_unknown {
            for trade in trades.iter_mut().filter(|t| t.direction == Direction::Sell) {
                trade.pnl_usd =
                    Some(trade.value_usd - trade.token_amount * settled.average_entry_price);
            }
        }

        Position {
            wallet: self.key.wallet,
            token_mint: self.key.token_mint,
            token_symbol: self.symbol.unwrap_or_else(TokenSymbol::unknown),
            total_bought: self.totals.total_bought,
            total_sold: self.totals.total_sold,
            total_buy_value_usd: self.totals.total_buy_value_usd,
            total_sell_value_usd: self.totals.total_sell_value_usd,
            buy_count: self.totals.buy_count,
            sell_count: self.sell_count,
            average_entry_price: settled.average_entry_price,
            average_exit_price: settled.average_exit_price,
            remaining_tokens: settled.remaining_tokens,
            is_fully_sold: settled.is_fully_sold,
            current_price_usd,
            market_cap_usd: self.market_cap_usd,
            realized_pnl_usd: settled.realized_pnl_usd,
            unrealized_pnl_usd: settled.unrealized_pnl_usd,
            total_pnl_usd: settled.total_pnl_usd,
            realized_pnl_pct: settled.realized_pnl_pct,
            unrealized_pnl_pct: settled.unrealized_pnl_pct,
            total_pnl_pct: settled.total_pnl_pct,
            cost_basis_unknown: settled.cost_basis_unknown,
            negative_balance: settled.negative_balance,
            first_trade_time: self.first_trade_time.unwrap_or(BlockTime::new(0)),
            first_buy_time: self.first_buy_time,
            last_sell_time: self.last_sell_time,
            trades,
        }
    }
}

impl Position {
    /// Compute the position of one group from its events.
    ///
    /// Every event is expected to belong to `key`. Events out of
    /// chronological order are sorted (stable on `seq`) first.
    pub fn from_events(
        key: PositionKey,
        events: &[TradeEvent],
        current_price: Option<Decimal>,
    ) -> Position {
        let ordered: Cow<'_, [TradeEvent]> = if is_chronological(events) {
            Cow::Borrowed(events)
        } else {
            debug!(
                wallet = %key.wallet,
                mint = %key.token_mint,
                "events arrived out of order, sorting by block time"
            );
            let mut owned = events.to_vec();
            sort_events_chronological(&mut owned);
            Cow::Owned(owned)
        };

        let mut accumulator = PositionAccumulator::new(key);
        for event in ordered.iter() {
            accumulator.process_event(event);
        }
        accumulator.finish(current_price)
    }
}

/// Aggregate classified events into one position per (wallet, mint).
///
/// Pure and deterministic. Deduplication by signature is the caller's job.
pub fn aggregate(events: &[TradeEvent]) -> BTreeMap<PositionKey, Position> {
    aggregate_with(events, &AggregateOptions::default())
}

pub fn aggregate_with(
    events: &[TradeEvent],
    options: &AggregateOptions,
) -> BTreeMap<PositionKey, Position> {
    let mut groups: BTreeMap<PositionKey, Vec<TradeEvent>> = BTreeMap::new();
    for event in events {
        groups
            .entry(PositionKey::new(
                event.wallet.clone(),
                event.token_mint.clone(),
            ))
            .or_default()
            .push(event.clone());
    }

    groups
        .into_iter()
        .map(|(key, group)| {
            let price = options.current_prices.get(&key.token_mint).copied();
            let position = Position::from_events(key.clone(), &group, price);
            (key, position)
        })
        .collect()
}

/// Validate and classify one raw record into a trade event.
pub fn prepare_record(
    index: usize,
    record: &RawTradeRecord,
    classifier: &Classifier,
) -> Result<TradeEvent, RecordError> {
    let wallet = required(&record.wallet, "wallet")?;
    let wallet = Address::parse(wallet).map_err(|e| RecordError::InvalidField {
        field: "wallet",
        reason: e.to_string(),
    })?;

    let mint = required(&record.token_mint, "token_mint")?;
    let token_mint = Mint::parse(mint).map_err(|e| RecordError::InvalidField {
        field: "token_mint",
        reason: e.to_string(),
    })?;
    if token_mint.is_wrapped_sol() {
        return Err(RecordError::InvalidField {
            field: "token_mint",
            reason: "wrapped SOL is the quote asset, not a position".to_string(),
        });
    }

    let block_time = required(&record.block_time, "block_time")?;
    let block_time = BlockTime::parse(block_time).map_err(|e| RecordError::InvalidField {
        field: "block_time",
        reason: e.to_string(),
    })?;

    let unit_price_usd = record.price_usd.unwrap_or_default();
    if unit_price_usd.is_negative() {
        return Err(RecordError::InvalidField {
            field: "price_usd",
            reason: format!("negative price {}", unit_price_usd),
        });
    }

    if record
        .token_delta()
        .abs()
        .checked_mul(unit_price_usd)
        .is_none()
    {
        return Err(RecordError::InvalidField {
            field: "price_usd",
            reason: "value overflows".to_string(),
        });
    }

    let direction = match classifier.classify(
        record.sol_delta(),
        record.token_delta(),
        record.source_type.as_deref(),
    ) {
        Classification::Classified(direction) => direction,
        Classification::Unclassified(reason) => return Err(RecordError::Unclassified(reason)),
    };

    let signature = record
        .signature
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| record.content_key());

    let token_symbol = record
        .token_symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| TokenSymbol::new(s.to_string()))
        .unwrap_or_else(TokenSymbol::unknown);

    Ok(TradeEvent::new(
        signature,
        wallet,
        token_mint,
        token_symbol,
        direction,
        record.token_delta(),
        unit_price_usd,
        block_time,
    )
    .with_seq(index as u64)
    .with_market_cap(record.market_cap_usd.filter(|cap| cap.is_positive())))
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, RecordError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingField(field))
}

/// Classify, validate and aggregate raw records. Bad records are rejected
/// individually; the rest are aggregated.
pub fn aggregate_records(
    records: &[RawTradeRecord],
    classifier: &Classifier,
    options: &AggregateOptions,
) -> Aggregation {
    let mut events = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match prepare_record(index, record, classifier) {
            Ok(event) => events.push(event),
            Err(err) => {
                warn!(
                    index,
                    signature = record.signature.as_deref().unwrap_or(""),
                    "rejected trade record: {}",
                    err
                );
                rejected.push(RejectedRecord {
                    index,
                    signature: record.signature.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    Aggregation {
        positions: aggregate_with(&events, options),
        rejected,
    }
}
