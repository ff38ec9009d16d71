use walletpnl::domain::{Address, BlockTime, Decimal, Direction, Mint, TokenSymbol, TradeEvent};
use walletpnl::engine::{
    aggregate, aggregate_records, classify, AggregateOptions, Classification, Classifier,
    Position, PositionKey, UnclassifiedReason,
};
use walletpnl::RawTradeRecord;

const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
const FAKE_BONK: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn event(
    sig: &str,
    mint: &str,
    direction: Direction,
    amount: &str,
    price: &str,
    t: i64,
) -> TradeEvent {
    TradeEvent::new(
        sig,
        Address::parse(WALLET).unwrap(),
        Mint::parse(mint).unwrap(),
        TokenSymbol::new("BONK".to_string()),
        direction,
        d(amount),
        d(price),
        BlockTime::new(t),
    )
}

fn key(mint: &str) -> PositionKey {
    PositionKey::new(Address::parse(WALLET).unwrap(), Mint::parse(mint).unwrap())
}

fn only_position(events: &[TradeEvent]) -> Position {
    let positions = aggregate(events);
    assert_eq!(positions.len(), 1);
    positions.into_values().next().unwrap()
}

#[test]
fn test_aggregate_is_idempotent() {
    let events = vec![
        event("a", BONK, Direction::Buy, "100", "1", 1),
        event("b", BONK, Direction::Sell, "30", "2", 2),
        event("c", FAKE_BONK, Direction::Buy, "5", "7", 3),
    ];
    assert_eq!(aggregate(&events), aggregate(&events));
}

#[test]
fn test_buy_order_does_not_change_average_entry() {
    let forward = vec![
        event("a", BONK, Direction::Buy, "100", "1", 1),
        event("b", BONK, Direction::Buy, "300", "2", 2),
        event("c", BONK, Direction::Buy, "50", "4", 3),
    ];
    let reversed = vec![
        event("c", BONK, Direction::Buy, "50", "4", 1),
        event("b", BONK, Direction::Buy, "300", "2", 2),
        event("a", BONK, Direction::Buy, "100", "1", 3),
    ];
    assert_eq!(
        only_position(&forward).average_entry_price,
        only_position(&reversed).average_entry_price
    );
    // (100 + 600 + 200) / 450
    assert_eq!(only_position(&forward).average_entry_price, d("2"));
}

#[test]
fn test_remaining_tokens_is_conserved() {
    let events = vec![
        event("a", BONK, Direction::Buy, "1000.123456789", "0.01", 1),
        event("b", BONK, Direction::Sell, "0.000000001", "0.02", 2),
        event("c", BONK, Direction::Buy, "0.1", "0.03", 3),
        event("d", BONK, Direction::Sell, "333.333333333", "0.02", 4),
    ];
    let p = only_position(&events);
    assert_eq!(p.remaining_tokens, p.total_bought - p.total_sold);
    assert_eq!(p.remaining_tokens, d("666.890123455"));
}

#[test]
fn test_round_trip_at_same_price() {
    let p = only_position(&[
        event("a", BONK, Direction::Buy, "1000", "0.01", 1),
        event("b", BONK, Direction::Sell, "1000", "0.01", 2),
    ]);
    assert_eq!(p.average_entry_price, d("0.01"));
    assert_eq!(p.average_exit_price, d("0.01"));
    assert_eq!(p.realized_pnl_usd, Decimal::zero());
    assert_eq!(p.remaining_tokens, Decimal::zero());
    assert!(p.is_fully_sold);
    assert!(!p.is_open());
}

#[test]
fn test_average_cost_is_recomputed_retroactively() {
    let p = only_position(&[
        event("a", BONK, Direction::Buy, "100", "1", 1),
        event("b", BONK, Direction::Sell, "50", "2", 2),
        event("c", BONK, Direction::Buy, "100", "3", 3),
    ]);
    assert_eq!(p.average_entry_price, d("2"));
    assert_eq!(p.total_sold, d("50"));
    assert_eq!(p.realized_pnl_usd, Decimal::zero());
    // Per-sell P&L uses the same final average, so it sums to realized.
    let sell_pnl: Decimal = p.trades.iter().filter_map(|t| t.pnl_usd).sum();
    assert_eq!(sell_pnl, p.realized_pnl_usd);
}

#[test]
fn test_sell_without_buys_has_unknown_basis() {
    let p = only_position(&[event("a", BONK, Direction::Sell, "500", "0.05", 1)]);
    assert!(p.cost_basis_unknown);
    assert_eq!(p.average_entry_price, Decimal::zero());
    assert_eq!(p.realized_pnl_usd, Decimal::zero());
    assert_eq!(p.realized_pnl(), None);
    assert_eq!(p.total_sell_value_usd, d("25"));
    assert!(p.trades[0].pnl_usd.is_none());
}

#[test]
fn test_oversold_position_is_flagged() {
    let p = only_position(&[
        event("a", BONK, Direction::Buy, "100", "1", 1),
        event("b", BONK, Direction::Sell, "150", "1", 2),
    ]);
    assert_eq!(p.remaining_tokens, d("-50"));
    assert!(p.negative_balance);
    assert!(p.is_fully_sold);
    assert!(!p.cost_basis_unknown);
    assert_eq!(p.unrealized_pnl_usd, Decimal::zero());
}

#[test]
fn test_classifier_scenarios() {
    assert_eq!(
        classify(d("-1.5"), d("1000"), None),
        Classification::Classified(Direction::Buy)
    );
    assert_eq!(
        classify(d("1.5"), d("-1000"), None),
        Classification::Classified(Direction::Sell)
    );
    assert_eq!(
        classify(Decimal::zero(), Decimal::zero(), None),
        Classification::Unclassified(UnclassifiedReason::NoSignal)
    );
    assert_eq!(
        classify(d("-1"), d("5"), Some("TRANSFER")),
        Classification::Classified(Direction::Buy)
    );
    assert_eq!(
        classify(Decimal::zero(), Decimal::zero(), Some("BUY")),
        Classification::Classified(Direction::Buy)
    );
}

#[test]
fn test_same_symbol_different_mints_stay_separate() {
    let positions = aggregate(&[
        event("a", BONK, Direction::Buy, "100", "1", 1),
        event("b", FAKE_BONK, Direction::Buy, "100", "5", 2),
    ]);
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[&key(BONK)].average_entry_price, d("1"));
    assert_eq!(positions[&key(FAKE_BONK)].average_entry_price, d("5"));
    assert!(positions
        .values()
        .all(|p| p.token_symbol.as_str() == "BONK"));
}

#[test]
fn test_out_of_order_events_are_sorted() {
    let ordered = only_position(&[
        event("a", BONK, Direction::Buy, "10", "1", 100),
        event("b", BONK, Direction::Sell, "4", "2", 200),
    ]);
    let shuffled = only_position(&[
        event("b", BONK, Direction::Sell, "4", "2", 200),
        event("a", BONK, Direction::Buy, "10", "1", 100),
    ]);
    assert_eq!(ordered, shuffled);
    assert_eq!(shuffled.first_trade_time, BlockTime::new(100));
    assert_eq!(shuffled.last_sell_time, Some(BlockTime::new(200)));
}

#[test]
fn test_bad_records_are_rejected_and_rest_aggregated() {
    let good = RawTradeRecord {
        signature: Some("good".to_string()),
        wallet: Some(WALLET.to_string()),
        token_mint: Some(BONK.to_string()),
        source_type: Some("SWAP".to_string()),
        token_amount: Some(d("1000")),
        sol_amount: Some(d("-1")),
        price_usd: Some(d("0.01")),
        block_time: Some("1714000000".to_string()),
        ..Default::default()
    };
    let no_signal = RawTradeRecord {
        signature: Some("idle".to_string()),
        token_amount: Some(Decimal::zero()),
        sol_amount: Some(Decimal::zero()),
        ..good.clone()
    };
    let no_wallet = RawTradeRecord {
        signature: Some("orphan".to_string()),
        wallet: None,
        ..good.clone()
    };

    let aggregation = aggregate_records(
        &[no_signal, good, no_wallet],
        &Classifier::default(),
        &AggregateOptions::default().with_current_price(Mint::parse(BONK).unwrap(), d("0.02")),
    );

    assert_eq!(aggregation.positions.len(), 1);
    let p = &aggregation.positions[&key(BONK)];
    assert_eq!(p.total_bought, d("1000"));
    assert_eq!(p.current_price_usd, d("0.02"));
    assert_eq!(p.unrealized_pnl_usd, d("10"));

    let rejected: Vec<(usize, Option<&str>)> = aggregation
        .rejected
        .iter()
        .map(|r| (r.index, r.signature.as_deref()))
        .collect();
    assert_eq!(rejected, vec![(0, Some("idle")), (2, Some("orphan"))]);
}

#[test]
fn test_overflowing_record_is_rejected_and_rest_aggregated() {
    let good = RawTradeRecord {
        signature: Some("good".to_string()),
        wallet: Some(WALLET.to_string()),
        token_mint: Some(BONK.to_string()),
        source_type: Some("SWAP".to_string()),
        token_amount: Some(d("1000")),
        sol_amount: Some(d("-1")),
        price_usd: Some(d("0.01")),
        block_time: Some("1714000000".to_string()),
        ..Default::default()
    };
    let huge = RawTradeRecord {
        signature: Some("huge".to_string()),
        token_amount: Some(d("1000000000000000")),
        price_usd: Some(d("1000000000000000")),
        ..good.clone()
    };

    let aggregation = aggregate_records(
        &[huge, good],
        &Classifier::default(),
        &AggregateOptions::default(),
    );

    assert_eq!(aggregation.rejected.len(), 1);
    assert_eq!(aggregation.rejected[0].index, 0);
    assert!(aggregation.rejected[0].reason.contains("price_usd"));
    let p = &aggregation.positions[&key(BONK)];
    assert_eq!(p.total_bought, d("1000"));
    assert_eq!(p.total_buy_value_usd, d("10"));
}

#[test]
fn test_zero_quantity_buy_is_fully_sold() {
    let p = only_position(&[event("a", BONK, Direction::Buy, "0", "0", 1)]);
    assert_eq!(p.buy_count, 1);
    assert_eq!(p.remaining_tokens, Decimal::zero());
    assert!(p.is_fully_sold);
    assert!(!p.cost_basis_unknown);
    assert!(!p.negative_balance);
    assert_eq!(p.realized_pnl(), Some(Decimal::zero()));
}
