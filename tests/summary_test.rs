use walletpnl::domain::{Address, BlockTime, Decimal, Direction, Mint, TokenSymbol, TradeEvent};
use walletpnl::engine::{aggregate, summarize_wallet, top_tokens};

const ALICE: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
const BOB: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
const WIF: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";
const JUP: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

#[allow(clippy::too_many_arguments)]
fn event(
    sig: &str,
    wallet: &str,
    mint: &str,
    symbol: &str,
    direction: Direction,
    amount: &str,
    price: &str,
    t: i64,
) -> TradeEvent {
    TradeEvent::new(
        sig,
        Address::parse(wallet).unwrap(),
        Mint::parse(mint).unwrap(),
        TokenSymbol::new(symbol.to_string()),
        direction,
        d(amount),
        d(price),
        BlockTime::new(t),
    )
}

fn fixture() -> Vec<TradeEvent> {
    vec![
        // Alice: BONK closed at a gain (+50).
        event("1", ALICE, BONK, "BONK", Direction::Buy, "100", "1", 1),
        event("2", ALICE, BONK, "BONK", Direction::Sell, "100", "1.5", 2),
        // Alice: WIF closed at a loss (-20).
        event("3", ALICE, WIF, "WIF", Direction::Buy, "10", "4", 3),
        event("4", ALICE, WIF, "WIF", Direction::Sell, "10", "2", 4),
        // Alice: JUP still open, bought at 1, last seen at 1.2 (+2 unrealized).
        event("5", ALICE, JUP, "JUP", Direction::Buy, "10", "1", 5),
        event("6", BOB, JUP, "JUP", Direction::Buy, "1", "1.2", 6),
        // Bob: BONK sold without a recorded buy.
        event("7", BOB, BONK, "BONK", Direction::Sell, "5", "2", 7),
    ]
}

#[test]
fn test_wallet_summary_counts_and_totals() {
    let positions = aggregate(&fixture());
    let alice = Address::parse(ALICE).unwrap();
    let summary = summarize_wallet(&alice, positions.values());

    assert_eq!(summary.total_positions, 3);
    assert_eq!(summary.closed_positions, 2);
    assert_eq!(summary.open_positions, 1);
    assert_eq!(summary.unknown_basis_positions, 0);
    assert_eq!(summary.total_realized_pnl_usd, d("30"));
    // Alice's JUP has only her own trades, so current price is her buy price.
    assert_eq!(summary.total_unrealized_pnl_usd, Decimal::zero());
    assert_eq!(summary.total_pnl_usd, d("30"));
    assert_eq!(summary.win_rate_pct, Some(d("50")));
}

#[test]
fn test_wallet_summary_unknown_basis_and_no_closed_positions() {
    let positions = aggregate(&fixture());
    let bob = Address::parse(BOB).unwrap();
    let summary = summarize_wallet(&bob, positions.values());

    assert_eq!(summary.total_positions, 2);
    assert_eq!(summary.unknown_basis_positions, 1);
    assert_eq!(summary.closed_positions, 0);
    assert_eq!(summary.total_realized_pnl_usd, Decimal::zero());
    assert_eq!(summary.win_rate_pct, None);
}

#[test]
fn test_top_tokens_ranked_by_pnl() {
    let positions = aggregate(&fixture());
    let ranked = top_tokens(positions.values(), 10);

    let order: Vec<&str> = ranked.iter().map(|t| t.token_symbol.as_str()).collect();
    assert_eq!(order, vec!["BONK", "JUP", "WIF"]);

    let bonk = &ranked[0];
    assert_eq!(bonk.wallet_count, 2);
    assert_eq!(bonk.trade_count, 3);
    assert_eq!(bonk.total_pnl_usd, d("50"));
    assert_eq!(ranked[2].total_pnl_usd, d("-20"));
}

#[test]
fn test_top_tokens_respects_limit() {
    let positions = aggregate(&fixture());
    let ranked = top_tokens(positions.values(), 1);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].token_mint.as_str(), BONK);
}
