//! Roll-ups over computed positions: per-wallet summary and token ranking.

use crate::domain::{Address, Decimal, Mint, TokenSymbol};
use crate::engine::position::Position;
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals over every position one wallet holds or held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    pub wallet: Address,
    pub total_positions: usize,
    pub open_positions: usize,
    pub closed_positions: usize,
    /// Positions with sells but no recorded buys.
    pub unknown_basis_positions: usize,
    pub total_realized_pnl_usd: Decimal,
    pub total_unrealized_pnl_usd: Decimal,
    pub total_pnl_usd: Decimal,
    /// Share of closed positions with positive realized P&L, in percent.
    /// `None` when nothing is closed.
    pub win_rate_pct: Option<Decimal>,
}

/// Summarize the positions belonging to `wallet`; positions of other
/// wallets are ignored.
pub fn summarize_wallet<'a, I>(wallet: &Address, positions: I) -> WalletSummary
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut summary = WalletSummary {
        wallet: wallet.clone(),
        total_positions: 0,
        open_positions: 0,
        closed_positions: 0,
        unknown_basis_positions: 0,
        total_realized_pnl_usd: Decimal::zero(),
        total_unrealized_pnl_usd: Decimal::zero(),
        total_pnl_usd: Decimal::zero(),
        win_rate_pct: None,
    };
    let mut winners = 0i64;

    for position in positions.into_iter().filter(|p| &p.wallet == wallet) {
        summary.total_positions += 1;
        if position.is_fully_sold {
            summary.closed_positions += 1;
            if position.realized_pnl_usd.is_positive() {
                winners += 1;
            }
        } else if position.is_open() {
            summary.open_positions += 1;
        }
        if position.cost_basis_unknown {
            summary.unknown_basis_positions += 1;
        }
        summary.total_realized_pnl_usd += position.realized_pnl_usd;
        summary.total_unrealized_pnl_usd += position.unrealized_pnl_usd;
    }

    summary.total_pnl_usd = summary.total_realized_pnl_usd + summary.total_unrealized_pnl_usd;
    summary.win_rate_pct = Decimal::from_i64(winners)
        .percent_of(Decimal::from_i64(summary.closed_positions as i64));
    summary
}

/// One token's P&L summed across wallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPerformance {
    pub token_mint: Mint,
    pub token_symbol: TokenSymbol,
    pub wallet_count: usize,
    pub trade_count: u32,
    pub total_pnl_usd: Decimal,
}

/// Rank tokens by P&L summed over all wallets' positions, best first.
/// Ties are broken by mint so the ranking is deterministic.
pub fn top_tokens<'a, I>(positions: I, limit: usize) -> Vec<TokenPerformance>
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut by_mint: BTreeMap<&Mint, TokenPerformance> = BTreeMap::new();
    for position in positions {
        let entry = by_mint
            .entry(&position.token_mint)
            .or_insert_with(|| TokenPerformance {
                token_mint: position.token_mint.clone(),
                token_symbol: position.token_symbol.clone(),
                wallet_count: 0,
                trade_count: 0,
                total_pnl_usd: Decimal::zero(),
            });
        entry.wallet_count += 1;
        entry.trade_count += position.trade_count();
        entry.total_pnl_usd += position.total_pnl_usd;
    }

    let mut ranked: Vec<TokenPerformance> = by_mint.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_pnl_usd
            .cmp(&a.total_pnl_usd)
            .then_with(|| a.token_mint.cmp(&b.token_mint))
    });
    ranked.truncate(limit);
    ranked
}
