use crate::domain::{Address, BlockTime, Decimal, Direction, Mint, TokenSymbol};
use serde::Serialize;

/// Grouping key for positions. Keyed by mint, never by symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PositionKey {
    pub wallet: Address,
    pub token_mint: Mint,
}

impl PositionKey {
    pub fn new(wallet: Address, token_mint: Mint) -> Self {
        Self { wallet, token_mint }
    }
}

/// One entry of a position's trade history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeHistoryEntry {
    pub signature: String,
    pub direction: Direction,
    pub token_amount: Decimal,
    pub unit_price_usd: Decimal,
    pub value_usd: Decimal,
    /// Sell proceeds minus cost at the final average entry price.
    /// `None` for buys and when the cost basis is unknown.
    pub pnl_usd: Option<Decimal>,
    pub block_time: BlockTime,
}

/// Average-cost position of one wallet in one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub wallet: Address,
    pub token_mint: Mint,
    /// Symbol of the most recent event in the group.
    pub token_symbol: TokenSymbol,

    pub total_bought: Decimal,
    pub total_sold: Decimal,
    pub total_buy_value_usd: Decimal,
    pub total_sell_value_usd: Decimal,
    pub buy_count: u32,
    pub sell_count: u32,

    /// Zero when nothing was bought.
    pub average_entry_price: Decimal,
    /// Zero when nothing was sold.
    pub average_exit_price: Decimal,
    /// `total_bought - total_sold`; negative when buys are missing.
    pub remaining_tokens: Decimal,
    pub is_fully_sold: bool,

    pub current_price_usd: Decimal,
    /// Latest market cap reported in the group; display only.
    pub market_cap_usd: Option<Decimal>,
    /// Zero when `cost_basis_unknown`.
    pub realized_pnl_usd: Decimal,
    pub unrealized_pnl_usd: Decimal,
    pub total_pnl_usd: Decimal,
    pub realized_pnl_pct: Option<Decimal>,
    pub unrealized_pnl_pct: Option<Decimal>,
    pub total_pnl_pct: Option<Decimal>,

    /// Sells recorded with no buys in the group.
    pub cost_basis_unknown: bool,
    /// More sold than bought.
    pub negative_balance: bool,

    pub first_trade_time: BlockTime,
    pub first_buy_time: Option<BlockTime>,
    pub last_sell_time: Option<BlockTime>,
    pub trades: Vec<TradeHistoryEntry>,
}

impl Position {
    /// Realized P&L, or `None` when it has no meaning (no cost basis).
    pub fn realized_pnl(&self) -> Option<Decimal> {
        (!self.cost_basis_unknown).then_some(self.realized_pnl_usd)
    }

    /// Open means tokens are still held.
    pub fn is_open(&self) -> bool {
        self.remaining_tokens.is_positive()
    }

    pub fn trade_count(&self) -> u32 {
        self.buy_count + self.sell_count
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.wallet.clone(), self.token_mint.clone())
    }
}

/// Running sums for one group; [`Totals::settle`] applies the average-cost
/// formulas once every event is in.
#[derive(Debug, Clone, Default)]
pub(crate) struct Totals {
    /// Recorded buys, including zero-quantity ones.
    pub buy_count: u32,
    pub total_bought: Decimal,
    pub total_sold: Decimal,
    pub total_buy_value_usd: Decimal,
    pub total_sell_value_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settled {
    pub average_entry_price: Decimal,
    pub average_exit_price: Decimal,
    pub remaining_tokens: Decimal,
    pub is_fully_sold: bool,
    pub cost_basis_unknown: bool,
    pub negative_balance: bool,
    pub realized_pnl_usd: Decimal,
    pub unrealized_pnl_usd: Decimal,
    pub total_pnl_usd: Decimal,
    pub realized_pnl_pct: Option<Decimal>,
    pub unrealized_pnl_pct: Option<Decimal>,
    pub total_pnl_pct: Option<Decimal>,
}

impl Totals {
    pub fn settle(&self, current_price_usd: Decimal) -> Settled {
        let has_buys = self.buy_count > 0;
        let average_entry_price = self.total_buy_value_usd.div_or_zero(self.total_bought);
        let average_exit_price = self.total_sell_value_usd.div_or_zero(self.total_sold);
        let remaining_tokens = self.total_bought - self.total_sold;

        let cost_basis_unknown = self.total_bought.is_zero() && self.total_sold.is_positive();
        let realized_pnl_usd = if cost_basis_unknown {
            Decimal::zero()
        } else {
            self.total_sell_value_usd - self.total_sold * average_entry_price
        };

        let held_cost = remaining_tokens * average_entry_price;
        let unrealized_pnl_usd = if remaining_tokens.is_positive() {
            remaining_tokens * (current_price_usd - average_entry_price)
        } else {
            Decimal::zero()
        };
        let total_pnl_usd = realized_pnl_usd + unrealized_pnl_usd;

        let unrealized_pnl_pct = if remaining_tokens.is_positive() {
            unrealized_pnl_usd.percent_of(held_cost)
        } else {
            None
        };

        Settled {
            average_entry_price,
            average_exit_price,
            remaining_tokens,
            is_fully_sold: has_buys && !remaining_tokens.is_positive(),
            cost_basis_unknown,
            negative_balance: remaining_tokens.is_negative(),
            realized_pnl_usd,
            unrealized_pnl_usd,
            total_pnl_usd,
            realized_pnl_pct: realized_pnl_usd.percent_of(self.total_buy_value_usd),
            unrealized_pnl_pct,
            total_pnl_pct: total_pnl_usd.percent_of(self.total_buy_value_usd),
        }
    }
}
