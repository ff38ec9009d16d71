//! Trade events: the raw upstream record and the classified event the
//! aggregator consumes.

use crate::domain::decimal::lenient;
use crate::domain::{Address, BlockTime, Decimal, Direction, Mint, TokenSymbol};
use serde::{Deserialize, Serialize};

/// A classified BUY or SELL on one token by one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Originating transaction signature (dedup key).
    pub signature: String,
    pub wallet: Address,
    pub token_mint: Mint,
    pub token_symbol: TokenSymbol,
    pub direction: Direction,
    /// Token quantity, always a non-negative magnitude.
    pub token_amount: Decimal,
    /// Price per token at event time; zero when unknown.
    pub unit_price_usd: Decimal,
    pub block_time: BlockTime,
    /// Arrival index, the tie-breaker for equal block times.
    #[serde(default)]
    pub seq: u64,
    /// Market cap reported with the event; display only.
    #[serde(default)]
    pub market_cap_usd: Option<Decimal>,
}

impl TradeEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        signature: impl Into<String>,
        wallet: Address,
        token_mint: Mint,
        token_symbol: TokenSymbol,
        direction: Direction,
        token_amount: Decimal,
        unit_price_usd: Decimal,
        block_time: BlockTime,
    ) -> Self {
        TradeEvent {
            signature: signature.into(),
            wallet,
            token_mint,
            token_symbol,
            direction,
            token_amount: token_amount.abs(),
            unit_price_usd,
            block_time,
            seq: 0,
            market_cap_usd: None,
        }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    pub fn with_market_cap(mut self, market_cap_usd: Option<Decimal>) -> Self {
        self.market_cap_usd = market_cap_usd;
        self
    }

    /// `token_amount * unit_price_usd`.
    pub fn value_usd(&self) -> Decimal {
        self.token_amount * self.unit_price_usd
    }
}

/// Normalized transaction record as delivered by ingestion. Every field is
/// optional; validation happens when it is turned into a [`TradeEvent`].
///
/// Field aliases accept the column names of the `webhook_transactions`
/// export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTradeRecord {
    #[serde(default, alias = "transaction_signature")]
    pub signature: Option<String>,
    #[serde(default, alias = "from_address")]
    pub wallet: Option<String>,
    #[serde(default)]
    pub token_mint: Option<String>,
    #[serde(default)]
    pub token_symbol: Option<String>,
    /// Source label ("SWAP", "TRANSFER", "BUY", ...).
    #[serde(default, alias = "transaction_type", alias = "direction_hint")]
    pub source_type: Option<String>,
    /// Signed token delta: positive = received.
    #[serde(default, alias = "amount", deserialize_with = "lenient::option::deserialize")]
    pub token_amount: Option<Decimal>,
    /// Signed SOL delta: negative = SOL left the wallet.
    #[serde(default, deserialize_with = "lenient::option::deserialize")]
    pub sol_amount: Option<Decimal>,
    /// Signed native balance change, used when `sol_amount` is absent or zero.
    #[serde(default, deserialize_with = "lenient::option::deserialize")]
    pub native_balance_change: Option<Decimal>,
    #[serde(
        default,
        alias = "current_token_price",
        alias = "unit_price_usd",
        deserialize_with = "lenient::option::deserialize"
    )]
    pub price_usd: Option<Decimal>,
    /// Unix seconds or RFC 3339.
    #[serde(default, deserialize_with = "deserialize_block_time")]
    pub block_time: Option<String>,
    #[serde(
        default,
        alias = "market_cap",
        deserialize_with = "lenient::option::deserialize"
    )]
    pub market_cap_usd: Option<Decimal>,
}

impl RawTradeRecord {
    /// SOL leg used for classification: `sol_amount` when present and
    /// non-zero, else `native_balance_change`, else zero.
    pub fn sol_delta(&self) -> Decimal {
        match self.sol_amount {
            Some(sol) if !sol.is_zero() => sol,
            _ => self.native_balance_change.unwrap_or_default(),
        }
    }

    pub fn token_delta(&self) -> Decimal {
        self.token_amount.unwrap_or_default()
    }

    /// Deterministic stand-in key for records without a signature.
    pub fn content_key(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for field in [
            self.wallet.as_deref(),
            self.token_mint.as_deref(),
            self.source_type.as_deref(),
            self.block_time.as_deref(),
        ] {
            hasher.update(field.unwrap_or(""));
            hasher.update([0u8]);
        }
        for value in [
            self.token_amount,
            self.sol_amount,
            self.native_balance_change,
            self.price_usd,
        ] {
            hasher.update(value.map(|v| v.to_canonical_string()).unwrap_or_default());
            hasher.update([0u8]);
        }
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }
}

/// Block times arrive as integers (Helius) or strings (database exports).
fn deserialize_block_time<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(secs) => secs.to_string(),
    }))
}
