//! Domain primitives: Address, Mint, TokenSymbol, BlockTime, Direction.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Mint of wrapped SOL; token legs in this mint are SOL flow, not a position.
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address is empty")]
    Empty,
    #[error("address length {0} outside 32..=44")]
    BadLength(usize),
    #[error("address contains non-base58 character {0:?}")]
    BadCharacter(char),
}

fn validate_base58(s: &str) -> Result<(), AddressParseError> {
    if s.is_empty() {
        return Err(AddressParseError::Empty);
    }
    if !(32..=44).contains(&s.len()) {
        return Err(AddressParseError::BadLength(s.len()));
    }
    if let Some(c) = s.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(AddressParseError::BadCharacter(c));
    }
    Ok(())
}

/// Wallet address (base58 account key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Wrap without validation; ingestion paths use [`Address::parse`].
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let s = s.trim();
        validate_base58(s)?;
        Ok(Address(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token mint address. The only identity of an asset: symbols collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mint(pub String);

impl Mint {
    pub fn new(mint: String) -> Self {
        Mint(mint)
    }

    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let s = s.trim();
        validate_base58(s)?;
        Ok(Mint(s.to_string()))
    }

    pub fn is_wrapped_sol(&self) -> bool {
        self.0 == WRAPPED_SOL_MINT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Mint {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Mint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display ticker for a token ("BONK"). Presentation only.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenSymbol(pub String);

impl TokenSymbol {
    pub fn new(symbol: String) -> Self {
        TokenSymbol(symbol)
    }

    /// Placeholder for records that arrive without a symbol.
    pub fn unknown() -> Self {
        TokenSymbol("UNKNOWN".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid block time {0:?}: expected unix seconds or RFC 3339")]
pub struct BlockTimeParseError(pub String);

/// Block time in whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockTime(pub i64);

impl BlockTime {
    pub fn new(secs: i64) -> Self {
        BlockTime(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Parse either integer unix seconds ("1714000000") or an RFC 3339
    /// timestamp ("2024-04-25T00:26:40+00:00").
    pub fn parse(s: &str) -> Result<Self, BlockTimeParseError> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<i64>() {
            return Ok(BlockTime(secs));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| BlockTime(dt.timestamp()))
            .map_err(|_| BlockTimeParseError(s.to_string()))
    }
}

impl FromStr for BlockTime {
    type Err = BlockTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Trade direction relative to the traded token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Tokens acquired.
    Buy,
    /// Tokens disposed of.
    Sell,
}

impl Direction {
    /// Recognize a curated source label. Only BUY and SELL qualify;
    /// generic labels such as SWAP or TRANSFER return `None`.
    pub fn from_label(label: &str) -> Option<Direction> {
        match label.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(Direction::Buy),
            "SELL" => Some(Direction::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
