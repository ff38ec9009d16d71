//! Normalization of Helius enhanced transactions (webhook or history
//! payloads) into per-wallet trade records.

use super::ImportError;
use crate::domain::decimal::lenient;
use crate::domain::{Decimal, Mint, RawTradeRecord};
use rust_decimal::Decimal as RustDecimal;
use serde::Deserialize;
use std::collections::BTreeMap;

const LAMPORTS_DECIMALS: u32 = 9;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeliusTransaction {
    pub signature: String,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
    #[serde(default)]
    pub fee_payer: Option<String>,
    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,
    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,
    #[serde(default)]
    pub account_data: Vec<AccountData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    /// UI amount (decimals already applied).
    #[serde(deserialize_with = "lenient::deserialize")]
    pub token_amount: Decimal,
    pub mint: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    /// Lamports.
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub account: String,
    /// Lamports.
    #[serde(default)]
    pub native_balance_change: i64,
}

fn lamports_to_sol(lamports: i64) -> Decimal {
    Decimal::new(RustDecimal::new(lamports, LAMPORTS_DECIMALS))
}

/// Accept a webhook body in any of the shapes Helius delivers: an array of
/// transactions, a single transaction, or `{"transaction": {...}}`.
pub fn parse_webhook_payload(
    payload: &serde_json::Value,
) -> Result<Vec<HeliusTransaction>, ImportError> {
    let parsed = match payload {
        serde_json::Value::Array(_) => serde_json::from_value(payload.clone()),
        serde_json::Value::Object(map) => match map.get("transaction") {
            Some(inner) => serde_json::from_value(inner.clone()).map(|tx| vec![tx]),
            None => serde_json::from_value(payload.clone()).map(|tx| vec![tx]),
        },
        _ => {
            return Err(ImportError::Json(
                "expected a transaction object or array".to_string(),
            ))
        }
    };
    parsed.map_err(|e| ImportError::Json(e.to_string()))
}

/// Net flows of one wallet in one transaction.
#[derive(Debug, Default)]
struct WalletFlows {
    sol: Decimal,
    tokens: BTreeMap<String, Decimal>,
}

fn wallet_flows(tx: &HeliusTransaction, wallet: &str) -> WalletFlows {
    let mut flows = WalletFlows::default();

    for transfer in &tx.native_transfers {
        let amount = lamports_to_sol(transfer.amount);
        if transfer.to_user_account.as_deref() == Some(wallet) {
            flows.sol += amount;
        }
        if transfer.from_user_account.as_deref() == Some(wallet) {
            flows.sol = flows.sol - amount;
        }
    }

    for transfer in &tx.token_transfers {
        let mut delta = Decimal::zero();
        if transfer.to_user_account.as_deref() == Some(wallet) {
            delta += transfer.token_amount;
        }
        if transfer.from_user_account.as_deref() == Some(wallet) {
            delta = delta - transfer.token_amount;
        }
        if delta.is_zero() {
            continue;
        }
        // Wrapped SOL legs count as SOL flow.
        if transfer.mint == crate::domain::WRAPPED_SOL_MINT {
            flows.sol += delta;
        } else {
            *flows.tokens.entry(transfer.mint.clone()).or_default() += delta;
        }
    }

    flows
}

/// Turn one enhanced transaction into trade records for `wallet`, one per
/// non-SOL mint whose balance moved.
///
/// When `sol_price_usd` is given and exactly one token moved against a SOL
/// leg, the implied unit price is `|sol| * sol_price / |tokens|`. With
/// several tokens the SOL leg cannot be attributed and the price is left
/// empty. Multi-token records get `<signature>:<mint>` signatures so that
/// signature dedup does not collapse them.
pub fn normalize_transaction(
    tx: &HeliusTransaction,
    wallet: &str,
    sol_price_usd: Option<Decimal>,
) -> Vec<RawTradeRecord> {
    let flows = wallet_flows(tx, wallet);
    let token_legs: Vec<(&String, &Decimal)> = flows
        .tokens
        .iter()
        .filter(|(_, delta)| !delta.is_zero())
        .collect();
    let single_leg = token_legs.len() == 1;

    let native_balance_change = tx
        .account_data
        .iter()
        .find(|a| a.account == wallet)
        .map(|a| lamports_to_sol(a.native_balance_change))
        .filter(|change| !change.is_zero());

    token_legs
        .into_iter()
        .map(|(mint, delta)| {
            let sol_leg = if flows.sol.is_zero() {
                native_balance_change.unwrap_or_default()
            } else {
                flows.sol
            };
            let price_usd = match sol_price_usd {
                Some(sol_price) if single_leg && !sol_leg.is_zero() => {
                    (sol_leg.abs() * sol_price).checked_div(delta.abs())
                }
                _ => None,
            };
            let signature = if single_leg {
                tx.signature.clone()
            } else {
                format!("{}:{}", tx.signature, mint)
            };

            RawTradeRecord {
                signature: Some(signature),
                wallet: Some(wallet.to_string()),
                token_mint: Some(mint.clone()),
                token_symbol: None,
                source_type: tx.tx_type.clone(),
                token_amount: Some(*delta),
                sol_amount: (!flows.sol.is_zero()).then_some(flows.sol),
                native_balance_change,
                price_usd,
                block_time: Some(tx.timestamp.to_string()),
                market_cap_usd: None,
            }
        })
        .collect()
}

/// Normalize a batch, keeping only mints that are valid addresses.
pub fn normalize_transactions(
    txs: &[HeliusTransaction],
    wallet: &str,
    sol_price_usd: Option<Decimal>,
) -> Vec<RawTradeRecord> {
    txs.iter()
        .flat_map(|tx| normalize_transaction(tx, wallet, sol_price_usd))
        .filter(|record| {
            record
                .token_mint
                .as_deref()
                .map(|m| Mint::parse(m).is_ok())
                .unwrap_or(false)
        })
        .collect()
}
