//! BUY/SELL classification from SOL flow, token flow and source labels.

use crate::domain::{Decimal, Direction};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Why a record could not be given a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnclassifiedReason {
    /// Neither SOL nor tokens moved and no trusted label was given.
    NoSignal,
    /// SOL moved but the token balance did not.
    NoTokenMovement,
    /// SOL left the wallet without tokens arriving.
    ConflictingFlows,
}

impl fmt::Display for UnclassifiedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnclassifiedReason::NoSignal => write!(f, "no SOL or token movement"),
            UnclassifiedReason::NoTokenMovement => write!(f, "SOL moved but token did not"),
            UnclassifiedReason::ConflictingFlows => {
                write!(f, "SOL spent without tokens received")
            }
        }
    }
}

/// Result of classifying one raw record. Never an error: the caller decides
/// whether to drop, log or surface unclassified records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Classified(Direction),
    Unclassified(UnclassifiedReason),
}

impl Classification {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Classification::Classified(direction) => Some(*direction),
            Classification::Unclassified(_) => None,
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, Classification::Classified(_))
    }
}

/// Whether a curated BUY/SELL label outranks the flow heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPrecedence {
    /// A BUY/SELL label wins; flows are consulted otherwise.
    #[default]
    Trusted,
    /// Flows win; the label is only used when flows give no answer.
    FlowFirst,
}

/// Classifier with a configured label precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    pub precedence: LabelPrecedence,
}

impl Classifier {
    pub fn new(precedence: LabelPrecedence) -> Self {
        Self { precedence }
    }

    pub fn classify(
        &self,
        sol_delta: Decimal,
        token_delta: Decimal,
        source_type: Option<&str>,
    ) -> Classification {
        let label = source_type.and_then(Direction::from_label);

        let result = match (self.precedence, label) {
            (LabelPrecedence::Trusted, Some(direction)) => Classification::Classified(direction),
            (LabelPrecedence::Trusted, None) => classify_by_flow(sol_delta, token_delta),
            (LabelPrecedence::FlowFirst, label) => match classify_by_flow(sol_delta, token_delta) {
                Classification::Unclassified(reason) => label
                    .map(Classification::Classified)
                    .unwrap_or(Classification::Unclassified(reason)),
                classified => classified,
            },
        };

        debug!(
            sol_delta = %sol_delta,
            token_delta = %token_delta,
            source_type = source_type.unwrap_or(""),
            result = ?result,
            "classified trade record"
        );
        result
    }
}

/// Classify with the default (trusted label) precedence.
pub fn classify(
    sol_delta: Decimal,
    token_delta: Decimal,
    source_type: Option<&str>,
) -> Classification {
    Classifier::default().classify(sol_delta, token_delta, source_type)
}

/// Flow rules, first match wins:
/// SOL out + tokens in -> BUY; SOL in + any token movement -> SELL;
/// no SOL leg -> sign of the token delta.
fn classify_by_flow(sol_delta: Decimal, token_delta: Decimal) -> Classification {
    if sol_delta.is_negative() && token_delta.is_positive() {
        return Classification::Classified(Direction::Buy);
    }
    if sol_delta.is_positive() && !token_delta.is_zero() {
        return Classification::Classified(Direction::Sell);
    }
    if sol_delta.is_zero() {
        if token_delta.is_positive() {
            return Classification::Classified(Direction::Buy);
        }
        if token_delta.is_negative() {
            return Classification::Classified(Direction::Sell);
        }
        return Classification::Unclassified(UnclassifiedReason::NoSignal);
    }
    if token_delta.is_zero() {
        Classification::Unclassified(UnclassifiedReason::NoTokenMovement)
    } else {
        Classification::Unclassified(UnclassifiedReason::ConflictingFlows)
    }
}
