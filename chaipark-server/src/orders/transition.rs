//! Status transition policy
//!
//! `Permissive` only forbids leaving a terminal state. `Strict` follows the
//! happy path one step at a time and allows cancelling any non-terminal order.

use serde::{Deserialize, Serialize};
use shared::order::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

/// Rejected transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl TransitionPolicy {
    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), TransitionRejected> {
        let rejected = TransitionRejected { from, to };
        if from.is_terminal() {
            return Err(rejected);
        }
        match self {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Strict => {
                if to == OrderStatus::Cancelled || from.next() == Some(to) {
                    Ok(())
                } else {
                    Err(rejected)
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPolicy::Permissive => "permissive",
            TransitionPolicy::Strict => "strict",
        }
    }
}

impl std::str::FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown transition policy: {}", other)),
        }
    }
}
