use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// ReorderPolicy
///
/// Selects how an update behaves when the requested `order` differs from the
/// entity's current one.
///
/// - `Preserve`: the long-standing catalog behaviour. A swap moves only the two
///   order values and leaves the other submitted fields unapplied; a request
///   for an order nobody holds changes nothing.
/// - `ApplyAll`: submitted fields are always written. The order is swapped with
///   the current holder, or simply moved when the value is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReorderPolicy {
    #[default]
    Preserve,
    ApplyAll,
}

impl FromStr for ReorderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "apply-all" | "apply_all" => Ok(Self::ApplyAll),
            other => Err(format!("unknown reorder policy '{other}'")),
        }
    }
}

impl fmt::Display for ReorderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preserve => f.write_str("preserve"),
            Self::ApplyAll => f.write_str("apply-all"),
        }
    }
}

/// A row reduced to its identity and display rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct Ranked {
    pub id: i64,
    pub order: i32,
}

/// One order assignment produced by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderMove {
    pub id: i64,
    pub order: i32,
}

/// ReorderPlan
///
/// The writes an update must perform, computed before anything touches
/// storage. Repositories execute a plan inside a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReorderPlan {
    /// Whether the non-order fields of the request are written.
    pub apply_fields: bool,
    /// Order assignments, current entity first.
    pub moves: Vec<OrderMove>,
}

impl ReorderPlan {
    /// True when the plan exchanges orders between two rows.
    pub fn swapped(&self) -> bool {
        self.moves.len() == 2
    }

    /// True when executing the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        !self.apply_fields && self.moves.is_empty()
    }
}

/// Rank assigned to a newly created row: one past the current maximum, or 1
/// for an empty set.
pub fn next_order(current_max: Option<i32>) -> i32 {
    current_max.map_or(1, |max| max.saturating_add(1))
}

/// plan_reorder
///
/// Computes the writes for updating `current` to the `requested` order.
/// `holder` is the sibling currently ranked at `requested`, if any; callers
/// only look it up when `requested` differs from the current order.
pub fn plan_reorder(
    current: Ranked,
    requested: i32,
    holder: Option<Ranked>,
    policy: ReorderPolicy,
) -> ReorderPlan {
    if requested == current.order {
        return ReorderPlan {
            apply_fields: true,
            moves: Vec::new(),
        };
    }

    match (holder.filter(|h| h.id != current.id), policy) {
        (Some(holder), policy) => ReorderPlan {
            apply_fields: policy == ReorderPolicy::ApplyAll,
            moves: vec![
                OrderMove {
                    id: current.id,
                    order: requested,
                },
                OrderMove {
                    id: holder.id,
                    order: current.order,
                },
            ],
        },
        (None, ReorderPolicy::Preserve) => ReorderPlan::default(),
        (None, ReorderPolicy::ApplyAll) => ReorderPlan {
            apply_fields: true,
            moves: vec![OrderMove {
                id: current.id,
                order: requested,
            }],
        },
    }
}
