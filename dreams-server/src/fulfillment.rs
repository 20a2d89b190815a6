//! Dream fulfillment - applies a contribution to a dream by category
//!
//! Pure state transition, no I/O. The repository layer reads a
//! [`DreamSnapshot`], calls [`fulfill`], and writes the resulting
//! [`Fulfillment`] back with a compare-and-swap on the snapshot values.
//!
//! - Money: `contribution_amount` is added to the running total; the dream
//!   completes once the total reaches the cost.
//! - Services / Gifts: `contribution_description` is recorded as a
//!   contribution and the dream completes immediately.

use serde_json::Value;

use crate::models::{Category, DreamStatus};

/// Payload key for money contributions
pub const AMOUNT_KEY: &str = "contribution_amount";

/// Payload key for service/gift contributions
pub const DESCRIPTION_KEY: &str = "contribution_description";

/// The parts of a dream that fulfillment reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DreamSnapshot {
    pub category: Category,
    pub cost: i64,
    pub accumulated: i64,
    pub status: DreamStatus,
}

/// A contribution parsed from the request payload for a given category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    Money { amount: i64 },
    InKind { description: String },
}

/// New dream state after a successful fulfillment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
    pub accumulated: i64,
    pub status: DreamStatus,
    /// Description to store as a contribution record (in-kind only)
    pub record: Option<String>,
}

/// Why a fulfillment was refused. All variants are user-correctable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FulfillError {
    #[error("This dream has already been fulfilled.")]
    AlreadyFulfilled,

    #[error("contribution_amount must be an integer.")]
    AmountNotInteger,

    #[error("Contribution must be a positive integer.")]
    NonPositiveAmount,

    #[error("Contribution is too large.")]
    AmountOverflow,

    #[error("Description of contribution is required for this category.")]
    MissingDescription,
}

impl Contribution {
    /// Read the category-specific key from a free-form JSON payload.
    ///
    /// A missing amount counts as 0 and is rejected as non-positive.
    pub fn from_payload(category: Category, payload: &Value) -> Result<Self, FulfillError> {
        match category {
            Category::Money => {
                let amount = match payload.get(AMOUNT_KEY) {
                    None | Some(Value::Null) => 0,
                    Some(v) => v.as_i64().ok_or(FulfillError::AmountNotInteger)?,
                };
                if amount <= 0 {
                    return Err(FulfillError::NonPositiveAmount);
                }
                Ok(Self::Money { amount })
            }
            Category::Services | Category::Gifts => {
                let description = payload
                    .get(DESCRIPTION_KEY)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default();
                if description.is_empty() {
                    return Err(FulfillError::MissingDescription);
                }
                Ok(Self::InKind {
                    description: description.to_owned(),
                })
            }
        }
    }
}

/// Apply `payload` to `dream`.
///
/// Completed dreams are rejected before the payload is looked at.
pub fn fulfill(dream: &DreamSnapshot, payload: &Value) -> Result<Fulfillment, FulfillError> {
    if dream.status == DreamStatus::Completed {
        return Err(FulfillError::AlreadyFulfilled);
    }

    match Contribution::from_payload(dream.category, payload)? {
        Contribution::Money { amount } => {
            let accumulated = dream
                .accumulated
                .checked_add(amount)
                .ok_or(FulfillError::AmountOverflow)?;
            let status = if accumulated >= dream.cost {
                DreamStatus::Completed
            } else {
                DreamStatus::Pending
            };
            Ok(Fulfillment {
                accumulated,
                status,
                record: None,
            })
        }
        Contribution::InKind { description } => Ok(Fulfillment {
            accumulated: dream.accumulated,
            status: DreamStatus::Completed,
            record: Some(description),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn money(cost: i64, accumulated: i64) -> DreamSnapshot {
        DreamSnapshot {
            category: Category::Money,
            cost,
            accumulated,
            status: DreamStatus::Pending,
        }
    }

    fn in_kind(category: Category) -> DreamSnapshot {
        DreamSnapshot {
            category,
            cost: 1,
            accumulated: 0,
            status: DreamStatus::Pending,
        }
    }

    #[test]
    fn money_crossing_cost_completes() {
        let out = fulfill(&money(100, 80), &json!({ "contribution_amount": 30 })).unwrap();
        assert_eq!(out.accumulated, 110);
        assert_eq!(out.status, DreamStatus::Completed);
        assert_eq!(out.record, None);
    }

    #[test]
    fn money_exactly_reaching_cost_completes() {
        let out = fulfill(&money(100, 60), &json!({ "contribution_amount": 40 })).unwrap();
        assert_eq!(out.accumulated, 100);
        assert_eq!(out.status, DreamStatus::Completed);
    }

    #[test]
    fn money_below_cost_stays_pending() {
        let out = fulfill(&money(100, 0), &json!({ "contribution_amount": 99 })).unwrap();
        assert_eq!(out.accumulated, 99);
        assert_eq!(out.status, DreamStatus::Pending);
    }

    #[test]
    fn money_accumulates_for_any_positive_amount() {
        for (acc, amount) in [(0, 1), (5, 7), (90, 10), (0, 1_000)] {
            let out = fulfill(&money(100, acc), &json!({ "contribution_amount": amount })).unwrap();
            assert_eq!(out.accumulated, acc + amount);
            assert_eq!(out.status == DreamStatus::Completed, acc + amount >= 100);
        }
    }

    #[test]
    fn money_rejects_non_positive() {
        for amount in [0, -1, -50] {
            assert_eq!(
                fulfill(&money(100, 10), &json!({ "contribution_amount": amount })).unwrap_err(),
                FulfillError::NonPositiveAmount
            );
        }
    }

    #[test]
    fn money_missing_amount_is_non_positive() {
        assert_eq!(
            fulfill(&money(100, 0), &json!({})).unwrap_err(),
            FulfillError::NonPositiveAmount
        );
        assert_eq!(
            fulfill(&money(100, 0), &json!({ "contribution_amount": null })).unwrap_err(),
            FulfillError::NonPositiveAmount
        );
    }

    #[test]
    fn money_rejects_non_integer() {
        for bad in [json!("30"), json!(2.5), json!([1])] {
            assert_eq!(
                fulfill(&money(100, 0), &json!({ "contribution_amount": bad })).unwrap_err(),
                FulfillError::AmountNotInteger
            );
        }
    }

    #[test]
    fn money_overflow_is_rejected() {
        assert_eq!(
            fulfill(&money(i64::MAX, i64::MAX - 1), &json!({ "contribution_amount": 2 })).unwrap_err(),
            FulfillError::AmountOverflow
        );
    }

    #[test]
    fn in_kind_completes_and_records() {
        for category in [Category::Services, Category::Gifts] {
            let out = fulfill(
                &in_kind(category),
                &json!({ "contribution_description": "I can fix the roof" }),
            )
            .unwrap();
            assert_eq!(out.status, DreamStatus::Completed);
            assert_eq!(out.accumulated, 0);
            assert_eq!(out.record.as_deref(), Some("I can fix the roof"));
        }
    }

    #[test]
    fn in_kind_requires_description() {
        for payload in [
            json!({}),
            json!({ "contribution_description": "" }),
            json!({ "contribution_description": "   " }),
            json!({ "contribution_description": 42 }),
            json!({ "contribution_amount": 10 }),
        ] {
            assert_eq!(
                fulfill(&in_kind(Category::Services), &payload).unwrap_err(),
                FulfillError::MissingDescription
            );
        }
    }

    #[test]
    fn completed_dream_is_rejected_for_every_category() {
        for category in Category::ALL {
            let dream = DreamSnapshot {
                category,
                cost: 10,
                accumulated: 10,
                status: DreamStatus::Completed,
            };
            let payload = json!({
                "contribution_amount": 5,
                "contribution_description": "more",
            });
            assert_eq!(fulfill(&dream, &payload).unwrap_err(), FulfillError::AlreadyFulfilled);
        }
    }

    #[test]
    fn messages_match_api_contract() {
        assert_eq!(
            FulfillError::AlreadyFulfilled.to_string(),
            "This dream has already been fulfilled."
        );
        assert_eq!(
            FulfillError::NonPositiveAmount.to_string(),
            "Contribution must be a positive integer."
        );
        assert_eq!(
            FulfillError::MissingDescription.to_string(),
            "Description of contribution is required for this category."
        );
    }
}
