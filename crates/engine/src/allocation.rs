//! Pool allocation.
//!
//! Redistributes compliance balance inside a pool for one year. Surplus ships
//! (donors) are drained largest first into deficit ships (receivers), most
//! negative first. Ships with a zero balance pass through untouched.
//!
//! The allocation is greedy and single pass. Sorting is stable, so ties keep
//! the order in which ships were given and the result is reproducible.

use serde::{Deserialize, Serialize};

use crate::{EngineError, PoolMember, ResultEngine};

/// A ship's balance before pooling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub ship_id: String,
    pub cb_before: f64,
}

impl MemberBalance {
    pub fn new(ship_id: impl Into<String>, cb_before: f64) -> Self {
        Self {
            ship_id: ship_id.into(),
            cb_before,
        }
    }
}

/// Allocate surplus to deficits. The output keeps the input order.
pub fn allocate_pool(members: &[MemberBalance]) -> Vec<PoolMember> {
    let mut result: Vec<PoolMember> = members
        .iter()
        .map(|m| PoolMember {
            ship_id: m.ship_id.clone(),
            cb_before: m.cb_before,
            cb_after: m.cb_before,
        })
        .collect();

    let mut donors: Vec<usize> = (0..members.len())
        .filter(|&i| members[i].cb_before > 0.0)
        .collect();
    donors.sort_by(|&a, &b| members[b].cb_before.total_cmp(&members[a].cb_before));

    let mut receivers: Vec<usize> = (0..members.len())
        .filter(|&i| members[i].cb_before < 0.0)
        .collect();
    receivers.sort_by(|&a, &b| members[a].cb_before.total_cmp(&members[b].cb_before));

    for receiver in receivers {
        let mut remaining = members[receiver].cb_before.abs();
        for &donor in &donors {
            if remaining <= 0.0 {
                break;
            }
            // Donors keep a running balance across every receiver they fund.
            let transferable = result[donor].cb_after.min(remaining);
            if transferable <= 0.0 {
                continue;
            }
            result[donor].cb_after -= transferable;
            result[receiver].cb_after += transferable;
            remaining -= transferable;
        }
    }

    result
}

/// Check the pool invariants on an allocation:
///
/// - the pool as a whole stays compliant (sum of `cb_after` >= 0)
/// - no surplus ship ends negative
/// - no deficit ship ends worse than it started
pub fn validate_allocation(members: &[PoolMember]) -> ResultEngine<()> {
    let total: f64 = members.iter().map(|m| m.cb_after).sum();
    if total < 0.0 {
        return Err(EngineError::Validation(format!(
            "pool sum must be >= 0, got {total}"
        )));
    }

    for member in members {
        if member.cb_before >= 0.0 && member.cb_after < 0.0 {
            return Err(EngineError::Validation(format!(
                "surplus ship {} cannot exit negative (before: {}, after: {})",
                member.ship_id, member.cb_before, member.cb_after
            )));
        }
        if member.cb_before < 0.0 && member.cb_after < member.cb_before {
            return Err(EngineError::Validation(format!(
                "deficit ship {} cannot exit worse (before: {}, after: {})",
                member.ship_id, member.cb_before, member.cb_after
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn after(members: &[PoolMember], ship_id: &str) -> f64 {
        members
            .iter()
            .find(|m| m.ship_id == ship_id)
            .map(|m| m.cb_after)
            .unwrap()
    }

    fn sum_before(members: &[PoolMember]) -> f64 {
        members.iter().map(|m| m.cb_before).sum()
    }

    fn sum_after(members: &[PoolMember]) -> f64 {
        members.iter().map(|m| m.cb_after).sum()
    }

    #[test]
    fn single_donor_covers_two_deficits() {
        let result = allocate_pool(&[
            MemberBalance::new("A", 100.0),
            MemberBalance::new("B", -40.0),
            MemberBalance::new("C", -30.0),
        ]);

        assert_eq!(after(&result, "A"), 30.0);
        assert_eq!(after(&result, "B"), 0.0);
        assert_eq!(after(&result, "C"), 0.0);
        assert_eq!(sum_before(&result), sum_after(&result));
        validate_allocation(&result).unwrap();
    }

    #[test]
    fn output_keeps_input_order() {
        let result = allocate_pool(&[
            MemberBalance::new("C", -30.0),
            MemberBalance::new("A", 100.0),
            MemberBalance::new("B", 0.0),
        ]);
        let ids: Vec<&str> = result.iter().map(|m| m.ship_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn most_negative_receiver_is_served_first() {
        let result = allocate_pool(&[
            MemberBalance::new("small", -10.0),
            MemberBalance::new("large", -50.0),
            MemberBalance::new("donor", 40.0),
        ]);

        assert_eq!(after(&result, "large"), -10.0);
        assert_eq!(after(&result, "small"), -10.0);
        assert_eq!(after(&result, "donor"), 0.0);
    }

    #[test]
    fn largest_donor_is_drained_first() {
        let result = allocate_pool(&[
            MemberBalance::new("d1", 20.0),
            MemberBalance::new("d2", 50.0),
            MemberBalance::new("r", -60.0),
        ]);

        assert_eq!(after(&result, "d2"), 0.0);
        assert_eq!(after(&result, "d1"), 10.0);
        assert_eq!(after(&result, "r"), 0.0);
    }

    #[test]
    fn tied_donors_follow_input_order() {
        let result = allocate_pool(&[
            MemberBalance::new("first", 30.0),
            MemberBalance::new("second", 30.0),
            MemberBalance::new("r", -20.0),
        ]);

        assert_eq!(after(&result, "first"), 10.0);
        assert_eq!(after(&result, "second"), 30.0);
    }

    #[test]
    fn zero_balance_ships_pass_through() {
        let result = allocate_pool(&[
            MemberBalance::new("zero", 0.0),
            MemberBalance::new("d", 5.0),
            MemberBalance::new("r", -5.0),
        ]);

        assert_eq!(after(&result, "zero"), 0.0);
        assert_eq!(after(&result, "d"), 0.0);
        assert_eq!(after(&result, "r"), 0.0);
    }

    #[test]
    fn insufficient_surplus_runs_but_fails_validation() {
        let result = allocate_pool(&[
            MemberBalance::new("A", 10.0),
            MemberBalance::new("B", -50.0),
        ]);

        assert_eq!(after(&result, "A"), 0.0);
        assert_eq!(after(&result, "B"), -40.0);
        assert_eq!(sum_before(&result), sum_after(&result));

        let err = validate_allocation(&result).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("pool sum")));
    }

    #[test]
    fn pool_total_just_below_zero_is_rejected() {
        let result = allocate_pool(&[
            MemberBalance::new("A", 10.0),
            MemberBalance::new("B", -10.0009),
        ]);

        assert_eq!(after(&result, "A"), 0.0);
        assert!(sum_after(&result) < 0.0);
        let err = validate_allocation(&result).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("pool sum")));
    }

    #[test]
    fn pool_summing_to_exactly_zero_is_accepted() {
        let result = allocate_pool(&[
            MemberBalance::new("A", 25.0),
            MemberBalance::new("B", -25.0),
        ]);

        assert_eq!(sum_after(&result), 0.0);
        validate_allocation(&result).unwrap();
    }

    #[test]
    fn validation_rejects_surplus_ship_going_negative() {
        let members = vec![
            PoolMember {
                ship_id: "A".to_string(),
                cb_before: 10.0,
                cb_after: -5.0,
            },
            PoolMember {
                ship_id: "B".to_string(),
                cb_before: -10.0,
                cb_after: 25.0,
            },
        ];
        let err = validate_allocation(&members).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("surplus ship A")));
    }

    #[test]
    fn validation_rejects_worsened_deficit() {
        let members = vec![
            PoolMember {
                ship_id: "A".to_string(),
                cb_before: 30.0,
                cb_after: 40.0,
            },
            PoolMember {
                ship_id: "B".to_string(),
                cb_before: -10.0,
                cb_after: -20.0,
            },
        ];
        let err = validate_allocation(&members).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("deficit ship B")));
    }
}
