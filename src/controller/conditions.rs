//! Status condition tracking.
//!
//! Pure helpers over the ordered condition list in EtcdCluster status.
//! The list holds at most one condition per type; lookup is a linear scan.

use tracing::trace;

use crate::crd::Condition;

/// Policy for refreshing `lastTransitionTime` on upsert.
///
/// The loop historically refreshed the timestamp on every write, even when
/// the status value did not change, so the condition doubles as a "last
/// reconciled" marker. `OnStatusChange` keeps the previous timestamp for
/// no-op transitions instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransitionStamping {
    /// Refresh the transition timestamp on every upsert.
    Always,
    /// Keep the existing timestamp when the status value is unchanged.
    OnStatusChange,
}

/// Find a condition by type.
pub fn find_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Check if a condition of the given type is present and "True".
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    find_condition(conditions, condition_type).is_some_and(|c| c.status == "True")
}

/// Append or update a condition.
///
/// When a condition of the same type exists, its status, reason, message and
/// observed generation are overwritten together as a unit; the transition
/// timestamp follows `stamping`. Otherwise the condition is appended.
pub fn upsert_condition(
    conditions: &mut Vec<Condition>,
    condition: Condition,
    stamping: TransitionStamping,
) {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) => {
            if stamping == TransitionStamping::OnStatusChange && existing.status == condition.status
            {
                trace!(r#type = %condition.r#type, "Condition status unchanged, keeping timestamp");
                let last_transition_time = existing.last_transition_time.clone();
                *existing = condition;
                existing.last_transition_time = last_transition_time;
            } else {
                *existing = condition;
            }
        }
        None => conditions.push(condition),
    }
}
