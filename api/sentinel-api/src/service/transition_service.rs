//! Status ladders for events and violations.
//!
//! A status only moves forward (skips allowed). Requesting the current status
//! again is a no-op that succeeds, and leaving a terminal status is rejected.

use crate::module::error::AppError;
use crate::service::auth_service::{Principal, check_acknowledger};
use std::fmt::Display;

pub trait StatusLadder: Copy + PartialEq + Display {
    const ACKNOWLEDGED: Self;

    fn rank(&self) -> u8;

    fn is_terminal(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Advance,
}

pub fn plan_transition<S: StatusLadder>(current: S, target: S) -> Result<Transition, AppError> {
    if current == target {
        return Ok(Transition::Unchanged);
    }
    if current.is_terminal() || target.rank() <= current.rank() {
        return Err(AppError::unprocessable(
            "INVALID_STATUS_TRANSITION",
            format!("status cannot move from {current} to {target}"),
        ));
    }
    Ok(Transition::Advance)
}

/// Effective changes of a status/acknowledgment update. `None` fields leave
/// the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan<S> {
    pub status: Option<S>,
    pub acknowledged_by: Option<i64>,
}

impl<S> UpdatePlan<S> {
    pub fn is_noop(&self) -> bool {
        self.status.is_none() && self.acknowledged_by.is_none()
    }
}

pub fn plan_update<S: StatusLadder>(
    current_status: S,
    current_acknowledger: Option<i64>,
    requested_status: Option<S>,
    requested_acknowledger: Option<i64>,
    principal: Option<&Principal>,
) -> Result<UpdatePlan<S>, AppError> {
    check_acknowledger(principal, requested_acknowledger)?;

    let status = match requested_status {
        Some(target) => match plan_transition(current_status, target)? {
            Transition::Unchanged => None,
            Transition::Advance => Some(target),
        },
        None => None,
    };

    let acknowledger = if status == Some(S::ACKNOWLEDGED) {
        let who = requested_acknowledger
            .or_else(|| principal.map(|p| p.user_id))
            .or(current_acknowledger);
        if who.is_none() {
            return Err(AppError::unprocessable(
                "ACKNOWLEDGER_REQUIRED",
                "acknowledged_by is required to acknowledge",
            ));
        }
        who
    } else {
        requested_acknowledger
    };

    let acknowledged_by = acknowledger.filter(|who| Some(*who) != current_acknowledger);
    // Without a status move the acknowledger may only change on an acknowledged row.
    if acknowledged_by.is_some() && status.is_none() && current_status != S::ACKNOWLEDGED {
        return Err(AppError::unprocessable(
            "INVALID_STATUS_TRANSITION",
            format!("acknowledged_by cannot change while status is {current_status}"),
        ));
    }

    Ok(UpdatePlan {
        status,
        acknowledged_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::auth::schema::UserRole;
    use crate::module::event::schema::EventStatus;
    use crate::module::violation::schema::ViolationStatus;

    #[test]
    fn violation_ladder_allows_forward_moves_only() {
        use ViolationStatus::*;
        assert_eq!(plan_transition(Detected, Investigating).unwrap(), Transition::Advance);
        assert_eq!(plan_transition(Detected, Acknowledged).unwrap(), Transition::Advance);
        assert_eq!(plan_transition(Investigating, Acknowledged).unwrap(), Transition::Advance);
        assert_eq!(plan_transition(Acknowledged, Resolved).unwrap(), Transition::Advance);
        assert_eq!(plan_transition(Detected, FalsePositive).unwrap(), Transition::Advance);
        assert_eq!(plan_transition(Acknowledged, Acknowledged).unwrap(), Transition::Unchanged);

        for (from, to) in [
            (Acknowledged, Detected),
            (Acknowledged, Investigating),
            (Resolved, Acknowledged),
            (Resolved, FalsePositive),
            (FalsePositive, Resolved),
        ] {
            let err = plan_transition(from, to).expect_err("must reject");
            assert_eq!(err.code, "INVALID_STATUS_TRANSITION");
        }
    }

    #[test]
    fn event_ladder_allows_closing_after_resolution() {
        use EventStatus::*;
        assert_eq!(plan_transition(Resolved, Closed).unwrap(), Transition::Advance);
        assert!(plan_transition(Closed, Open).is_err());
        assert!(plan_transition(Resolved, Investigating).is_err());
    }

    #[test]
    fn acknowledging_requires_someone_to_acknowledge() {
        let err = plan_update(ViolationStatus::Detected, None, Some(ViolationStatus::Acknowledged), None, None)
            .expect_err("no acknowledger");
        assert_eq!(err.code, "ACKNOWLEDGER_REQUIRED");
    }

    #[test]
    fn principal_fills_in_missing_acknowledger() {
        let principal = Principal {
            user_id: 3,
            username: "george.torres".to_string(),
            role: UserRole::Analyst,
        };
        let plan = plan_update(
            EventStatus::Open,
            None,
            Some(EventStatus::Acknowledged),
            None,
            Some(&principal),
        )
        .expect("plan");
        assert_eq!(plan.status, Some(EventStatus::Acknowledged));
        assert_eq!(plan.acknowledged_by, Some(3));
    }

    #[test]
    fn repeating_an_acknowledgment_is_a_noop() {
        let plan = plan_update(
            ViolationStatus::Acknowledged,
            Some(1),
            Some(ViolationStatus::Acknowledged),
            Some(1),
            None,
        )
        .expect("plan");
        assert!(plan.is_noop());
    }

    #[test]
    fn acknowledger_alone_only_changes_on_acknowledged_rows() {
        use ViolationStatus::*;
        for current in [Detected, Resolved, FalsePositive] {
            let err = plan_update(current, Some(1), None, Some(2), None).expect_err("must reject");
            assert_eq!(err.code, "INVALID_STATUS_TRANSITION");
        }

        let plan = plan_update(Acknowledged, Some(1), None, Some(2), None).expect("plan");
        assert_eq!(plan.status, None);
        assert_eq!(plan.acknowledged_by, Some(2));

        let same = plan_update(Resolved, Some(1), None, Some(1), None).expect("plan");
        assert!(same.is_noop());
    }

    #[test]
    fn resolving_keeps_existing_acknowledger() {
        let plan = plan_update(
            ViolationStatus::Acknowledged,
            Some(1),
            Some(ViolationStatus::Resolved),
            None,
            None,
        )
        .expect("plan");
        assert_eq!(plan.status, Some(ViolationStatus::Resolved));
        assert_eq!(plan.acknowledged_by, None);
    }
}
