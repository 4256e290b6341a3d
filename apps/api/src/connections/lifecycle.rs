use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::connection::{ConnectionRow, ConnectionStatus, RequestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Activate,
    Block,
    Unblock { by: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Accept,
    Reject,
    Cancel,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Connection is already {0}")]
    AlreadyInState(&'static str),

    #[error("Cannot {action} a {from} connection")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Only the user who blocked this connection can unblock it")]
    NotBlocker,

    #[error("Connection between these users is blocked")]
    Blocked,

    #[error("Request is already {0}")]
    RequestClosed(&'static str),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotBlocker | LifecycleError::Blocked => {
                AppError::Forbidden(err.to_string())
            }
            _ => AppError::Conflict(err.to_string()),
        }
    }
}

/// Connection state machine:
/// pending → active (request accepted), active → blocked,
/// blocked → active (blocker only, via unblock).
pub fn transition(
    current: ConnectionStatus,
    blocked_by: Option<Uuid>,
    action: ConnectionAction,
) -> Result<ConnectionStatus, LifecycleError> {
    use ConnectionStatus::*;

    match (current, action) {
        (Pending, ConnectionAction::Activate) => Ok(Active),
        (Active, ConnectionAction::Activate) => Err(LifecycleError::AlreadyInState("active")),
        (Blocked, ConnectionAction::Activate) => Err(LifecycleError::Blocked),
        (Active, ConnectionAction::Block) => Ok(Blocked),
        (Blocked, ConnectionAction::Block) => Err(LifecycleError::AlreadyInState("blocked")),
        (Blocked, ConnectionAction::Unblock { by }) => {
            if blocked_by == Some(by) {
                Ok(Active)
            } else {
                Err(LifecycleError::NotBlocker)
            }
        }
        (from, action) => Err(LifecycleError::InvalidTransition {
            from: from.as_str(),
            action: action_name(action),
        }),
    }
}

fn action_name(action: ConnectionAction) -> &'static str {
    match action {
        ConnectionAction::Activate => "activate",
        ConnectionAction::Block => "block",
        ConnectionAction::Unblock { .. } => "unblock",
    }
}

/// Status a pair's connection moves to when a request between them is accepted.
/// A pair without a row is treated as pending.
pub fn activation_for(
    existing: Option<&ConnectionRow>,
) -> Result<ConnectionStatus, LifecycleError> {
    let current = existing
        .and_then(ConnectionRow::status)
        .unwrap_or(ConnectionStatus::Pending);
    transition(
        current,
        existing.and_then(|c| c.blocked_by),
        ConnectionAction::Activate,
    )
}

/// Requests can only be answered while pending.
pub fn request_transition(
    current: RequestStatus,
    action: RequestAction,
) -> Result<RequestStatus, LifecycleError> {
    if current != RequestStatus::Pending {
        return Err(LifecycleError::RequestClosed(current.as_str()));
    }
    Ok(match action {
        RequestAction::Accept => RequestStatus::Accepted,
        RequestAction::Reject => RequestStatus::Rejected,
        RequestAction::Cancel => RequestStatus::Cancelled,
    })
}

/// Decides whether `requester` may send a new request to `recipient`.
pub fn check_can_request(
    requester: Uuid,
    recipient: Uuid,
    existing: Option<&ConnectionRow>,
    pending_request_exists: bool,
) -> Result<(), AppError> {
    if requester == recipient {
        return Err(AppError::Validation(
            "Cannot send a connection request to yourself".to_string(),
        ));
    }
    match existing.and_then(ConnectionRow::status) {
        Some(ConnectionStatus::Blocked) => {
            return Err(AppError::Forbidden(
                "Connection between these users is blocked".to_string(),
            ))
        }
        Some(ConnectionStatus::Active) => {
            return Err(AppError::Conflict("Users are already connected".to_string()))
        }
        _ => {}
    }
    if pending_request_exists {
        return Err(AppError::Conflict(
            "A pending request already exists between these users".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_strength(strength: f64) -> Result<f64, AppError> {
    if strength.is_finite() && (0.0..=1.0).contains(&strength) {
        Ok(strength)
    } else {
        Err(AppError::Validation(
            "strength must be between 0 and 1".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::fixtures::connection;

    #[test]
    fn test_pending_activates() {
        assert_eq!(
            transition(ConnectionStatus::Pending, None, ConnectionAction::Activate),
            Ok(ConnectionStatus::Active)
        );
    }

    #[test]
    fn test_block_and_unblock_by_blocker() {
        let me = Uuid::new_v4();
        let blocked = transition(ConnectionStatus::Active, None, ConnectionAction::Block);
        assert_eq!(blocked, Ok(ConnectionStatus::Blocked));
        let unblock = ConnectionAction::Unblock { by: me };
        assert_eq!(
            transition(ConnectionStatus::Blocked, Some(me), unblock),
            Ok(ConnectionStatus::Active)
        );
    }

    #[test]
    fn test_only_blocker_can_unblock() {
        let blocker = Uuid::new_v4();
        let other = Uuid::new_v4();
        let err = transition(
            ConnectionStatus::Blocked,
            Some(blocker),
            ConnectionAction::Unblock { by: other },
        )
        .unwrap_err();
        assert_eq!(err, LifecycleError::NotBlocker);
        assert!(matches!(AppError::from(err), AppError::Forbidden(_)));
    }

    #[test]
    fn test_invalid_transitions_conflict() {
        let me = Uuid::new_v4();
        for (status, action) in [
            (ConnectionStatus::Pending, ConnectionAction::Block),
            (ConnectionStatus::Pending, ConnectionAction::Unblock { by: me }),
            (ConnectionStatus::Active, ConnectionAction::Unblock { by: me }),
            (ConnectionStatus::Active, ConnectionAction::Activate),
            (ConnectionStatus::Blocked, ConnectionAction::Block),
        ] {
            let err = transition(status, Some(me), action).unwrap_err();
            assert!(
                matches!(AppError::from(err), AppError::Conflict(_)),
                "{status:?} + {action:?}"
            );
        }
    }

    #[test]
    fn test_accept_activates_new_pair() {
        assert_eq!(activation_for(None), Ok(ConnectionStatus::Active));
    }

    #[test]
    fn test_accept_on_existing_rows() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let active = connection(a, b, 0.5, "active");
        let mut blocked = connection(a, b, 0.5, "blocked");
        blocked.blocked_by = Some(a);

        assert_eq!(
            activation_for(Some(&active)),
            Err(LifecycleError::AlreadyInState("active"))
        );
        let err = activation_for(Some(&blocked)).unwrap_err();
        assert_eq!(err, LifecycleError::Blocked);
        assert!(matches!(AppError::from(err), AppError::Forbidden(_)));
    }

    #[test]
    fn test_request_only_answered_while_pending() {
        assert_eq!(
            request_transition(RequestStatus::Pending, RequestAction::Accept),
            Ok(RequestStatus::Accepted)
        );
        assert_eq!(
            request_transition(RequestStatus::Pending, RequestAction::Cancel),
            Ok(RequestStatus::Cancelled)
        );
        assert_eq!(
            request_transition(RequestStatus::Rejected, RequestAction::Accept),
            Err(LifecycleError::RequestClosed("rejected"))
        );
    }

    #[test]
    fn test_self_request_rejected() {
        let me = Uuid::new_v4();
        assert!(matches!(
            check_can_request(me, me, None, false),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_request_against_existing_edges() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let blocked = connection(a, b, 0.5, "blocked");
        let active = connection(a, b, 0.5, "active");

        assert!(matches!(
            check_can_request(a, b, Some(&blocked), false),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_can_request(a, b, Some(&active), false),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            check_can_request(a, b, None, true),
            Err(AppError::Conflict(_))
        ));
        assert!(check_can_request(a, b, None, false).is_ok());
    }

    #[test]
    fn test_strength_bounds() {
        assert_eq!(validate_strength(0.0).unwrap(), 0.0);
        assert_eq!(validate_strength(1.0).unwrap(), 1.0);
        assert!(validate_strength(1.01).is_err());
        assert!(validate_strength(-0.1).is_err());
        assert!(validate_strength(f64::NAN).is_err());
    }
}
