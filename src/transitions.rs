//! Order lifecycle rules.
//!
//! ```text
//! CREATED   -> CONFIRMED | CANCELLED
//! CONFIRMED -> SHIPPED   | CANCELLED
//! SHIPPED   -> DELIVERED | CANCELLED
//! DELIVERED -> (terminal)
//! CANCELLED -> (terminal)
//! ```
//!
//! Status updates and explicit cancellation both decide through [`validate`].

use crate::models::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Allowed,
    Rejected(String),
}

impl Transition {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Transition::Allowed)
    }
}

pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled)
}

/// Statuses reachable in one step from `from`.
pub fn successors(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;

    match from {
        Created => &[Confirmed, Cancelled],
        Confirmed => &[Shipped, Cancelled],
        Shipped => &[Delivered, Cancelled],
        Delivered | Cancelled => &[],
    }
}

pub fn validate(from: OrderStatus, to: OrderStatus) -> Transition {
    if successors(from).contains(&to) {
        return Transition::Allowed;
    }

    let reason = if from == to {
        format!("Invalid state transition from {from} to {to}: order already has status {to}")
    } else if is_terminal(from) {
        format!("Invalid state transition from {from} to {to}: {from} is a terminal state")
    } else {
        format!("Invalid state transition from {from} to {to}")
    };
    Transition::Rejected(reason)
}

pub fn can_cancel(from: OrderStatus) -> bool {
    validate(from, OrderStatus::Cancelled).is_allowed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const EDGES: [(OrderStatus, OrderStatus); 6] = [
        (Created, Confirmed),
        (Created, Cancelled),
        (Confirmed, Shipped),
        (Confirmed, Cancelled),
        (Shipped, Delivered),
        (Shipped, Cancelled),
    ];

    #[test]
    fn every_pair_agrees_with_the_graph() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = EDGES.contains(&(from, to));
                assert_eq!(
                    validate(from, to).is_allowed(),
                    expected,
                    "{from} -> {to}"
                );
                assert_eq!(validate(from, to), validate(from, to));
            }
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for to in OrderStatus::ALL {
            assert!(!validate(Delivered, to).is_allowed());
            assert!(!validate(Cancelled, to).is_allowed());
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in OrderStatus::ALL {
            assert!(!validate(status, status).is_allowed());
        }
    }

    #[test]
    fn cancel_parity() {
        for status in OrderStatus::ALL {
            assert_eq!(
                can_cancel(status),
                validate(status, Cancelled) == Transition::Allowed
            );
        }
        assert!(can_cancel(Shipped));
        assert!(!can_cancel(Delivered));
    }

    #[test]
    fn rejection_names_both_states() {
        let Transition::Rejected(reason) = validate(Created, Shipped) else {
            panic!("CREATED -> SHIPPED must be rejected");
        };
        assert!(reason.contains("CREATED"));
        assert!(reason.contains("SHIPPED"));
    }
}
