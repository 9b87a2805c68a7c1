//! Manual document status transitions per family
//!
//! Signed, declined and expired are reached through the e-signature flow
//! and overdue through [`crate::DocumentService::mark_overdue`]; none of them
//! is a manual target.

use shared_types::{DocumentStatus, Family};

use DocumentStatus::*;

/// Statuses a user may move a `family` document to from `from`
pub fn allowed_transitions(family: Family, from: DocumentStatus) -> &'static [DocumentStatus] {
    match (family, from) {
        (Family::Quote, Draft) => &[Sent],
        (Family::Quote, Sent) => &[Accepted, Refused],
        (Family::Quote, Accepted) => &[Refused, Sent],
        (Family::Quote, Refused) => &[Accepted, Sent],

        (Family::Invoice, Draft) => &[Sent, Cancelled],
        (Family::Invoice, Sent) => &[Paid, Cancelled],
        (Family::Invoice, Overdue) => &[Paid, Cancelled],

        (Family::Contract, Draft) => &[Sent, Cancelled],
        (Family::Contract, Sent) => &[Cancelled],

        _ => &[],
    }
}

pub fn can_transition(family: Family, from: DocumentStatus, to: DocumentStatus) -> bool {
    allowed_transitions(family, from).contains(&to)
}
