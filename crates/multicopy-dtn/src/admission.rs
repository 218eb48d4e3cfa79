//! Contact admission guard
//!
//! Decides whether an arriving replica may be split at all. A contact
//! instance services at most one transfer, and a replica needs at least
//! [`MIN_SPLITTABLE_COPIES`] credits to be divided between two holders.

use multicopy_core::{HostId, Message, RejectReason};

use crate::contacts::ContactTable;
use crate::error::{AllocatorError, AllocatorResult};

/// Fewest credits a replica must hold to be split across a contact
pub const MIN_SPLITTABLE_COPIES: u32 = 2;

/// Verdict of the admission guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The split may run
    Admit,
    /// The transfer is turned away without touching any state
    Reject(RejectReason),
}

/// Check whether `message`, arriving at `local` from `source`, may be split
///
/// Fails when no live contact links the two hosts: the caller tried to
/// transfer over a link that does not exist.
pub fn check_admission(
    contacts: &ContactTable,
    local: &HostId,
    source: &HostId,
    message: &Message,
) -> AllocatorResult<Admission> {
    let contact = contacts
        .get(local, source)
        .ok_or_else(|| AllocatorError::NoContact {
            local: local.to_string(),
            peer: source.to_string(),
        })?;

    if !contact.is_up() {
        return Err(AllocatorError::ContactDown {
            local: local.to_string(),
            peer: source.to_string(),
        });
    }

    if contact.is_serviced() {
        return Ok(Admission::Reject(RejectReason::Stale));
    }

    if message.copies() < MIN_SPLITTABLE_COPIES {
        return Ok(Admission::Reject(RejectReason::InsufficientCopies));
    }

    Ok(Admission::Admit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicopy_core::MessageId;

    fn host(name: &str) -> HostId {
        HostId::new(name).unwrap()
    }

    fn message(copies: u32) -> Message {
        Message::new(MessageId::new("M1").unwrap(), host("x"), [host("z")], 1, 0)
            .unwrap()
            .with_copies(copies)
    }

    #[test]
    fn test_missing_contact_is_violation() {
        let contacts = ContactTable::new();
        let result = check_admission(&contacts, &host("y"), &host("x"), &message(4));
        assert!(matches!(result, Err(AllocatorError::NoContact { .. })));
    }

    #[test]
    fn test_down_contact_is_violation() {
        let mut contacts = ContactTable::new();
        contacts.connection_changed(&host("x"), &host("y"), true, 0).unwrap();
        contacts.connection_changed(&host("x"), &host("y"), false, 1).unwrap();

        let result = check_admission(&contacts, &host("y"), &host("x"), &message(4));
        assert!(matches!(result, Err(AllocatorError::ContactDown { .. })));
    }

    #[test]
    fn test_admit_fresh_contact() {
        let mut contacts = ContactTable::new();
        contacts.connection_changed(&host("x"), &host("y"), true, 0).unwrap();

        let verdict = check_admission(&contacts, &host("y"), &host("x"), &message(2)).unwrap();
        assert_eq!(verdict, Admission::Admit);
    }

    #[test]
    fn test_reject_single_copy() {
        let mut contacts = ContactTable::new();
        contacts.connection_changed(&host("x"), &host("y"), true, 0).unwrap();

        let verdict = check_admission(&contacts, &host("y"), &host("x"), &message(1)).unwrap();
        assert_eq!(verdict, Admission::Reject(RejectReason::InsufficientCopies));
    }

    #[test]
    fn test_stale_wins_over_copy_count() {
        let mut contacts = ContactTable::new();
        contacts.connection_changed(&host("x"), &host("y"), true, 0).unwrap();
        contacts.mark_serviced(&host("x"), &host("y")).unwrap();

        for copies in [0, 1, 2, 50] {
            let verdict =
                check_admission(&contacts, &host("y"), &host("x"), &message(copies)).unwrap();
            assert_eq!(verdict, Admission::Reject(RejectReason::Stale));
        }
    }
}
