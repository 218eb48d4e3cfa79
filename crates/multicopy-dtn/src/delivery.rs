//! Delivery detection

use tracing::info;

use multicopy_core::{HostId, Message, MessageId};

/// A replica reaching one of its final recipients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: MessageId,
    /// Recipient that now holds the replica
    pub to: HostId,
    /// Host on the other end of the contact
    pub via: HostId,
}

/// Report a delivery if `local` is one of the message's recipients
///
/// Purely observational; routing state is not touched.
pub fn detect_delivery(message: &Message, local: &HostId, source: &HostId) -> Option<Delivery> {
    if !message.is_destination(local) {
        return None;
    }

    info!(
        message_id = %message.id,
        to = %local,
        via = %source,
        copies = message.copies(),
        "Message delivered"
    );

    Some(Delivery {
        message_id: message.id.clone(),
        to: local.clone(),
        via: source.clone(),
    })
}
