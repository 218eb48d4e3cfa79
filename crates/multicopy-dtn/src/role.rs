//! Host role classification
//!
//! Community centers are recognised purely by name: any host whose identity
//! starts with `CC` is a hub.

use multicopy_core::HostId;

/// Role a host plays in copy allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Regular roaming host
    Ordinary,
    /// Community-center hub that concentrates copies
    CommunityCenter,
}

impl NodeRole {
    /// Classify a host by its identity
    pub fn of(host: &HostId) -> Self {
        if host.has_community_center_prefix() {
            NodeRole::CommunityCenter
        } else {
            NodeRole::Ordinary
        }
    }

    pub fn is_hub(&self) -> bool {
        matches!(self, NodeRole::CommunityCenter)
    }
}

/// Whether `host` is a community-center hub
pub fn is_hub(host: &HostId) -> bool {
    NodeRole::of(host).is_hub()
}
