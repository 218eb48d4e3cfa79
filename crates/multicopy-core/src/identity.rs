//! Host identities
//!
//! Hosts are named by plain strings, the way contact traces name them.
//! The naming convention carries one piece of routing information: hosts
//! whose identity starts with [`COMMUNITY_CENTER_PREFIX`] are community
//! centers (hubs).

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Reserved identity prefix marking a community-center host
pub const COMMUNITY_CENTER_PREFIX: &str = "CC";

/// Identity of a host in the network
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostId(String);

impl HostId {
    /// Create a host identity
    ///
    /// Identities must be non-empty and must not contain whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::Empty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(IdentityError::InvalidFormat(name));
        }
        Ok(Self(name))
    }

    /// Get the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identity follows the community-center naming convention
    pub fn has_community_center_prefix(&self) -> bool {
        self.0.starts_with(COMMUNITY_CENTER_PREFIX)
    }
}

impl Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HostId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for HostId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HostId> for String {
    fn from(id: HostId) -> Self {
        id.0
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
