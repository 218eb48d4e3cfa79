//! # Multicopy DTN
//!
//! Community-aware multi-copy routing for delay-tolerant networks.
//!
//! Every message starts with a fixed budget of replication credits
//! ("copies"). Whenever two hosts meet, the router decides how the credits
//! of a replica are split between them. Ordinary hosts split evenly, as in
//! binary spray-and-wait; community-center hosts (identities starting with
//! `CC`) soak up all but one credit so they can redistribute them later.
//! Each host also carries a capacity counter that tracks the credits it
//! holds across all of its messages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use multicopy_dtn::{ArrivalContext, CapacityLedger, ContactRouter, ContactTable,
//!     MulticopyConfig, MulticopyRouter};
//!
//! let router = MulticopyRouter::new(MulticopyConfig { copies: 8 });
//! let mut contacts = ContactTable::new();
//! let mut ledger = CapacityLedger::new();
//!
//! router.on_connection_changed(&mut contacts, &x, &y, true, tick)?;
//! let outcome = router.receive(&mut incoming, &x, ArrivalContext {
//!     local: &y,
//!     local_store: &y_store,
//!     contacts: &mut contacts,
//!     ledger: &mut ledger,
//! })?;
//! ```
//!
//! ## Architecture
//!
//! - [`admission`]: Per-contact single-transfer guard and the copy floor
//! - [`contacts`]: Contact registry shared by both endpoints
//! - [`delivery`]: Delivery detection
//! - [`ledger`]: Per-host capacity counters
//! - [`role`]: Community-center classification
//! - [`router`]: The [`ContactRouter`] capability and [`MulticopyRouter`]
//! - [`split`]: Even and hub-favoring split arithmetic
//! - [`error`]: Router-specific error types

pub mod admission;
pub mod contacts;
pub mod delivery;
pub mod error;
pub mod ledger;
pub mod role;
pub mod router;
pub mod split;

// Re-export main types
pub use admission::{Admission, MIN_SPLITTABLE_COPIES, check_admission};
pub use contacts::ContactTable;
pub use delivery::{Delivery, detect_delivery};
pub use error::{AllocatorError, AllocatorResult, ConfigError};
pub use ledger::{CapacityLedger, LedgerDrift};
pub use role::{NodeRole, is_hub};
pub use router::{ArrivalContext, ContactRouter, MulticopyRouter, ReceiveOutcome, TransferAttempt};
pub use split::{Side, SplitPlan, SplitStrategy, plan_split};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Setting name for the initial copy budget
pub const COPIES_SETTING: &str = "copies";

/// Configuration for the multicopy router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MulticopyConfig {
    /// Replication credits given to every newly created message
    pub copies: u32,
}

impl Default for MulticopyConfig {
    fn default() -> Self {
        Self { copies: 8 }
    }
}

impl MulticopyConfig {
    /// Create a config optimized for sparse networks
    ///
    /// A larger budget lets hubs collect enough copies to keep spraying.
    pub fn sparse_network() -> Self {
        Self { copies: 16 }
    }

    /// Create a config optimized for resource-constrained hosts
    ///
    /// Two copies: a single even split, then direct delivery only.
    pub fn resource_constrained() -> Self {
        Self { copies: 2 }
    }

    /// Read the config from flat `key = value` settings
    ///
    /// `<namespace>.copies` takes precedence over a bare `copies` key;
    /// missing keys keep their defaults and unknown keys are ignored.
    pub fn from_settings(
        settings: &BTreeMap<String, String>,
        namespace: &str,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let scoped = format!("{}.{}", namespace, COPIES_SETTING);

        if let Some((key, value)) = settings
            .get_key_value(&scoped)
            .or_else(|| settings.get_key_value(COPIES_SETTING))
        {
            config.copies = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.clone(),
                    value: value.clone(),
                })?;
        }

        Ok(config)
    }

    /// Validate configuration invariants
    ///
    /// Returns a list of warnings if the configuration has potential issues.
    /// An empty list means the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.copies == 0 {
            warnings.push(ConfigWarning::NoCopies);
        } else if self.copies < MIN_SPLITTABLE_COPIES {
            warnings.push(ConfigWarning::CopiesNeverSplit);
        }

        if self.copies > 1024 {
            warnings.push(ConfigWarning::LargeCopyBudget);
        }

        warnings
    }

    /// Check if the configuration is valid (no warnings)
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validate, turning any warning into an error
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate().first() {
            Some(warning) => Err(ConfigError::Invalid(warning.to_string())),
            None => Ok(self),
        }
    }
}

/// Configuration warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Messages would be created without any copies
    NoCopies,
    /// Messages would be created with a single copy and never be sprayed
    CopiesNeverSplit,
    /// Copy budget is very large (> 1024)
    LargeCopyBudget,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::NoCopies => write!(f, "copies is 0"),
            ConfigWarning::CopiesNeverSplit => {
                write!(f, "copies is below {}, messages are never sprayed", MIN_SPLITTABLE_COPIES)
            }
            ConfigWarning::LargeCopyBudget => write!(f, "copies is very large (> 1024)"),
        }
    }
}
