//! Per-host capacity ledger
//!
//! Every host carries a running total of the credits it holds across all of
//! its replicas (its capacity, Ccap). The ledger is plain bookkeeping kept in
//! step with the stores through matching add/reduce pairs; it never looks at
//! the stores itself except in [`CapacityLedger::reconcile`].

use std::collections::BTreeMap;

use tracing::{trace, warn};

use multicopy_core::{HostId, MessageStore};

/// Difference between a host's ledger entry and its stored credits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDrift {
    pub host: HostId,
    /// Value recorded in the ledger
    pub recorded: u64,
    /// Sum of credits actually held in the host's store
    pub stored: u64,
}

impl LedgerDrift {
    pub fn is_consistent(&self) -> bool {
        self.recorded == self.stored
    }

    /// Signed difference `recorded - stored`
    pub fn difference(&self) -> i128 {
        i128::from(self.recorded) - i128::from(self.stored)
    }
}

/// Capacity counters for every known host
#[derive(Debug, Clone, Default)]
pub struct CapacityLedger {
    counters: BTreeMap<HostId, u64>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current capacity of `host`, 0 if never recorded
    pub fn capacity(&self, host: &HostId) -> u64 {
        self.counters.get(host).copied().unwrap_or(0)
    }

    /// Overwrite the capacity of `host`
    pub fn set_capacity(&mut self, host: &HostId, value: u64) {
        trace!(host = %host, value, "Set capacity");
        self.counters.insert(host.clone(), value);
    }

    /// Credit `n` copies to `host`
    pub fn add_capacity(&mut self, host: &HostId, n: u32) -> u64 {
        let counter = self.counters.entry(host.clone()).or_insert(0);
        *counter = counter.saturating_add(u64::from(n));
        trace!(host = %host, added = n, capacity = *counter, "Capacity increased");
        *counter
    }

    /// Debit `n` copies from `host`
    ///
    /// Reducing below zero means the ledger has drifted from the stores.
    /// Debug builds treat that as an assertion failure; release builds log
    /// it and clamp the counter to zero.
    pub fn reduce_capacity(&mut self, host: &HostId, n: u32) -> u64 {
        let counter = self.counters.entry(host.clone()).or_insert(0);
        let amount = u64::from(n);

        if amount > *counter {
            warn!(
                host = %host,
                capacity = *counter,
                reduce = n,
                "Capacity underflow, ledger out of sync with store"
            );
        }
        debug_assert!(
            amount <= *counter,
            "capacity underflow on {}: reduce {} from {}",
            host,
            n,
            *counter
        );

        *counter = counter.saturating_sub(amount);
        trace!(host = %host, reduced = n, capacity = *counter, "Capacity reduced");
        *counter
    }

    /// Compare the ledger entry of `host` with the credits in its store
    pub fn reconcile(&self, host: &HostId, store: &dyn MessageStore) -> LedgerDrift {
        LedgerDrift {
            host: host.clone(),
            recorded: self.capacity(host),
            stored: store.total_copies(),
        }
    }

    /// Hosts with a ledger entry
    pub fn hosts(&self) -> impl Iterator<Item = &HostId> {
        self.counters.keys()
    }

    /// Sum of every host's capacity
    pub fn total(&self) -> u64 {
        self.counters.values().sum()
    }
}
