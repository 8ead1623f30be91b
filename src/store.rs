// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store for in-progress flows.
//!
//! Everything here is scratch state keyed by session subject. It is lost on
//! restart; a user simply resumes onboarding from their profile or starts a
//! new listing draft. Entries nobody has touched for [`FLOW_IDLE_TIMEOUT`]
//! are dropped, and each kind of flow tracks at most [`FLOW_CAPACITY`]
//! subjects.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    fetchers::TtlCache,
    flows::{InstitutionSearch, ListingDraft, OnboardingFlow},
};

pub const FLOW_CAPACITY: usize = 1024;

pub const FLOW_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How often [`sweep_idle`] purges expired flows.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One subject's flow, `None` when nothing is in progress.
///
/// A transition holds the lock from load to write-back, so concurrent
/// requests for the same subject apply one after the other.
pub type FlowSlot<T> = Arc<Mutex<Option<T>>>;

pub struct FlowStore {
    onboarding: TtlCache<String, FlowSlot<OnboardingFlow>>,
    drafts: TtlCache<String, FlowSlot<ListingDraft>>,
    searches: TtlCache<String, Arc<InstitutionSearch>>,
}

impl Default for FlowStore {
    fn default() -> Self {
        Self::with_limits(FLOW_CAPACITY, FLOW_IDLE_TIMEOUT)
    }
}

impl FlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(capacity: usize, idle: Duration) -> Self {
        Self {
            onboarding: TtlCache::new(capacity, idle),
            drafts: TtlCache::new(capacity, idle),
            searches: TtlCache::new(capacity, idle),
        }
    }

    pub fn onboarding(&self, subject: &str) -> FlowSlot<OnboardingFlow> {
        self.onboarding
            .touch_or_insert_with(subject.to_string(), FlowSlot::default)
    }

    pub fn draft(&self, subject: &str) -> FlowSlot<ListingDraft> {
        self.drafts
            .touch_or_insert_with(subject.to_string(), FlowSlot::default)
    }

    /// The subject's search state, created on first use.
    pub fn search(&self, subject: &str) -> Arc<InstitutionSearch> {
        self.searches
            .touch_or_insert_with(subject.to_string(), || Arc::new(InstitutionSearch::new()))
    }

    /// Drop a finished onboarding along with its search state.
    pub fn finish_onboarding(&self, subject: &str) {
        let subject = subject.to_string();
        self.onboarding.invalidate(&subject);
        self.searches.invalidate(&subject);
    }

    /// Drop every flow belonging to `subject` (logout).
    pub fn forget(&self, subject: &str) {
        let subject = subject.to_string();
        self.onboarding.invalidate(&subject);
        self.drafts.invalidate(&subject);
        self.searches.invalidate(&subject);
    }

    /// Drop flows idle for longer than the timeout. Returns how many went.
    pub fn purge_idle(&self) -> usize {
        self.onboarding.purge_expired() + self.drafts.purge_expired() + self.searches.purge_expired()
    }
}

/// Purge idle flows every `every` until the task is dropped.
pub async fn sweep_idle(store: Arc<FlowStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let dropped = store.purge_idle();
        if dropped > 0 {
            debug!(dropped, "Dropped idle flows");
        }
    }
}
