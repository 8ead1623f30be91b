// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Debounced institution search.
//!
//! Each keystroke bumps a generation counter and cancels the pending timer
//! of the previous query. A query that survives the debounce window is sent
//! to the backend, and its results are returned only if no newer query was
//! issued while the request was in flight.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{backend::BackendClient, models::College};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Shorter queries are not sent to the backend.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Query below the minimum length; any shown results should be cleared.
    TooShort,
    /// A newer query replaced this one; its results must not be shown.
    Superseded,
    Results {
        generation: u64,
        colleges: Vec<College>,
    },
}

/// Per-user search state.
pub struct InstitutionSearch {
    generation: AtomicU64,
    pending: Mutex<Option<CancellationToken>>,
    debounce: Duration,
}

impl Default for InstitutionSearch {
    fn default() -> Self {
        Self::with_debounce(SEARCH_DEBOUNCE)
    }
}

impl InstitutionSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
            debounce,
        }
    }

    /// Generation of the most recent query.
    pub fn latest(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Run one debounced query.
    ///
    /// Backend failures yield empty results and are only logged.
    pub async fn search(&self, backend: &BackendClient, query: &str) -> SearchOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let timer = CancellationToken::new();
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(timer.clone()) {
                previous.cancel();
            }
        }

        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return SearchOutcome::TooShort;
        }

        tokio::select! {
            _ = timer.cancelled() => {
                debug!(generation, "Institution search debounced away");
                return SearchOutcome::Superseded;
            }
            _ = tokio::time::sleep(self.debounce) => {}
        }

        let colleges = match backend.search_colleges(query).await {
            Ok(colleges) => colleges,
            Err(e) => {
                warn!(error = %e, "Institution search failed");
                Vec::new()
            }
        };

        if self.latest() != generation {
            debug!(generation, latest = self.latest(), "Dropping stale search results");
            return SearchOutcome::Superseded;
        }

        SearchOutcome::Results {
            generation,
            colleges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_backend, unreachable_backend};
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    fn college_router() -> Router {
        Router::new().route(
            "/api/colleges/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let q = params.get("q").cloned().unwrap_or_default();
                // The first query answers slowly so a newer one overtakes it
                if q == "iit" {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                Json(serde_json::json!([{ "id": 1, "name": q, "slug": q }]))
            }),
        )
    }

    #[tokio::test]
    async fn short_queries_never_reach_backend() {
        let client = BackendClient::new(unreachable_backend()).unwrap();
        let search = InstitutionSearch::with_debounce(Duration::ZERO);
        assert_eq!(search.search(&client, " i ").await, SearchOutcome::TooShort);
        assert_eq!(search.latest(), 1);
    }

    #[tokio::test]
    async fn newer_query_cancels_pending_timer() {
        let client = BackendClient::new(spawn_backend(college_router()).await).unwrap();
        let search = InstitutionSearch::with_debounce(Duration::from_millis(100));

        let (first, second) = tokio::join!(search.search(&client, "ii"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            search.search(&client, "iith").await
        });

        assert_eq!(first, SearchOutcome::Superseded);
        match second {
            SearchOutcome::Results {
                generation,
                colleges,
            } => {
                assert_eq!(generation, 2);
                assert_eq!(colleges[0].name, "iith");
            }
            other => panic!("expected results, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let client = BackendClient::new(spawn_backend(college_router()).await).unwrap();
        let search = InstitutionSearch::with_debounce(Duration::ZERO);

        let (slow, fast) = tokio::join!(search.search(&client, "iit"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            search.search(&client, "nit").await
        });

        assert_eq!(slow, SearchOutcome::Superseded);
        assert!(matches!(fast, SearchOutcome::Results { generation: 2, .. }));
    }

    #[tokio::test]
    async fn backend_failure_yields_empty_results() {
        let client = BackendClient::new(unreachable_backend()).unwrap();
        let search = InstitutionSearch::with_debounce(Duration::ZERO);

        assert_eq!(
            search.search(&client, "iit").await,
            SearchOutcome::Results {
                generation: 1,
                colleges: Vec::new()
            }
        );
    }
}
