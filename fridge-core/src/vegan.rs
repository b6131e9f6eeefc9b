//! Vegan classification of the current result set.
//!
//! [`VeganFilter`] keys each classification pass on the pair
//! `(result set id, mode)`. Observing the same key again is a no-op; a new key
//! bumps the generation, and any response carrying an older generation is
//! discarded. A failed pass publishes an empty output unless the keyword
//! heuristic was explicitly chosen.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::FetchError;
use crate::gateway::{GatewayClient, GatewayError};
use crate::search::SearchState;
use crate::types::{Recipe, ResultSet, ResultSetId};

/// Words that disqualify a recipe under the keyword heuristic.
const MEAT_WORDS: &[&str] = &[
    "pork", "beef", "chicken", "lamb", "meat", "fish", "seafood", "ham", "bacon",
];

/// Shared vegan-mode switch.
///
/// Cloning yields another handle to the same switch.
#[derive(Clone, Debug)]
pub struct VeganMode {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for VeganMode {
    fn default() -> Self {
        Self::new(false)
    }
}

impl VeganMode {
    pub fn new(enabled: bool) -> Self {
        let (tx, _) = watch::channel(enabled);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_enabled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set(&self, enabled: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != enabled;
            *current = enabled;
            changed
        });
    }

    /// Flip the switch and return the new value.
    pub fn toggle(&self) -> bool {
        let mut now = false;
        self.tx.send_modify(|current| {
            *current = !*current;
            now = *current;
        });
        now
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// What to show when the classifier cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassificationFallback {
    /// Show nothing.
    #[default]
    FailClosed,
    /// Drop recipes whose title or category names a meat.
    KeywordHeuristic,
}

impl FromStr for ClassificationFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-closed" | "fail_closed" | "failclosed" => Ok(Self::FailClosed),
            "heuristic" | "keyword-heuristic" | "keyword_heuristic" => Ok(Self::KeywordHeuristic),
            other => Err(format!("unknown classification fallback: {other}")),
        }
    }
}

/// Keyword check used by [`ClassificationFallback::KeywordHeuristic`].
pub fn heuristic_is_safe(recipe: &Recipe) -> bool {
    let title = recipe.title.to_lowercase();
    let category = recipe.category.as_deref().unwrap_or_default().to_lowercase();
    !MEAT_WORDS
        .iter()
        .any(|word| title.contains(word) || category.contains(word))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("Classifier is rate limited or overloaded (HTTP {0})")]
    Overloaded(u16),

    #[error("Classifier returned HTTP {0}")]
    Status(u16),

    #[error("Classifier unreachable: {0}")]
    Transport(FetchError),

    #[error("Malformed classifier response: {0}")]
    Malformed(String),
}

impl From<GatewayError> for ClassificationError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Fetch(FetchError::Status { status, .. })
                if status == 429 || status == 503 =>
            {
                ClassificationError::Overloaded(status)
            }
            GatewayError::Fetch(FetchError::Status { status, .. }) => {
                ClassificationError::Status(status)
            }
            GatewayError::Fetch(FetchError::InvalidBody(msg)) | GatewayError::Malformed(msg) => {
                ClassificationError::Malformed(msg)
            }
            GatewayError::Fetch(other) => ClassificationError::Transport(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterStatus {
    /// Mode off or nothing to classify.
    #[default]
    Idle,
    Analyzing,
    Resolved,
    /// Classifier failed; output is empty.
    Unavailable,
    /// Classifier failed; output comes from the keyword heuristic.
    Degraded,
}

/// Published filter output.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub status: FilterStatus,
    /// Result set this output was derived from.
    pub source: Option<ResultSetId>,
    /// Safe recipes, in result-set order.
    pub recipes: Vec<Recipe>,
}

impl FilterState {
    fn new(status: FilterStatus, source: ResultSetId, recipes: Vec<Recipe>) -> Self {
        Self {
            status,
            source: Some(source),
            recipes,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status != FilterStatus::Analyzing
    }
}

/// What [`VeganFilter::reconcile`] did.
#[derive(Debug)]
pub enum Reconcile {
    /// Same key as the current pass.
    Unchanged,
    /// Published an idle state without a request.
    Idle,
    /// Reused the classification already held for this result set.
    Reused,
    /// A classification request is in flight.
    Started(JoinHandle<()>),
}

#[derive(Default)]
struct Pass {
    key: Option<(ResultSetId, bool)>,
    generation: u64,
    /// Safe ids from the last successful pass.
    resolved: Option<(ResultSetId, Arc<HashSet<String>>)>,
}

pub struct VeganFilter {
    gateway: GatewayClient,
    fallback: ClassificationFallback,
    pass: Mutex<Pass>,
    state: watch::Sender<FilterState>,
}

fn keep_safe(results: &ResultSet, safe_ids: &HashSet<String>) -> Vec<Recipe> {
    results
        .recipes()
        .iter()
        .filter(|recipe| safe_ids.contains(&recipe.id))
        .cloned()
        .collect()
}

impl VeganFilter {
    pub fn new(gateway: GatewayClient, fallback: ClassificationFallback) -> Self {
        let (state, _) = watch::channel(FilterState::default());
        Self {
            gateway,
            fallback,
            pass: Mutex::new(Pass::default()),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FilterState {
        self.state.borrow().clone()
    }

    /// Wait until the output for `source` is no longer being analyzed.
    pub async fn settled(&self, source: ResultSetId) -> FilterState {
        let mut rx = self.state.subscribe();
        let result = rx
            .wait_for(|state| state.source == Some(source) && state.is_settled())
            .await
            .map(|state| state.clone());
        result.unwrap_or_else(|_| self.state())
    }

    /// Bring the output in line with `results` and `enabled`.
    pub fn reconcile(self: &Arc<Self>, results: &ResultSet, enabled: bool) -> Reconcile {
        let source = results.id();
        let (generation, reuse) = {
            let mut pass = self.pass.lock().unwrap_or_else(PoisonError::into_inner);
            if pass.key == Some((source, enabled)) {
                return Reconcile::Unchanged;
            }
            pass.key = Some((source, enabled));
            pass.generation += 1;
            let reuse = pass
                .resolved
                .as_ref()
                .filter(|(id, _)| *id == source)
                .map(|(_, safe)| Arc::clone(safe));
            (pass.generation, reuse)
        };

        if !enabled || results.is_empty() {
            self.publish(generation, FilterState::new(FilterStatus::Idle, source, Vec::new()), None);
            return Reconcile::Idle;
        }

        if let Some(safe) = reuse {
            tracing::debug!(result_set = source.get(), "vegan: reusing classification");
            let recipes = keep_safe(results, &safe);
            self.publish(generation, FilterState::new(FilterStatus::Resolved, source, recipes), None);
            return Reconcile::Reused;
        }

        self.publish(
            generation,
            FilterState::new(FilterStatus::Analyzing, source, Vec::new()),
            None,
        );

        let this = Arc::clone(self);
        let results = results.clone();
        Reconcile::Started(tokio::spawn(async move {
            this.classify(generation, results).await;
        }))
    }

    async fn classify(&self, generation: u64, results: ResultSet) {
        let source = results.id();
        tracing::info!(result_set = source.get(), count = results.len(), "vegan: classifying");

        let outcome = self
            .gateway
            .classify_vegan(results.recipes())
            .await
            .map_err(ClassificationError::from);

        let (state, safe) = match outcome {
            Ok(safe_ids) => {
                let recipes = keep_safe(&results, &safe_ids);
                tracing::info!(
                    result_set = source.get(),
                    safe = recipes.len(),
                    total = results.len(),
                    "vegan: classified"
                );
                (
                    FilterState::new(FilterStatus::Resolved, source, recipes),
                    Some(Arc::new(safe_ids)),
                )
            }
            Err(err) => {
                tracing::warn!(result_set = source.get(), error = %err, "vegan: classification unavailable");
                let state = match self.fallback {
                    ClassificationFallback::FailClosed => {
                        FilterState::new(FilterStatus::Unavailable, source, Vec::new())
                    }
                    ClassificationFallback::KeywordHeuristic => {
                        let recipes = results
                            .recipes()
                            .iter()
                            .filter(|recipe| heuristic_is_safe(recipe))
                            .cloned()
                            .collect();
                        FilterState::new(FilterStatus::Degraded, source, recipes)
                    }
                };
                (state, None)
            }
        };

        if !self.publish(generation, state, safe) {
            tracing::debug!(result_set = source.get(), "vegan: discarding stale classification");
        }
    }

    /// Write `state` if `generation` is still current.
    fn publish(
        &self,
        generation: u64,
        state: FilterState,
        safe: Option<Arc<HashSet<String>>>,
    ) -> bool {
        self.state.send_if_modified(|current| {
            let mut pass = self.pass.lock().unwrap_or_else(PoisonError::into_inner);
            if pass.generation != generation {
                return false;
            }
            if let (Some(safe), Some(source)) = (safe, state.source) {
                pass.resolved = Some((source, safe));
            }
            *current = state;
            true
        })
    }

    /// Reconcile on every change of the search results or the mode.
    pub fn spawn_driver(
        self: &Arc<Self>,
        mut search: watch::Receiver<SearchState>,
        mode: VeganMode,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let mut enabled = mode.subscribe();
        tokio::spawn(async move {
            loop {
                let results = search.borrow_and_update().results.clone();
                let on = *enabled.borrow_and_update();
                this.reconcile(&results, on);

                tokio::select! {
                    changed = search.changed() => if changed.is_err() { break },
                    changed = enabled.changed() => if changed.is_err() { break },
                }
            }
            tracing::debug!("vegan: driver stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockClient, MockResponse};
    use crate::types::fixtures;
    use serde_json::json;
    use std::time::Duration;

    const URL: &str = "http://gw.test/api/classify-vegan";

    fn filter(mock: Arc<MockClient>, fallback: ClassificationFallback) -> Arc<VeganFilter> {
        Arc::new(VeganFilter::new(
            GatewayClient::new(mock, "http://gw.test/api"),
            fallback,
        ))
    }

    fn set() -> ResultSet {
        ResultSet::new(vec![
            fixtures::meal("1", "Tomato Soup", "Vegetarian"),
            fixtures::meal("2", "Beef Stew", "Beef"),
            fixtures::meal("3", "Apple Cake", "Dessert"),
        ])
    }

    async fn finish(reconcile: Reconcile) {
        match reconcile {
            Reconcile::Started(handle) => handle.await.unwrap(),
            other => panic!("expected a request, got {other:?}"),
        }
    }

    fn ids(state: &FilterState) -> Vec<&str> {
        state.recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_disabled_mode_is_idle_without_network() {
        let mock = Arc::new(MockClient::new());
        let filter = filter(mock.clone(), ClassificationFallback::FailClosed);
        assert!(matches!(filter.reconcile(&set(), false), Reconcile::Idle));
        assert!(matches!(filter.reconcile(&ResultSet::empty(), true), Reconcile::Idle));
        assert_eq!(filter.state().status, FilterStatus::Idle);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_resolved_keeps_result_order() {
        let mock = Arc::new(MockClient::new().with_json(URL, json!({"safeIds": [3, "1"]})));
        let filter = filter(mock, ClassificationFallback::FailClosed);
        let results = set();
        finish(filter.reconcile(&results, true)).await;

        let state = filter.state();
        assert_eq!(state.status, FilterStatus::Resolved);
        assert_eq!(state.source, Some(results.id()));
        assert_eq!(ids(&state), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_same_key_does_not_retrigger() {
        let mock = Arc::new(MockClient::new().with_json(URL, json!({"safeIds": ["1"]})));
        let filter = filter(mock.clone(), ClassificationFallback::FailClosed);
        let results = set();
        let first = filter.reconcile(&results, true);
        assert!(matches!(filter.reconcile(&results, true), Reconcile::Unchanged));
        finish(first).await;
        assert!(matches!(filter.reconcile(&results, true), Reconcile::Unchanged));
        assert_eq!(mock.request_count(URL), 1);
    }

    #[tokio::test]
    async fn test_toggle_after_resolution_reuses_classification() {
        let mock = Arc::new(MockClient::new().with_json(URL, json!({"safeIds": ["1"]})));
        let filter = filter(mock.clone(), ClassificationFallback::FailClosed);
        let results = set();
        finish(filter.reconcile(&results, true)).await;

        assert!(matches!(filter.reconcile(&results, false), Reconcile::Idle));
        assert!(matches!(filter.reconcile(&results, true), Reconcile::Reused));
        assert_eq!(ids(&filter.state()), vec!["1"]);
        assert_eq!(mock.request_count(URL), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_during_flight_issues_one_new_request() {
        let mock = Arc::new(
            MockClient::new()
                .with_response(
                    URL,
                    MockResponse::delayed(Duration::from_secs(3), MockResponse::json(json!({"safeIds": ["2"]}))),
                )
                .with_response(
                    URL,
                    MockResponse::delayed(Duration::from_secs(1), MockResponse::json(json!({"safeIds": ["1"]}))),
                ),
        );
        let filter = filter(mock.clone(), ClassificationFallback::FailClosed);
        let results = set();

        let first = filter.reconcile(&results, true);
        tokio::task::yield_now().await;
        filter.reconcile(&results, false);
        let second = filter.reconcile(&results, true);

        finish(second).await;
        finish(first).await;
        assert_eq!(mock.request_count(URL), 2);
        assert_eq!(ids(&filter.state()), vec!["1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_for_replaced_set_is_discarded() {
        let mock = Arc::new(
            MockClient::new()
                .with_response(
                    URL,
                    MockResponse::delayed(Duration::from_secs(5), MockResponse::json(json!({"safeIds": ["1", "2", "3"]}))),
                )
                .with_response(URL, MockResponse::json(json!({"safeIds": ["9"]}))),
        );
        let filter = filter(mock, ClassificationFallback::FailClosed);
        let old = set();
        let new = ResultSet::new(vec![fixtures::meal("9", "Dal", "Vegetarian")]);

        let stale = filter.reconcile(&old, true);
        tokio::task::yield_now().await;
        finish(filter.reconcile(&new, true)).await;
        let before = filter.state();

        finish(stale).await;
        let after = filter.state();
        assert_eq!(after.source, Some(new.id()));
        assert_eq!(ids(&after), vec!["9"]);
        assert_eq!(ids(&before), ids(&after));
    }

    #[tokio::test]
    async fn test_failure_fails_closed() {
        for response in [
            MockResponse::Status(429, r#"{"error":"quota"}"#.into()),
            MockResponse::Status(503, String::new()),
            MockResponse::Body("not json".into()),
            MockResponse::Error("reset".into()),
        ] {
            let mock = Arc::new(MockClient::new().with_response(URL, response));
            let filter = filter(mock, ClassificationFallback::FailClosed);
            finish(filter.reconcile(&set(), true)).await;
            let state = filter.state();
            assert_eq!(state.status, FilterStatus::Unavailable);
            assert!(state.recipes.is_empty());
        }
    }

    #[tokio::test]
    async fn test_failure_is_not_reused() {
        let mock = Arc::new(
            MockClient::new()
                .with_response(URL, MockResponse::Status(503, String::new()))
                .with_json(URL, json!({"safeIds": ["3"]})),
        );
        let filter = filter(mock.clone(), ClassificationFallback::FailClosed);
        let results = set();
        finish(filter.reconcile(&results, true)).await;
        filter.reconcile(&results, false);
        finish(filter.reconcile(&results, true)).await;
        assert_eq!(ids(&filter.state()), vec!["3"]);
        assert_eq!(mock.request_count(URL), 2);
    }

    #[tokio::test]
    async fn test_heuristic_is_opt_in() {
        let mock = Arc::new(MockClient::new().with_error(URL, "down"));
        let filter = filter(mock, ClassificationFallback::KeywordHeuristic);
        finish(filter.reconcile(&set(), true)).await;
        let state = filter.state();
        assert_eq!(state.status, FilterStatus::Degraded);
        assert_eq!(ids(&state), vec!["1", "3"]);
    }

    #[test]
    fn test_fallback_from_str() {
        assert_eq!("fail-closed".parse(), Ok(ClassificationFallback::FailClosed));
        assert_eq!("Heuristic".parse(), Ok(ClassificationFallback::KeywordHeuristic));
        assert!("sometimes".parse::<ClassificationFallback>().is_err());
    }

    #[test]
    fn test_mode_toggle() {
        let mode = VeganMode::default();
        let other = mode.clone();
        assert!(other.toggle());
        assert!(mode.is_enabled());
        mode.set(false);
        assert!(!other.is_enabled());
    }

    #[tokio::test]
    async fn test_driver_follows_search_and_mode() {
        let mock = Arc::new(MockClient::new().with_json(URL, json!({"safeIds": ["1"]})));
        let filter = filter(mock.clone(), ClassificationFallback::FailClosed);
        let (search_tx, search_rx) = watch::channel(SearchState::default());
        let mode = VeganMode::new(false);
        let driver = filter.spawn_driver(search_rx, mode.clone());

        let results = set();
        search_tx.send_modify(|s| s.results = results.clone());
        let state = filter.settled(results.id()).await;
        assert_eq!(state.status, FilterStatus::Idle);
        assert!(mock.requests().is_empty());

        mode.set(true);
        let state = filter
            .subscribe()
            .wait_for(|s| s.status == FilterStatus::Resolved)
            .await
            .unwrap()
            .clone();
        assert_eq!(ids(&state), vec!["1"]);
        assert_eq!(mock.request_count(URL), 1);

        drop(search_tx);
        driver.await.unwrap();
    }
}
