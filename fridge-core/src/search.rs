//! Recipe search with the multi-ingredient fallback.
//!
//! [`SearchService`] performs one search. [`SearchController`] owns the
//! published [`SearchState`] and makes sure only the newest search writes it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use crate::config::DEFAULT_SEARCH_TIMEOUT_SECS;
use crate::error::SearchError;
use crate::mealdb::MealDb;
use crate::types::{Recipe, ResultSet};

/// True when the query names several ingredients.
pub fn is_multi_ingredient(query: &str) -> bool {
    query.contains(',')
}

fn terms(query: &str) -> impl Iterator<Item = &str> {
    query.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Comma-joined ingredient list with whitespace and empty terms removed.
pub fn normalize_ingredients(query: &str) -> String {
    terms(query).collect::<Vec<_>>().join(",")
}

/// The single term retried when a multi-ingredient filter finds nothing.
pub fn fallback_term(query: &str) -> Option<&str> {
    terms(query).next()
}

fn fallback_warning(query: &str, fallback: &str) -> String {
    format!("No recipes contain all of \"{query}\"; showing results for \"{fallback}\" instead.")
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// The query as searched (multi-ingredient queries normalized).
    pub query: String,
    /// The term whose results are returned; differs from `query` after a fallback.
    pub term: String,
    pub results: Vec<Recipe>,
    pub warning: Option<String>,
}

impl SearchOutcome {
    pub fn used_fallback(&self) -> bool {
        self.term != self.query
    }
}

#[derive(Clone)]
pub struct SearchService {
    db: MealDb,
    deadline: Duration,
}

impl SearchService {
    pub fn new(db: MealDb) -> Self {
        Self {
            db,
            deadline: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
        }
    }

    /// Deadline for a whole search, fallback included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn db(&self) -> &MealDb {
        &self.db
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::Validation);
        }

        match tokio::time::timeout(self.deadline, self.run(query)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(query, deadline_secs = self.deadline.as_secs_f64(), "search: timed out");
                Err(SearchError::Timeout)
            }
        }
    }

    async fn run(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        if !is_multi_ingredient(query) {
            let results = self.db.search_by_name(query).await?;
            return Ok(SearchOutcome {
                query: query.to_string(),
                term: query.to_string(),
                results,
                warning: None,
            });
        }

        let normalized = normalize_ingredients(query);
        let Some(fallback) = fallback_term(query) else {
            return Ok(SearchOutcome {
                query: normalized.clone(),
                term: normalized,
                results: Vec::new(),
                warning: None,
            });
        };

        let filtered = self.db.filter_by_ingredients(&normalized).await?;
        if !filtered.is_empty() {
            return Ok(SearchOutcome {
                query: normalized.clone(),
                term: normalized,
                results: filtered,
                warning: None,
            });
        }

        tracing::info!(query = %normalized, fallback, "search: no filter matches, falling back");
        let results = self.db.search_by_name(fallback).await?;
        Ok(SearchOutcome {
            warning: Some(fallback_warning(query, fallback)),
            query: normalized,
            term: fallback.to_string(),
            results,
        })
    }
}

/// Published search state.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Term of the current or last search.
    pub term: String,
    pub loading: bool,
    pub results: ResultSet,
    pub error: Option<SearchError>,
    pub warning: Option<String>,
    pub has_searched: bool,
}

/// What became of one [`SearchController::submit`] call.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Rejected before any request was made.
    Rejected(SearchError),
    /// A newer search or a reset took over; nothing was written.
    Superseded,
    /// The state this search published.
    Published(SearchState),
}

pub struct SearchController {
    service: SearchService,
    state: watch::Sender<SearchState>,
    generation: AtomicU64,
}

impl SearchController {
    pub fn new(service: SearchService) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            service,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn service(&self) -> &SearchService {
        &self.service
    }

    /// Whether `generation` is still the newest search.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Claim a generation for `query` and publish it as in progress.
    ///
    /// Any earlier search still waiting on the network is superseded from
    /// this point on, even if it has not reached [`Self::finish`] yet.
    pub fn begin(&self, query: &str) -> Result<u64, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::Validation);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            *state = SearchState {
                term: query.to_string(),
                loading: true,
                results: ResultSet::empty(),
                error: None,
                warning: None,
                has_searched: true,
            };
        });
        Ok(generation)
    }

    /// Run the search for a generation claimed by [`Self::begin`].
    ///
    /// `term` may differ from the text passed to `begin`, e.g. after
    /// translation. Nothing is requested or written once the generation
    /// is stale.
    pub async fn finish(&self, generation: u64, term: &str) -> Submission {
        let term = term.trim();
        let claimed = self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            if state.term != term {
                state.term = term.to_string();
            }
            true
        });
        if !claimed {
            tracing::debug!(term, "search: superseded before request");
            return Submission::Superseded;
        }

        let outcome = self.service.search(term).await;

        let mut published = None;
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            state.loading = false;
            match outcome {
                Ok(outcome) => {
                    state.term = outcome.term;
                    state.results = ResultSet::new(outcome.results);
                    state.warning = outcome.warning;
                }
                Err(err) => {
                    tracing::warn!(term, error = %err, "search: failed");
                    state.error = Some(err);
                }
            }
            published = Some(state.clone());
            true
        });

        match published {
            Some(state) => {
                tracing::debug!(
                    term = %state.term,
                    count = state.results.len(),
                    result_set = state.results.id().get(),
                    "search: published"
                );
                Submission::Published(state)
            }
            None => {
                tracing::debug!(term, "search: superseded, discarding");
                Submission::Superseded
            }
        }
    }

    pub async fn submit(&self, query: &str) -> Submission {
        match self.begin(query) {
            Ok(generation) => self.finish(generation, query).await,
            Err(err) => Submission::Rejected(err),
        }
    }

    /// Clear results and abandon any in-flight search.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| *state = SearchState::default());
    }

    /// Clearing the input box resets the search.
    pub fn on_input_change(&self, text: &str) {
        if text.trim().is_empty() {
            self.reset();
        }
    }
}
