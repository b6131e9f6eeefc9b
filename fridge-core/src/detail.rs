//! Selection and detail lifecycle for the open recipe.
//!
//! At most one recipe is open. Selecting clears the previous detail before
//! the lookup starts, and a lookup or enrichment that finishes after the
//! selection moved on is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::enrich::{EnrichedRecipe, Enricher, EnrichmentError};
use crate::error::FetchError;
use crate::mealdb::MealDb;
use crate::shopping::{ShoppingList, ShoppingListOp};
use crate::store::{KeyValueStore, StoreError};
use crate::types::Recipe;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailFetchError {
    #[error("Could not load recipe: {0}")]
    Fetch(#[from] FetchError),

    #[error("Recipe {0} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailStatus {
    #[default]
    Closed,
    Loading,
    Loaded,
}

/// Enrichment state of the open recipe.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentView {
    pub loading: bool,
    pub result: Option<Arc<EnrichedRecipe>>,
    /// Shown inline; the original recipe stays visible.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub selected: Option<String>,
    pub status: DetailStatus,
    pub recipe: Option<Recipe>,
    pub shopping_list: Option<ShoppingList>,
    pub enrichment: EnrichmentView,
    /// Why the last selection closed without loading.
    pub last_error: Option<String>,
}

/// What became of one [`SelectionLifecycle::select`] call.
#[derive(Debug, Clone)]
pub enum SelectOutcome {
    Loaded(DetailState),
    Failed(DetailFetchError),
    /// The selection changed before the lookup finished.
    Superseded,
}

/// Clears the enrichment loading flag if `enrich_selected` is dropped
/// before the enrichment call returns.
struct PendingEnrichment<'a> {
    lifecycle: &'a SelectionLifecycle,
    generation: u64,
}

impl Drop for PendingEnrichment<'_> {
    fn drop(&mut self) {
        let lifecycle = self.lifecycle;
        lifecycle.state.send_if_modified(|state| {
            if !lifecycle.is_current(self.generation) || !state.enrichment.loading {
                return false;
            }
            tracing::debug!("detail: enrichment abandoned");
            state.enrichment.loading = false;
            true
        });
    }
}

pub struct SelectionLifecycle {
    db: MealDb,
    enricher: Arc<Enricher>,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<DetailState>,
    generation: AtomicU64,
}

impl SelectionLifecycle {
    pub fn new(db: MealDb, enricher: Arc<Enricher>, store: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        Self {
            db,
            enricher,
            store,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn enricher(&self) -> &Arc<Enricher> {
        &self.enricher
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    pub async fn select(&self, id: &str) -> SelectOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            *state = DetailState {
                selected: Some(id.to_string()),
                status: DetailStatus::Loading,
                ..DetailState::default()
            };
        });

        let lookup = match self.db.lookup(id).await {
            Ok(Some(recipe)) => Ok(recipe),
            Ok(None) => Err(DetailFetchError::NotFound(id.to_string())),
            Err(e) => Err(DetailFetchError::from(e)),
        };
        if !self.is_current(generation) {
            tracing::debug!(recipe_id = id, "detail: selection changed, discarding lookup");
            return SelectOutcome::Superseded;
        }

        let loaded = lookup.map(|recipe| {
            let shopping_list = ShoppingList::open(self.store.as_ref(), &recipe);
            let enrichment = EnrichmentView {
                result: self.enricher.cached(&recipe.id),
                ..EnrichmentView::default()
            };
            (recipe, shopping_list, enrichment)
        });

        let mut outcome = SelectOutcome::Superseded;
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            match loaded {
                Ok((recipe, shopping_list, enrichment)) => {
                    tracing::info!(recipe_id = id, title = %recipe.title, "detail: loaded");
                    state.status = DetailStatus::Loaded;
                    state.recipe = Some(recipe);
                    state.shopping_list = Some(shopping_list);
                    state.enrichment = enrichment;
                    outcome = SelectOutcome::Loaded(state.clone());
                }
                Err(err) => {
                    tracing::warn!(recipe_id = id, error = %err, "detail: lookup failed");
                    *state = DetailState {
                        last_error: Some(err.to_string()),
                        ..DetailState::default()
                    };
                    outcome = SelectOutcome::Failed(err);
                }
            }
            true
        });
        outcome
    }

    /// Deselect. Any pending lookup or enrichment is ignored when it lands.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| *state = DetailState::default());
    }

    /// Enrich the open recipe and attach the result if it is still open.
    pub async fn enrich_selected(&self) -> Result<Arc<EnrichedRecipe>, EnrichmentError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let recipe = {
            let state = self.state.borrow();
            match (&state.status, &state.recipe) {
                (DetailStatus::Loaded, Some(recipe)) => recipe.clone(),
                _ => return Err(EnrichmentError::NoSelection),
            }
        };

        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            state.enrichment.loading = true;
            state.enrichment.error = None;
            true
        });

        let pending = PendingEnrichment {
            lifecycle: self,
            generation,
        };
        let result = self.enricher.enrich(&recipe).await;
        std::mem::forget(pending);

        let applied = self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            state.enrichment.loading = false;
            match &result {
                Ok(enriched) => state.enrichment.result = Some(Arc::clone(enriched)),
                Err(err) => state.enrichment.error = Some(err.user_message()),
            }
            true
        });
        if !applied {
            tracing::debug!(recipe_id = %recipe.id, "detail: recipe closed, enrichment not shown");
        }
        result
    }

    /// Apply a shopping-list change to the open recipe and persist it.
    ///
    /// Returns the updated list, or `None` when no recipe is loaded.
    pub fn mutate_shopping_list(
        &self,
        op: ShoppingListOp,
    ) -> Result<Option<ShoppingList>, StoreError> {
        let mut updated = None;
        self.state.send_if_modified(|state| {
            let (Some(recipe), Some(list)) = (&state.recipe, &mut state.shopping_list) else {
                return false;
            };
            let changed = list.apply(op, recipe);
            updated = Some(list.clone());
            changed
        });

        match updated {
            Some(list) => {
                list.write(self.store.as_ref())?;
                tracing::debug!(recipe_id = list.recipe_id(), ?op, "shopping: saved");
                Ok(Some(list))
            }
            None => Ok(None),
        }
    }

    /// Clipboard export of the open recipe's list.
    pub fn clipboard_text(&self) -> Option<String> {
        let state = self.state.borrow();
        let recipe = state.recipe.as_ref()?;
        let list = state.shopping_list.as_ref()?;
        Some(list.to_clipboard_text(&recipe.title))
    }
}
