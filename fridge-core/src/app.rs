//! One user session: search, vegan filtering, the open recipe.

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::FridgeConfig;
use crate::detail::{DetailState, SelectOutcome, SelectionLifecycle};
use crate::enrich::{EnrichedRecipe, Enricher, EnrichmentError};
use crate::error::FetchError;
use crate::gateway::GatewayClient;
use crate::http::{HttpClient, ReqwestClient};
use crate::mealdb::MealDb;
use crate::search::{SearchController, SearchService, SearchState, Submission};
use crate::shopping::{ShoppingList, ShoppingListOp};
use crate::store::{FileStore, KeyValueStore, StoreError};
use crate::translate::{KeywordTranslator, Translation};
use crate::types::Recipe;
use crate::vegan::{FilterState, VeganFilter, VeganMode};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to set up HTTP: {0}")]
    Http(#[from] FetchError),
}

/// Result of [`App::smart_search`].
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub translation: Translation,
    pub submission: Submission,
}

impl SearchReport {
    /// "AI interpreted" notice, if the keyword differs from the input.
    pub fn notice(&self) -> Option<String> {
        self.translation.notice()
    }
}

pub struct App {
    search: Arc<SearchController>,
    translator: KeywordTranslator,
    vegan_mode: VeganMode,
    vegan: Arc<VeganFilter>,
    detail: Arc<SelectionLifecycle>,
    driver: JoinHandle<()>,
}

impl App {
    /// Session backed by the network and the on-disk store.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: &FridgeConfig) -> Result<Self, AppError> {
        let mut builder = ReqwestClient::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http: Arc<dyn HttpClient> = Arc::new(builder.build()?);
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage_dir.clone()));
        Self::with_parts(config, http, store, VeganMode::default())
    }

    /// Session over caller-supplied transport, storage and mode switch.
    pub fn with_parts(
        config: &FridgeConfig,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
        vegan_mode: VeganMode,
    ) -> Result<Self, AppError> {
        let db = MealDb::new(Arc::clone(&http), &config.mealdb_url)?;
        let gateway = GatewayClient::new(http, config.gateway_url.clone());

        let search = Arc::new(SearchController::new(
            SearchService::new(db.clone()).with_deadline(config.search_timeout),
        ));
        let vegan = Arc::new(VeganFilter::new(gateway.clone(), config.vegan_fallback));
        let driver = vegan.spawn_driver(search.subscribe(), vegan_mode.clone());
        let enricher = Arc::new(Enricher::new(gateway.clone()));
        let detail = Arc::new(SelectionLifecycle::new(db, enricher, store));

        Ok(Self {
            search,
            translator: KeywordTranslator::new(gateway),
            vegan_mode,
            vegan,
            detail,
            driver,
        })
    }

    /// Validate, translate if needed, then search.
    ///
    /// The search is marked in progress before translation starts, so a
    /// newer search or a reset during translation supersedes this one.
    pub async fn smart_search(&self, input: &str) -> SearchReport {
        let input = input.trim();
        let generation = match self.search.begin(input) {
            Ok(generation) => generation,
            Err(err) => {
                return SearchReport {
                    translation: Translation::passthrough(input),
                    submission: Submission::Rejected(err),
                }
            }
        };

        let translation = self.translator.interpret(input).await;
        let submission = self
            .search
            .finish(generation, &translation.english_keyword)
            .await;
        SearchReport {
            translation,
            submission,
        }
    }

    pub fn on_input_change(&self, text: &str) {
        self.search.on_input_change(text);
    }

    pub fn reset(&self) {
        self.search.reset();
    }

    pub fn search_state(&self) -> SearchState {
        self.search.state()
    }

    pub fn vegan_mode(&self) -> &VeganMode {
        &self.vegan_mode
    }

    pub fn filter_state(&self) -> FilterState {
        self.vegan.state()
    }

    /// Wait for the vegan filter to settle on the current results.
    pub async fn wait_for_filter(&self) -> FilterState {
        let source = self.search.state().results.id();
        self.vegan.settled(source).await
    }

    /// Recipes to show: the filtered output in vegan mode, the raw results otherwise.
    pub fn displayed(&self) -> Vec<Recipe> {
        let results = self.search.state().results;
        if !self.vegan_mode.is_enabled() {
            return results.recipes().to_vec();
        }
        let filter = self.vegan.state();
        if filter.source == Some(results.id()) {
            filter.recipes
        } else {
            Vec::new()
        }
    }

    pub async fn select(&self, id: &str) -> SelectOutcome {
        self.detail.select(id).await
    }

    pub fn close(&self) {
        self.detail.close();
    }

    pub fn detail_state(&self) -> DetailState {
        self.detail.state()
    }

    pub async fn enrich_selected(&self) -> Result<Arc<EnrichedRecipe>, EnrichmentError> {
        self.detail.enrich_selected().await
    }

    pub fn mutate_shopping_list(
        &self,
        op: ShoppingListOp,
    ) -> Result<Option<ShoppingList>, StoreError> {
        self.detail.mutate_shopping_list(op)
    }

    pub fn clipboard_text(&self) -> Option<String> {
        self.detail.clipboard_text()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
