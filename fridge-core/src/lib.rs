pub mod ai;
pub mod app;
pub mod config;
pub mod detail;
pub mod enrich;
pub mod error;
pub mod gateway;
pub mod http;
pub mod json;
pub mod llm;
pub mod mealdb;
pub mod search;
pub mod shopping;
pub mod store;
pub mod translate;
pub mod types;
pub mod vegan;

pub use app::{App, AppError, SearchReport};
pub use config::{ConfigError, FridgeConfig};
pub use detail::{DetailFetchError, DetailState, DetailStatus, SelectOutcome, SelectionLifecycle};
pub use enrich::{Difficulty, EnrichedRecipe, Enricher, EnrichmentError};
pub use error::{FetchError, SearchError};
pub use gateway::{GatewayClient, GatewayError};
pub use http::{HttpClient, MockClient, MockResponse, ReqwestClient};
pub use mealdb::MealDb;
pub use search::{SearchController, SearchOutcome, SearchService, SearchState, Submission};
pub use shopping::{ShoppingList, ShoppingListItem, ShoppingListOp};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use translate::{needs_translation, KeywordTranslator, Translation, TranslationError};
pub use types::{IngredientLine, Recipe, ResultSet, ResultSetId};
pub use vegan::{
    ClassificationError, ClassificationFallback, FilterState, FilterStatus, VeganFilter, VeganMode,
};
