//! Keyword translation for non-English queries.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::gateway::{GatewayClient, GatewayError};

/// ASCII letters, digits, underscore, whitespace and punctuation only.
static ENGLISH_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\s\p{P}]+$").expect("Invalid English-only regex")
});

/// True when `text` contains a character outside the English-only set.
pub fn needs_translation(text: &str) -> bool {
    !text.is_empty() && !ENGLISH_ONLY.is_match(text)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Gateway returned an empty keyword")]
    EmptyKeyword,
}

/// The keyword a query will be searched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub original_input: String,
    pub english_keyword: String,
    pub is_multiple: Option<bool>,
    /// False when the input was used verbatim.
    pub translated: bool,
}

impl Translation {
    pub fn passthrough(text: &str) -> Self {
        Self {
            original_input: text.to_string(),
            english_keyword: text.to_string(),
            is_multiple: None,
            translated: false,
        }
    }

    /// "Interpreted as" notice, when the keyword differs from the input.
    pub fn notice(&self) -> Option<String> {
        if self.english_keyword.to_lowercase() == self.original_input.to_lowercase() {
            return None;
        }
        Some(format!(
            "AI interpreted: \"{}\" -> Searching for \"{}\"",
            self.original_input, self.english_keyword
        ))
    }
}

#[derive(Clone)]
pub struct KeywordTranslator {
    gateway: GatewayClient,
}

impl KeywordTranslator {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }

    /// Keyword to search for. Never fails: English input and gateway
    /// failures both yield the input unchanged.
    pub async fn interpret(&self, text: &str) -> Translation {
        if !needs_translation(text) {
            return Translation::passthrough(text);
        }

        match self.translate(text).await {
            Ok(translation) => {
                tracing::info!(
                    input = text,
                    keyword = %translation.english_keyword,
                    "translate: interpreted"
                );
                translation
            }
            Err(e) => {
                tracing::warn!(input = text, error = %e, "translate: failed, searching raw input");
                Translation::passthrough(text)
            }
        }
    }

    pub async fn translate(&self, text: &str) -> Result<Translation, TranslationError> {
        let response = self.gateway.smart_search(text).await?;
        let keyword = response.english_keyword.trim();
        if keyword.is_empty() {
            return Err(TranslationError::EmptyKeyword);
        }

        let original_input = if response.original_input.trim().is_empty() {
            text.to_string()
        } else {
            response.original_input
        };

        Ok(Translation {
            original_input,
            english_keyword: keyword.to_string(),
            is_multiple: response.is_multiple,
            translated: true,
        })
    }
}
