//! Card art and rules text from an outside card database.
//!
//! Everything here is best effort. A failed lookup degrades to an empty
//! result and never blocks creating tokens.

mod cache;
pub mod scryfall;

pub use cache::{LookupCache, LookupListener};

use async_trait::async_trait;

use crate::engine::prelude::Colors;

/// What the card database knows about a token name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardInfo {
    pub image_url: Option<String>,
    pub oracle_text: Option<String>,
}

impl CardInfo {
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.oracle_text.is_none()
    }
}

/// One result of a free-text card search, as shown by an art picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardCandidate {
    pub name: String,
    pub set_name: String,
    pub art_url: Option<String>,
    pub colors: Colors,
}

/// The card database. Implementations swallow their own failures: a lookup
/// that goes wrong returns `CardInfo::default()`, a search returns nothing.
#[async_trait]
pub trait CardLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> CardInfo;

    async fn search(&self, query: &str, tokens_only: bool) -> Vec<CardCandidate>;

    /// Card names completing a partial query, for name pickers.
    async fn autocomplete(&self, _query: &str) -> Vec<String> {
        vec![]
    }
}

/// A card database that knows nothing. Used when running offline.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

#[async_trait]
impl CardLookup for Offline {
    async fn lookup(&self, _name: &str) -> CardInfo {
        CardInfo::default()
    }

    async fn search(&self, _query: &str, _tokens_only: bool) -> Vec<CardCandidate> {
        vec![]
    }
}

#[async_trait]
impl<L: CardLookup + ?Sized> CardLookup for Box<L> {
    async fn lookup(&self, name: &str) -> CardInfo {
        (**self).lookup(name).await
    }

    async fn search(&self, query: &str, tokens_only: bool) -> Vec<CardCandidate> {
        (**self).search(query, tokens_only).await
    }

    async fn autocomplete(&self, query: &str) -> Vec<String> {
        (**self).autocomplete(query).await
    }
}
