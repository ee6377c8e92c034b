use std::sync::LazyLock;

use async_trait::async_trait;
use log::{debug, warn};
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize};

use crate::engine::prelude::*;

use super::{CardCandidate, CardInfo, CardLookup};

pub const SCRYFALL_API: &str = "https://api.scryfall.com";

static LEADING_STATS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+/\d+\s+").expect("static regex"));

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImageUris {
    pub normal: Option<String>,
    pub art_crop: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CardFace {
    pub image_uris: Option<ImageUris>,
    pub oracle_text: Option<String>,
}

/// The subset of a Scryfall card object the tracker reads.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScryfallCard {
    pub name: String,
    #[serde(default)]
    pub set_name: String,
    pub oracle_text: Option<String>,
    pub image_uris: Option<ImageUris>,
    #[serde(default)]
    pub card_faces: Vec<CardFace>,
    #[serde(default)]
    pub colors: Vec<String>,
}

impl ScryfallCard {
    /// Art crop of the card, or of its front face for double-faced cards.
    pub fn art_url(&self) -> Option<String> {
        self.image_uris
            .as_ref()
            .and_then(|uris| uris.art_crop.clone())
            .or_else(|| {
                self.card_faces
                    .first()
                    .and_then(|face| face.image_uris.as_ref())
                    .and_then(|uris| uris.art_crop.clone())
            })
    }

    pub fn rules_text(&self) -> Option<String> {
        self.oracle_text
            .clone()
            .or_else(|| self.card_faces.first().and_then(|face| face.oracle_text.clone()))
    }

    pub fn color_set(&self) -> Colors {
        self.colors.iter().map(|symbol| Color::from_symbol(symbol)).collect()
    }

    pub fn info(&self) -> CardInfo {
        CardInfo {
            image_url: self.art_url(),
            oracle_text: self.rules_text(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<ScryfallCard>,
}

/// Scryfall's list-of-strings response, as returned by autocomplete.
#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    data: Vec<String>,
}

/// Strips a leading power/toughness, so "1/1 Soldier" is looked up as
/// "Soldier".
pub fn clean_name(name: &str) -> &str {
    match LEADING_STATS.find(name) {
        Some(found) => &name[found.end()..],
        None => name,
    }
}

/// [`CardLookup`] backed by the public Scryfall API.
#[derive(Clone)]
pub struct ScryfallClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new() -> Self {
        Self::with_base_url(SCRYFALL_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("token-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!("scryfall: falling back to default http client: {e}");
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// GETs `path` and decodes the body. Any failure, including a non-2xx
    /// status, is logged and reported as `None`.
    async fn fetch<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Option<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = match self.http.get(&url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("scryfall: request to {url} failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!("scryfall: {url} answered {}", response.status());
            return None;
        }
        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("scryfall: could not decode {url}: {e}");
                None
            }
        }
    }

    pub async fn named_fuzzy(&self, name: &str) -> Option<ScryfallCard> {
        self.fetch("/cards/named", &[("fuzzy", name)]).await
    }

    /// Newest token printing matching `name`, falling back to a fuzzy name
    /// match against any card.
    pub async fn token_card(&self, name: &str) -> Option<ScryfallCard> {
        let name = clean_name(name);
        let query = format!("{name} t:token");
        let page: Option<SearchPage> = self
            .fetch(
                "/cards/search",
                &[("q", query.as_str()), ("unique", "cards"), ("order", "released"), ("dir", "desc")],
            )
            .await;
        if let Some(card) = page.and_then(|page| page.data.into_iter().next()) {
            debug!("scryfall: '{}' matched token '{}'", name, card.name);
            return Some(card);
        }
        self.named_fuzzy(name).await
    }
}

impl Default for ScryfallClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CardLookup for ScryfallClient {
    async fn lookup(&self, name: &str) -> CardInfo {
        self.token_card(name)
            .await
            .map(|card| card.info())
            .unwrap_or_default()
    }

    async fn search(&self, query: &str, tokens_only: bool) -> Vec<CardCandidate> {
        let query = if tokens_only {
            format!("{query} type:token")
        } else {
            query.to_string()
        };
        let page: Option<SearchPage> = self
            .fetch("/cards/search", &[("q", query.as_str()), ("unique", "cards")])
            .await;
        page.map(|page| page.data)
            .unwrap_or_default()
            .into_iter()
            .map(|card| CardCandidate {
                art_url: card.art_url(),
                colors: card.color_set(),
                name: card.name,
                set_name: card.set_name,
            })
            .collect()
    }

    async fn autocomplete(&self, query: &str) -> Vec<String> {
        let catalog: Option<Catalog> = self.fetch("/cards/autocomplete", &[("q", query)]).await;
        catalog.map(|catalog| catalog.data).unwrap_or_default()
    }
}
