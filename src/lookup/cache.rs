use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{debug, info, warn};
use tokio::sync::{
    broadcast::{self, error::TryRecvError, Receiver, Sender},
    OnceCell,
};

use crate::engine::prelude::*;

use super::{CardCandidate, CardInfo, CardLookup};

/// Process-lifetime cache in front of a [`CardLookup`], keyed by token name.
///
/// Concurrent requests for the same name share one call to the database.
/// Failed lookups are cached as empty results too, so a missing card is not
/// asked for again. There is no eviction; the set of names is small.
pub struct LookupCache<L> {
    lookup: L,
    entries: Mutex<HashMap<String, Arc<OnceCell<CardInfo>>>>,
    resolved: Sender<String>,
}

impl<L: CardLookup> LookupCache<L> {
    pub fn new(lookup: L) -> Self {
        let cap = 64;
        let (resolved, _) = broadcast::channel(cap);
        Self {
            lookup,
            entries: Mutex::new(HashMap::new()),
            resolved,
        }
    }

    /// Receives the name of every entry as it lands in the cache.
    pub fn subscribe(&self) -> LookupListener {
        LookupListener::from(self.resolved.subscribe())
    }

    pub async fn get(&self, name: &str) -> CardInfo {
        let cell = self.cell(name);
        let info = cell
            .get_or_init(|| async {
                debug!("lookup: fetching '{}'", name);
                let info = self.lookup.lookup(name).await;
                if info.is_empty() {
                    warn!("lookup: nothing found for '{}'", name);
                } else {
                    info!("lookup: cached '{}' (image: {})", name, info.image_url.is_some());
                }
                // nobody listening is fine
                let _ = self.resolved.send(name.to_string());
                info
            })
            .await;
        info.clone()
    }

    /// The cached entry for `name`, without going to the database.
    pub fn cached(&self, name: &str) -> Option<CardInfo> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(name).and_then(|cell| cell.get().cloned())
    }

    /// Warms the cache one name at a time, pausing between requests to go
    /// easy on the remote service.
    pub async fn prefetch<I, S>(&self, names: I, pause: Duration)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if self.cached(name).is_some() {
                debug!("lookup: cache hit for '{}'", name);
                continue;
            }
            self.get(name).await;
            tokio::time::sleep(pause).await;
        }
        info!("lookup: prefetch complete");
    }

    /// Fills in a template's missing art and rules text from whatever is
    /// already cached. Existing tokens are never touched; only tokens printed
    /// from the returned template see the data.
    pub fn enrich(&self, template: &TokenTemplate) -> TokenTemplate {
        let mut template = template.clone();
        if let Some(info) = self.cached(&template.name) {
            if template.image_url.is_none() {
                template.image_url = info.image_url;
            }
            if template.abilities.is_none() {
                template.abilities = info.oracle_text;
            }
        }
        template
    }

    /// Free-text search, passed straight through. Results are not cached.
    pub async fn search(&self, query: &str, tokens_only: bool) -> Vec<CardCandidate> {
        self.lookup.search(query, tokens_only).await
    }

    /// Name completion, passed straight through and not cached.
    pub async fn autocomplete(&self, query: &str) -> Vec<String> {
        self.lookup.autocomplete(query).await
    }

    fn cell(&self, name: &str) -> Arc<OnceCell<CardInfo>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(name.to_string()).or_default().clone()
    }
}

/// Polls for names resolved by a [`LookupCache`], for UIs that redraw when
/// new art arrives.
pub struct LookupListener {
    receiver: Receiver<String>,
}

impl LookupListener {
    pub fn from(receiver: Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Drains everything resolved since the last call.
    pub fn update(&mut self) -> Vec<String> {
        let mut names = vec![];
        loop {
            match self.receiver.try_recv() {
                Ok(name) => names.push(name),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("lookup: listener fell behind, {missed} updates missed");
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Fake {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CardLookup for Fake {
        async fn lookup(&self, name: &str) -> CardInfo {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if name == "Missing" {
                return CardInfo::default();
            }
            CardInfo {
                image_url: Some(format!("https://img.test/{name}.jpg")),
                oracle_text: Some(format!("{name} text")),
            }
        }

        async fn search(&self, query: &str, _tokens_only: bool) -> Vec<CardCandidate> {
            vec![CardCandidate {
                name: query.to_string(),
                set_name: "Test Set".into(),
                art_url: None,
                colors: Colors::new(),
            }]
        }
    }

    #[tokio::test]
    async fn concurrent_gets_share_one_call() {
        let cache = LookupCache::new(Fake::default());
        let (a, b) = tokio::join!(cache.get("Soldier"), cache.get("Soldier"));
        assert_eq!(a, b);
        assert_eq!(cache.get("Soldier").await, a);
        assert_eq!(cache.lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn misses_are_cached_as_empty() {
        let cache = LookupCache::new(Fake::default());
        assert!(cache.get("Missing").await.is_empty());
        assert!(cache.get("Missing").await.is_empty());
        assert_eq!(cache.lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached("Missing"), Some(CardInfo::default()));
    }

    #[tokio::test]
    async fn enrich_only_fills_gaps() {
        let cache = LookupCache::new(Fake::default());
        let plain = TokenTemplate::new("Goblin").with_stats(1, 1);
        assert_eq!(cache.enrich(&plain), plain);

        cache.prefetch(["Goblin"], Duration::ZERO).await;
        let enriched = cache.enrich(&plain);
        assert_eq!(enriched.image_url.as_deref(), Some("https://img.test/Goblin.jpg"));
        assert_eq!(enriched.abilities.as_deref(), Some("Goblin text"));

        let custom = plain.clone().with_abilities("Haste");
        assert_eq!(cache.enrich(&custom).abilities.as_deref(), Some("Haste"));
    }

    #[tokio::test]
    async fn prefetch_skips_cached_and_announces() {
        let cache = LookupCache::new(Fake::default());
        let mut listener = cache.subscribe();
        cache.get("Beast").await;
        cache.prefetch(["Beast", "Zombie"], Duration::ZERO).await;

        assert_eq!(cache.lookup.calls.load(Ordering::SeqCst), 2);
        assert_eq!(listener.update(), vec!["Beast".to_string(), "Zombie".to_string()]);
        assert!(listener.update().is_empty());
    }

    #[tokio::test]
    async fn search_passes_through() {
        let cache = LookupCache::new(Fake::default());
        let results = cache.search("Angel", true).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].set_name, "Test Set");
        assert!(cache.autocomplete("Ang").await.is_empty());
    }
}
