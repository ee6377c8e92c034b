use std::{
    collections::{BTreeSet, HashMap},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use super::prelude::*;

pub const BOARD_KEY: &str = "token-tracker-storage";
pub const SETTINGS_KEY: &str = "token-tracker-settings";
pub const COUNTER_TYPES_KEY: &str = "counter-types-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Opaque string blob store. The board does not care where bytes end up.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Keeps one file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // write then rename so a crash never leaves half a snapshot behind
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(tmp, self.path(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process store, handy for tests and for running without a disk.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }
}

/// Converts the multi-select set to and from its stored array form. This is
/// the only place the conversion happens; ids that no longer point at a
/// battlefield token are dropped on the way in.
pub mod selection {
    use super::*;

    pub fn to_ids(selected: &BTreeSet<TokenID>) -> Vec<TokenID> {
        selected.iter().copied().collect()
    }

    pub fn from_ids(ids: Vec<TokenID>, battlefield: &[Token]) -> BTreeSet<TokenID> {
        let live: BTreeSet<TokenID> = battlefield.iter().map(|token| token.id).collect();
        let (kept, dropped): (BTreeSet<TokenID>, BTreeSet<TokenID>) =
            ids.into_iter().partition(|id| live.contains(id));
        if !dropped.is_empty() {
            warn!("snapshot: dropped {} stale selected ids", dropped.len());
        }
        kept
    }
}

/// The persisted form of a [`Board`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub graveyard: Vec<Token>,
    #[serde(default)]
    pub custom_templates: Vec<TokenTemplate>,
    #[serde(default)]
    pub selected_tokens: Vec<TokenID>,
    #[serde(default)]
    pub next_id: usize,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
}

impl From<&Board> for BoardSnapshot {
    fn from(board: &Board) -> Self {
        Self {
            tokens: board.battlefield.clone(),
            graveyard: board.graveyard.clone(),
            custom_templates: board.templates.clone(),
            selected_tokens: selection::to_ids(&board.selected),
            next_id: board.token_ids.high_water(),
        }
    }
}

impl BoardSnapshot {
    /// Rebuilds a board, repairing whatever older snapshots got wrong: mixed
    /// +1/+1 and -1/-1 counters fold to their net, stale selections go, and
    /// the id factory resumes past every id seen.
    pub fn into_board(self, counter_types: CounterTypes) -> Board {
        let mut board = Board::new();
        board.counter_types = counter_types;

        let mut tokens = self.tokens;
        let mut graveyard = self.graveyard;
        tokens
            .iter_mut()
            .chain(graveyard.iter_mut())
            .for_each(Token::normalize);

        let highest = tokens
            .iter()
            .chain(graveyard.iter())
            .map(|token| token.id.raw())
            .max()
            .unwrap_or(0);
        board.token_ids.resume_after(self.next_id.max(highest));

        board.selected = selection::from_ids(self.selected_tokens, &tokens);
        board.battlefield = tokens;
        board.graveyard = graveyard;
        board.templates = self.custom_templates;
        board
    }
}

fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt { key: key.to_string(), source })
}

fn save_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|source| StorageError::Encode { key: key.to_string(), source })?;
    store.set(key, &raw)
}

/// Loads the board and counter type registry. Nothing stored yet means an
/// empty board, not an error.
pub fn load_board(store: &dyn KvStore) -> Result<Board> {
    let counter_types = load_json::<Envelope<CounterTypes>>(store, COUNTER_TYPES_KEY)?
        .map(|envelope| envelope.state)
        .unwrap_or_default();

    let board = match load_json::<Envelope<BoardSnapshot>>(store, BOARD_KEY)? {
        Some(envelope) => envelope.state.into_board(counter_types),
        None => {
            info!("snapshot: nothing stored under '{}', starting empty", BOARD_KEY);
            BoardSnapshot::default().into_board(counter_types)
        }
    };
    info!(
        "snapshot: loaded {} tokens, {} in graveyard",
        board.battlefield.len(),
        board.graveyard.len()
    );
    Ok(board)
}

pub fn save_board(store: &dyn KvStore, board: &Board) -> Result<()> {
    save_json(store, BOARD_KEY, &Envelope { state: BoardSnapshot::from(board) })?;
    save_json(store, COUNTER_TYPES_KEY, &Envelope { state: &board.counter_types })
}

pub fn load_settings(store: &dyn KvStore) -> Result<Settings> {
    Ok(load_json::<Envelope<Settings>>(store, SETTINGS_KEY)?
        .map(|envelope| envelope.state.sanitized())
        .unwrap_or_default())
}

pub fn save_settings(store: &dyn KvStore, settings: &Settings) -> Result<()> {
    save_json(store, SETTINGS_KEY, &Envelope { state: settings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_board() -> Board {
        let mut board = Board::new();
        let template = TokenTemplate::new("2/2 Zombie").with_stats(2, 2).with_colors([Color::Black]);
        let ids = board.add_token(&template, 3);
        board.add_minus_counter(ids[0]);
        board.add_attachment(ids[1], Attachment::new("Aura", "Flying"));
        board.toggle_select(ids[2]);
        board.move_to_graveyard(ids[1]);
        board.save_template(template);
        board.counter_types.add("doom", "💀", None);
        board
    }

    #[test]
    fn empty_store_gives_empty_board() {
        let store = MemoryStore::new();
        let board = load_board(&store).unwrap();
        assert!(board.battlefield().is_empty());
        assert!(board.graveyard().is_empty());
        assert!(board.selected().is_empty());
        assert_eq!(load_settings(&store).unwrap(), Settings::default());
    }

    #[test]
    fn board_survives_a_round_trip() {
        let store = MemoryStore::new();
        let board = sample_board();
        save_board(&store, &board).unwrap();

        let loaded = load_board(&store).unwrap();
        assert_eq!(loaded.battlefield(), board.battlefield());
        assert_eq!(loaded.graveyard(), board.graveyard());
        assert_eq!(loaded.selected(), board.selected());
        assert_eq!(loaded.templates(), board.templates());
        assert_eq!(loaded.counter_types, board.counter_types);
    }

    #[test]
    fn ids_are_not_reused_after_reload() {
        let store = MemoryStore::new();
        let mut board = sample_board();
        let ids = board.add_token(&TokenTemplate::new("Food"), 1);
        board.remove_token(ids[0]);
        save_board(&store, &board).unwrap();

        let mut loaded = load_board(&store).unwrap();
        let fresh = loaded.add_token(&TokenTemplate::new("Food"), 1)[0];
        assert!(fresh.raw() > ids[0].raw());
    }

    #[test]
    fn selection_is_stored_as_an_array() {
        let store = MemoryStore::new();
        save_board(&store, &sample_board()).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&store.get(BOARD_KEY).unwrap().unwrap()).unwrap();
        assert!(raw["state"]["selected_tokens"].is_array());
        assert_eq!(raw["state"]["selected_tokens"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn stale_selected_ids_are_dropped() {
        let kept = selection::from_ids(vec![TokenID::from_raw(1), TokenID::from_raw(8)], &[]);
        assert!(kept.is_empty());
    }

    #[test]
    fn legacy_counters_normalize_on_load() {
        let store = MemoryStore::new();
        store
            .set(
                BOARD_KEY,
                r#"{"state":{"tokens":[{"id":3,"name":"Ooze","stats":{"power":2,"toughness":2},
                "plus_one":2,"minus_one":3,"created_at":"2024-05-01T10:00:00Z"}],
                "selected_tokens":[3, 4]}}"#,
            )
            .unwrap();

        let mut board = load_board(&store).unwrap();
        let token = &board.battlefield()[0];
        assert_eq!(token.typed_counters, TypedCounters { plus_one: 0, minus_one: 1 });
        assert_eq!(board.selected().len(), 1);
        assert_eq!(board.add_token(&TokenTemplate::new("Food"), 1)[0].raw(), 4);
    }

    #[test]
    fn corrupt_snapshot_is_a_hard_error() {
        let store = MemoryStore::new();
        store.set(BOARD_KEY, "{not json").unwrap();
        assert!(matches!(load_board(&store), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn settings_round_trip_and_clamp() {
        let store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.set_min_stack_size(4);
        settings.auto_stack_enabled = false;
        save_settings(&store, &settings).unwrap();
        assert_eq!(load_settings(&store).unwrap(), settings);

        store.set(SETTINGS_KEY, r#"{"state":{"min_stack_size":0}}"#).unwrap();
        assert_eq!(load_settings(&store).unwrap().min_stack_size(), 2);
    }

    #[test]
    fn file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            save_board(&store, &sample_board()).unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        let board = load_board(&store).unwrap();
        assert_eq!(board.battlefield().len(), 2);
        assert_eq!(board.graveyard().len(), 1);

        store.remove(BOARD_KEY).unwrap();
        store.remove(BOARD_KEY).unwrap();
        assert!(store.get(BOARD_KEY).unwrap().is_none());
    }
}
