use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::prelude::*;

use super::util::id::ID;

pub type TokenID = ID<Token>;

/// Base power and toughness. A token either has both or neither, so the pair
/// lives behind a single `Option`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stats {
    pub power: i64,
    pub toughness: i64,
}

impl Stats {
    pub fn new(power: i64, toughness: i64) -> Self {
        Self { power, toughness }
    }

    /// Both values shifted by the same amount, as +1/+1 counters do.
    pub fn shifted(self, by: i64) -> Self {
        Self::new(self.power.saturating_add(by), self.toughness.saturating_add(by))
    }
}

/// An aura, equipment or other effect hanging off a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effect: effect.into(),
            image_url: None,
        }
    }
}

/// Stamp that new tokens are printed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTemplate {
    pub name: String,
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub colors: Colors,
    #[serde(default)]
    pub abilities: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub has_haste: bool,
}

impl TokenTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: None,
            colors: Colors::new(),
            abilities: None,
            image_url: None,
            has_haste: false,
        }
    }

    pub fn with_stats(mut self, power: i64, toughness: i64) -> Self {
        self.stats = Some(Stats::new(power, toughness));
        self
    }

    pub fn with_colors(mut self, colors: impl IntoIterator<Item = Color>) -> Self {
        self.colors = colors.into_iter().collect();
        self
    }

    pub fn with_abilities(mut self, abilities: impl Into<String>) -> Self {
        self.abilities = Some(abilities.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_haste(mut self) -> Self {
        self.has_haste = true;
        self
    }
}

/// The quick-create presets.
pub fn common_templates() -> Vec<TokenTemplate> {
    use Color::*;
    vec![
        TokenTemplate::new("1/1 Soldier").with_stats(1, 1).with_colors([White]),
        TokenTemplate::new("1/1 Goblin").with_stats(1, 1).with_colors([Red]),
        TokenTemplate::new("2/2 Zombie").with_stats(2, 2).with_colors([Black]),
        TokenTemplate::new("3/3 Beast").with_stats(3, 3).with_colors([Green]),
        TokenTemplate::new("1/1 Saproling").with_stats(1, 1).with_colors([Green]),
        TokenTemplate::new("Treasure"),
        TokenTemplate::new("Food"),
    ]
}

/// A single game piece on the battlefield or in the graveyard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenID,
    pub name: String,
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub colors: Colors,
    #[serde(default)]
    pub abilities: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tapped: bool,
    #[serde(default)]
    pub summoning_sickness: bool,
    #[serde(default)]
    pub has_haste: bool,
    #[serde(flatten)]
    pub typed_counters: TypedCounters,
    #[serde(default)]
    pub counters: Counters,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn from_template(template: &TokenTemplate, id: TokenID) -> Self {
        Self {
            id,
            name: template.name.clone(),
            stats: template.stats,
            colors: template.colors.clone(),
            abilities: template.abilities.clone(),
            image_url: template.image_url.clone(),
            tapped: false,
            summoning_sickness: !template.has_haste,
            has_haste: template.has_haste,
            typed_counters: TypedCounters::new(),
            counters: Counters::new(),
            attachments: vec![],
            created_at: Utc::now(),
        }
    }

    /// A field-for-field copy under a new identity.
    pub fn reprint(&self, id: TokenID) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            ..self.clone()
        }
    }

    /// The template this token would have been printed from.
    pub fn template(&self) -> TokenTemplate {
        TokenTemplate {
            name: self.name.clone(),
            stats: self.stats,
            colors: self.colors.clone(),
            abilities: self.abilities.clone(),
            image_url: self.image_url.clone(),
            has_haste: self.has_haste,
        }
    }

    pub fn is_creature(&self) -> bool {
        self.stats.is_some()
    }

    /// Power and toughness after +1/+1 and -1/-1 counters.
    pub fn current_stats(&self) -> Option<Stats> {
        self.stats.map(|base| base.shifted(self.typed_counters.net()))
    }

    /// A creature with no toughness left, due to be put in the graveyard.
    pub fn is_dying(&self) -> bool {
        self.current_stats().is_some_and(|stats| stats.toughness <= 0)
    }

    pub fn toggle_tap(&mut self) {
        self.tapped = !self.tapped;
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Appends the attachment unless one with the same name is already there.
    pub fn add_attachment(&mut self, attachment: Attachment) -> bool {
        if self.attachments.iter().any(|a| a.name == attachment.name) {
            return false;
        }
        self.attachments.push(attachment);
        true
    }

    pub fn remove_attachment(&mut self, name: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.name != name);
        before != self.attachments.len()
    }

    /// Repairs data that may come from an older or hand-edited snapshot.
    pub fn normalize(&mut self) {
        self.typed_counters.normalize();
        self.counters.normalize();
        let mut seen = std::collections::HashSet::new();
        self.attachments.retain(|a| seen.insert(a.name.clone()));
    }

    pub fn apply(&mut self, patch: &TokenPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(stats) = patch.stats {
            self.stats = stats;
        }
        if let Some(colors) = &patch.colors {
            self.colors = colors.clone();
        }
        if let Some(abilities) = &patch.abilities {
            self.abilities = abilities.clone();
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = image_url.clone();
        }
    }
}

/// Partial update for the displayed fields of a token. `None` leaves a field
/// alone; `Some(None)` clears an optional one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenPatch {
    pub name: Option<String>,
    pub stats: Option<Option<Stats>>,
    pub colors: Option<Colors>,
    pub abilities: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

impl From<&TokenTemplate> for TokenPatch {
    fn from(template: &TokenTemplate) -> Self {
        Self {
            name: Some(template.name.clone()),
            stats: Some(template.stats),
            colors: Some(template.colors.clone()),
            abilities: Some(template.abilities.clone()),
            image_url: Some(template.image_url.clone()),
        }
    }
}
