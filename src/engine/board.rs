use std::collections::BTreeSet;

use log::{debug, info};

use super::prelude::*;

use super::util::id::{IDFactory, IDMapper, ID};

#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
pub enum Zone {
    Battlefield,
    Graveyard,
}

/// The Board owns every token in play or in the graveyard, plus the saved
/// templates and the multi-select set. All mutation goes through it; groups
/// are computed from it on demand and never stored.
///
/// Operations that name a single token are no-ops when the id does not
/// resolve, and report whether anything changed.
#[derive(Debug, Default)]
pub struct Board {
    pub(crate) battlefield: Vec<Token>,
    pub(crate) graveyard: Vec<Token>,
    pub(crate) templates: Vec<TokenTemplate>,
    pub(crate) selected: BTreeSet<TokenID>,
    pub counter_types: CounterTypes,

    pub(crate) token_ids: IDFactory<TokenID>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn battlefield(&self) -> &[Token] {
        &self.battlefield
    }

    pub fn graveyard(&self) -> &[Token] {
        &self.graveyard
    }

    pub fn templates(&self) -> &[TokenTemplate] {
        &self.templates
    }

    pub fn selected(&self) -> &BTreeSet<TokenID> {
        &self.selected
    }

    pub fn zone_of(&self, id: TokenID) -> Option<Zone> {
        if self.position(id).is_some() {
            Some(Zone::Battlefield)
        } else if self.graveyard.iter().any(|token| token.id == id) {
            Some(Zone::Graveyard)
        } else {
            None
        }
    }

    /// Current display groups for the battlefield.
    pub fn groups(&self, settings: &Settings) -> Vec<TokenGroup<'_>> {
        if settings.auto_stack_enabled {
            group(&self.battlefield, settings.min_stack_size())
        } else {
            ungrouped(&self.battlefield)
        }
    }

    // Lifecycle

    /// Prints `quantity` independent tokens from `template` onto the
    /// battlefield and returns their ids.
    pub fn add_token(&mut self, template: &TokenTemplate, quantity: usize) -> Vec<TokenID> {
        let ids: Vec<TokenID> = (0..quantity).map(|_| self.token_ids.get_id()).collect();
        self.battlefield
            .extend(ids.iter().map(|&id| Token::from_template(template, id)));
        info!("board: created {} x '{}'", quantity, template.name);
        ids
    }

    /// Deletes a token outright, without a graveyard entry.
    pub fn remove_token(&mut self, id: TokenID) -> bool {
        let removed = self.take(id).is_some();
        if removed {
            self.selected.remove(&id);
            debug!("board: removed {:?}", id);
        }
        removed
    }

    /// Moves a battlefield token, same identity and fields, to the graveyard.
    pub fn move_to_graveyard(&mut self, id: TokenID) -> bool {
        let Some(token) = self.take(id) else {
            debug!("board: {:?} is not on the battlefield, nothing to destroy", id);
            return false;
        };
        info!("board: '{}' {:?} moved to graveyard", token.name, id);
        self.selected.remove(&id);
        self.graveyard.push(token);
        true
    }

    /// Puts a fresh copy of a graveyard token back on the battlefield and
    /// drops the graveyard entry. The copy gets a new id and is always
    /// summoning sick, even if the original had haste.
    pub fn restore_from_graveyard(&mut self, id: TokenID) -> Option<TokenID> {
        let pos = self.graveyard.iter().position(|token| token.id == id)?;
        let dead = self.graveyard.remove(pos);

        let mut restored = dead.reprint(self.token_ids.get_id());
        restored.summoning_sickness = true;
        let new_id = restored.id;
        info!("board: restored '{}' {:?} as {:?}", dead.name, id, new_id);
        self.battlefield.push(restored);
        Some(new_id)
    }

    pub fn clear_graveyard(&mut self) {
        info!("board: graveyard cleared ({} tokens)", self.graveyard.len());
        self.graveyard.clear();
    }

    /// Copies a battlefield token, state and all, under a new id.
    pub fn duplicate_token(&mut self, id: TokenID) -> Option<TokenID> {
        let source = self.get(id)?.clone();
        let new_id = self.token_ids.get_id();
        let copy = source.reprint(new_id);
        debug!("board: duplicated {:?} as {:?}", id, new_id);
        self.battlefield.push(copy);
        Some(new_id)
    }

    /// Empties the battlefield. The graveyard is untouched.
    pub fn clear_all(&mut self) {
        info!("board: cleared {} tokens", self.battlefield.len());
        self.battlefield.clear();
        self.selected.clear();
    }

    // Tapping and turn structure

    pub fn toggle_tap(&mut self, id: TokenID) -> bool {
        self.with_token(id, Token::toggle_tap)
    }

    pub fn tap_all(&mut self) {
        self.battlefield.iter_mut().for_each(Token::tap);
    }

    pub fn untap_all(&mut self) {
        self.battlefield.iter_mut().for_each(Token::untap);
    }

    /// New turn: every token loses summoning sickness and untaps.
    pub fn clear_summoning_sickness(&mut self) {
        for token in self.battlefield.iter_mut() {
            token.summoning_sickness = false;
            token.untap();
        }
        info!("board: new turn, {} tokens ready", self.battlefield.len());
    }

    /// Clears sickness on one token, leaving its tap state alone.
    pub fn remove_summoning_sickness(&mut self, id: TokenID) -> bool {
        self.with_token(id, |token| token.summoning_sickness = false)
    }

    // +1/+1 and -1/-1 counters

    pub fn add_plus_counter(&mut self, id: TokenID) -> bool {
        self.with_token(id, |token| token.typed_counters.add_plus())
    }

    pub fn add_minus_counter(&mut self, id: TokenID) -> bool {
        self.with_token(id, |token| token.typed_counters.add_minus())
    }

    pub fn add_plus_counter_to_all(&mut self) {
        for token in self.battlefield.iter_mut() {
            token.typed_counters.add_plus();
        }
    }

    pub fn add_minus_counter_to_all(&mut self) {
        for token in self.battlefield.iter_mut() {
            token.typed_counters.add_minus();
        }
    }

    // Named counters

    pub fn add_custom_counter(&mut self, id: TokenID, kind: &str, icon: Option<&str>) -> bool {
        let Some(token) = self.battlefield.iter_mut().find(|token| token.id == id) else {
            return false;
        };
        token.counters.add(kind, icon, &self.counter_types);
        true
    }

    pub fn remove_custom_counter(&mut self, id: TokenID, kind: &str) -> bool {
        self.get_mut(id)
            .is_some_and(|token| token.counters.remove(kind))
    }

    pub fn set_custom_counter(&mut self, id: TokenID, kind: &str, amount: i64) -> bool {
        let Some(token) = self.battlefield.iter_mut().find(|token| token.id == id) else {
            return false;
        };
        token.counters.set_amount(kind, amount, &self.counter_types);
        true
    }

    pub fn update_counter_icon(&mut self, id: TokenID, kind: &str, icon: &str) -> bool {
        self.get_mut(id)
            .is_some_and(|token| token.counters.update_icon(kind, icon))
    }

    // Attachments

    pub fn add_attachment(&mut self, id: TokenID, attachment: Attachment) -> bool {
        self.get_mut(id)
            .is_some_and(|token| token.add_attachment(attachment))
    }

    pub fn remove_attachment(&mut self, id: TokenID, name: &str) -> bool {
        self.get_mut(id)
            .is_some_and(|token| token.remove_attachment(name))
    }

    // State based cleanup

    /// Creatures whose toughness after counters is zero or less.
    pub fn dying_tokens(&self) -> Vec<TokenID> {
        self.battlefield
            .iter()
            .filter(|token| token.is_dying())
            .map(|token| token.id)
            .collect()
    }

    /// Moves every dying creature to the graveyard and returns their ids.
    /// Callers should confirm with the user first; an empty result means
    /// there was nothing to clean up.
    pub fn cleanup(&mut self) -> Vec<TokenID> {
        let dying = self.dying_tokens();
        for &id in dying.iter() {
            self.move_to_graveyard(id);
        }
        if !dying.is_empty() {
            info!("board: cleanup destroyed {} tokens", dying.len());
        }
        dying
    }

    // Multi-select

    pub fn toggle_select(&mut self, id: TokenID) -> bool {
        if self.selected.remove(&id) {
            return true;
        }
        if self.position(id).is_none() {
            return false;
        }
        self.selected.insert(id);
        true
    }

    pub fn select_all(&mut self) {
        self.selected = self.battlefield.iter().map(|token| token.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Applies `patch` to every selected token, then clears the selection.
    /// Returns how many tokens changed.
    pub fn transform_selected(&mut self, patch: &TokenPatch) -> usize {
        let mut changed = 0;
        for token in self.battlefield.iter_mut() {
            if self.selected.contains(&token.id) {
                token.apply(patch);
                changed += 1;
            }
        }
        self.selected.clear();
        info!("board: transformed {} selected tokens", changed);
        changed
    }

    // Saved templates

    pub fn save_template(&mut self, template: TokenTemplate) {
        self.templates.push(template);
    }

    pub fn remove_template(&mut self, name: &str) {
        self.templates.retain(|template| template.name != name);
    }

    // Internals

    fn position(&self, id: TokenID) -> Option<usize> {
        self.battlefield.iter().position(|token| token.id == id)
    }

    fn take(&mut self, id: TokenID) -> Option<Token> {
        let pos = self.position(id)?;
        Some(self.battlefield.remove(pos))
    }

    fn with_token(&mut self, id: TokenID, f: impl FnOnce(&mut Token)) -> bool {
        match self.get_mut(id) {
            Some(token) => {
                f(token);
                true
            }
            None => false,
        }
    }
}

impl IDMapper<Token> for Board {
    fn get(&self, id: ID<Token>) -> Option<&Token> {
        self.battlefield.iter().find(|token| token.id == id)
    }

    fn get_mut(&mut self, id: ID<Token>) -> Option<&mut Token> {
        self.battlefield.iter_mut().find(|token| token.id == id)
    }
}
