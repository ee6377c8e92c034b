use std::collections::BTreeSet;

use log::debug;

use super::prelude::*;

/// The member ids of a stack the user has opened up.
///
/// Groups are rebuilt on every query and a member's key can change under
/// it, so an expansion remembers ids rather than a group key. Members are
/// resolved against the live battlefield each time; ids that have left it
/// simply stop resolving, and an expansion with no live members is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandedStack {
    ids: BTreeSet<TokenID>,
}

impl ExpandedStack {
    pub fn expand(group: &TokenGroup) -> Self {
        Self::from_ids(group.ids())
    }

    pub fn from_ids(ids: impl IntoIterator<Item = TokenID>) -> Self {
        Self { ids: ids.into_iter().collect() }
    }

    pub fn collapse(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: TokenID) -> bool {
        self.ids.contains(&id)
    }

    pub fn forget(&mut self, id: TokenID) {
        self.ids.remove(&id);
    }

    /// Live members in battlefield order.
    pub fn members<'a>(&self, board: &'a Board) -> Vec<&'a Token> {
        board
            .battlefield()
            .iter()
            .filter(|token| self.ids.contains(&token.id))
            .collect()
    }

    pub fn member_ids(&self, board: &Board) -> Vec<TokenID> {
        self.members(board).into_iter().map(|token| token.id).collect()
    }

    /// True when none of the remembered ids is still on the battlefield.
    pub fn is_empty(&self, board: &Board) -> bool {
        self.members(board).is_empty()
    }

    /// Forgets ids that are no longer on the battlefield.
    pub fn prune(&mut self, board: &Board) {
        let live: BTreeSet<TokenID> = self.member_ids(board).into_iter().collect();
        self.ids = live;
    }
}

impl Board {
    /// Taps every untapped member. Returns how many changed.
    pub fn tap_stack(&mut self, stack: &ExpandedStack) -> usize {
        self.set_stack_tapped(stack, true)
    }

    /// Untaps every tapped member. Returns how many changed.
    pub fn untap_stack(&mut self, stack: &ExpandedStack) -> usize {
        self.set_stack_tapped(stack, false)
    }

    /// Taps the first half (rounded down) of the members.
    pub fn tap_half_of_stack(&mut self, stack: &ExpandedStack) -> usize {
        let members = stack.member_ids(self);
        let half = members.len() / 2;
        let mut changed = 0;
        for id in members.into_iter().take(half) {
            if let Some(token) = self.get_mut(id) {
                if !token.tapped {
                    token.tap();
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Peels `count` members off the stack by tapping the first `count` of
    /// them, then collapses the expansion. Requires `0 < count < members`;
    /// anything else changes nothing.
    pub fn split_stack(&mut self, stack: &mut ExpandedStack, count: usize) -> bool {
        let members = stack.member_ids(self);
        if count == 0 || count >= members.len() {
            debug!("stack: split of {} out of {} rejected", count, members.len());
            return false;
        }
        for id in members.into_iter().take(count) {
            if let Some(token) = self.get_mut(id) {
                token.tap();
            }
        }
        stack.collapse();
        true
    }

    /// Puts a +1/+1 counter on each member. Members may stop being
    /// identical afterwards, which is fine; the next grouping splits them.
    pub fn add_plus_counter_to_stack(&mut self, stack: &ExpandedStack) -> usize {
        let members = stack.member_ids(self);
        members
            .into_iter()
            .filter(|&id| self.add_plus_counter(id))
            .count()
    }

    pub fn add_minus_counter_to_stack(&mut self, stack: &ExpandedStack) -> usize {
        let members = stack.member_ids(self);
        members
            .into_iter()
            .filter(|&id| self.add_minus_counter(id))
            .count()
    }

    /// Hangs a copy of `attachment` on each member. Members already carrying
    /// one with the same name are left alone. Returns how many changed.
    pub fn add_attachment_to_stack(&mut self, stack: &ExpandedStack, attachment: Attachment) -> usize {
        let members = stack.member_ids(self);
        let changed = members
            .into_iter()
            .filter(|&id| self.add_attachment(id, attachment.clone()))
            .count();
        debug!("stack: attached '{}' to {} members", attachment.name, changed);
        changed
    }

    /// Moves one member to the graveyard and drops it from the expansion.
    pub fn move_member_to_graveyard(&mut self, stack: &mut ExpandedStack, id: TokenID) -> bool {
        stack.forget(id);
        self.move_to_graveyard(id)
    }

    /// Moves every member to the graveyard and empties the expansion.
    pub fn move_stack_to_graveyard(&mut self, stack: &mut ExpandedStack) -> usize {
        let members = stack.member_ids(self);
        let moved = members
            .into_iter()
            .filter(|&id| self.move_to_graveyard(id))
            .count();
        stack.collapse();
        moved
    }

    fn set_stack_tapped(&mut self, stack: &ExpandedStack, tapped: bool) -> usize {
        let members = stack.member_ids(self);
        let mut changed = 0;
        for id in members {
            if let Some(token) = self.get_mut(id) {
                if token.tapped != tapped {
                    token.toggle_tap();
                    changed += 1;
                }
            }
        }
        changed
    }
}
