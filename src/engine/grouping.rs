use std::{collections::HashMap, fmt};

use super::prelude::*;

/// Canonical equality key for stacking. Two tokens with the same key are
/// interchangeable on the board.
///
/// Every free-text part is length prefixed, so names or abilities that
/// happen to contain separator characters can't make two different tokens
/// collide.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    /// Builds the key from everything that changes how a token looks or plays.
    /// Identity, creation time, art, haste and the named counter list are
    /// deliberately left out.
    pub fn of(token: &Token) -> Self {
        let mut key = String::new();
        push_part(&mut key, &token.name);

        let stats = match token.stats {
            Some(stats) => format!("{}/{}", stats.power, stats.toughness),
            None => "-/-".to_string(),
        };
        push_part(&mut key, &stats);
        push_part(&mut key, &colors_label(&token.colors));
        push_part(&mut key, token.abilities.as_deref().unwrap_or(""));
        push_part(&mut key, if token.tapped { "tapped" } else { "untapped" });
        push_part(&mut key, if token.summoning_sickness { "sick" } else { "ready" });
        push_part(&mut key, &format!("net:{}", token.typed_counters.net()));

        let mut attachments: Vec<(&str, &str)> = token
            .attachments
            .iter()
            .map(|a| (a.name.as_str(), a.effect.as_str()))
            .collect();
        attachments.sort_unstable();
        push_part(&mut key, &attachments.len().to_string());
        for (name, effect) in attachments {
            push_part(&mut key, name);
            push_part(&mut key, effect);
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn push_part(key: &mut String, part: &str) {
    key.push_str(&part.len().to_string());
    key.push(':');
    key.push_str(part);
    key.push(';');
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupKey({:?})", self.0)
    }
}

/// Shorthand for [`GroupKey::of`] rendered to a string.
pub fn group_key(token: &Token) -> String {
    GroupKey::of(token).0
}

/// A read-only view of tokens that display as one unit. Groups borrow from
/// the collection they were built from and are rebuilt on every query.
#[derive(Debug, Clone)]
pub struct TokenGroup<'a> {
    pub key: GroupKey,
    pub tokens: Vec<&'a Token>,
}

impl<'a> TokenGroup<'a> {
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// The token shown for the whole group.
    pub fn representative(&self) -> &'a Token {
        self.tokens[0]
    }

    pub fn is_stack(&self) -> bool {
        self.tokens.len() > 1
    }

    pub fn ids(&self) -> Vec<TokenID> {
        self.tokens.iter().map(|token| token.id).collect()
    }
}

/// Partitions `tokens` into display groups.
///
/// Tokens sharing a key form one group when there are at least
/// `min_stack_size` of them; otherwise each is emitted as its own group so
/// every token appears exactly once. Keys appear in first-seen order and
/// members keep their input order. A threshold of zero behaves like one.
pub fn group(tokens: &[Token], min_stack_size: usize) -> Vec<TokenGroup<'_>> {
    let min_stack_size = min_stack_size.max(1);

    let mut buckets: Vec<(GroupKey, Vec<&Token>)> = vec![];
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    for token in tokens {
        let key = GroupKey::of(token);
        match index.get(&key) {
            Some(&idx) => buckets[idx].1.push(token),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![token]));
            }
        }
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for (key, members) in buckets {
        if members.len() >= min_stack_size {
            groups.push(TokenGroup { key, tokens: members });
        } else {
            groups.extend(members.into_iter().map(|token| TokenGroup {
                key: key.clone(),
                tokens: vec![token],
            }));
        }
    }
    groups
}

/// One group per token, for when stacking is switched off.
pub fn ungrouped(tokens: &[Token]) -> Vec<TokenGroup<'_>> {
    tokens
        .iter()
        .map(|token| TokenGroup {
            key: GroupKey::of(token),
            tokens: vec![token],
        })
        .collect()
}
