use serde::{Deserialize, Serialize};

/// Glyph used for a named counter when neither the caller nor the counter
/// type registry has one.
pub const FALLBACK_COUNTER_ICON: &str = "📍";

/// The +1/+1 and -1/-1 counters on a token.
///
/// These annihilate one for one, so after any transition at most one of the
/// two fields is non-zero. Only the net value is meaningful; imported data
/// that carries both kinds is folded into net form by [`TypedCounters::normalize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedCounters {
    #[serde(default)]
    pub plus_one: u32,
    #[serde(default)]
    pub minus_one: u32,
}

impl TypedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a +1/+1 counter on, cancelling a -1/-1 counter if there is one.
    pub fn add_plus(&mut self) {
        if self.minus_one > 0 {
            self.minus_one -= 1;
        } else {
            self.plus_one = self.plus_one.saturating_add(1);
        }
    }

    /// Puts a -1/-1 counter on, cancelling a +1/+1 counter if there is one.
    pub fn add_minus(&mut self) {
        if self.plus_one > 0 {
            self.plus_one -= 1;
        } else {
            self.minus_one = self.minus_one.saturating_add(1);
        }
    }

    pub fn net(&self) -> i64 {
        i64::from(self.plus_one) - i64::from(self.minus_one)
    }

    /// Rewrites the pair so only the net-sign field is populated.
    pub fn normalize(&mut self) {
        let cancelled = self.plus_one.min(self.minus_one);
        self.plus_one -= cancelled;
        self.minus_one -= cancelled;
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.net() == 0
    }
}

/// A named counter such as `loyalty` or `charge`. Stored counts are always
/// at least one; a counter that would drop to zero is removed instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u32,
    pub icon: String,
}

/// Ordered list of named counters, unique by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counters(Vec<Counter>);

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: &str) -> Option<&Counter> {
        self.0.iter().find(|counter| counter.kind == kind)
    }

    pub fn count(&self, kind: &str) -> u32 {
        self.get(kind).map_or(0, |counter| counter.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Counter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bumps `kind` by one, creating it if needed. A new counter takes the
    /// given icon, else the registry default, else [`FALLBACK_COUNTER_ICON`].
    pub fn add(&mut self, kind: &str, icon: Option<&str>, types: &CounterTypes) {
        match self.position(kind) {
            Some(idx) => self.0[idx].count = self.0[idx].count.saturating_add(1),
            None => self.0.push(Counter {
                kind: kind.to_string(),
                count: 1,
                icon: icon.map_or_else(|| types.icon_for(kind), str::to_string),
            }),
        }
    }

    /// Takes one `kind` counter off. Returns false if there was none.
    pub fn remove(&mut self, kind: &str) -> bool {
        let Some(idx) = self.position(kind) else {
            return false;
        };
        if self.0[idx].count > 1 {
            self.0[idx].count -= 1;
        } else {
            self.0.remove(idx);
        }
        true
    }

    /// Sets `kind` to exactly `amount`. Zero or less deletes the entry.
    pub fn set_amount(&mut self, kind: &str, amount: i64, types: &CounterTypes) {
        let idx = self.position(kind);
        if amount <= 0 {
            if let Some(idx) = idx {
                self.0.remove(idx);
            }
            return;
        }

        let count = u32::try_from(amount).unwrap_or(u32::MAX);
        match idx {
            Some(idx) => self.0[idx].count = count,
            None => self.0.push(Counter {
                kind: kind.to_string(),
                count,
                icon: types.icon_for(kind),
            }),
        }
    }

    /// Replaces the icon of an existing counter. Absent kinds are ignored.
    pub fn update_icon(&mut self, kind: &str, icon: &str) -> bool {
        match self.position(kind) {
            Some(idx) => {
                self.0[idx].icon = icon.to_string();
                true
            }
            None => false,
        }
    }

    /// Drops zero counts and merges duplicate kinds. Used on imported data.
    pub fn normalize(&mut self) {
        let mut merged: Vec<Counter> = Vec::with_capacity(self.0.len());
        for counter in self.0.drain(..) {
            if counter.count == 0 {
                continue;
            }
            match merged.iter_mut().find(|seen| seen.kind == counter.kind) {
                Some(seen) => seen.count = seen.count.saturating_add(counter.count),
                None => merged.push(counter),
            }
        }
        self.0 = merged;
    }

    fn position(&self, kind: &str) -> Option<usize> {
        self.0.iter().position(|counter| counter.kind == kind)
    }
}

/// A counter kind the user can pick from, with its display glyph and color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterType {
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
    pub color: String,
}

pub const BUILTIN_COUNTER_TYPES: [(&str, &str, &str); 8] = [
    ("+1/+1", "⬆", "green"),
    ("-1/-1", "⬇", "red"),
    ("loyalty", "⚡", "purple"),
    ("charge", "🔋", "blue"),
    ("energy", "Ⓔ", "yellow"),
    ("poison", "☠", "purple"),
    ("treasure", "💰", "amber"),
    ("food", "🍖", "green"),
];

const DEFAULT_COUNTER_COLOR: &str = "gray";

/// Registry of user-defined counter kinds, consulted together with the
/// built-in ones when a counter needs a default icon.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterTypes {
    #[serde(default)]
    custom: Vec<CounterType>,
}

impl CounterTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new kind. Kinds that already exist, built in or custom,
    /// are left alone.
    pub fn add(&mut self, kind: &str, icon: &str, color: Option<&str>) -> bool {
        if self.default_icon(kind).is_some() {
            return false;
        }
        self.custom.push(CounterType {
            kind: kind.to_string(),
            icon: icon.to_string(),
            color: color.unwrap_or(DEFAULT_COUNTER_COLOR).to_string(),
        });
        true
    }

    pub fn remove(&mut self, kind: &str) {
        self.custom.retain(|counter_type| counter_type.kind != kind);
    }

    pub fn update(&mut self, kind: &str, icon: &str, color: Option<&str>) {
        if let Some(counter_type) = self.custom.iter_mut().find(|ct| ct.kind == kind) {
            counter_type.icon = icon.to_string();
            counter_type.color = color.unwrap_or(DEFAULT_COUNTER_COLOR).to_string();
        }
    }

    pub fn custom(&self) -> &[CounterType] {
        &self.custom
    }

    /// Built-in kinds followed by custom ones.
    pub fn all(&self) -> Vec<CounterType> {
        BUILTIN_COUNTER_TYPES
            .iter()
            .map(|(kind, icon, color)| CounterType {
                kind: kind.to_string(),
                icon: icon.to_string(),
                color: color.to_string(),
            })
            .chain(self.custom.iter().cloned())
            .collect()
    }

    pub fn default_icon(&self, kind: &str) -> Option<&str> {
        BUILTIN_COUNTER_TYPES
            .iter()
            .find(|(builtin, _, _)| *builtin == kind)
            .map(|(_, icon, _)| *icon)
            .or_else(|| {
                self.custom
                    .iter()
                    .find(|ct| ct.kind == kind)
                    .map(|ct| ct.icon.as_str())
            })
    }

    pub fn icon_for(&self, kind: &str) -> String {
        self.default_icon(kind).unwrap_or(FALLBACK_COUNTER_ICON).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minus_then_plus_cancels() {
        let mut counters = TypedCounters::new();
        for _ in 0..3 {
            counters.add_minus();
        }
        counters.add_plus();
        counters.add_plus();
        assert_eq!(counters, TypedCounters { plus_one: 0, minus_one: 1 });
        assert_eq!(counters.net(), -1);
    }

    #[test]
    fn never_both_positive_after_a_transition() {
        let mut counters = TypedCounters::new();
        let steps = [true, true, false, false, false, true, false, true, true, true];
        for plus in steps {
            if plus {
                counters.add_plus();
            } else {
                counters.add_minus();
            }
            assert!(counters.plus_one == 0 || counters.minus_one == 0);
        }
        assert_eq!(counters.net(), 2);
    }

    #[test]
    fn legacy_pairs_normalize_to_net() {
        let legacy = TypedCounters { plus_one: 2, minus_one: 5 };
        assert_eq!(legacy.net(), -3);
        assert_eq!(legacy.normalized(), TypedCounters { plus_one: 0, minus_one: 3 });
    }

    #[test]
    fn loyalty_floor() {
        let types = CounterTypes::new();
        let mut counters = Counters::new();

        counters.set_amount("loyalty", 3, &types);
        assert!(counters.remove("loyalty"));
        assert_eq!(counters.count("loyalty"), 2);

        counters.set_amount("loyalty", 1, &types);
        counters.remove("loyalty");
        assert!(counters.get("loyalty").is_none());

        counters.set_amount("loyalty", 4, &types);
        counters.set_amount("loyalty", 0, &types);
        assert!(counters.is_empty());
    }

    #[test]
    fn add_picks_icon_from_caller_then_registry_then_fallback() {
        let mut types = CounterTypes::new();
        types.add("doom", "💀", None);
        let mut counters = Counters::new();

        counters.add("charge", None, &types);
        counters.add("doom", None, &types);
        counters.add("mystery", None, &types);
        counters.add("lore", Some("📜"), &types);
        counters.add("charge", Some("ignored"), &types);

        assert_eq!(counters.get("charge").unwrap().icon, "🔋");
        assert_eq!(counters.get("charge").unwrap().count, 2);
        assert_eq!(counters.get("doom").unwrap().icon, "💀");
        assert_eq!(counters.get("mystery").unwrap().icon, FALLBACK_COUNTER_ICON);
        assert_eq!(counters.get("lore").unwrap().icon, "📜");
        assert_eq!(counters.len(), 4);
    }

    #[test]
    fn update_icon_ignores_missing_kinds() {
        let types = CounterTypes::new();
        let mut counters = Counters::new();
        assert!(!counters.update_icon("charge", "⚙"));
        counters.add("charge", None, &types);
        assert!(counters.update_icon("charge", "⚙"));
        assert_eq!(counters.get("charge").unwrap().icon, "⚙");
    }

    #[test]
    fn normalize_merges_and_drops_zero() {
        let mut counters: Counters = serde_json::from_str(
            r#"[{"type":"a","count":1,"icon":"x"},{"type":"b","count":0,"icon":"y"},{"type":"a","count":2,"icon":"z"}]"#,
        )
        .unwrap();
        counters.normalize();
        assert_eq!(counters.len(), 1);
        assert_eq!(counters.count("a"), 3);
    }

    #[test]
    fn registry_rejects_duplicates_and_builtins() {
        let mut types = CounterTypes::new();
        assert!(!types.add("loyalty", "?", None));
        assert!(types.add("doom", "💀", Some("black")));
        assert!(!types.add("doom", "☠", None));
        types.update("doom", "☠", None);
        assert_eq!(types.custom()[0].icon, "☠");
        assert_eq!(types.custom()[0].color, "gray");
        assert_eq!(types.all().len(), BUILTIN_COUNTER_TYPES.len() + 1);
        types.remove("doom");
        assert!(types.custom().is_empty());
    }

    #[test]
    fn huge_counts_stay_at_the_ceiling() {
        let types = CounterTypes::new();
        let mut counters = Counters::new();
        counters.set_amount("charge", i64::MAX, &types);
        counters.add("charge", None, &types);
        assert_eq!(counters.count("charge"), u32::MAX);

        let mut merged: Counters = serde_json::from_str(&format!(
            r#"[{{"type":"a","count":{max},"icon":"x"}},{{"type":"a","count":5,"icon":"x"}}]"#,
            max = u32::MAX
        ))
        .unwrap();
        merged.normalize();
        assert_eq!(merged.count("a"), u32::MAX);

        let mut typed = TypedCounters { plus_one: u32::MAX, minus_one: 0 };
        typed.add_plus();
        assert_eq!(typed.plus_one, u32::MAX);
    }
}
