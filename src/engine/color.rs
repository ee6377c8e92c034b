use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// The five colors of magic plus colorless. The declaration order is the
/// canonical sort order used wherever colors are compared.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "U")]
    Blue,
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "C")]
    Colorless,
}

impl Color {
    pub fn symbol(self) -> char {
        use Color::*;
        match self {
            White => 'W',
            Blue => 'U',
            Black => 'B',
            Red => 'R',
            Green => 'G',
            Colorless => 'C',
        }
    }

    /// Parses a single color letter. Anything unknown maps to colorless, the
    /// same way card data with odd color codes is treated.
    pub fn from_symbol(symbol: &str) -> Self {
        use Color::*;
        match symbol {
            "W" => White,
            "U" => Blue,
            "B" => Black,
            "R" => Red,
            "G" => Green,
            _ => Colorless,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A token's colors. Backed by an ordered set so iteration is always sorted
/// and duplicates can't sneak in.
pub type Colors = BTreeSet<Color>;

/// Renders colors sorted and comma joined, e.g. `W,G`.
pub fn colors_label(colors: &Colors) -> String {
    colors
        .iter()
        .map(|color| color.symbol().to_string())
        .collect::<Vec<_>>()
        .join(",")
}
