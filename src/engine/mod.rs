mod util;

pub mod color;
pub mod counters;
pub mod token;
pub mod grouping;
pub mod board;
pub mod stack;
pub mod settings;
pub mod snapshot;

pub mod prelude;
