pub use crate::engine::{
    color::*,
    counters::*,
    token::*,
    grouping::*,
    board::*,
    stack::*,
    settings::*,
    util::id::*,
};
