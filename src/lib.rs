//! Board-state tracker for card game tokens: spawn tokens, tap them, put
//! counters on them, and see identical ones folded into stacks.

pub mod engine;
pub mod lookup;
