use serde::{Deserialize, Serialize};

pub const MIN_STACK_SIZE_RANGE: (usize, usize) = (2, 10);
pub const QUICK_CREATE_RANGE: (u32, u32) = (1, 999);

/// User preferences that shape how the board is grouped and how many tokens
/// quick-create prints at once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub auto_stack_enabled: bool,
    min_stack_size: usize,
    quick_create_quantity: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_stack_enabled: true,
            min_stack_size: 2,
            quick_create_quantity: 1,
        }
    }
}

impl Settings {
    pub fn min_stack_size(&self) -> usize {
        self.min_stack_size
    }

    /// Clamped to [`MIN_STACK_SIZE_RANGE`].
    pub fn set_min_stack_size(&mut self, size: usize) {
        let (lo, hi) = MIN_STACK_SIZE_RANGE;
        self.min_stack_size = size.clamp(lo, hi);
    }

    pub fn quick_create_quantity(&self) -> u32 {
        self.quick_create_quantity
    }

    /// Clamped to [`QUICK_CREATE_RANGE`].
    pub fn set_quick_create_quantity(&mut self, quantity: u32) {
        let (lo, hi) = QUICK_CREATE_RANGE;
        self.quick_create_quantity = quantity.clamp(lo, hi);
    }

    /// Re-applies the setter clamps to values read from disk.
    pub fn sanitized(mut self) -> Self {
        self.set_min_stack_size(self.min_stack_size);
        self.set_quick_create_quantity(self.quick_create_quantity);
        self
    }
}
