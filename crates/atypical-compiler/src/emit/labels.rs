//! Label allocation and binding.

use crate::bytecode::Label;

/// Hands out labels and remembers which ones were placed.
#[derive(Debug, Default)]
pub struct LabelManager {
    next: u32,
    bound: Vec<bool>,
}

impl LabelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh, unbound label.
    pub fn create(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;
        self.bound.push(false);
        label
    }

    /// Mark `label` as placed. Returns `false` if it was placed before.
    pub fn bind(&mut self, label: Label) -> bool {
        match self.bound.get_mut(label.0 as usize) {
            Some(bound) if !*bound => {
                *bound = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_bound(&self, label: Label) -> bool {
        self.bound.get(label.0 as usize).copied().unwrap_or(false)
    }

    pub fn count(&self) -> u32 {
        self.next
    }
}
