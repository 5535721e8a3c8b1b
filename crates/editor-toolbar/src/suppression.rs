use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

/// Reference-counted "no text selection while dragging" switch.
///
/// Every holder gets a [`SuppressionGuard`]; suppression stays active while
/// any guard is alive, so each exit path of a drag releases it by dropping
/// its guard. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct SelectionSuppression {
    holders: Rc<Cell<usize>>,
}

impl SelectionSuppression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, reason: &'static str) -> SuppressionGuard {
        let holders = self.holders.get() + 1;
        self.holders.set(holders);
        trace!(reason, holders, "selection suppression acquired");
        SuppressionGuard {
            holders: self.holders.clone(),
            reason,
        }
    }

    pub fn is_active(&self) -> bool {
        self.holders.get() > 0
    }
}

#[derive(Debug)]
#[must_use = "suppression is released when the guard is dropped"]
pub struct SuppressionGuard {
    holders: Rc<Cell<usize>>,
    reason: &'static str,
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        let holders = self.holders.get().saturating_sub(1);
        self.holders.set(holders);
        trace!(reason = self.reason, holders, "selection suppression released");
    }
}
