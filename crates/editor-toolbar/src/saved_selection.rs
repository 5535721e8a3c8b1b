use std::cell::RefCell;
use std::rc::Rc;

use blockdesk_editor_core::{Editor, Point, RangeSelection, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRange {
    pub anchor: Point,
    pub focus: Point,
}

/// The last range selection the toolbar saw.
///
/// Lives outside render state so that a popover stealing focus does not lose
/// the user's selection. Clones share one cell.
#[derive(Debug, Clone, Default)]
pub struct SavedSelection {
    cell: Rc<RefCell<Option<SavedRange>>>,
}

impl SavedSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, range: &RangeSelection) {
        *self.cell.borrow_mut() = Some(SavedRange {
            anchor: range.anchor.clone(),
            focus: range.focus.clone(),
        });
    }

    pub fn get(&self) -> Option<SavedRange> {
        self.cell.borrow().clone()
    }

    pub fn clear(&self) {
        self.cell.borrow_mut().take();
    }

    /// Makes the saved range the editor selection. Fails when nothing is
    /// saved or either endpoint no longer resolves.
    pub fn restore(&self, editor: &mut Editor) -> bool {
        let Some(saved) = self.get() else {
            return false;
        };
        if !editor.contains(saved.anchor.key) || !editor.contains(saved.focus.key) {
            debug!(
                anchor = %saved.anchor.key,
                focus = %saved.focus.key,
                "saved selection no longer resolves"
            );
            return false;
        }
        editor.set_selection(Some(Selection::range(saved.anchor, saved.focus)));
        true
    }
}
