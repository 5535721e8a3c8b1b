use std::hash::Hash;

/// Checked row ids, in the order they were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSelection<Id> {
    ids: Vec<Id>,
}

impl<Id> Default for RowSelection<Id> {
    fn default() -> Self {
        Self { ids: Vec::new() }
    }
}

impl<Id: Clone + Eq + Hash> RowSelection<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    pub fn is_selected(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    pub fn set_row(&mut self, id: Id, checked: bool) {
        if checked {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        } else {
            self.ids.retain(|existing| *existing != id);
        }
    }

    pub fn toggle_row(&mut self, id: Id) {
        let checked = !self.is_selected(&id);
        self.set_row(id, checked);
    }

    /// Checks or unchecks every visible row. Selected rows outside `visible`
    /// are left alone.
    pub fn set_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a Id>, checked: bool)
    where
        Id: 'a,
    {
        for id in visible {
            self.set_row(id.clone(), checked);
        }
    }

    /// Selects all visible rows unless they already are, then clears them.
    pub fn toggle_all(&mut self, visible: &[Id]) {
        let checked = !self.all_selected(visible);
        self.set_all(visible, checked);
    }

    pub fn all_selected(&self, visible: &[Id]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.is_selected(id))
    }

    pub fn some_selected(&self, visible: &[Id]) -> bool {
        visible.iter().any(|id| self.is_selected(id))
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
