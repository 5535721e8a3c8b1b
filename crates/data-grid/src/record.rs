use std::borrow::Cow;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// A row the grid can filter, sort and page.
pub trait GridRecord {
    /// Column identifier.
    type Field: Copy + Eq + Ord + Hash + Debug + 'static;
    type Id: Clone + Eq + Hash + Debug;

    /// Fields matched by the "all" filter, joined in this order.
    fn searchable_fields() -> &'static [Self::Field];

    fn field_text(&self, field: Self::Field) -> Cow<'_, str>;

    fn id(&self) -> Self::Id;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridField {
    Id,
    Customer,
    Email,
    Role,
    Status,
}

/// Customer row shown by the default grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub id: String,
    pub customer: String,
    pub email: String,
    pub role: String,
    pub status: String,
}

impl GridRow {
    pub fn new(
        id: impl Into<String>,
        customer: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            customer: customer.into(),
            email: email.into(),
            role: role.into(),
            status: status.into(),
        }
    }
}

impl GridRecord for GridRow {
    type Field = GridField;
    type Id = String;

    fn searchable_fields() -> &'static [GridField] {
        &[
            GridField::Id,
            GridField::Customer,
            GridField::Email,
            GridField::Role,
            GridField::Status,
        ]
    }

    fn field_text(&self, field: GridField) -> Cow<'_, str> {
        Cow::Borrowed(match field {
            GridField::Id => &self.id,
            GridField::Customer => &self.customer,
            GridField::Email => &self.email,
            GridField::Role => &self.role,
            GridField::Status => &self.status,
        })
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}
