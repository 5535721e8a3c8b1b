mod client;
mod collate;
mod columns;
mod config;
mod pagination;
mod query;
mod record;
mod selection;
mod server;
mod store;

pub use crate::client::*;
pub use crate::collate::*;
pub use crate::columns::*;
pub use crate::config::*;
pub use crate::pagination::*;
pub use crate::query::*;
pub use crate::record::*;
pub use crate::selection::*;
pub use crate::server::*;
pub use crate::store::*;
