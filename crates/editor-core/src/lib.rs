mod core;
mod ops;
mod plugin;
mod serde_value;
mod style;
mod transforms;

pub use crate::core::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::serde_value::*;
pub use crate::style::*;
pub use crate::transforms::*;
