mod color;
mod color_picker;
mod config;
mod controller;
mod floating;
mod format;
mod geometry;
mod saved_selection;
mod side_actions;
mod suppression;

pub use crate::color::*;
pub use crate::color_picker::*;
pub use crate::config::*;
pub use crate::controller::*;
pub use crate::floating::*;
pub use crate::format::*;
pub use crate::geometry::*;
pub use crate::saved_selection::*;
pub use crate::side_actions::*;
pub use crate::suppression::*;
