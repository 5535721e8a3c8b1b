//! gpui rendering of the block editor toolbar.
//!
//! Everything here is stateless: groups render a snapshot of
//! [`blockdesk_toolbar::ToolbarState`] and forward clicks to the host, which
//! owns the [`blockdesk_toolbar::ToolbarController`] and the editor.

mod buttons;
mod groups;
mod icon;

pub use crate::buttons::*;
pub use crate::groups::*;
pub use crate::icon::*;
