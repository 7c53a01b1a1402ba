//! CLI commands module.

mod layout;
mod relayout;
mod util;

pub use layout::LayoutCommand;
pub use relayout::RelayoutCommand;

pub(crate) use util::*;
