//! Terminal UI components.
//!
//! - [`TerminalSurface`]: the document surface behind the editor pane
//! - [`render`]: query bar, results pane, document pane and status rows

mod render;
mod status;
mod terminal_surface;

pub use render::{body_rows, render, split_main_columns};
pub use terminal_surface::TerminalSurface;

pub const RESULTS_WIDTH_PERCENT: u16 = 35;
pub const DOCUMENT_WIDTH_PERCENT: u16 = 65;
