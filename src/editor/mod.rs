//! Structured note editing.
//!
//! A [`Document`] holds a single-line title, tags and a multi-line body, each
//! text region backed by a [`LineBuffer`]. Editing goes through a [`Surface`],
//! which owns the caret; the engine functions read and place the caret via the
//! cursor model so any surface (headless or terminal) behaves the same.

mod buffer;
mod cursor;
mod document;
mod engine;
mod line;
mod surface;

pub use buffer::LineBuffer;
pub use cursor::{
    Caret, Cursor, Field, Motion, Scope, absolute_position, at_end, at_start, focus, move_caret,
    position, set_absolute_position, set_position,
};
pub use document::Document;
pub(crate) use document::single_line;
pub use engine::{
    Clipboard, Edit, SEPARATOR, delete_backward, delete_forward, insert_newline, insert_text,
    paste,
};
pub use line::{EMPTY_LINE_SENTINEL, Line};
pub use surface::{HeadlessSurface, Surface};
