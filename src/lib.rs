//! Core library for Kasten, an editor for flattened archive messages.
//! Provides the typed message container, the binary flatten/unflatten codec
//! with round-trip guarantees, and the selection-path machinery the GUI uses
//! to edit values nested arbitrarily deep.

mod archive;
mod editors;
mod gui;
mod message;
mod selection;
pub mod statics;
mod value;
mod wire;

pub use archive::{ImportMode, LoadedArchive};
pub use editors::{EditorBuffer, EditorState};
pub use gui::run_gui;
pub use message::{ArchiveMessage, FieldInfo, MessageError};
pub use selection::{ChainLink, SelectionError, SelectionTarget, commit_chain, resolve_selection};
pub use value::{
    AffineTransform, Alignment, Color, EntryRef, FieldValue, HorizontalAlignment, NodeRef, Point,
    Rect, Size, TypeCode, VerticalAlignment,
};
pub use wire::{WireError, flatten, unflatten};
