//! marginalia: review comments stored inline in the markdown documents they annotate.
//!
//! Comments live in the document itself as hidden `<!--comment ... -->` markers, so a document
//! carries its own review history. The library scans a body into commentable sections, attaches
//! each marker to its section, and rewrites bodies to add, edit or delete exactly one marker.

pub mod app_state;
pub mod config;
pub mod error;
pub mod input;
pub mod marker;
pub mod mutation;
pub mod scanner;
pub mod section;
pub mod store;

pub use error::{Error, Result};
