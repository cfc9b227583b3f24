//! LSP Protocol Implementation
//!
//! Publishes analysis findings as diagnostics, plus hover, completion and
//! document symbols for the supported codes.

pub mod backend;
pub mod document;
pub mod handlers;
pub mod server;

pub use backend::Backend;
