//! Core document model, mutation engine, and classification indices for
//! block.properties-style files.
//!
//! # Design
//!
//! - No IO: text goes in, text comes out. File and session handling live in
//!   `blockprops-loader`.
//! - Untouched content is preserved byte-for-byte; only structurally
//!   mutated properties are rewritten, canonically, forever after.
//! - Single-threaded by construction: the [`manager::Manager`] is the one
//!   mutable owner of a session and is driven strictly sequentially.

pub mod automap;
pub mod document;
pub mod element;
pub mod history;
pub mod manager;
pub mod parser;
pub mod suggest;
