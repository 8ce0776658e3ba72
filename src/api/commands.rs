//! Command modules called by the widget layer
//!
//! ## Architecture
//!
//! - `units`: conversion engine (convert, list units, parse free text)
//! - `tools`: catalog, favorites, recents and widget evaluation
//! - `settings`: settings persistence

pub mod units;
pub mod tools;
pub mod settings;
