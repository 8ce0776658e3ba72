//! Command facade for the widget layer

pub mod commands;
