//! Message surface exposed to the plugin UI

pub mod commands;
