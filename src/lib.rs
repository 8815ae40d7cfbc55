//! Local to-do list: a versioned SQLite task and tag store, deadline-window
//! reminders behind a pluggable alarm service, and completion statistics.

pub mod agenda;
pub mod clock;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod output;
pub mod pin;
pub mod reminder;
pub mod stats;
pub mod store;
pub mod tags;
