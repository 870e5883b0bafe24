//! Command handlers, grouped by resource family.

pub mod catalog;
pub mod clients;
pub mod content;
pub mod logistics;
pub mod orders;
pub mod watch;
