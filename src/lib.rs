//! Loumo back-office client.
//!
//! The [`cache`] module keeps independently fetched collections consistent
//! after writes; [`application::admin`] binds every backend resource to it;
//! [`cli`] drives both from the command line.

pub mod application;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infra;
