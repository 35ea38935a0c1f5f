//! FormVault: scan pages for forms, save field values as profiles, and
//! restore them later.
//!
//! The core (scanner, selector generator, matcher, filler, store) operates
//! on in-memory page models built from JSON page snapshots; the CLI in
//! `main.rs` is the user-facing surface.

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod page;
pub mod protocol;
pub mod store;

pub use error::{FormVaultError, Result};
