//! Library crate for inactive-user-manager.
//!
//! This crate exposes the building blocks of the TUI:
//! - Remote directory client and wire types (`api`)
//! - Application state, event loop, and bulk workflow (`app`)
//! - Error and result types (`error`)
//! - Inactivity filter resolution (`filter`)
//! - In-memory search helpers (`search`)
//! - UI rendering and widgets (`ui`)
//! - Tabular view and selection model (`view`)
//!
//! It is used by the `inactive-user-manager` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod error;
pub mod filter;
pub mod search;
pub mod ui;
pub mod view;

// Re-export commonly used items at the crate root for convenience
pub use error::{ApiError, ApiResult, Result};
