//! core
//!
//! Local storage for gitpr.
//!
//! # Modules
//!
//! - [`paths`] - Where the config and key files live
//! - [`config`] - Persisted provider configuration
//! - [`fs`] - Atomic, owner-only file writes

pub mod config;
pub mod fs;
pub mod paths;
