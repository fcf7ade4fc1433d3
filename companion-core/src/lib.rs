//! # companion-core
//!
//! Core library for Code Companion - tools that sit next to an AI coding
//! assistant and keep track of what it did and what changed.
//!
//! This library provides:
//! - Domain types for sessions, messages and content blocks
//! - Session history: metadata scans and full transcript reconstruction
//!   from append-only JSONL logs
//! - A change notification coalescer that turns raw filesystem events into
//!   debounced, categorized signals
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use companion_core::history::{provider_from_config, HistoryProvider};
//! use companion_core::Config;
//! use std::path::Path;
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // List sessions for a project and load the newest one
//! let provider = provider_from_config(&config.history).expect("unknown provider");
//! let sessions = provider.sessions_for_path(Path::new("/home/me/project"));
//! if let Some(latest) = sessions.first() {
//!     let messages = provider.load_session(latest);
//!     println!("{} has {} messages", latest.id, messages.len());
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use history::{load_full, scan_metadata, HistoryProvider};
pub use monitor::{Category, FileMonitor, Notification};
pub use types::*;

// Public modules
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod logging;
pub mod monitor;
pub mod types;
