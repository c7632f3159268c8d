//! Error types for the Tessera library.
//!
//! This crate provides the foundation error types used throughout the Tessera
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use tessera_error::{TesseraResult, BackendError, BackendErrorKind};
//!
//! fn fetch_completion() -> TesseraResult<String> {
//!     Err(BackendError::new(BackendErrorKind::Timeout))?
//! }
//!
//! match fetch_completion() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod epic;
mod error;
mod json;
mod store;

pub use backend::{BackendError, BackendErrorKind};
pub use config::ConfigError;
pub use epic::{EpicError, EpicErrorKind};
pub use error::{TesseraError, TesseraErrorKind, TesseraResult};
pub use json::JsonError;
pub use store::{StoreError, StoreErrorKind};
