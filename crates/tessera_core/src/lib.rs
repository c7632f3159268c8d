//! Core data types for the Tessera narrative library.
//!
//! This crate provides the foundation data types used across all Tessera
//! interfaces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod input;
mod media;
mod message;
mod output;
mod request;
mod role;
mod telemetry;

pub use input::Input;
pub use media::MediaSource;
pub use message::{Message, MessageBuilder};
pub use output::Output;
pub use request::{
    GenerateRequest, GenerateRequestBuilder, GenerateResponse, ResponseFormat,
};
pub use role::Role;
pub use telemetry::init_telemetry;
