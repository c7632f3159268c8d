//! Generation backend drivers for Tessera.
//!
//! Currently provides the Groq OpenAI-compatible chat-completions driver,
//! which implements both [`tessera_interface::TextGeneration`] and
//! [`tessera_interface::VisionAnalysis`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod groq;

pub use config::GroqConfig;
pub use groq::GroqClient;
