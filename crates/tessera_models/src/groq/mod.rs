//! Groq OpenAI-compatible chat-completions driver.

mod client;
mod conversion;
mod dto;

pub use client::GroqClient;
