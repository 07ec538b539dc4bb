//! Image server for a pictionary game
//!
//! Turns a dictionary entry (word, part of speech, definition) into a sketch
//! image via OpenAI, caching the resulting image reference so repeated
//! requests for the same entry never regenerate.

pub mod ai;
pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
