//! Core domain + application logic for the Zorya channel bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / Gemini live
//! behind ports (traits) implemented in adapter crates.

pub mod calendar;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod generation;
pub mod history;
pub mod limits;
pub mod logging;
pub mod messaging;
pub mod posts;
pub mod prompts;
pub mod publisher;
pub mod readings;
pub mod scheduler;
pub mod users;
pub mod zodiac;

pub use errors::{Error, Result};
