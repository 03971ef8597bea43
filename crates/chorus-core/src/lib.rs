//! # chorus-core
//!
//! Core types, traits, configuration, and error handling for Chorus.

pub mod config;
pub mod error;
pub mod message;
pub mod traits;
