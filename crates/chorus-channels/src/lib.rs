//! # chorus-channels
//!
//! Messaging platform integrations for Chorus.

pub mod telegram;
