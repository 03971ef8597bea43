//! # chorus-tracker
//!
//! Burst detection for Chorus.
//!
//! - **[`normalize()`]** maps a message payload to the [`ContentKey`] that
//!   identifies "the same content" across senders.
//! - **[`Tracker`]** counts distinct senders per `(chat, key)` inside a
//!   fixed-origin window and fires once per qualifying burst.
//! - **[`Sweeper`]** periodically evicts records that expired without firing.

mod normalize;
mod sweeper;
mod tracker;

pub use normalize::{normalize, ContentKey};
pub use sweeper::Sweeper;
pub use tracker::{BurstRecord, Decision, Tracker, TrackerStats};
