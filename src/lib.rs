//! Chat message disentanglement.
//!
//! Messages of a channel are paired with nearby earlier messages, each pair is
//! scored by a binary classifier over handcrafted features, and a single greedy
//! pass groups the messages into conversations.

pub mod classifier;
pub mod config;
pub mod display;
pub mod error;
pub mod features;
pub mod models;
pub mod processing;
pub mod utils;

pub use config::DisentanglerConfig;
pub use error::{DisentangleError, Result};
pub use processing::Disentangler;
