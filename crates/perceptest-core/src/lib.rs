//! perceptest-core: question bank, session state machine, and scoring.
//!
//! This crate defines the data model, corpus loaders, the per-session state
//! machine, and the category aggregation that the rest of perceptest builds on.

pub mod answers;
pub mod bank;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod mock;
pub mod model;
pub mod results;
pub mod scoring;
pub mod session;
pub mod summary;
pub mod traits;
