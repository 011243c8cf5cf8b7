//! The feedback domain: typed models, the classifier client, the store,
//! and the aggregator.

pub mod classifier;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod stats;
pub mod store;
