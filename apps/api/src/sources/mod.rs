//! Ingestion adapters. Each adapter maps one external source into
//! `RawFeedbackItem`s and fails independently of its siblings.

pub mod csv;
pub mod handlers;
pub mod reddit;
pub mod sheets;
