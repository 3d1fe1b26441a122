//! freedb ingestion library - shared modules for all binaries.

pub mod config;
pub mod fields;
pub mod identity;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod safety;
pub mod sink;
pub mod source;
pub mod text;
