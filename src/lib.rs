//! An item catalog CRUD server and client

#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod client;
pub mod config;
pub mod http;
pub mod query;
pub mod server;
pub mod state;
mod store;

// Re-export to be able to construct your own catalog server
pub use store::{Document, ItemStore};
