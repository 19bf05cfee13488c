//! Storage module for document files
//!
//! Keeps uploaded PDFs, proofreading artifacts and generated PDFs on the
//! local filesystem behind the [`DocumentStore`] seam.

mod local_store;

pub use local_store::{DocumentStore, LocalDocumentStore};
