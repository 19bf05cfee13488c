//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the document storage adapter.

pub mod storage;
