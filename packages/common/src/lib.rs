//! Shared building blocks for the Movies Space backend.
//!
//! Currently this is the content-addressed blob storage that backs user
//! uploads.

pub mod storage;
