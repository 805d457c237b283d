//! Common test utilities and helpers.
//!
//! - An in-memory document backend that records every call
//! - Test fixtures and PDF builders
//! - PDF inspection helpers

#![allow(dead_code)]

pub mod fake_backend;
pub mod fixtures;
pub mod pdf_helpers;

pub use fake_backend::*;
pub use fixtures::*;
pub use pdf_helpers::*;
