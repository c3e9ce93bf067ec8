//! # Quill Core
//!
//! The domain layer of the Quill API.
//! This crate contains the entities and the ports infrastructure must implement;
//! it has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::RepoError;
