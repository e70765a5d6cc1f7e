//! # Catalog Common Library
//!
//! Shared code for the catalog services including:
//! - Database initialization and the catalog table schema
//! - Row models for catalog records
//! - Configuration loading and root folder resolution

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
