pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod library;
pub mod media;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CatalogError, Result};
