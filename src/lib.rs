pub mod cli;
pub mod db;
pub mod error;
pub mod models;
pub mod processors;
pub mod sources;
pub mod utils;

pub use error::{EtlError, Result};
