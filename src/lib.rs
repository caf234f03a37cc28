pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod server;
pub mod utils;

pub use error::{AppError, Result};
