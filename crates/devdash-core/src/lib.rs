pub mod collab;
pub mod config;
pub mod error;
pub mod http;
pub mod io;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use error::{DashError, Result};
