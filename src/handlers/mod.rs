pub mod config;
pub mod incoming;

pub use config::*;
pub use incoming::*;
