pub mod error;
pub mod polygon;
pub mod provider;
pub mod sample;
pub mod types;
