#![doc = include_str!("../README.md")]

pub mod backend;
pub mod error;

pub use backend::{Backend, Redis};
pub use error::ConfigError;
