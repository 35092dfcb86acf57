#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backend;
pub mod config;
pub mod error;

#[doc(inline)]
pub use crate::backend::{RedisStore, RedisTileCache, RedisTileCacheBuilder};
#[doc(inline)]
pub use crate::config::{CertRequirements, ConnectionSecurity};
#[doc(inline)]
pub use crate::error::Error;
