#![allow(dead_code)]

pub mod test_store;

pub use test_store::{ErrorStore, MemoryStore};
