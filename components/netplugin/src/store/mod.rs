//! Distributed store address handling.

pub mod locator;

pub use locator::{StoreSelector, locate};
