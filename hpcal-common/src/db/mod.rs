//! Catalog data contracts and store access

pub mod memory;
pub mod models;
pub mod store;

pub use memory::*;
pub use models::*;
pub use store::*;
