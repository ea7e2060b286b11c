pub mod entities;
pub mod models;
pub mod repositories;
pub mod store;

pub use models::*;
