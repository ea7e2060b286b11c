//! Music Catalog Library
//!
//! This library exposes modules for integration testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod state;
pub mod storage;
pub mod templates;
pub mod test_utils;
