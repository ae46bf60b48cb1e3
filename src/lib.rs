//! Manual test management: folder hierarchies of test cases with default
//! versions and manual scenarios, shared attributes, test plans with
//! milestones, datasets bound to environments, and folder export.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod repository;
pub mod service;

pub use error::{Result, TmsError};
pub use service::Tms;
