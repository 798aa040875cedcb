pub mod config;
pub mod domain;
pub mod inventory;
pub mod metrics;
pub mod service;
pub mod store;
