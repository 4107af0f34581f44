// src/core/mod.rs
//! Transport, storage and configuration services behind the session manager

pub mod config_manager;
pub mod fs_ops;
pub mod service_client;
pub mod token_store;

pub use config_manager::ConfigManager;
pub use fs_ops::FsOps;
pub use service_client::{Backend, RequestAuth, ServiceClient};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
