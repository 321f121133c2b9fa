// Core architecture components
mod cache;
mod config;
mod error;
mod manager;
mod manager_builder;
mod notifier;
mod rate_limit;
mod time_utils;

// Code generation hooks
pub mod generator;

// Storage and sweep systems
pub mod storage;
pub mod sweep;

// Core components exports
pub use cache::SessionCache;
pub use config::{ConfigPreset, OtpConfig};
pub use error::OtpError;
pub use generator::{CODE_LENGTH, CodeGeneratorFn, TimeProviderFn, secure_code};
pub use manager::OtpManager;
pub use manager_builder::OtpManagerBuilder;
pub use notifier::Notifier;
pub use rate_limit::RateLimiter;

// Storage and sweep exports
pub use storage::{CredentialRecord, CredentialStore, MemoryStore, StorageStats};
pub use sweep::SweepHandle;
