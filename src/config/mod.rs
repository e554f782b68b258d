//! Configuration management for the prestige-check service
//!
//! This module handles all configuration loading from environment variables
//! or a TOML file, validation, and default values for the voting service.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, CompanySeed, HttpSettings, ServiceSettings, VotingSettings};
pub use rating::EloConfig;
