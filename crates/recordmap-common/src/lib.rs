//! Shared plumbing for recordmap users: configuration files.

pub mod config;

pub type Result<T> = anyhow::Result<T>;
