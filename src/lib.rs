#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod listener;
pub mod relay;
pub mod repair;
pub mod signer;
pub mod telemetry;
pub mod types;
pub mod webhook;

pub type Result<T> = std::result::Result<T, error::Error>;
