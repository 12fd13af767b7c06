//! Library exports for the product dataset preparation tools.
/// Bulk image acquisition from manifest rows.
pub mod acquire;
/// Per-user app directory resolution.
pub mod app_dirs;
/// TOML configuration for unit tables and acquisition defaults.
pub mod config;
/// Shared HTTP helpers.
pub mod http_client;
/// Tracing setup with rotating log files.
pub mod logging;
/// Manifest loading, sampling and deduplication.
pub mod manifest;
/// Measurement parsing against allowed unit tables.
pub mod units;
