//! Endpoint configuration shared by every part of the client

mod config;
mod endpoint;

pub use config::{ApiConfig, EnvInputs, Mode, Overrides, resolve_assets_url, resolve_base_url};
pub use endpoint::{Endpoint, Endpoints};

/// [`ApiConfig::get_api_url`] on the process-wide configuration
pub fn get_api_url(endpoint: &str) -> String {
    ApiConfig::global().get_api_url(endpoint)
}

/// [`ApiConfig::get_assets_url`] on the process-wide configuration
pub fn get_assets_url(path: &str) -> String {
    ApiConfig::global().get_assets_url(path)
}
