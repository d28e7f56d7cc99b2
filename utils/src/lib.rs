pub use crate::health::{ProbeOptions, check_backend_health, check_backend_health_with, health_uri};

mod health;
