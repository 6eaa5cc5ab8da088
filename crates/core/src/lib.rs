//! Lumifi core types and utilities

pub mod config;
pub mod error;
pub mod validation;

pub use config::{
    ApiConfig, DEFAULT_IP_LOOKUP_URL, DEFAULT_USER_AGENT, IpLookupConfig, LumifiConfig,
};
pub use error::{CoreError, CoreResult, ErrorContext};
pub use validation::{ValidateConfig, is_valid_dea_number, is_valid_email};
