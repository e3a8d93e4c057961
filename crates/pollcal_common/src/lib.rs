// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP client utilities
pub mod logging; // Logging utilities
pub mod models; // Shared data structures
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, external_service_error, internal_error, not_found, Context, HttpStatusCode,
    PollcalError,
};

// Re-export HTTP utilities for easier access
pub use http::{create_client, HTTP_CLIENT};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level};
