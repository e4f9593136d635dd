pub mod config;
pub mod constants;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod pipeline;
