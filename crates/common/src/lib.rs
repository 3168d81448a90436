pub mod config;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "github")]
pub mod github;
