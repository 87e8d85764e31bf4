//! AI Core client: configuration plus the service's endpoint surface.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
mod endpoint;
#[cfg(test)]
pub(crate) mod mock;
pub mod options;
pub mod validation;

pub use self::core::Client;
pub use builder::ClientBuilder;
pub use options::{Evaluate, Features, FitOptions, PredictOptions};
pub use validation::{validate_token, validate_url, TOKEN_LENGTH};
