//! # compredict-client
//!
//! COMPREDICT AI Core 服务的阻塞式 Rust 客户端：提交预测/训练请求、查询或取消异步任务、
//! 下载模板与图表，并解密服务端以 RSA-OAEP 加密返回的结果。
//!
//! Blocking client for the COMPREDICT AI Core algorithm service.
//!
//! ## Overview
//!
//! The service runs algorithms remotely. A prediction either comes back right
//! away as a [`Prediction`] or is escalated to a background job, a [`Task`],
//! which the caller refreshes with [`Task::update`] until it reaches a terminal
//! state. Results can be returned encrypted with the caller's public key; the
//! client decrypts them block by block with the configured private key.
//!
//! ## Key Features
//!
//! - **Typed resources**: service payloads map onto [`Algorithm`], [`Version`],
//!   [`Task`] and [`Prediction`], with unknown keys kept in an `extra` map
//! - **Explicit failures**: HTTP errors either raise or yield
//!   [`Outcome::Failed`] with the body available from [`Client::last_error`]
//! - **Encrypted results**: chunked RSA-OAEP decryption in [`crypto`]
//! - **Pluggable transport**: [`transport::Transport`] is the seam for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use compredict_client::{Client, Outcome, PredictOptions, Resource};
//! use serde_json::json;
//!
//! fn main() -> compredict_client::Result<()> {
//!     let client = Client::new("0123456789abcdef0123456789abcdef01234567")?;
//!
//!     let features = json!([{"speed": 12.5, "torque": 140.0}]);
//!     match client.get_prediction("ecolife", features, &PredictOptions::new())? {
//!         Outcome::Resource(Resource::Prediction(p)) => println!("{:?}", p.predictions()),
//!         Outcome::Resource(Resource::Task(mut task)) => {
//!             while !task.is_terminal() {
//!                 std::thread::sleep(std::time::Duration::from_secs(5));
//!                 task.update()?;
//!             }
//!             println!("{:?}", task.predictions());
//!         }
//!         Outcome::Failed => eprintln!("request failed: {:?}", client.last_error()),
//!         other => eprintln!("unexpected answer: {:?}", other.text()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, per-call options and endpoints |
//! | [`resources`] | Typed resources and the payload mapper |
//! | [`transport`] | Request encoding, execution and HTTP outcome classification |
//! | [`crypto`] | Chunked RSA-OAEP decryption |
//! | [`config`] | File / environment / keyring configuration |
//! | [`types`] | Call outcomes and downloaded artifacts |

pub mod client;
pub mod config;
pub mod crypto;
pub mod resources;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{Client, ClientBuilder, Evaluate, Features, FitOptions, PredictOptions};
pub use config::ClientConfig;
pub use crypto::{OaepDigest, PrivateKey};
pub use resources::{Algorithm, Algorithms, Prediction, Resource, ResourceKind, Task, TaskStatus, Version};
pub use types::{Artifact, Outcome, TemplateKind};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
