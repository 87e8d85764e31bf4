//! 类型模块：调用结果与下载产物。
//!
//! # Types Module
//!
//! Value types shared by the client and the resource model.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Outcome`] | Result of a call whose HTTP errors may be recorded instead of raised |
//! | [`Artifact`] | Downloaded template or graph with its suggested file name |
//! | [`TemplateKind`] | Which side of an algorithm a template/graph describes |

pub mod artifact;
pub mod outcome;

pub use artifact::{Artifact, TemplateKind};
pub use outcome::Outcome;
