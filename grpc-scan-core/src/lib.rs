//! Core library for black-box gRPC service and method discovery.
//!
//! Five cooperating components do the work, listed leaves-first:
//! [`transport`] decides whether a peer speaks gRPC at all, [`oracle`]
//! classifies a single candidate probe, [`reflection`] enumerates services
//! via server reflection when available, [`candidates`] produces the
//! `(service, methods)` stream to probe, and [`orchestrator`] composes all
//! of the above into a full per-target scan. [`detect`] reuses the
//! transport probe across many targets for the cheaper yes/no check.

pub mod candidates;
pub mod codec;
pub mod connection;
pub mod detect;
pub mod error;
pub mod model;
pub mod oracle;
pub mod orchestrator;
pub mod reflection;
pub mod transport;

pub use error::{Result, ScanError};
pub use model::{DetectResult, ScanMode, ScanResult};
