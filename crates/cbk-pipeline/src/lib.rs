//! cbk-pipeline: encrypt-then-store and fetch-then-decrypt
//!
//! A [`Pipeline`] owns one cipher and one object store and is reused across
//! calls. Objects are buffered whole between stages: the authenticated cipher
//! checks a single tag over the full ciphertext, and no plaintext reaches the
//! caller before that check passes.

pub mod error;
pub mod pipeline;

pub use error::{PipelineError, PipelineResult, Stage};
pub use pipeline::{DownloadReport, Pipeline, UploadReport};
