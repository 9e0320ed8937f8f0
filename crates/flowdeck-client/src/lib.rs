//!
//! Flowdeck Client - HTTP access to the Flowdeck pipeline service
//!
//! This crate talks to the pipeline service on behalf of the editor:
//! pipeline CRUD, save rejection parsing, and streamed result previews.
//! It knows nothing about editing sessions; the editor crate composes it
//! with the graph model and the local cache.

#![forbid(unsafe_code)]

/// Bearer token sources
pub mod auth;

/// Error types
pub mod error;

/// Streamed result previews
pub mod explore;

/// Pipeline CRUD
pub mod pipelines;

// Re-export key types
pub use auth::{StaticTokenProvider, TokenProvider};
pub use error::{ClientError, ClientResult};
pub use explore::{ExploreQuery, ExploreStats, LineDecoder, DONE_SENTINEL};
pub use pipelines::{
    HttpPipelineClient, Page, PageQuery, PipelineApi, PipelineDetail, PipelineSummary,
    SaveOutcome, SaveRejection, REJECTION_PREFIX,
};
