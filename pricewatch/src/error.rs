use thiserror::Error;

pub use crate::notify::NotifyError;
pub use crate::price::FetchError;

/// Failure classes of one pipeline tick.
///
/// Only `Fetch` aborts a whole tick. `Persist` and `Notify` are scoped to a
/// single trigger and are collected into the dispatch report instead of
/// propagating.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("price fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("event persistence failed for {identity}: {source}")]
    Persist {
        identity: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("trigger load failed: {0}")]
    LoadTriggers(#[source] anyhow::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
