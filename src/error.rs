// Error kinds of the render pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    // Client errors: nothing has been launched or written when these occur.
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("item {0} not found in catalog")]
    UnknownItem(i32),
    #[error("item {0} cannot be equipped")]
    UnequippableItem(i32),

    // Server errors: the job is unusable.
    #[error("renderer process failed: {0}")]
    RenderProcess(String),
    #[error("renderer process did not finish within {0:?}")]
    RenderTimeout(Duration),
    #[error("render artifact {path} could not be read: {source}")]
    ArtifactNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to mirror chathead {path}: {message}")]
    PostProcess { path: PathBuf, message: String },
    #[error("job directory I/O error: {0}")]
    Io(#[from] std::io::Error),
}
