use thiserror::Error;

/// Errors raised while assembling a scene or validating settings, before any rendering starts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("the scene has no renderable entities")]
    EmptyAggregate,

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("invalid {what}: {reason}")]
    InvalidParameter { what: &'static str, reason: String },

    #[error("invalid render settings: {0}")]
    InvalidSettings(String),

    #[error("the scene has no camera")]
    MissingCamera,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("a render worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("failed to start the worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn the render thread")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Setup(#[from] Error),
}
