//! Document workflow: template rendering, verification tokens, PDF
//! rasterization and the two-phase generate/validate lifecycle.

pub mod lifecycle;
pub mod rasterizer;
pub mod templates;
pub mod verification;

pub use lifecycle::LifecycleManager;
pub use rasterizer::{ChromiumRasterizer, Rasterizer, RasterizerError};

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the document workflow. Each variant maps to a distinct
/// HTTP status in the handlers.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} introuvable")]
    NotFound(&'static str),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("rendering failed: {0}")]
    Rendering(#[from] RasterizerError),
    #[error("QR encoding failed: {0}")]
    Qr(#[from] verification::QrError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to read artifact: {0}")]
    ArtifactIo(#[source] std::io::Error),
    /// The PDF was written but the row update failed; the filename is logged
    /// so the record can be reconciled manually.
    #[error("persistence failed after rasterization of {filename}")]
    Persistence { filename: String },
}

/// Reference to a generated artifact, returned by both workflow phases.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct DocumentRef {
    pub filename: String,
    pub verification_url: String,
}
