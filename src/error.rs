//! Crate-wide error type, composing every module's own error enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] crate::catalog::Error),
    #[error(transparent)]
    Router(#[from] crate::router::Error),
    #[error(transparent)]
    Company(#[from] crate::company::Error),
    #[error(transparent)]
    CompanyRoute(#[from] crate::company::route::Error),
    #[error(transparent)]
    Layout(#[from] crate::layout::Error),
    #[error(transparent)]
    Render(#[from] crate::render::Error),
    #[error(transparent)]
    Snapshot(#[from] crate::snapshot::Error),
    #[error(transparent)]
    Request(#[from] crate::request::Error),
}
