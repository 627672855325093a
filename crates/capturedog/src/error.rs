use thiserror::Error;

use crate::{ApiVersion, OverlayBits};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("renderdoc library is not available in the current process")]
    NotAvailable,

    #[error("failed to load renderdoc library (Win32 error {0})")]
    LoadLibraryFailed(u32),

    #[error("failed to load renderdoc library: {0}")]
    DynamicLoadFailed(String),

    #[error("RENDERDOC_GetAPI not found in renderdoc module")]
    MissingGetApi,

    #[error("RENDERDOC_GetAPI symbol load failed: {0}")]
    GetApiSymbolLoadFailed(String),

    #[error("RENDERDOC_GetAPI returned failure for API version {0}")]
    GetApiFailed(ApiVersion),

    #[error("RENDERDOC_GetAPI returned a null function table for API version {0}")]
    NullApiTable(ApiVersion),

    #[error("required API function pointer is null: {0}")]
    MissingFunction(&'static str),

    #[error("no known RenderDoc API version matches {0}")]
    UnsupportedVersion(String),

    #[error("the capture session has already been built for this process")]
    AlreadyBuilt,

    #[error("overlay bits requested more than once: {0:?}")]
    DuplicateOverlayBit(OverlayBits),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("too many keys (max i32)")]
    TooManyKeys,

    #[error("string passed to RenderDoc contains an interior NUL byte")]
    InteriorNul,

    #[error("invalid UTF-8 from RenderDoc")]
    InvalidUtf8,
}

impl CaptureError {
    /// Whether this error aborts session construction. Such errors are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CaptureError::NotAvailable
                | CaptureError::LoadLibraryFailed(_)
                | CaptureError::DynamicLoadFailed(_)
                | CaptureError::MissingGetApi
                | CaptureError::GetApiSymbolLoadFailed(_)
                | CaptureError::GetApiFailed(_)
                | CaptureError::NullApiTable(_)
                | CaptureError::MissingFunction(_)
                | CaptureError::UnsupportedVersion(_)
        )
    }
}
