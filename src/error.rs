//! Texture system error types.

use thiserror::Error;

use crate::facade::LoadTicket;
use crate::pool::TextureId;

/// Errors that can occur in the texture system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    /// The facade failed to allocate a device resource.
    #[error("resource allocation failed: {0}")]
    AllocationFailed(String),
    /// An asynchronous load (network/codec) failed.
    #[error("texture load failed: {0}")]
    LoadFailed(String),
    /// A capability was invoked without the required collaborator wired in.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// The id refers to a retired or never-allocated pool slot.
    #[error("texture id {0:?} is stale or was never allocated")]
    StaleId(TextureId),
    /// A rebuild was requested while a previous one is still pending.
    #[error("a rebuild is already in flight for texture {0:?}")]
    RebuildInFlight(TextureId),
    /// A completion was delivered for a ticket nobody is waiting on.
    #[error("no pending rebuild for ticket {0:?}")]
    UnknownTicket(LoadTicket),
    /// Out of GPU memory.
    #[error("out of GPU memory")]
    OutOfMemory,
    /// The GPU device was lost.
    #[error("GPU device lost")]
    DeviceLost,
}
