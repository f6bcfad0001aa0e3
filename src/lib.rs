//! Texture Engine - GPU texture resource lifecycle management
//!
//! Manages the lifecycle of GPU texture resources independently of any
//! concrete graphics API:
//! - Stable logical identity across device-handle recreation
//! - Reference-counted disposal with exactly-once handle release
//! - Context-loss recovery via per-source recreation recipes
//! - Atomic ownership transfer from freshly built donors into long-lived
//!   resources
//! - A registry that always reflects the current device-handle holders
//!
//! The device itself sits behind the [`facade::DeviceFacade`] trait; the
//! bundled [`facade::NullFacade`] mints handles without a GPU and is what the
//! test suite drives.

pub mod error;
pub mod facade;
pub mod pool;
pub mod registry;
pub mod resource;
pub mod source;
pub mod system;
pub mod types;

pub use error::TextureError;
pub use facade::{DeviceCaps, DeviceFacade, DeviceHandle, DeviceLimits, LoadTicket, NullFacade};
pub use pool::TextureId;
pub use resource::TextureResource;
pub use source::{SourceKind, TextureSource};
pub use system::{LoadOutcome, RebuildStatus, TextureSystem};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_surface_smoke() {
        let mut system = TextureSystem::new(Box::new(NullFacade::new()));
        let id = system
            .create_texture(TextureSource::Dynamic, false)
            .unwrap();
        assert!(system.registry().contains(id));
        assert!(!VERSION.is_empty());
    }
}
