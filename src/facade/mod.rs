//! Device capability surface consumed by the texture system.
//!
//! The [`DeviceFacade`] trait abstracts the graphics context: one factory
//! operation per source kind plus a release operation. Synchronous recipes
//! return a fully populated donor resource; asynchronous recipes (network or
//! codec bound) return a [`LoadTicket`] and complete later through an explicit
//! event delivered to the texture system.
//!
//! [`NullFacade`] is a no-op implementation in the spirit of a dummy backend:
//! it mints handles without touching a GPU and records statistics for tests.

pub mod null;

pub use null::{NullFacade, NullProbe, NullStats};

use std::sync::Arc;

use bitflags::bitflags;

use crate::error::TextureError;
use crate::resource::TextureResource;
use crate::source::{DepthStencilOptions, RenderTargetOptions};
use crate::types::{
    CompressionFormat, Extent3d, SamplingMode, SphericalPolynomial, TexelType, TextureFormat,
};

/// Opaque reference to a graphics-API-allocated resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    /// Wrap a raw handle value. Only facade implementations mint these.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Identifier for an in-flight asynchronous creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Wrap a raw ticket value. Only facade implementations mint these.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw ticket value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Optional device capabilities reported by a facade.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceCaps: u32 {
        /// The device can decode RGBD-encoded environment payloads.
        const RGBD_DECODE = 1 << 0;
        /// The device supports multisampled render targets.
        const MULTISAMPLED_RENDER_TARGET = 1 << 1;
        /// The device supports 3D textures.
        const TEXTURE_3D = 1 << 2;
        /// The device supports anisotropic filtering.
        const ANISOTROPIC_FILTERING = 1 << 3;
    }
}

/// Hard limits of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceLimits {
    /// Maximum texture dimension along any axis.
    pub max_texture_dimension: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
        }
    }
}

/// Metadata snapshot handed to the facade's factory operations during rebuild.
///
/// Captures everything a recipe needs to manufacture a donor carrying the same
/// metadata as the resource being rebuilt. The facade may clamp `extent`
/// against its [`DeviceLimits`]; `base_extent` always stays at the requested
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildDescriptor {
    /// Debug label of the resource.
    pub label: Option<String>,
    /// Current (possibly clamped) dimensions.
    pub extent: Extent3d,
    /// Requested, pre-clamp dimensions.
    pub base_extent: Extent3d,
    /// Texture format.
    pub format: TextureFormat,
    /// Texel storage type.
    pub texel: TexelType,
    /// Sampling mode.
    pub sampling: SamplingMode,
    /// Whether to generate a mip chain.
    pub generate_mip_maps: bool,
    /// Whether uploads flip the Y axis.
    pub invert_y: bool,
    /// Multisample count.
    pub samples: u32,
    /// Compressed codec tag, if the payload is compressed.
    pub compression: Option<CompressionFormat>,
}

/// Capability surface used to create, update, and destroy device resources.
///
/// One factory operation per source kind. Synchronous operations return the
/// donor directly; asynchronous ones return a [`LoadTicket`] whose completion
/// the engine later delivers as a [`LoadOutcome`](crate::system::LoadOutcome).
pub trait DeviceFacade: Send {
    /// Optional capabilities of the device.
    fn caps(&self) -> DeviceCaps;

    /// Hard limits of the device.
    fn limits(&self) -> DeviceLimits;

    /// Allocate a bare primary handle (construction path).
    fn allocate_texture(&mut self) -> Result<DeviceHandle, TextureError>;

    /// Release a device handle.
    fn release_texture(&mut self, handle: DeviceHandle);

    /// Build a 2D texture from an in-memory buffer.
    fn create_raw(
        &mut self,
        desc: &RebuildDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureResource, TextureError>;

    /// Build a 3D texture from an in-memory buffer.
    fn create_raw_3d(
        &mut self,
        desc: &RebuildDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureResource, TextureError>;

    /// Build a 2D array texture from an in-memory buffer.
    fn create_raw_2d_array(
        &mut self,
        desc: &RebuildDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureResource, TextureError>;

    /// Build a cube texture from six in-memory face buffers.
    fn create_cube_raw(
        &mut self,
        desc: &RebuildDescriptor,
        faces: &[Arc<[u8]>],
    ) -> Result<TextureResource, TextureError>;

    /// Allocate an empty dynamic texture.
    fn create_dynamic(&mut self, desc: &RebuildDescriptor)
        -> Result<TextureResource, TextureError>;

    /// Push current canvas/bitmap content into a dynamic texture.
    ///
    /// Marks the resource ready once the content lands.
    fn update_dynamic_content(
        &mut self,
        resource: &mut TextureResource,
    ) -> Result<(), TextureError>;

    /// Allocate a render target, honoring depth/stencil and shape options.
    fn create_render_target(
        &mut self,
        desc: &RebuildDescriptor,
        options: RenderTargetOptions,
    ) -> Result<TextureResource, TextureError>;

    /// Allocate a depth/stencil-only resource.
    fn create_depth_stencil(
        &mut self,
        desc: &RebuildDescriptor,
        options: DepthStencilOptions,
    ) -> Result<TextureResource, TextureError>;

    /// Allocate the empty cube an RGBD decode pass fills in.
    fn create_cube_rgbd_shell(
        &mut self,
        desc: &RebuildDescriptor,
    ) -> Result<TextureResource, TextureError>;

    /// Start loading a texture from a URL or prefetched buffer.
    fn load_from_url(
        &mut self,
        desc: &RebuildDescriptor,
        url: &str,
        buffer: Option<&[u8]>,
    ) -> Result<LoadTicket, TextureError>;

    /// Start loading six cube faces from URLs.
    fn load_cube(
        &mut self,
        desc: &RebuildDescriptor,
        urls: &[String],
    ) -> Result<LoadTicket, TextureError>;

    /// Start loading a prefiltered environment mip chain from a URL.
    fn load_cube_prefiltered(
        &mut self,
        desc: &RebuildDescriptor,
        url: &str,
    ) -> Result<LoadTicket, TextureError>;

    /// Start an RGBD decode pass against an already-allocated cube shell.
    ///
    /// Fails with [`TextureError::FeatureNotSupported`] when the device lacks
    /// [`DeviceCaps::RGBD_DECODE`].
    fn decode_rgbd(
        &mut self,
        shell: &mut TextureResource,
        mips: &[Vec<Arc<[u8]>>],
        polynomial: Option<&SphericalPolynomial>,
        lod_scale: f32,
        lod_offset: f32,
    ) -> Result<LoadTicket, TextureError>;
}
