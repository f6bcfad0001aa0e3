//! Texture source kinds and their payloads.
//!
//! Every texture is bound at construction to the origin of its content. The
//! origin determines the recreation recipe that runs after a device loss, so
//! each kind carries exactly the payload its recipe needs.

use std::sync::Arc;

use crate::types::CompareFunction;

/// Discriminant describing how a texture's bytes originate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Origin unknown; no recreation recipe applies.
    Unknown,
    /// Loaded from a URL.
    Url,
    /// Placeholder; never becomes ready.
    Temp,
    /// Built from an in-memory buffer.
    Raw,
    /// Content pushed from a canvas/bitmap after allocation.
    Dynamic,
    /// Render target.
    RenderTarget,
    /// Multi render target, recreated by its own manager.
    MultiRenderTarget,
    /// Six faces loaded from URLs.
    Cube,
    /// Six in-memory face buffers.
    CubeRaw,
    /// Prefiltered environment mip chain loaded from a URL.
    CubePrefiltered,
    /// In-memory 3D buffer.
    Raw3d,
    /// In-memory 2D array buffer.
    Raw2dArray,
    /// Depth/stencil-only resource.
    Depth,
    /// Per-face-per-mip RGBD-encoded buffers, decoded on the device.
    CubeRawRgbd,
}

impl SourceKind {
    /// Whether the recreation recipe for this kind completes asynchronously.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            Self::Url | Self::Cube | Self::CubePrefiltered | Self::CubeRawRgbd
        )
    }

    /// Whether this kind has a recreation recipe at all.
    pub fn is_rebuildable(&self) -> bool {
        !matches!(self, Self::Unknown | Self::Temp | Self::MultiRenderTarget)
    }
}

/// Dimensional topology of a render-target or depth resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureShape {
    /// Plain 2D texture.
    #[default]
    D2,
    /// 2D array texture.
    D2Array,
    /// Cube texture.
    Cube,
}

/// Options consumed by the render-target recreation recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderTargetOptions {
    /// Topology of the target.
    pub shape: TextureShape,
    /// Allocate a depth buffer alongside the color target.
    pub generate_depth_buffer: bool,
    /// Allocate a stencil buffer alongside the color target.
    pub generate_stencil_buffer: bool,
}

/// Options consumed by the depth/stencil recreation recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepthStencilOptions {
    /// Topology of the resource.
    pub shape: TextureShape,
    /// Comparison function for shadow sampling, if any.
    pub comparison: Option<CompareFunction>,
    /// Allocate a stencil component.
    pub generate_stencil: bool,
}

/// Origin of a texture's content, one payload shape per source kind.
///
/// Immutable after construction; the payload is retained for the lifetime of
/// the resource so the recreation recipe can replay it after a device loss.
/// Bulk byte payloads are shared (`Arc`) so cloning the source for a rebuild
/// dispatch is cheap.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Origin unknown.
    Unknown,
    /// Placeholder resource.
    Temp,
    /// Loaded from a URL, optionally with a prefetched byte buffer.
    Url {
        /// Source URL.
        url: String,
        /// Prefetched bytes, used instead of refetching when present.
        buffer: Option<Arc<[u8]>>,
    },
    /// Built from an in-memory buffer.
    Raw {
        /// Texel data; `None` allocates uninitialized storage.
        data: Option<Arc<[u8]>>,
    },
    /// Content pushed from a canvas/bitmap after allocation.
    Dynamic,
    /// Render target.
    RenderTarget(RenderTargetOptions),
    /// Multi render target.
    MultiRenderTarget,
    /// Six faces loaded from URLs.
    Cube {
        /// Per-face source URLs.
        urls: Vec<String>,
    },
    /// Six in-memory face buffers.
    CubeRaw {
        /// Per-face texel data.
        faces: Vec<Arc<[u8]>>,
    },
    /// Prefiltered environment mip chain loaded from a URL.
    CubePrefiltered {
        /// Source URL of the prefiltered chain.
        url: String,
    },
    /// In-memory 3D buffer.
    Raw3d {
        /// Voxel data; `None` allocates uninitialized storage.
        data: Option<Arc<[u8]>>,
    },
    /// In-memory 2D array buffer.
    Raw2dArray {
        /// Layer data; `None` allocates uninitialized storage.
        data: Option<Arc<[u8]>>,
    },
    /// Depth/stencil-only resource.
    Depth(DepthStencilOptions),
    /// Per-face-per-mip RGBD-encoded buffers.
    CubeRawRgbd {
        /// Outer index is the mip level, inner index the cube face.
        mips: Vec<Vec<Arc<[u8]>>>,
    },
}

impl TextureSource {
    /// The fieldless discriminant of this source.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Unknown => SourceKind::Unknown,
            Self::Temp => SourceKind::Temp,
            Self::Url { .. } => SourceKind::Url,
            Self::Raw { .. } => SourceKind::Raw,
            Self::Dynamic => SourceKind::Dynamic,
            Self::RenderTarget(_) => SourceKind::RenderTarget,
            Self::MultiRenderTarget => SourceKind::MultiRenderTarget,
            Self::Cube { .. } => SourceKind::Cube,
            Self::CubeRaw { .. } => SourceKind::CubeRaw,
            Self::CubePrefiltered { .. } => SourceKind::CubePrefiltered,
            Self::Raw3d { .. } => SourceKind::Raw3d,
            Self::Raw2dArray { .. } => SourceKind::Raw2dArray,
            Self::Depth(_) => SourceKind::Depth,
            Self::CubeRawRgbd { .. } => SourceKind::CubeRawRgbd,
        }
    }

    /// Whether this source describes a cube texture.
    pub fn is_cube(&self) -> bool {
        match self {
            Self::Cube { .. }
            | Self::CubeRaw { .. }
            | Self::CubePrefiltered { .. }
            | Self::CubeRawRgbd { .. } => true,
            Self::RenderTarget(options) => options.shape == TextureShape::Cube,
            Self::Depth(options) => options.shape == TextureShape::Cube,
            _ => false,
        }
    }

    /// Whether this source describes a 3D texture.
    pub fn is_3d(&self) -> bool {
        matches!(self, Self::Raw3d { .. })
    }

    /// Whether this source describes a 2D array texture.
    pub fn is_2d_array(&self) -> bool {
        match self {
            Self::Raw2dArray { .. } => true,
            Self::RenderTarget(options) => options.shape == TextureShape::D2Array,
            Self::Depth(options) => options.shape == TextureShape::D2Array,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(TextureSource::Unknown.kind(), SourceKind::Unknown);
        assert_eq!(
            TextureSource::Raw { data: None }.kind(),
            SourceKind::Raw
        );
        assert_eq!(
            TextureSource::CubeRawRgbd { mips: Vec::new() }.kind(),
            SourceKind::CubeRawRgbd
        );
    }

    #[test]
    fn test_async_kinds() {
        assert!(SourceKind::Url.is_async());
        assert!(SourceKind::CubePrefiltered.is_async());
        assert!(!SourceKind::Raw.is_async());
        assert!(!SourceKind::RenderTarget.is_async());
    }

    #[test]
    fn test_shape_predicates() {
        let cube_rt = TextureSource::RenderTarget(RenderTargetOptions {
            shape: TextureShape::Cube,
            ..Default::default()
        });
        assert!(cube_rt.is_cube());
        assert!(!cube_rt.is_2d_array());

        let depth_array = TextureSource::Depth(DepthStencilOptions {
            shape: TextureShape::D2Array,
            ..Default::default()
        });
        assert!(depth_array.is_2d_array());
        assert!(!depth_array.is_cube());

        assert!(TextureSource::Raw3d { data: None }.is_3d());
        assert!(TextureSource::CubeRaw { faces: Vec::new() }.is_cube());
    }

    #[test]
    fn test_rebuildable() {
        assert!(!SourceKind::Temp.is_rebuildable());
        assert!(!SourceKind::MultiRenderTarget.is_rebuildable());
        assert!(SourceKind::Depth.is_rebuildable());
    }
}
