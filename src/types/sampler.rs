//! Sampling state types and the per-resource sampler cache.

/// Texture sampling (filtering) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplingMode {
    /// Nearest neighbor filtering, no mip interpolation.
    Nearest,
    /// Linear filtering within a mip level.
    #[default]
    Bilinear,
    /// Linear filtering across mip levels.
    Trilinear,
}

impl SamplingMode {
    /// Whether this mode uses linear (as opposed to nearest) filtering.
    pub fn linear_filtering(&self) -> bool {
        matches!(self, Self::Bilinear | Self::Trilinear)
    }
}

/// Texture coordinate wrapping behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Repeat.
    #[default]
    Wrap,
    /// Clamp to edge.
    Clamp,
    /// Mirrored repeat.
    Mirror,
}

/// How texture coordinates are generated for a bound texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinatesMode {
    /// Coordinates taken directly from vertex data.
    #[default]
    Explicit,
    /// Spherical environment mapping.
    Spherical,
    /// Planar projection.
    Planar,
    /// Cubic environment mapping.
    Cubic,
    /// Projection mapping.
    Projection,
    /// Skybox mapping.
    Skybox,
    /// Equirectangular mapping.
    Equirectangular,
}

/// Comparison function for depth/shadow sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Never pass.
    Never,
    /// Pass if less than.
    Less,
    /// Pass if equal.
    Equal,
    /// Pass if less than or equal.
    LessEqual,
    /// Pass if greater than.
    Greater,
    /// Pass if not equal.
    NotEqual,
    /// Pass if greater than or equal.
    GreaterEqual,
    /// Always pass.
    Always,
}

/// Sampler state last applied to the device for a resource.
///
/// Each field is `None` until the consumer applies a value on bind. The whole
/// cache is invalidated when the resource is rebuilt, which forces the consumer
/// to reapply its sampling state against the recreated device object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerCache {
    /// Last applied coordinates mode.
    pub coordinates_mode: Option<CoordinatesMode>,
    /// Last applied U wrap mode.
    pub wrap_u: Option<WrapMode>,
    /// Last applied V wrap mode.
    pub wrap_v: Option<WrapMode>,
    /// Last applied R wrap mode.
    pub wrap_r: Option<WrapMode>,
    /// Last applied anisotropic filtering level.
    pub anisotropic_level: Option<u32>,
}

impl SamplerCache {
    /// Reset every cached field to unset.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// True when no field holds a cached value.
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_filtering() {
        assert!(!SamplingMode::Nearest.linear_filtering());
        assert!(SamplingMode::Bilinear.linear_filtering());
        assert!(SamplingMode::Trilinear.linear_filtering());
    }

    #[test]
    fn test_cache_invalidate() {
        let mut cache = SamplerCache {
            coordinates_mode: Some(CoordinatesMode::Cubic),
            wrap_u: Some(WrapMode::Clamp),
            wrap_v: Some(WrapMode::Wrap),
            wrap_r: Some(WrapMode::Mirror),
            anisotropic_level: Some(8),
        };
        assert!(!cache.is_unset());
        cache.invalidate();
        assert!(cache.is_unset());
    }
}
