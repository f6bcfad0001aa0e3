//! Common dimensional types and device-limit helpers.

/// Three-dimensional extent of a texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels (1 for 2D textures).
    pub depth: u32,
}

impl Extent3d {
    /// Create a new 2D extent.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }

    /// Create a new 3D extent.
    pub fn new_3d(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Total texel/voxel count, `width * height * depth`.
    pub fn volume(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }
}

impl Default for Extent3d {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            depth: 1,
        }
    }
}

/// Largest power of two less than or equal to `value` (0 for 0).
pub fn floor_pot(value: u32) -> u32 {
    if value == 0 {
        0
    } else {
        1 << (31 - value.leading_zeros())
    }
}

/// Clamp a requested dimension against a device limit.
///
/// Dimensions within the limit pass through unchanged; oversized requests are
/// clamped down to the largest power of two the device supports.
pub fn clamp_to_limit(value: u32, max_dimension: u32) -> u32 {
    if value <= max_dimension {
        value
    } else {
        floor_pot(max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume() {
        assert_eq!(Extent3d::new_2d(4, 8).volume(), 32);
        assert_eq!(Extent3d::new_3d(4, 8, 2).volume(), 64);
        assert_eq!(Extent3d::default().volume(), 0);
    }

    #[test]
    fn test_floor_pot() {
        assert_eq!(floor_pot(0), 0);
        assert_eq!(floor_pot(1), 1);
        assert_eq!(floor_pot(255), 128);
        assert_eq!(floor_pot(256), 256);
        assert_eq!(floor_pot(257), 256);
    }

    #[test]
    fn test_clamp_to_limit() {
        assert_eq!(clamp_to_limit(512, 1024), 512);
        assert_eq!(clamp_to_limit(1024, 1024), 1024);
        assert_eq!(clamp_to_limit(1920, 1024), 1024);
        assert_eq!(clamp_to_limit(5000, 3000), 2048);
    }
}
