//! Spherical harmonics polynomial for environment lighting.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Second-order spherical harmonics polynomial.
///
/// Holds the nine RGB coefficients produced when prefiltering an environment
/// map. `Pod` so the whole struct can be uploaded as a uniform blob.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SphericalPolynomial {
    /// Linear X coefficient.
    pub x: Vec3,
    /// Linear Y coefficient.
    pub y: Vec3,
    /// Linear Z coefficient.
    pub z: Vec3,
    /// Quadratic XX coefficient.
    pub xx: Vec3,
    /// Quadratic YY coefficient.
    pub yy: Vec3,
    /// Quadratic ZZ coefficient.
    pub zz: Vec3,
    /// Cross XY coefficient.
    pub xy: Vec3,
    /// Cross YZ coefficient.
    pub yz: Vec3,
    /// Cross ZX coefficient.
    pub zx: Vec3,
}

impl SphericalPolynomial {
    /// Scale every coefficient, e.g. by an environment intensity factor.
    pub fn scale(&mut self, factor: f32) {
        self.x *= factor;
        self.y *= factor;
        self.z *= factor;
        self.xx *= factor;
        self.yy *= factor;
        self.zz *= factor;
        self.xy *= factor;
        self.yz *= factor;
        self.zx *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale() {
        let mut poly = SphericalPolynomial {
            x: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        poly.scale(0.5);
        assert_eq!(poly.x, Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(poly.y, Vec3::ZERO);
    }

    #[test]
    fn test_pod_size() {
        assert_eq!(std::mem::size_of::<SphericalPolynomial>(), 9 * 12);
    }
}
