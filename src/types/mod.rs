//! Plain data types shared across the texture system.

pub mod common;
pub mod polynomial;
pub mod sampler;
pub mod texture;

pub use common::Extent3d;
pub use polynomial::SphericalPolynomial;
pub use sampler::{CompareFunction, CoordinatesMode, SamplerCache, SamplingMode, WrapMode};
pub use texture::{CompressionFormat, TexelType, TextureFormat};
