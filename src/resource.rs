//! The texture resource under lifecycle management.
//!
//! A [`TextureResource`] reconciles a mutable device handle with a stable
//! logical identity: consumers keep referring to the same resource while its
//! underlying device objects are destroyed and recreated across context
//! losses. Ownership of device handles moves between resources exactly once,
//! through [`TextureResource::adopt_from`].

use crate::facade::{DeviceFacade, DeviceHandle, RebuildDescriptor};
use crate::pool::TextureId;
use crate::source::{SourceKind, TextureSource};
use crate::types::{
    CompressionFormat, Extent3d, SamplerCache, SamplingMode, SphericalPolynomial, TexelType,
    TextureFormat,
};

/// A GPU texture resource: device handles, metadata, and a reference count.
///
/// Created bound to a [`TextureSource`] that never changes afterwards. The
/// source determines which recreation recipe runs after a device loss.
#[derive(Debug)]
pub struct TextureResource {
    source: TextureSource,
    label: Option<String>,

    ready: bool,
    extent: Extent3d,
    base_extent: Extent3d,
    size: u64,
    is_multiview: bool,

    format: TextureFormat,
    texel: TexelType,
    sampling: SamplingMode,
    generate_mip_maps: bool,
    samples: u32,
    invert_y: bool,
    compression: Option<CompressionFormat>,
    is_rgbd: bool,
    lod_generation_scale: f32,
    lod_generation_offset: f32,

    hardware: Option<DeviceHandle>,
    framebuffer: Option<DeviceHandle>,
    depth_stencil_buffer: Option<DeviceHandle>,
    msaa_framebuffer: Option<DeviceHandle>,
    msaa_renderbuffer: Option<DeviceHandle>,
    cube_color_handles: Vec<DeviceHandle>,
    cube_depth_stencil_handles: Vec<DeviceHandle>,

    sampler_cache: SamplerCache,
    spherical_polynomial: Option<SphericalPolynomial>,

    depth_stencil_texture: Option<TextureId>,
    lod_high: Option<TextureId>,
    lod_mid: Option<TextureId>,
    lod_low: Option<TextureId>,
    irradiance: Option<TextureId>,

    reference_count: u32,
}

impl TextureResource {
    /// Create a resource bound to `source`.
    ///
    /// Unless `defer_allocation` is set, a primary device handle is allocated
    /// immediately through the facade. Deferral leaves the handle unset until
    /// a later explicit allocation or rebuild fills it; that is not an error.
    pub fn new(
        facade: &mut dyn DeviceFacade,
        source: TextureSource,
        defer_allocation: bool,
    ) -> Result<Self, crate::error::TextureError> {
        let hardware = if defer_allocation {
            None
        } else {
            Some(facade.allocate_texture()?)
        };
        Ok(Self {
            source,
            label: None,
            ready: false,
            extent: Extent3d::default(),
            base_extent: Extent3d::default(),
            size: 0,
            is_multiview: false,
            format: TextureFormat::default(),
            texel: TexelType::default(),
            sampling: SamplingMode::default(),
            generate_mip_maps: false,
            samples: 1,
            invert_y: false,
            compression: None,
            is_rgbd: false,
            lod_generation_scale: 0.8,
            lod_generation_offset: 0.0,
            hardware,
            framebuffer: None,
            depth_stencil_buffer: None,
            msaa_framebuffer: None,
            msaa_renderbuffer: None,
            cube_color_handles: Vec::new(),
            cube_depth_stencil_handles: Vec::new(),
            sampler_cache: SamplerCache::default(),
            spherical_polynomial: None,
            depth_stencil_texture: None,
            lod_high: None,
            lod_mid: None,
            lod_low: None,
            irradiance: None,
            reference_count: 1,
        })
    }

    /// The origin of this resource's content.
    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    /// The source kind discriminant.
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Whether this resource is a cube texture.
    pub fn is_cube(&self) -> bool {
        self.source.is_cube()
    }

    /// Whether this resource is a 3D texture.
    pub fn is_3d(&self) -> bool {
        self.source.is_3d()
    }

    /// Whether this resource is a 2D array texture.
    pub fn is_2d_array(&self) -> bool {
        self.source.is_2d_array()
    }

    /// Whether this resource is rendered with multiview.
    pub fn is_multiview(&self) -> bool {
        self.is_multiview
    }

    /// Mark this resource as a multiview target.
    pub fn set_multiview(&mut self, multiview: bool) {
        self.is_multiview = multiview;
    }

    /// Debug label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set the debug label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Whether the device-side content is usable. False while (re)allocation
    /// is pending; never true for `Temp` placeholders.
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Set the readiness flag.
    pub fn mark_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Current (possibly clamped) dimensions.
    pub fn extent(&self) -> Extent3d {
        self.extent
    }

    /// Requested, pre-clamp dimensions.
    pub fn base_extent(&self) -> Extent3d {
        self.base_extent
    }

    /// Current width.
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    /// Current height.
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Current depth.
    pub fn depth(&self) -> u32 {
        self.extent.depth
    }

    /// Texel/voxel count, always the product of the current dimensions.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Set current and base dimensions identically and recompute the size.
    ///
    /// The two diverge only through platform clamping inside a recreation
    /// recipe, never through this operation. Pure data mutation.
    pub fn update_size(&mut self, width: u32, height: u32, depth: u32) {
        let extent = Extent3d::new_3d(width, height, depth);
        self.set_extents(extent, extent);
    }

    /// Set current and base dimensions separately (recipe clamping path).
    pub fn set_extents(&mut self, current: Extent3d, base: Extent3d) {
        self.extent = current;
        self.base_extent = base;
        self.size = current.volume();
    }

    /// Texture format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Texel storage type.
    pub fn texel(&self) -> TexelType {
        self.texel
    }

    /// Sampling mode.
    pub fn sampling(&self) -> SamplingMode {
        self.sampling
    }

    /// Set the sampling mode.
    pub fn set_sampling(&mut self, sampling: SamplingMode) {
        self.sampling = sampling;
    }

    /// Whether a mip chain is generated for this resource.
    pub fn generate_mip_maps(&self) -> bool {
        self.generate_mip_maps
    }

    /// Multisample count.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Set the multisample count.
    pub fn set_samples(&mut self, samples: u32) {
        self.samples = samples.max(1);
    }

    /// Whether uploads flip the Y axis.
    pub fn invert_y(&self) -> bool {
        self.invert_y
    }

    /// Compressed codec tag, if any.
    pub fn compression(&self) -> Option<CompressionFormat> {
        self.compression
    }

    /// Whether the device-side content is RGBD encoded.
    pub fn is_rgbd(&self) -> bool {
        self.is_rgbd
    }

    /// Set the RGBD encoding flag.
    pub fn set_rgbd(&mut self, rgbd: bool) {
        self.is_rgbd = rgbd;
    }

    /// LOD generation scale used by the RGBD decode pass.
    pub fn lod_generation_scale(&self) -> f32 {
        self.lod_generation_scale
    }

    /// LOD generation offset used by the RGBD decode pass.
    pub fn lod_generation_offset(&self) -> f32 {
        self.lod_generation_offset
    }

    /// Set the LOD generation scale and offset.
    pub fn set_lod_generation(&mut self, scale: f32, offset: f32) {
        self.lod_generation_scale = scale;
        self.lod_generation_offset = offset;
    }

    /// Apply a metadata snapshot, except for dimensions.
    ///
    /// Used by facade recipes to stamp donor resources; dimensions go through
    /// [`Self::set_extents`] so clamping stays explicit.
    pub fn apply_descriptor(&mut self, desc: &RebuildDescriptor) {
        self.label = desc.label.clone();
        self.format = desc.format;
        self.texel = desc.texel;
        self.sampling = desc.sampling;
        self.generate_mip_maps = desc.generate_mip_maps;
        self.invert_y = desc.invert_y;
        self.samples = desc.samples.max(1);
        self.compression = desc.compression;
    }

    /// Snapshot the metadata a recreation recipe needs.
    pub fn rebuild_descriptor(&self) -> RebuildDescriptor {
        RebuildDescriptor {
            label: self.label.clone(),
            extent: self.extent,
            base_extent: self.base_extent,
            format: self.format,
            texel: self.texel,
            sampling: self.sampling,
            generate_mip_maps: self.generate_mip_maps,
            invert_y: self.invert_y,
            samples: self.samples,
            compression: self.compression,
        }
    }

    /// Primary device handle, if allocated.
    pub fn hardware(&self) -> Option<DeviceHandle> {
        self.hardware
    }

    /// Set the primary device handle.
    pub fn set_hardware(&mut self, handle: Option<DeviceHandle>) {
        self.hardware = handle;
    }

    /// Take the primary device handle, leaving it unset.
    pub fn take_hardware(&mut self) -> Option<DeviceHandle> {
        self.hardware.take()
    }

    /// Framebuffer handle, if any.
    pub fn framebuffer(&self) -> Option<DeviceHandle> {
        self.framebuffer
    }

    /// Attach a framebuffer handle.
    pub fn attach_framebuffer(&mut self, handle: DeviceHandle) {
        self.framebuffer = Some(handle);
    }

    /// Take the framebuffer handle, leaving it unset.
    pub fn take_framebuffer(&mut self) -> Option<DeviceHandle> {
        self.framebuffer.take()
    }

    /// Depth/stencil buffer handle, if any.
    pub fn depth_stencil_buffer(&self) -> Option<DeviceHandle> {
        self.depth_stencil_buffer
    }

    /// Attach a depth/stencil buffer handle.
    pub fn attach_depth_stencil_buffer(&mut self, handle: DeviceHandle) {
        self.depth_stencil_buffer = Some(handle);
    }

    /// Take the depth/stencil buffer handle, leaving it unset.
    pub fn take_depth_stencil_buffer(&mut self) -> Option<DeviceHandle> {
        self.depth_stencil_buffer.take()
    }

    /// Multisample framebuffer handle, if any.
    pub fn msaa_framebuffer(&self) -> Option<DeviceHandle> {
        self.msaa_framebuffer
    }

    /// Attach a multisample framebuffer handle.
    pub fn attach_msaa_framebuffer(&mut self, handle: DeviceHandle) {
        self.msaa_framebuffer = Some(handle);
    }

    /// Take the multisample framebuffer handle, leaving it unset.
    pub fn take_msaa_framebuffer(&mut self) -> Option<DeviceHandle> {
        self.msaa_framebuffer.take()
    }

    /// Multisample renderbuffer handle, if any.
    pub fn msaa_renderbuffer(&self) -> Option<DeviceHandle> {
        self.msaa_renderbuffer
    }

    /// Attach a multisample renderbuffer handle.
    pub fn attach_msaa_renderbuffer(&mut self, handle: DeviceHandle) {
        self.msaa_renderbuffer = Some(handle);
    }

    /// Take the multisample renderbuffer handle, leaving it unset.
    pub fn take_msaa_renderbuffer(&mut self) -> Option<DeviceHandle> {
        self.msaa_renderbuffer.take()
    }

    /// Per-face color handles of a cube render target.
    pub fn cube_color_handles(&self) -> &[DeviceHandle] {
        &self.cube_color_handles
    }

    /// Set the per-face color handles of a cube render target.
    pub fn set_cube_color_handles(&mut self, handles: Vec<DeviceHandle>) {
        self.cube_color_handles = handles;
    }

    /// Take the per-face color handles, leaving the list empty.
    pub fn take_cube_color_handles(&mut self) -> Vec<DeviceHandle> {
        std::mem::take(&mut self.cube_color_handles)
    }

    /// Per-face depth/stencil handles of a cube depth resource.
    pub fn cube_depth_stencil_handles(&self) -> &[DeviceHandle] {
        &self.cube_depth_stencil_handles
    }

    /// Set the per-face depth/stencil handles of a cube depth resource.
    pub fn set_cube_depth_stencil_handles(&mut self, handles: Vec<DeviceHandle>) {
        self.cube_depth_stencil_handles = handles;
    }

    /// Take the per-face depth/stencil handles, leaving the list empty.
    pub fn take_cube_depth_stencil_handles(&mut self) -> Vec<DeviceHandle> {
        std::mem::take(&mut self.cube_depth_stencil_handles)
    }

    /// Sampler state last applied on the device.
    pub fn sampler_cache(&self) -> &SamplerCache {
        &self.sampler_cache
    }

    /// Mutable access to the cached sampler state (bind path).
    pub fn sampler_cache_mut(&mut self) -> &mut SamplerCache {
        &mut self.sampler_cache
    }

    /// Reset the cached sampler state, forcing reapplication on next bind.
    pub fn invalidate_sampler_cache(&mut self) {
        self.sampler_cache.invalidate();
    }

    /// Spherical harmonics polynomial, if computed.
    pub fn spherical_polynomial(&self) -> Option<SphericalPolynomial> {
        self.spherical_polynomial
    }

    /// Set the spherical harmonics polynomial.
    pub fn set_spherical_polynomial(&mut self, polynomial: Option<SphericalPolynomial>) {
        self.spherical_polynomial = polynomial;
    }

    /// Depth/stencil companion texture, if any.
    pub fn depth_stencil_texture(&self) -> Option<TextureId> {
        self.depth_stencil_texture
    }

    /// Set the depth/stencil companion texture.
    pub fn set_depth_stencil_texture(&mut self, id: Option<TextureId>) {
        self.depth_stencil_texture = id;
    }

    /// High-detail LOD proxy texture, if any.
    pub fn lod_high(&self) -> Option<TextureId> {
        self.lod_high
    }

    /// Set the high-detail LOD proxy texture.
    pub fn set_lod_high(&mut self, id: Option<TextureId>) {
        self.lod_high = id;
    }

    /// Mid-detail LOD proxy texture, if any.
    pub fn lod_mid(&self) -> Option<TextureId> {
        self.lod_mid
    }

    /// Set the mid-detail LOD proxy texture.
    pub fn set_lod_mid(&mut self, id: Option<TextureId>) {
        self.lod_mid = id;
    }

    /// Low-detail LOD proxy texture, if any.
    pub fn lod_low(&self) -> Option<TextureId> {
        self.lod_low
    }

    /// Set the low-detail LOD proxy texture.
    pub fn set_lod_low(&mut self, id: Option<TextureId>) {
        self.lod_low = id;
    }

    /// Irradiance proxy texture, if any.
    pub fn irradiance(&self) -> Option<TextureId> {
        self.irradiance
    }

    /// Set the irradiance proxy texture.
    pub fn set_irradiance(&mut self, id: Option<TextureId>) {
        self.irradiance = id;
    }

    /// Current reference count.
    pub fn reference_count(&self) -> u32 {
        self.reference_count
    }

    /// Attach another logical owner.
    pub fn add_reference(&mut self) {
        self.reference_count += 1;
    }

    /// Detach a logical owner, releasing the primary handle when the count
    /// reaches zero.
    ///
    /// A no-op once the primary handle has been released, so calling it again
    /// is always safe. Auxiliary sub-resources are not cascaded; their owners
    /// release them through their own disposal paths.
    pub fn dispose(&mut self, facade: &mut dyn DeviceFacade) {
        let Some(handle) = self.hardware else {
            return;
        };
        self.reference_count = self.reference_count.saturating_sub(1);
        if self.reference_count == 0 {
            log::trace!("releasing texture handle {:?} ({:?})", handle, self.label);
            facade.release_texture(handle);
            self.hardware = None;
        }
    }

    /// Move everything the donor owns into this resource.
    ///
    /// The donor is a freshly manufactured replacement; after the call it is
    /// an empty husk and must be discarded. Pure bookkeeping over
    /// already-created handles, no device calls.
    ///
    /// Returns the ids of sub-resources this resource previously held in
    /// slots the donor overwrote; the caller must dispose them to avoid
    /// leaking their handles.
    pub fn adopt_from(&mut self, mut donor: TextureResource) -> Vec<TextureId> {
        let mut displaced = Vec::new();

        self.hardware = donor.hardware.take();
        self.is_rgbd = donor.is_rgbd;

        if donor.framebuffer.is_some() {
            self.framebuffer = donor.framebuffer.take();
        }
        if donor.depth_stencil_buffer.is_some() {
            self.depth_stencil_buffer = donor.depth_stencil_buffer.take();
        }
        if donor.msaa_framebuffer.is_some() {
            self.msaa_framebuffer = donor.msaa_framebuffer.take();
        }
        if donor.msaa_renderbuffer.is_some() {
            self.msaa_renderbuffer = donor.msaa_renderbuffer.take();
        }
        if !donor.cube_color_handles.is_empty() {
            self.cube_color_handles = std::mem::take(&mut donor.cube_color_handles);
        }
        if !donor.cube_depth_stencil_handles.is_empty() {
            self.cube_depth_stencil_handles =
                std::mem::take(&mut donor.cube_depth_stencil_handles);
        }

        if donor.spherical_polynomial.is_some() {
            self.spherical_polynomial = donor.spherical_polynomial.take();
        }

        // The companion moves even when the donor holds none.
        self.depth_stencil_texture = donor.depth_stencil_texture.take();

        if let Some(id) = donor.lod_high.take() {
            if let Some(prev) = self.lod_high.replace(id) {
                displaced.push(prev);
            }
        }
        if let Some(id) = donor.lod_mid.take() {
            if let Some(prev) = self.lod_mid.replace(id) {
                displaced.push(prev);
            }
        }
        if let Some(id) = donor.lod_low.take() {
            if let Some(prev) = self.lod_low.replace(id) {
                displaced.push(prev);
            }
        }
        if let Some(id) = donor.irradiance.take() {
            if let Some(prev) = self.irradiance.replace(id) {
                displaced.push(prev);
            }
        }

        displaced
    }
}

static_assertions::assert_impl_all!(TextureResource: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::NullFacade;
    use crate::source::TextureSource;
    use std::sync::Arc;

    fn raw_source() -> TextureSource {
        TextureSource::Raw {
            data: Some(Arc::from(&[0u8; 16][..])),
        }
    }

    #[test]
    fn test_construction_allocates() {
        let mut facade = NullFacade::new();
        let resource = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        assert!(resource.hardware().is_some());
        assert_eq!(resource.reference_count(), 1);
        assert!(!resource.ready());
    }

    #[test]
    fn test_construction_deferred() {
        let mut facade = NullFacade::new();
        let probe = facade.probe();
        let resource = TextureResource::new(&mut facade, raw_source(), true).unwrap();
        assert!(resource.hardware().is_none());
        assert_eq!(probe.stats().allocated, 0);
    }

    #[test]
    fn test_update_size() {
        let mut facade = NullFacade::new();
        let mut resource = TextureResource::new(&mut facade, raw_source(), true).unwrap();
        resource.update_size(10, 20, 3);
        assert_eq!(resource.size(), 600);
        assert_eq!(resource.extent(), resource.base_extent());
        assert_eq!(resource.width(), 10);
        assert_eq!(resource.depth(), 3);
    }

    #[test]
    fn test_release_exactly_once() {
        let mut facade = NullFacade::new();
        let probe = facade.probe();
        let mut resource = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        resource.add_reference();
        resource.add_reference();

        resource.dispose(&mut facade);
        resource.dispose(&mut facade);
        assert_eq!(probe.stats().released, 0);
        assert!(resource.hardware().is_some());

        resource.dispose(&mut facade);
        assert_eq!(probe.stats().released, 1);
        assert!(resource.hardware().is_none());

        // Idempotent once the handle is gone.
        resource.dispose(&mut facade);
        resource.dispose(&mut facade);
        assert_eq!(probe.stats().released, 1);
        assert_eq!(resource.reference_count(), 0);
    }

    #[test]
    fn test_adopt_moves_primary_and_rgbd() {
        let mut facade = NullFacade::new();
        let mut target = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        let original = target.hardware();

        let mut donor = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        donor.set_rgbd(true);
        let donor_handle = donor.hardware();

        let displaced = target.adopt_from(donor);
        assert!(displaced.is_empty());
        assert_eq!(target.hardware(), donor_handle);
        assert_ne!(target.hardware(), original);
        assert!(target.is_rgbd());
    }

    #[test]
    fn test_adopt_moves_auxiliary_handles() {
        let mut facade = NullFacade::new();
        let mut target = TextureResource::new(&mut facade, raw_source(), false).unwrap();

        let mut donor = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        let faces: Vec<_> = (0..6)
            .map(|_| facade.allocate_texture().unwrap())
            .collect();
        donor.set_cube_color_handles(faces.clone());
        let msaa_fb = facade.allocate_texture().unwrap();
        let msaa_rb = facade.allocate_texture().unwrap();
        donor.attach_msaa_framebuffer(msaa_fb);
        donor.attach_msaa_renderbuffer(msaa_rb);

        target.adopt_from(donor);
        assert_eq!(target.cube_color_handles(), faces.as_slice());
        assert_eq!(target.msaa_framebuffer(), Some(msaa_fb));
        assert_eq!(target.msaa_renderbuffer(), Some(msaa_rb));
    }

    #[test]
    fn test_adopt_keeps_polynomial_when_donor_has_none() {
        let mut facade = NullFacade::new();
        let mut target = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        let polynomial = SphericalPolynomial::default();
        target.set_spherical_polynomial(Some(polynomial));

        let donor = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        target.adopt_from(donor);
        assert_eq!(target.spherical_polynomial(), Some(polynomial));
    }

    #[test]
    fn test_adopt_keeps_framebuffer_when_donor_has_none() {
        let mut facade = NullFacade::new();
        let mut target = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        let fb = facade.allocate_texture().unwrap();
        target.attach_framebuffer(fb);

        let donor = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        target.adopt_from(donor);
        assert_eq!(target.framebuffer(), Some(fb));
    }

    #[test]
    fn test_adopt_moves_companion_unconditionally() {
        let mut facade = NullFacade::new();
        let mut target = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        target.set_depth_stencil_texture(Some(crate::pool::TextureId::from_raw_parts(7, 0)));

        let donor = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        target.adopt_from(donor);
        assert_eq!(target.depth_stencil_texture(), None);
    }

    #[test]
    fn test_adopt_reports_displaced_lod() {
        let mut facade = NullFacade::new();
        let mut target = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        let old = crate::pool::TextureId::from_raw_parts(1, 0);
        let new = crate::pool::TextureId::from_raw_parts(2, 0);
        target.set_lod_high(Some(old));

        let mut donor = TextureResource::new(&mut facade, raw_source(), false).unwrap();
        donor.set_lod_high(Some(new));

        let displaced = target.adopt_from(donor);
        assert_eq!(displaced, vec![old]);
        assert_eq!(target.lod_high(), Some(new));
    }
}
