//! No-op device facade for tests and headless development.
//!
//! Mints handles without performing GPU work, clamps dimensions against its
//! configured limits, and records allocation statistics that tests can probe
//! after the facade has been handed to a [`TextureSystem`](crate::system::TextureSystem).

use std::sync::{Arc, Mutex};

use crate::error::TextureError;
use crate::resource::TextureResource;
use crate::source::{DepthStencilOptions, RenderTargetOptions, TextureShape, TextureSource};
use crate::types::{common, Extent3d, SphericalPolynomial};

use super::{DeviceCaps, DeviceFacade, DeviceHandle, DeviceLimits, LoadTicket, RebuildDescriptor};

/// Allocation statistics recorded by [`NullFacade`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullStats {
    /// Handles minted so far.
    pub allocated: u64,
    /// Handles released so far.
    pub released: u64,
}

impl NullStats {
    /// Handles currently outstanding.
    pub fn live(&self) -> u64 {
        self.allocated - self.released
    }
}

#[derive(Debug, Default)]
struct NullState {
    next_handle: u64,
    next_ticket: u64,
    stats: NullStats,
}

/// Shared view into a [`NullFacade`]'s statistics.
#[derive(Debug, Clone)]
pub struct NullProbe {
    state: Arc<Mutex<NullState>>,
}

impl NullProbe {
    /// Snapshot the current statistics.
    pub fn stats(&self) -> NullStats {
        self.state.lock().expect("null facade state poisoned").stats
    }
}

/// Device facade that mints handles without touching a GPU.
#[derive(Debug)]
pub struct NullFacade {
    state: Arc<Mutex<NullState>>,
    caps: DeviceCaps,
    limits: DeviceLimits,
}

impl NullFacade {
    /// Create a facade with every capability and default limits.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NullState::default())),
            caps: DeviceCaps::all(),
            limits: DeviceLimits::default(),
        }
    }

    /// Restrict the reported capabilities.
    pub fn with_caps(mut self, caps: DeviceCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Override the reported limits.
    pub fn with_limits(mut self, limits: DeviceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Obtain a probe that stays valid after the facade is boxed away.
    pub fn probe(&self) -> NullProbe {
        NullProbe {
            state: self.state.clone(),
        }
    }

    fn mint_handle(&self) -> DeviceHandle {
        let mut state = self.state.lock().expect("null facade state poisoned");
        state.next_handle += 1;
        state.stats.allocated += 1;
        DeviceHandle::new(state.next_handle)
    }

    fn mint_ticket(&self) -> LoadTicket {
        let mut state = self.state.lock().expect("null facade state poisoned");
        state.next_ticket += 1;
        LoadTicket::new(state.next_ticket)
    }

    fn clamp(&self, extent: Extent3d) -> Extent3d {
        let max = self.limits.max_texture_dimension;
        Extent3d {
            width: common::clamp_to_limit(extent.width, max),
            height: common::clamp_to_limit(extent.height, max),
            depth: common::clamp_to_limit(extent.depth, max),
        }
    }

    /// Stamp a donor with the descriptor's metadata and clamped dimensions.
    fn manufacture(
        &mut self,
        desc: &RebuildDescriptor,
        source: TextureSource,
    ) -> Result<TextureResource, TextureError> {
        let mut donor = TextureResource::new(self, source, false)?;
        donor.apply_descriptor(desc);
        donor.set_extents(self.clamp(desc.extent), desc.base_extent);
        donor.mark_ready(true);
        Ok(donor)
    }
}

impl Default for NullFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceFacade for NullFacade {
    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn allocate_texture(&mut self) -> Result<DeviceHandle, TextureError> {
        let handle = self.mint_handle();
        log::trace!("NullFacade: allocated {:?}", handle);
        Ok(handle)
    }

    fn release_texture(&mut self, handle: DeviceHandle) {
        log::trace!("NullFacade: released {:?}", handle);
        let mut state = self.state.lock().expect("null facade state poisoned");
        state.stats.released += 1;
    }

    fn create_raw(
        &mut self,
        desc: &RebuildDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureResource, TextureError> {
        log::trace!(
            "NullFacade: creating raw texture {:?} ({} bytes)",
            desc.label,
            data.map_or(0, <[u8]>::len)
        );
        self.manufacture(
            desc,
            TextureSource::Raw {
                data: data.map(Arc::from),
            },
        )
    }

    fn create_raw_3d(
        &mut self,
        desc: &RebuildDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureResource, TextureError> {
        log::trace!("NullFacade: creating raw 3D texture {:?}", desc.label);
        self.manufacture(
            desc,
            TextureSource::Raw3d {
                data: data.map(Arc::from),
            },
        )
    }

    fn create_raw_2d_array(
        &mut self,
        desc: &RebuildDescriptor,
        data: Option<&[u8]>,
    ) -> Result<TextureResource, TextureError> {
        log::trace!("NullFacade: creating raw 2D array texture {:?}", desc.label);
        self.manufacture(
            desc,
            TextureSource::Raw2dArray {
                data: data.map(Arc::from),
            },
        )
    }

    fn create_cube_raw(
        &mut self,
        desc: &RebuildDescriptor,
        faces: &[Arc<[u8]>],
    ) -> Result<TextureResource, TextureError> {
        log::trace!(
            "NullFacade: creating raw cube texture {:?} ({} faces)",
            desc.label,
            faces.len()
        );
        self.manufacture(
            desc,
            TextureSource::CubeRaw {
                faces: faces.to_vec(),
            },
        )
    }

    fn create_dynamic(
        &mut self,
        desc: &RebuildDescriptor,
    ) -> Result<TextureResource, TextureError> {
        log::trace!("NullFacade: creating dynamic texture {:?}", desc.label);
        let mut donor = self.manufacture(desc, TextureSource::Dynamic)?;
        // Content arrives through update_dynamic_content.
        donor.mark_ready(false);
        Ok(donor)
    }

    fn update_dynamic_content(
        &mut self,
        resource: &mut TextureResource,
    ) -> Result<(), TextureError> {
        log::trace!("NullFacade: updating dynamic content for {:?}", resource.label());
        resource.mark_ready(true);
        Ok(())
    }

    fn create_render_target(
        &mut self,
        desc: &RebuildDescriptor,
        options: RenderTargetOptions,
    ) -> Result<TextureResource, TextureError> {
        log::trace!(
            "NullFacade: creating render target {:?} ({:?})",
            desc.label,
            options.shape
        );
        let mut donor = self.manufacture(desc, TextureSource::RenderTarget(options))?;
        let framebuffer = self.mint_handle();
        donor.attach_framebuffer(framebuffer);
        if options.generate_depth_buffer || options.generate_stencil_buffer {
            let depth_stencil = self.mint_handle();
            donor.attach_depth_stencil_buffer(depth_stencil);
        }
        if options.shape == TextureShape::Cube {
            let faces = (0..6).map(|_| self.mint_handle()).collect();
            donor.set_cube_color_handles(faces);
        }
        if desc.samples > 1 && self.caps.contains(DeviceCaps::MULTISAMPLED_RENDER_TARGET) {
            let msaa_framebuffer = self.mint_handle();
            let msaa_renderbuffer = self.mint_handle();
            donor.attach_msaa_framebuffer(msaa_framebuffer);
            donor.attach_msaa_renderbuffer(msaa_renderbuffer);
        }
        Ok(donor)
    }

    fn create_depth_stencil(
        &mut self,
        desc: &RebuildDescriptor,
        options: DepthStencilOptions,
    ) -> Result<TextureResource, TextureError> {
        log::trace!(
            "NullFacade: creating depth/stencil texture {:?} (comparison {:?}, bilinear {})",
            desc.label,
            options.comparison,
            desc.sampling.linear_filtering()
        );
        let mut donor = self.manufacture(desc, TextureSource::Depth(options))?;
        let depth_stencil = self.mint_handle();
        donor.attach_depth_stencil_buffer(depth_stencil);
        if options.shape == TextureShape::Cube {
            let faces = (0..6).map(|_| self.mint_handle()).collect();
            donor.set_cube_depth_stencil_handles(faces);
        }
        Ok(donor)
    }

    fn create_cube_rgbd_shell(
        &mut self,
        desc: &RebuildDescriptor,
    ) -> Result<TextureResource, TextureError> {
        log::trace!("NullFacade: creating RGBD cube shell {:?}", desc.label);
        let mut shell = self.manufacture(desc, TextureSource::CubeRawRgbd { mips: Vec::new() })?;
        shell.set_rgbd(true);
        shell.mark_ready(false);
        Ok(shell)
    }

    fn load_from_url(
        &mut self,
        desc: &RebuildDescriptor,
        url: &str,
        buffer: Option<&[u8]>,
    ) -> Result<LoadTicket, TextureError> {
        log::trace!(
            "NullFacade: loading {:?} from {} (prefetched: {})",
            desc.label,
            url,
            buffer.is_some()
        );
        Ok(self.mint_ticket())
    }

    fn load_cube(
        &mut self,
        desc: &RebuildDescriptor,
        urls: &[String],
    ) -> Result<LoadTicket, TextureError> {
        log::trace!(
            "NullFacade: loading cube {:?} ({} faces)",
            desc.label,
            urls.len()
        );
        Ok(self.mint_ticket())
    }

    fn load_cube_prefiltered(
        &mut self,
        desc: &RebuildDescriptor,
        url: &str,
    ) -> Result<LoadTicket, TextureError> {
        log::trace!("NullFacade: loading prefiltered cube {:?} from {}", desc.label, url);
        Ok(self.mint_ticket())
    }

    fn decode_rgbd(
        &mut self,
        shell: &mut TextureResource,
        mips: &[Vec<Arc<[u8]>>],
        polynomial: Option<&SphericalPolynomial>,
        lod_scale: f32,
        lod_offset: f32,
    ) -> Result<LoadTicket, TextureError> {
        if !self.caps.contains(DeviceCaps::RGBD_DECODE) {
            return Err(TextureError::FeatureNotSupported(
                "RGBD decode".to_string(),
            ));
        }
        log::trace!(
            "NullFacade: decoding RGBD into {:?} ({} mips, polynomial: {}, lod {}/{})",
            shell.label(),
            mips.len(),
            polynomial.is_some(),
            lod_scale,
            lod_offset
        );
        Ok(self.mint_ticket())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextureFormat;

    fn descriptor(width: u32, height: u32) -> RebuildDescriptor {
        RebuildDescriptor {
            label: Some("test".to_string()),
            extent: Extent3d::new_2d(width, height),
            base_extent: Extent3d::new_2d(width, height),
            format: TextureFormat::Rgba8Unorm,
            texel: Default::default(),
            sampling: Default::default(),
            generate_mip_maps: false,
            invert_y: false,
            samples: 1,
            compression: None,
        }
    }

    #[test]
    fn test_stats_counting() {
        let mut facade = NullFacade::new();
        let probe = facade.probe();
        let handle = facade.allocate_texture().unwrap();
        assert_eq!(probe.stats().allocated, 1);
        facade.release_texture(handle);
        assert_eq!(probe.stats().released, 1);
        assert_eq!(probe.stats().live(), 0);
    }

    #[test]
    fn test_dimension_clamping() {
        let mut facade = NullFacade::new().with_limits(DeviceLimits {
            max_texture_dimension: 1024,
        });
        let donor = facade.create_raw(&descriptor(1920, 600), None).unwrap();
        assert_eq!(donor.width(), 1024);
        assert_eq!(donor.height(), 600);
        // Base dimensions stay at the requested values.
        assert_eq!(donor.base_extent().width, 1920);
    }

    #[test]
    fn test_render_target_handles() {
        let mut facade = NullFacade::new();
        let options = RenderTargetOptions {
            generate_depth_buffer: true,
            ..Default::default()
        };
        let donor = facade
            .create_render_target(&descriptor(256, 256), options)
            .unwrap();
        assert!(donor.framebuffer().is_some());
        assert!(donor.depth_stencil_buffer().is_some());
        assert!(donor.msaa_framebuffer().is_none());
    }

    #[test]
    fn test_rgbd_requires_capability() {
        let mut facade = NullFacade::new().with_caps(DeviceCaps::empty());
        let mut shell = TextureResource::new(
            &mut facade,
            TextureSource::CubeRawRgbd { mips: Vec::new() },
            false,
        )
        .unwrap();
        let err = facade
            .decode_rgbd(&mut shell, &[], None, 0.8, 0.0)
            .unwrap_err();
        assert!(matches!(err, TextureError::FeatureNotSupported(_)));
    }
}
