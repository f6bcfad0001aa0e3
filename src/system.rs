//! Rebuild orchestration and ownership-transfer bookkeeping.
//!
//! [`TextureSystem`] owns the resource pool, the live-resource registry, the
//! device facade, and the table of in-flight asynchronous recreations. It runs
//! the recreation state machine after a device loss: manufacture a donor
//! through the facade, adopt it into the long-lived resource, then fix up the
//! registry so it keeps describing device-handle holders.
//!
//! Asynchronous recipes complete through [`TextureSystem::complete_rebuild`],
//! an explicit event delivered on the engine's update thread rather than a
//! callback captured at dispatch time.

use std::collections::HashMap;

use crate::error::TextureError;
use crate::facade::{DeviceCaps, DeviceFacade, LoadTicket};
use crate::pool::{TextureId, TexturePool};
use crate::registry::ResourceRegistry;
use crate::resource::TextureResource;
use crate::source::{SourceKind, TextureSource};

/// Result of a rebuild dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStatus {
    /// The recipe ran synchronously; the resource is rebuilt.
    Completed,
    /// The recipe is waiting on an asynchronous load or decode.
    Pending(LoadTicket),
    /// The source kind has no recreation recipe.
    Skipped,
}

/// Completion event for an asynchronous recreation.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The load produced a donor resource.
    Loaded(TextureResource),
    /// The device finished an operation against an already-parked donor
    /// (RGBD decode).
    Finished,
    /// The load failed.
    Failed(TextureError),
}

#[derive(Debug)]
struct PendingRebuild {
    target: TextureId,
    kind: SourceKind,
    /// Donor manufactured up front (RGBD shell), parked until completion.
    donor: Option<TextureResource>,
}

/// Orchestrates texture lifecycles: pooling, rebuild dispatch, adoption, and
/// registry upkeep.
pub struct TextureSystem {
    pool: TexturePool,
    registry: ResourceRegistry,
    facade: Box<dyn DeviceFacade>,
    pending: HashMap<LoadTicket, PendingRebuild>,
}

impl TextureSystem {
    /// Create a system driving the given facade.
    pub fn new(facade: Box<dyn DeviceFacade>) -> Self {
        Self {
            pool: TexturePool::new(),
            registry: ResourceRegistry::new(),
            facade,
            pending: HashMap::new(),
        }
    }

    /// Create a texture bound to `source` and pool it.
    ///
    /// Unless allocation is deferred, the resource receives a primary handle
    /// and is registered as a live GPU resource.
    pub fn create_texture(
        &mut self,
        source: TextureSource,
        defer_allocation: bool,
    ) -> Result<TextureId, TextureError> {
        let resource = TextureResource::new(self.facade.as_mut(), source, defer_allocation)?;
        let live = resource.hardware().is_some();
        let id = self.pool.insert(resource);
        if live {
            self.registry.insert(id);
        }
        log::debug!("created texture {:?} (live: {})", id, live);
        Ok(id)
    }

    /// Shared access to a pooled resource.
    pub fn get(&self, id: TextureId) -> Option<&TextureResource> {
        self.pool.get(id)
    }

    /// Mutable access to a pooled resource.
    pub fn get_mut(&mut self, id: TextureId) -> Option<&mut TextureResource> {
        self.pool.get_mut(id)
    }

    /// The live-resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Number of pooled resources.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// True when no resources are pooled.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Whether a rebuild is pending for `id`.
    pub fn has_pending_rebuild(&self, id: TextureId) -> bool {
        self.pending.values().any(|pending| pending.target == id)
    }

    /// Attach another logical owner to `id`.
    pub fn add_reference(&mut self, id: TextureId) -> Result<(), TextureError> {
        self.pool
            .get_mut(id)
            .ok_or(TextureError::StaleId(id))?
            .add_reference();
        Ok(())
    }

    /// Detach a logical owner from `id`.
    ///
    /// When the reference count reaches zero the primary handle is released
    /// and the resource leaves the pool and the registry. Disposing a stale id
    /// is a no-op, so repeated disposal is always safe.
    pub fn dispose(&mut self, id: TextureId) -> Result<(), TextureError> {
        let released = {
            let Some(resource) = self.pool.get_mut(id) else {
                log::trace!("dispose of stale texture {:?} ignored", id);
                return Ok(());
            };
            resource.dispose(self.facade.as_mut());
            resource.reference_count() == 0 && resource.hardware().is_none()
        };
        if released {
            self.registry.remove(id);
            self.pool.remove(id);
            log::debug!("texture {:?} fully released", id);
        }
        Ok(())
    }

    /// Update current and base dimensions of `id` identically.
    pub fn update_size(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<(), TextureError> {
        self.pool
            .get_mut(id)
            .ok_or(TextureError::StaleId(id))?
            .update_size(width, height, depth);
        Ok(())
    }

    /// Run the recreation state machine for `id` after a device loss.
    ///
    /// Uniformly resets readiness and the cached sampler state, then
    /// dispatches on the source kind. Synchronous recipes adopt their donor
    /// before returning; asynchronous ones park a pending entry completed
    /// later through [`Self::complete_rebuild`]. A second rebuild while one is
    /// pending for the same target is rejected rather than raced.
    pub fn rebuild(&mut self, id: TextureId) -> Result<RebuildStatus, TextureError> {
        if self.has_pending_rebuild(id) {
            return Err(TextureError::RebuildInFlight(id));
        }

        let (desc, source, polynomial, lod_scale, lod_offset) = {
            let resource = self.pool.get_mut(id).ok_or(TextureError::StaleId(id))?;
            resource.mark_ready(false);
            resource.invalidate_sampler_cache();
            (
                resource.rebuild_descriptor(),
                resource.source().clone(),
                resource.spherical_polynomial(),
                resource.lod_generation_scale(),
                resource.lod_generation_offset(),
            )
        };
        log::debug!("rebuilding texture {:?} (kind {:?})", id, source.kind());

        match source {
            TextureSource::Unknown | TextureSource::Temp | TextureSource::MultiRenderTarget => {
                Ok(RebuildStatus::Skipped)
            }
            TextureSource::Raw { data } => {
                let donor = self.facade.create_raw(&desc, data.as_deref())?;
                self.adopt_and_finish(id, donor, true)?;
                Ok(RebuildStatus::Completed)
            }
            TextureSource::Raw3d { data } => {
                let donor = self.facade.create_raw_3d(&desc, data.as_deref())?;
                self.adopt_and_finish(id, donor, true)?;
                Ok(RebuildStatus::Completed)
            }
            TextureSource::Raw2dArray { data } => {
                let donor = self.facade.create_raw_2d_array(&desc, data.as_deref())?;
                self.adopt_and_finish(id, donor, true)?;
                Ok(RebuildStatus::Completed)
            }
            TextureSource::CubeRaw { faces } => {
                let donor = self.facade.create_cube_raw(&desc, &faces)?;
                self.adopt_and_finish(id, donor, true)?;
                Ok(RebuildStatus::Completed)
            }
            TextureSource::RenderTarget(options) => {
                let donor = self.facade.create_render_target(&desc, options)?;
                self.adopt_and_finish(id, donor, true)?;
                Ok(RebuildStatus::Completed)
            }
            TextureSource::Depth(options) => {
                let donor = self.facade.create_depth_stencil(&desc, options)?;
                self.adopt_and_finish(id, donor, true)?;
                Ok(RebuildStatus::Completed)
            }
            TextureSource::Dynamic => {
                let donor = self.facade.create_dynamic(&desc)?;
                // Readiness belongs to the content-push path.
                self.adopt_and_finish(id, donor, false)?;
                let resource = self.pool.get_mut(id).ok_or(TextureError::StaleId(id))?;
                self.facade.update_dynamic_content(resource)?;
                Ok(RebuildStatus::Completed)
            }
            TextureSource::Url { url, buffer } => {
                let ticket = self.facade.load_from_url(&desc, &url, buffer.as_deref())?;
                self.park(ticket, id, SourceKind::Url, None);
                Ok(RebuildStatus::Pending(ticket))
            }
            TextureSource::Cube { urls } => {
                let ticket = self.facade.load_cube(&desc, &urls)?;
                self.park(ticket, id, SourceKind::Cube, None);
                Ok(RebuildStatus::Pending(ticket))
            }
            TextureSource::CubePrefiltered { url } => {
                let ticket = self.facade.load_cube_prefiltered(&desc, &url)?;
                self.park(ticket, id, SourceKind::CubePrefiltered, None);
                Ok(RebuildStatus::Pending(ticket))
            }
            TextureSource::CubeRawRgbd { mips } => {
                if !self.facade.caps().contains(DeviceCaps::RGBD_DECODE) {
                    return Err(TextureError::FeatureNotSupported(
                        "RGBD decode".to_string(),
                    ));
                }
                let mut shell = self.facade.create_cube_rgbd_shell(&desc)?;
                let ticket = self.facade.decode_rgbd(
                    &mut shell,
                    &mips,
                    polynomial.as_ref(),
                    lod_scale,
                    lod_offset,
                )?;
                self.park(ticket, id, SourceKind::CubeRawRgbd, Some(shell));
                Ok(RebuildStatus::Pending(ticket))
            }
        }
    }

    /// Rebuild every registered resource, e.g. after a full context loss.
    pub fn rebuild_all(&mut self) -> Result<Vec<(TextureId, RebuildStatus)>, TextureError> {
        let ids: Vec<_> = self.registry.iter().collect();
        let mut statuses = Vec::with_capacity(ids.len());
        for id in ids {
            let status = self.rebuild(id)?;
            statuses.push((id, status));
        }
        Ok(statuses)
    }

    /// Deliver the completion of an asynchronous recreation.
    ///
    /// If the target was disposed while the load was in flight, the donor's
    /// handles are released and the event is dropped with a warning. A failed
    /// prefiltered-cube load still marks the target ready: its content simply
    /// stays whatever it was. Other kinds surface the load error.
    pub fn complete_rebuild(
        &mut self,
        ticket: LoadTicket,
        outcome: LoadOutcome,
    ) -> Result<(), TextureError> {
        let pending = self
            .pending
            .remove(&ticket)
            .ok_or(TextureError::UnknownTicket(ticket))?;
        let target = pending.target;

        if !self.pool.contains(target) {
            log::warn!(
                "completion for disposed texture {:?} (ticket {:?})",
                target,
                ticket
            );
            if let LoadOutcome::Loaded(donor) = outcome {
                self.release_orphan(donor);
            }
            if let Some(shell) = pending.donor {
                self.release_orphan(shell);
            }
            return Ok(());
        }

        match outcome {
            LoadOutcome::Failed(err) => {
                if let Some(shell) = pending.donor {
                    self.release_orphan(shell);
                }
                if pending.kind == SourceKind::CubePrefiltered {
                    // Best effort by contract for this kind only.
                    log::warn!("prefiltered cube load failed for {:?}: {}", target, err);
                    self.mark_ready(target);
                    Ok(())
                } else {
                    Err(err)
                }
            }
            LoadOutcome::Loaded(mut donor) => {
                // A loaded donor supersedes any donor parked at dispatch time.
                if let Some(shell) = pending.donor {
                    self.release_orphan(shell);
                }
                if pending.kind == SourceKind::CubePrefiltered {
                    let polynomial = self
                        .pool
                        .get(target)
                        .and_then(|resource| resource.spherical_polynomial());
                    donor.set_spherical_polynomial(polynomial);
                }
                self.adopt_and_finish(target, donor, true)
            }
            LoadOutcome::Finished => {
                let shell = pending.donor.ok_or_else(|| {
                    TextureError::LoadFailed("completion without a donor".to_string())
                })?;
                self.adopt_and_finish(target, shell, true)
            }
        }
    }

    /// Adopt a donor into `target`: swap at the pool level, retire the donor's
    /// slot, dispose displaced sub-resources, and fix up the registry.
    pub fn adopt(
        &mut self,
        target: TextureId,
        donor: TextureResource,
    ) -> Result<(), TextureError> {
        let donor_id = self.pool.insert(donor);
        self.adopt_pooled(target, donor_id)
    }

    /// Adopt one pooled resource into another.
    ///
    /// After the call the registry lists `target` exactly once and does not
    /// list `donor`, whichever of the two was present beforehand.
    pub fn adopt_pooled(
        &mut self,
        target: TextureId,
        donor: TextureId,
    ) -> Result<(), TextureError> {
        let displaced = match self.pool.adopt(target, donor) {
            Ok(displaced) => displaced,
            Err(err) => {
                if let Some(orphan) = self.pool.remove(donor) {
                    self.registry.remove(donor);
                    self.release_orphan(orphan);
                }
                return Err(err);
            }
        };
        self.registry.remove(donor);
        self.registry.insert(target);
        for sub in displaced {
            log::debug!("disposing displaced sub-resource {:?}", sub);
            self.dispose(sub)?;
        }
        Ok(())
    }

    /// Adopt a freshly manufactured donor and apply its authoritative
    /// dimensions, which a recipe may have clamped against device limits.
    fn adopt_and_finish(
        &mut self,
        target: TextureId,
        donor: TextureResource,
        ready: bool,
    ) -> Result<(), TextureError> {
        let extent = donor.extent();
        let base_extent = donor.base_extent();
        self.adopt(target, donor)?;
        if let Some(resource) = self.pool.get_mut(target) {
            resource.set_extents(extent, base_extent);
            if ready {
                resource.mark_ready(true);
            }
        }
        Ok(())
    }

    fn park(
        &mut self,
        ticket: LoadTicket,
        target: TextureId,
        kind: SourceKind,
        donor: Option<TextureResource>,
    ) {
        self.pending.insert(
            ticket,
            PendingRebuild {
                target,
                kind,
                donor,
            },
        );
    }

    fn mark_ready(&mut self, id: TextureId) {
        if let Some(resource) = self.pool.get_mut(id) {
            resource.mark_ready(true);
        }
    }

    /// Release every handle a never-adopted donor still owns.
    fn release_orphan(&mut self, mut donor: TextureResource) {
        log::warn!("releasing orphaned donor {:?}", donor.label());
        if let Some(handle) = donor.take_hardware() {
            self.facade.release_texture(handle);
        }
        if let Some(handle) = donor.take_framebuffer() {
            self.facade.release_texture(handle);
        }
        if let Some(handle) = donor.take_depth_stencil_buffer() {
            self.facade.release_texture(handle);
        }
        if let Some(handle) = donor.take_msaa_framebuffer() {
            self.facade.release_texture(handle);
        }
        if let Some(handle) = donor.take_msaa_renderbuffer() {
            self.facade.release_texture(handle);
        }
        for handle in donor.take_cube_color_handles() {
            self.facade.release_texture(handle);
        }
        for handle in donor.take_cube_depth_stencil_handles() {
            self.facade.release_texture(handle);
        }
    }
}

static_assertions::assert_impl_all!(TextureSystem: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::NullFacade;

    fn system() -> TextureSystem {
        TextureSystem::new(Box::new(NullFacade::new()))
    }

    #[test]
    fn test_create_registers_live_resources() {
        let mut system = system();
        let id = system.create_texture(TextureSource::Raw { data: None }, false).unwrap();
        assert!(system.registry().contains(id));
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn test_create_deferred_not_registered() {
        let mut system = system();
        let id = system.create_texture(TextureSource::Raw { data: None }, true).unwrap();
        assert!(!system.registry().contains(id));
        assert!(system.get(id).unwrap().hardware().is_none());
    }

    #[test]
    fn test_dispose_stale_is_noop() {
        let mut system = system();
        let id = system.create_texture(TextureSource::Raw { data: None }, false).unwrap();
        system.dispose(id).unwrap();
        assert!(system.get(id).is_none());
        // Second disposal of the now-stale id.
        system.dispose(id).unwrap();
    }

    #[test]
    fn test_unknown_ticket() {
        let mut system = system();
        let err = system
            .complete_rebuild(LoadTicket::new(42), LoadOutcome::Finished)
            .unwrap_err();
        assert_eq!(err, TextureError::UnknownTicket(LoadTicket::new(42)));
    }
}
