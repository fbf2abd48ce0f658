//! Per-frame resource lifecycle: render targets and the acceleration slot.
//!
//! This module is the bookkeeping half of the tracer. It owns the three
//! render targets and the scene acceleration structure, recreating the
//! targets when the viewport size changes and tearing everything down on
//! release. The rules come straight from the component contract:
//!
//! - ensuring resources is idempotent — calling it twice with the same
//!   viewport allocates nothing new;
//! - targets are reallocated if and only if the requested size differs from
//!   the last-allocated size (including the first call);
//! - releasing is idempotent and zeroes the cached viewport, so a later
//!   ensure starts from scratch;
//! - nothing is ever touched after release without an ensure in between.

use crate::accel::SceneAccel;
use crate::camera::Viewport;
use crate::gpu::GpuContext;
use crate::target::TargetSet;

/// Explicit lifecycle for a lazily-created, releasable resource.
///
/// The three states replace the nullable-handle pattern: a slot is `Absent`
/// before first creation, `Allocated` while usable, and `Released` after
/// teardown. Creation from `Absent` or `Released` is allowed; creating while
/// `Allocated` is a no-op.
pub(crate) enum ResourceSlot<T> {
    Absent,
    Allocated(T),
    Released,
}

impl<T> ResourceSlot<T> {
    /// Creates the resource if the slot is empty. Idempotent.
    ///
    /// Returns whether a new resource was actually created.
    pub fn ensure(&mut self, create: impl FnOnce() -> T) -> bool {
        match self {
            ResourceSlot::Allocated(_) => false,
            ResourceSlot::Absent | ResourceSlot::Released => {
                *self = ResourceSlot::Allocated(create());
                true
            }
        }
    }

    /// Drops the resource if present. Idempotent.
    pub fn release(&mut self) {
        if matches!(self, ResourceSlot::Allocated(_)) {
            *self = ResourceSlot::Released;
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            ResourceSlot::Allocated(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            ResourceSlot::Allocated(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self, ResourceSlot::Allocated(_))
    }
}

/// Tracks the last-allocated viewport to detect size changes.
///
/// `changed` both answers and records: it returns `true` when the requested
/// size differs from the remembered one (including the first call after a
/// reset) and remembers the new size.
#[derive(Default)]
pub(crate) struct SizeCache {
    last: Viewport,
}

impl SizeCache {
    /// Returns whether `viewport` differs from the last recorded size,
    /// recording it either way.
    pub fn changed(&mut self, viewport: Viewport) -> bool {
        let changed = self.last != viewport;
        self.last = viewport;
        changed
    }

    /// Forgets the recorded size (back to zero), forcing the next call to
    /// report a change.
    pub fn reset(&mut self) {
        self.last = Viewport::ZERO;
    }
}

/// Owns every GPU resource the tracer creates: the target set and the
/// acceleration-structure slot.
pub struct FrameResources {
    targets: Option<TargetSet>,
    size: SizeCache,
    accel: ResourceSlot<SceneAccel>,
}

impl FrameResources {
    pub fn new() -> Self {
        Self {
            targets: None,
            size: SizeCache::default(),
            accel: ResourceSlot::Absent,
        }
    }

    /// Ensures the acceleration slot exists and the targets match `viewport`.
    ///
    /// Idempotent: with an unchanged, non-empty viewport this does nothing.
    /// An empty viewport releases the targets (there is nothing to size them
    /// to) but leaves the acceleration slot alone.
    pub fn ensure(&mut self, gpu: &GpuContext, viewport: Viewport) {
        self.accel.ensure(|| SceneAccel::new(gpu));

        if self.size.changed(viewport) {
            if let Some(targets) = self.targets.take() {
                targets.destroy();
            }
            if !viewport.is_empty() {
                self.targets = Some(TargetSet::new(gpu, viewport));
            }
        }
    }

    /// Releases the acceleration structure and all render targets.
    ///
    /// Safe to call any number of times; a released manager is equivalent to
    /// a fresh one except that the slot remembers it was torn down.
    pub fn release_all(&mut self) {
        if let Some(targets) = self.targets.take() {
            targets.destroy();
        }
        self.accel.release();
        self.size.reset();
    }

    pub fn targets(&self) -> Option<&TargetSet> {
        self.targets.as_ref()
    }

    pub fn accel(&self) -> Option<&SceneAccel> {
        self.accel.get()
    }

    pub fn accel_mut(&mut self) -> Option<&mut SceneAccel> {
        self.accel.get_mut()
    }

    pub fn accel_ready(&self) -> bool {
        self.accel.is_allocated()
    }
}

impl Default for FrameResources {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_allocates_exactly_once() {
        let mut slot: ResourceSlot<u32> = ResourceSlot::Absent;
        let mut creations = 0;

        assert!(slot.ensure(|| {
            creations += 1;
            7
        }));
        assert!(!slot.ensure(|| {
            creations += 1;
            8
        }));

        assert_eq!(creations, 1);
        assert_eq!(slot.get(), Some(&7));
    }

    #[test]
    fn slot_release_is_idempotent() {
        let mut slot: ResourceSlot<u32> = ResourceSlot::Absent;
        slot.release(); // releasing an absent slot is a no-op
        assert!(!slot.is_allocated());

        slot.ensure(|| 1);
        slot.release();
        slot.release();
        assert!(!slot.is_allocated());
        assert!(slot.get().is_none());
    }

    #[test]
    fn slot_can_reallocate_after_release() {
        let mut slot: ResourceSlot<u32> = ResourceSlot::Absent;
        slot.ensure(|| 1);
        slot.release();
        assert!(slot.ensure(|| 2));
        assert_eq!(slot.get(), Some(&2));
    }

    #[test]
    fn size_cache_reports_change_only_on_difference() {
        let mut cache = SizeCache::default();

        // First call always differs from the zeroed initial state
        assert!(cache.changed(Viewport::new(640, 480)));
        assert!(!cache.changed(Viewport::new(640, 480)));
        assert!(!cache.changed(Viewport::new(640, 480)));

        assert!(cache.changed(Viewport::new(1280, 720)));
        assert!(!cache.changed(Viewport::new(1280, 720)));
    }

    #[test]
    fn size_cache_reset_forces_reallocation() {
        let mut cache = SizeCache::default();
        cache.changed(Viewport::new(800, 600));

        cache.reset();
        // Back at the zeroed state: zero is "unchanged", anything else differs
        assert!(!cache.changed(Viewport::ZERO));
        assert!(cache.changed(Viewport::new(800, 600)));
    }
}
