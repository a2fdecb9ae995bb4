/// Fixed-slot registry of render targets, indexed by `TargetKind`.
///
/// Creating the same kind twice is an error; iteration order is always the
/// kind order so recording and submission stay deterministic.

use crate::device::ImageHandle;
use crate::engine_error;
use crate::error::{Error, Result};
use crate::scene::CameraId;
use crate::target::{RenderTarget, TargetKind};

pub struct TargetRegistry {
    slots: [Option<RenderTarget>; 4],
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }

    /// Register a new target for `kind`
    pub fn create(&mut self, kind: TargetKind, camera: Option<CameraId>) -> Result<&mut RenderTarget> {
        let slot = &mut self.slots[kind.slot()];
        if slot.is_some() {
            engine_error!(
                "nova3d::TargetRegistry",
                "render target '{}' already exists",
                kind.name()
            );
            return Err(Error::InvalidResource(format!(
                "render target '{}' already exists",
                kind.name()
            )));
        }
        Ok(slot.insert(RenderTarget::new(kind, camera)))
    }

    pub fn contains(&self, kind: TargetKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn get(&self, kind: TargetKind) -> Option<&RenderTarget> {
        self.slots[kind.slot()].as_ref()
    }

    pub fn get_mut(&mut self, kind: TargetKind) -> Option<&mut RenderTarget> {
        self.slots[kind.slot()].as_mut()
    }

    pub fn remove(&mut self, kind: TargetKind) -> Option<RenderTarget> {
        self.slots[kind.slot()].take()
    }

    /// Existing targets in kind order (Composite first)
    pub fn iter(&self) -> impl Iterator<Item = &RenderTarget> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RenderTarget> {
        self.slots.iter_mut().flatten()
    }

    /// Existing kinds in build/record/submit order: scene targets first,
    /// composite last
    pub fn kinds_descending(&self) -> Vec<TargetKind> {
        TargetKind::ALL
            .iter()
            .rev()
            .copied()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    /// Color image the composite pass samples: the target submitted just
    /// before it (UI when present, otherwise a scene target)
    pub fn composite_input(&self) -> Option<ImageHandle> {
        TargetKind::ALL
            .iter()
            .filter(|kind| **kind != TargetKind::Composite)
            .filter_map(|kind| self.get(*kind))
            .find_map(|target| target.attachments.color)
    }

    /// Resolved color image of the primary scene target, the input the UI
    /// overlay pass composites over
    pub fn scene_color(&self) -> Option<ImageHandle> {
        [TargetKind::MainScene, TargetKind::OffscreenColor]
            .iter()
            .filter_map(|kind| self.get(*kind))
            .find_map(|target| target.attachments.color)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "target_registry_tests.rs"]
mod tests;
