/// Generic create/lookup/release registry for GPU-object wrappers.
///
/// An object lives in exactly one of two collections at any time: the
/// active map (handle -> object) or the inactive free-list (alive but
/// logically free for reuse). `acquire` prefers recycling an inactive
/// instance over constructing a new one; `release` runs the object's
/// cleanup and moves it back to the free-list. The pool exclusively owns
/// every instance; callers hold handles, never the objects themselves.

use slotmap::SlotMap;

use crate::device::GraphicsDevice;
use crate::error::{Error, Result};
use crate::engine_error;

slotmap::new_key_type! {
    /// Generational handle into an [`ObjectPool`]
    pub struct PoolHandle;
}

/// A GPU-object wrapper that can be pooled.
///
/// `initialize` is invoked on every acquire (fresh or recycled instance)
/// and `cleanup` on every release; implementations create and destroy
/// their backend objects there.
pub trait PoolObject: Default {
    /// Per-acquire initialization data
    type Params;

    fn initialize(&mut self, device: &mut dyn GraphicsDevice, params: &Self::Params)
        -> Result<()>;

    fn cleanup(&mut self, device: &mut dyn GraphicsDevice);
}

/// Generic pooled-object registry
pub struct ObjectPool<T: PoolObject> {
    active: SlotMap<PoolHandle, T>,
    inactive: Vec<T>,
}

impl<T: PoolObject> ObjectPool<T> {
    /// Create a new empty pool
    pub fn new() -> Self {
        Self {
            active: SlotMap::with_key(),
            inactive: Vec::new(),
        }
    }

    /// Acquire a ready-to-use object.
    ///
    /// Pulls from the inactive list when non-empty, constructing a new
    /// instance otherwise, and runs the object's initialize routine. On
    /// initialization failure the instance returns to the free-list and
    /// the error is propagated.
    pub fn acquire(
        &mut self,
        device: &mut dyn GraphicsDevice,
        params: &T::Params,
    ) -> Result<PoolHandle> {
        let mut object = self.inactive.pop().unwrap_or_default();
        if let Err(err) = object.initialize(device, params) {
            self.inactive.push(object);
            return Err(err);
        }
        Ok(self.active.insert(object))
    }

    /// Get the active object for a handle
    pub fn lookup(&self, handle: PoolHandle) -> Option<&T> {
        self.active.get(handle)
    }

    /// Get the active object for a handle, mutably
    pub fn lookup_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.active.get_mut(handle)
    }

    /// Release an active object back to the free-list.
    ///
    /// Runs the object's cleanup routine first. Releasing a handle that is
    /// not currently active is an invariant violation: it fails with
    /// [`Error::UnknownHandle`] and leaves both collections unchanged.
    pub fn release(&mut self, device: &mut dyn GraphicsDevice, handle: PoolHandle) -> Result<()> {
        match self.active.remove(handle) {
            Some(mut object) => {
                object.cleanup(device);
                self.inactive.push(object);
                Ok(())
            }
            None => {
                engine_error!("nova3d::ObjectPool", "release of unknown handle {:?}", handle);
                Err(Error::UnknownHandle(format!("{:?}", handle)))
            }
        }
    }

    /// Release every active object back to the free-list
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        let keys: Vec<PoolHandle> = self.active.keys().collect();
        for key in keys {
            if let Some(mut object) = self.active.remove(key) {
                object.cleanup(device);
                self.inactive.push(object);
            }
        }
    }

    /// Pool teardown: release all active objects, then drop the free-list
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        self.release_all(device);
        self.inactive.clear();
    }

    /// Number of active objects
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of inactive objects available for recycling
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }
}

impl<T: PoolObject> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "object_pool_tests.rs"]
mod tests;
