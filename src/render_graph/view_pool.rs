//! Cached allocator for derived texture views
//!
//! Views are memoized by a structural key so identical projections requested
//! across frames reuse the backend object. The pool is shared by every frame
//! in flight, so the map sits behind a single mutex; entries are small and
//! insertion is rare relative to lookup.

use crate::backend::types::*;
use crate::backend::{BackendResult, DeviceId, RenderBackend, TextureId, TextureViewId};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Structural identity of a view: every field participates in equality, and
/// the device identity keeps the same texture handle on two devices from
/// colliding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ViewKey {
    device: DeviceId,
    texture: TextureId,
    format: TextureFormat,
    usage: TextureViewUsage,
    aspect: TextureAspect,
    dims: TextureDimension,
    base_mip_level: u32,
    mip_level_count: u32,
    base_array_layer: u32,
    array_layer_count: u32,
}

impl ViewKey {
    fn new(device: DeviceId, desc: &TextureViewDescriptor) -> Self {
        Self {
            device,
            texture: desc.texture,
            format: desc.format,
            usage: desc.usage,
            aspect: desc.aspect,
            dims: desc.dims,
            base_mip_level: desc.base_mip_level,
            mip_level_count: desc.mip_level_count,
            base_array_layer: desc.base_array_layer,
            array_layer_count: desc.array_layer_count,
        }
    }
}

struct PooledView {
    view: TextureViewId,
    last_used: u64,
}

/// Memoizing allocator for backend texture views
pub struct TextureViewPool {
    device: DeviceId,
    views: Mutex<HashMap<ViewKey, PooledView>>,
}

impl TextureViewPool {
    pub fn new(device: DeviceId) -> Self {
        Self {
            device,
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached view for `desc`, creating it on first request.
    ///
    /// A cache hit stamps the entry with `frame_index`; at most one entry
    /// exists per distinct key.
    pub fn allocate(
        &self,
        backend: &mut dyn RenderBackend,
        desc: &TextureViewDescriptor,
        frame_index: u64,
    ) -> BackendResult<TextureViewId> {
        let key = ViewKey::new(self.device, desc);
        let mut views = self.views.lock();
        if let Some(entry) = views.get_mut(&key) {
            entry.last_used = frame_index;
            return Ok(entry.view);
        }
        let view = backend.create_texture_view(desc)?;
        views.insert(
            key,
            PooledView {
                view,
                last_used: frame_index,
            },
        );
        Ok(view)
    }

    /// Release every cached view projecting `texture`; returns the count
    /// removed. Called when the physical texture is destroyed.
    pub fn erase(&self, backend: &mut dyn RenderBackend, texture: TextureId) -> u32 {
        let mut views = self.views.lock();
        let before = views.len();
        views.retain(|key, entry| {
            if key.texture == texture {
                backend.destroy_texture_view(entry.view);
                false
            } else {
                true
            }
        });
        (before - views.len()) as u32
    }

    /// Release entries not used since `critical_frame`; returns the count
    pub fn collect_garbage(&self, backend: &mut dyn RenderBackend, critical_frame: u64) -> u32 {
        let mut views = self.views.lock();
        let before = views.len();
        views.retain(|_, entry| {
            if entry.last_used < critical_frame {
                backend.destroy_texture_view(entry.view);
                false
            } else {
                true
            }
        });
        (before - views.len()) as u32
    }

    /// Release every cached view unconditionally; called at shutdown
    pub fn finalize(&self, backend: &mut dyn RenderBackend) {
        let mut views = self.views.lock();
        for (_, entry) in views.drain() {
            backend.destroy_texture_view(entry.view);
        }
    }

    pub fn len(&self) -> usize {
        self.views.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_desc(texture: TextureId, base_mip: u32) -> TextureViewDescriptor {
        TextureViewDescriptor {
            texture,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureViewUsage::SRV,
            aspect: TextureAspect::COLOR,
            dims: TextureDimension::D2,
            base_mip_level: base_mip,
            mip_level_count: 1,
            base_array_layer: 0,
            array_layer_count: 1,
        }
    }

    #[test]
    fn keys_are_exact_on_every_field() {
        let device = DeviceId(1);
        let a = ViewKey::new(device, &view_desc(TextureId(7), 0));
        let b = ViewKey::new(device, &view_desc(TextureId(7), 0));
        assert_eq!(a, b);

        // A differing mip range is a distinct entry.
        let c = ViewKey::new(device, &view_desc(TextureId(7), 1));
        assert_ne!(a, c);

        // Same texture handle on another device never collides.
        let d = ViewKey::new(DeviceId(2), &view_desc(TextureId(7), 0));
        assert_ne!(a, d);
    }
}
