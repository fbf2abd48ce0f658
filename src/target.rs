//! Storage-texture render targets for the ray-generation passes.
//!
//! The tracer writes into three off-screen images each frame: the traced
//! radiance, and the two G-buffer planes a denoiser would consume (world
//! normals and intersection distance). All three are random-write storage
//! textures, single-sampled, sized exactly to the viewport, and owned
//! exclusively by the resource manager — they are destroyed and recreated as
//! a unit whenever the viewport size changes.

use crate::camera::Viewport;
use crate::gpu::GpuContext;

/// A single GPU render target with random-write access.
///
/// Wraps a 2D `wgpu::Texture` and its default view. Created with
/// `STORAGE_BINDING` so ray-generation shaders can write arbitrary texels,
/// plus `TEXTURE_BINDING` so later passes (the composite blit, an external
/// denoiser) can read it back.
pub struct TraceTarget {
    /// The underlying GPU texture that stores pixel data.
    pub texture: wgpu::Texture,
    /// A view into the texture, used for shader binding.
    pub view: wgpu::TextureView,
    /// The texel format the target was created with.
    pub format: wgpu::TextureFormat,
}

impl TraceTarget {
    /// Creates a new render target at the given viewport size.
    ///
    /// # Arguments
    ///
    /// * `gpu` - The GPU context providing the device
    /// * `viewport` - Pixel dimensions; must be non-empty
    /// * `format` - Texel format (must support storage use)
    /// * `label` - Debug label for the texture (visible in GPU debuggers like RenderDoc)
    pub fn new(gpu: &GpuContext, viewport: Viewport, format: wgpu::TextureFormat, label: &str) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: viewport.width,
                height: viewport.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            format,
        }
    }

    /// Frees the GPU memory immediately instead of waiting for drop.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// The three render targets the tracer writes each frame.
pub struct TargetSet {
    /// Path-traced radiance, composited onto the destination image.
    pub radiance: TraceTarget,
    /// World-space surface normals (G-buffer, denoiser input).
    pub world_normals: TraceTarget,
    /// Primary-ray hit distance (G-buffer, denoiser input).
    pub intersection_t: TraceTarget,
    viewport: Viewport,
}

impl TargetSet {
    /// Allocates all three targets at the given size.
    pub fn new(gpu: &GpuContext, viewport: Viewport) -> Self {
        Self {
            radiance: TraceTarget::new(
                gpu,
                viewport,
                wgpu::TextureFormat::Rgba32Float,
                "Radiance Target",
            ),
            world_normals: TraceTarget::new(
                gpu,
                viewport,
                wgpu::TextureFormat::Rgba32Float,
                "World Normals Target",
            ),
            intersection_t: TraceTarget::new(
                gpu,
                viewport,
                wgpu::TextureFormat::R32Float,
                "Intersection T Target",
            ),
            viewport,
        }
    }

    /// The size the set was allocated at.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Destroys all three textures.
    pub fn destroy(&self) {
        self.radiance.destroy();
        self.world_normals.destroy();
        self.intersection_t.destroy();
    }
}
