//! Ray-generation shader passes for G-buffer and path-trace dispatch.
//!
//! This module provides the two compute passes the tracer runs each frame.
//! Both are built from externally-authored WGSL — the crate defines the
//! binding contract and the dispatch mechanics, the shader defines what the
//! rays actually do.
//!
//! - **G-buffer** ([`GBufferPass`]): primary-ray pass writing world-space
//!   normals and hit distance, the inputs a denoiser wants.
//! - **Path trace** ([`PathTracePass`]): the full light-transport pass
//!   writing radiance.
//!
//! # Shader Requirements
//!
//! Your WGSL shader must define a compute entry point named `main_ray_gen`
//! with an 8×8 workgroup. Dispatches are sized with ceiling division so every
//! pixel is covered; guard the ragged edge against the viewport size:
//!
//! ```wgsl
//! @compute @workgroup_size(8, 8, 1)
//! fn main_ray_gen(@builtin(global_invocation_id) gid: vec3u) {
//!     let dims = textureDimensions(g_world_normals);
//!     if gid.x >= dims.x || gid.y >= dims.y { return; }
//!     // ...
//! }
//! ```
//!
//! # Binding Contract
//!
//! Vertices are tightly packed scalars (32 bytes, matching
//! [`Vertex3d`](crate::Vertex3d)), not `vec3f` fields — WGSL would pad those
//! to 48 bytes and disagree with the buffer:
//!
//! ```wgsl
//! struct Vertex { px: f32, py: f32, pz: f32, nx: f32, ny: f32, nz: f32, u: f32, v: f32 }
//! struct MeshInfo { vertex_offset: u32, index_offset: u32, pad0: u32, pad1: u32 }
//! ```
//!
//! G-buffer pass, group 0:
//!
//! ```wgsl
//! struct GBufferParams {
//!     camera_pos: vec3f,     zoom: f32,
//!     camera_forward: vec3f, aspect_ratio: f32,
//!     camera_right: vec3f,   _pad0: f32,
//!     camera_up: vec3f,      _pad1: f32,
//! }
//! @group(0) @binding(0) var g_accel_struct: acceleration_structure;
//! @group(0) @binding(1) var<uniform> g_params: GBufferParams;
//! @group(0) @binding(2) var<storage, read> g_vertices: array<Vertex>;
//! @group(0) @binding(3) var<storage, read> g_indices: array<u32>;
//! @group(0) @binding(4) var<storage, read> g_mesh_info: array<MeshInfo>;
//! @group(0) @binding(5) var g_world_normals: texture_storage_2d<rgba32float, write>;
//! @group(0) @binding(6) var g_intersection_t: texture_storage_2d<r32float, write>;
//! ```
//!
//! Path-trace pass, group 0 — bindings 0–4 as above, then:
//!
//! ```wgsl
//! struct PathTraceParams {
//!     camera_pos: vec3f,     zoom: f32,
//!     camera_forward: vec3f, aspect_ratio: f32,
//!     camera_right: vec3f,   frame_index: u32,
//!     camera_up: vec3f,      bounce_count_opaque: u32,
//!     bounce_count_transparent: u32, _pad0: u32, _pad1: u32, _pad2: u32,
//! }
//! @group(0) @binding(1) var<uniform> g_params: PathTraceParams;
//! @group(0) @binding(5) var g_env_tex: texture_cube<f32>;
//! @group(0) @binding(6) var g_env_sampler: sampler;
//! @group(0) @binding(7) var g_radiance: texture_storage_2d<rgba32float, write>;
//! ```
//!
//! # Ray Construction
//!
//! To cast the primary ray through a pixel:
//!
//! ```wgsl
//! let uv = (vec2f(gid.xy) + 0.5) / vec2f(dims) * 2.0 - 1.0;
//! let dir = normalize(
//!     g_params.camera_forward
//!         + uv.x * g_params.aspect_ratio * g_params.zoom * g_params.camera_right
//!         - uv.y * g_params.zoom * g_params.camera_up
//! );
//! ```

use crate::accel::AccelBindings;
use crate::camera::{Camera, Viewport};
use crate::gpu::GpuContext;
use crate::target::TargetSet;
use crate::tracer::TraceSettings;

/// Compute entry point both ray-generation passes must export.
pub const RAY_GEN_ENTRY_POINT: &str = "main_ray_gen";

/// Workgroup edge length; dispatches are `ceil(w/8) × ceil(h/8)`.
pub const WORKGROUP_SIZE: u32 = 8;

/// Uniform block for the G-buffer pass, rebuilt every frame.
///
/// Layout matches the WGSL `GBufferParams` struct (64 bytes, vec3 fields
/// padded with the adjacent scalar).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GBufferParams {
    /// Camera position in world space.
    pub camera_pos: [f32; 3],
    /// `tan(fov / 2)` — image-plane half-height one unit out.
    pub zoom: f32,
    /// Camera forward direction (normalized).
    pub camera_forward: [f32; 3],
    /// Viewport width / height.
    pub aspect_ratio: f32,
    /// Camera right direction (normalized).
    pub camera_right: [f32; 3],
    pub _pad0: f32,
    /// Camera up direction (normalized, orthogonal to forward).
    pub camera_up: [f32; 3],
    pub _pad1: f32,
}

impl GBufferParams {
    pub fn new(camera: &Camera, viewport: Viewport) -> Self {
        Self {
            camera_pos: camera.position.to_array(),
            zoom: camera.zoom(),
            camera_forward: camera.forward.to_array(),
            aspect_ratio: viewport.aspect(),
            camera_right: camera.right().to_array(),
            _pad0: 0.0,
            camera_up: camera.orthogonal_up().to_array(),
            _pad1: 0.0,
        }
    }
}

/// Uniform block for the path-trace pass, rebuilt every frame.
///
/// Bounce limits ride in here explicitly — there is no process-wide shader
/// state anywhere in the crate.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PathTraceParams {
    pub camera_pos: [f32; 3],
    pub zoom: f32,
    pub camera_forward: [f32; 3],
    pub aspect_ratio: f32,
    pub camera_right: [f32; 3],
    /// Monotonic frame counter, for per-frame RNG seeding.
    pub frame_index: u32,
    pub camera_up: [f32; 3],
    /// Maximum bounces through opaque surfaces (clamped to 1–100).
    pub bounce_count_opaque: u32,
    /// Maximum bounces through transparent surfaces (clamped to 1–100).
    pub bounce_count_transparent: u32,
    pub _pad: [u32; 3],
}

impl PathTraceParams {
    pub fn new(
        camera: &Camera,
        viewport: Viewport,
        frame_index: u32,
        settings: TraceSettings,
    ) -> Self {
        let settings = settings.clamped();
        Self {
            camera_pos: camera.position.to_array(),
            zoom: camera.zoom(),
            camera_forward: camera.forward.to_array(),
            aspect_ratio: viewport.aspect(),
            camera_right: camera.right().to_array(),
            frame_index,
            camera_up: camera.orthogonal_up().to_array(),
            bounce_count_opaque: settings.bounce_count_opaque,
            bounce_count_transparent: settings.bounce_count_transparent,
            _pad: [0; 3],
        }
    }
}

fn geometry_layout_entries(first: u32) -> [wgpu::BindGroupLayoutEntry; 3] {
    let storage = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    [storage(first), storage(first + 1), storage(first + 2)]
}

fn storage_texture_entry(binding: u32, format: wgpu::TextureFormat) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

fn base_layout_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::AccelerationStructure {
                vertex_return: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
    ]
}

fn create_ray_gen_pipeline(
    gpu: &GpuContext,
    shader_source: &str,
    layout: &wgpu::BindGroupLayout,
    label: &str,
) -> wgpu::ComputePipeline {
    let shader = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

    let pipeline_layout = gpu
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });

    gpu.device
        .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(RAY_GEN_ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        })
}

fn workgroups_for(viewport: Viewport) -> (u32, u32) {
    (
        viewport.width.div_ceil(WORKGROUP_SIZE),
        viewport.height.div_ceil(WORKGROUP_SIZE),
    )
}

/// The G-buffer ray-generation pass.
///
/// Compiled once from WGSL source; per frame the tracer uploads fresh
/// [`GBufferParams`] and dispatches over the viewport, writing the
/// world-normal and intersection-distance targets.
pub struct GBufferPass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
}

impl GBufferPass {
    /// Create the pass from WGSL shader source.
    ///
    /// See the module-level documentation for the binding contract the
    /// shader must match.
    pub fn new(gpu: &GpuContext, shader_source: &str) -> Self {
        let mut entries = Vec::new();
        entries.extend(base_layout_entries());
        entries.extend(geometry_layout_entries(2));
        entries.push(storage_texture_entry(5, wgpu::TextureFormat::Rgba32Float));
        entries.push(storage_texture_entry(6, wgpu::TextureFormat::R32Float));

        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("GBuffer Bind Group Layout"),
                entries: &entries,
            });

        let params_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("GBuffer Params"),
            size: std::mem::size_of::<GBufferParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pipeline = create_ray_gen_pipeline(gpu, shader_source, &layout, "GBuffer Pipeline");

        Self {
            pipeline,
            layout,
            params_buffer,
        }
    }

    /// Uploads params, binds the scene, and records the dispatch.
    pub(crate) fn dispatch(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        accel: &AccelBindings<'_>,
        params: GBufferParams,
        targets: &TargetSet,
    ) {
        gpu.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GBuffer Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::AccelerationStructure(accel.tlas),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: accel.vertices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: accel.indices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: accel.mesh_info.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&targets.world_normals.view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(&targets.intersection_t.view),
                },
            ],
        });

        let viewport = targets.viewport();
        let (gx, gy) = workgroups_for(viewport);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("GBuffer Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(gx, gy, 1);
    }
}

/// The path-tracing ray-generation pass.
///
/// Same shape as [`GBufferPass`] with the environment cubemap bound as an
/// extra input and radiance as the output.
pub struct PathTracePass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
}

impl PathTracePass {
    /// Create the pass from WGSL shader source.
    ///
    /// See the module-level documentation for the binding contract the
    /// shader must match.
    pub fn new(gpu: &GpuContext, shader_source: &str) -> Self {
        let mut entries = Vec::new();
        entries.extend(base_layout_entries());
        entries.extend(geometry_layout_entries(2));
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 5,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::Cube,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 6,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        entries.push(storage_texture_entry(7, wgpu::TextureFormat::Rgba32Float));

        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PathTrace Bind Group Layout"),
                entries: &entries,
            });

        let params_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("PathTrace Params"),
            size: std::mem::size_of::<PathTraceParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pipeline = create_ray_gen_pipeline(gpu, shader_source, &layout, "PathTrace Pipeline");

        Self {
            pipeline,
            layout,
            params_buffer,
        }
    }

    /// Uploads params, binds the scene and environment, and records the
    /// dispatch.
    pub(crate) fn dispatch(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        accel: &AccelBindings<'_>,
        params: PathTraceParams,
        environment: &crate::environment::EnvironmentMap,
        targets: &TargetSet,
    ) {
        gpu.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PathTrace Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::AccelerationStructure(accel.tlas),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: accel.vertices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: accel.indices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: accel.mesh_info.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::Sampler(&environment.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::TextureView(&targets.radiance.view),
                },
            ],
        });

        let viewport = targets.viewport();
        let (gx, gy) = workgroups_for(viewport);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("PathTrace Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(gx, gy, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_blocks_have_uniform_friendly_sizes() {
        assert_eq!(std::mem::size_of::<GBufferParams>(), 64);
        assert_eq!(std::mem::size_of::<PathTraceParams>(), 80);
    }

    #[test]
    fn both_passes_share_zoom_and_aspect() {
        let camera = Camera::new().with_fov(75.0);
        let viewport = Viewport::new(1920, 1080);

        let gbuffer = GBufferParams::new(&camera, viewport);
        let trace = PathTraceParams::new(&camera, viewport, 42, TraceSettings::default());

        assert_eq!(gbuffer.zoom, trace.zoom);
        assert_eq!(gbuffer.aspect_ratio, trace.aspect_ratio);
        assert!((gbuffer.zoom - (camera.fov * 0.5).tan()).abs() < 1e-6);
        assert!((gbuffer.aspect_ratio - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn trace_params_clamp_bounce_counts() {
        let camera = Camera::new();
        let viewport = Viewport::new(64, 64);
        let settings = TraceSettings {
            bounce_count_opaque: 0,
            bounce_count_transparent: 500,
        };

        let params = PathTraceParams::new(&camera, viewport, 0, settings);
        assert_eq!(params.bounce_count_opaque, 1);
        assert_eq!(params.bounce_count_transparent, 100);
    }

    #[test]
    fn workgroup_math_covers_ragged_edges() {
        assert_eq!(workgroups_for(Viewport::new(64, 64)), (8, 8));
        assert_eq!(workgroups_for(Viewport::new(65, 63)), (9, 8));
        assert_eq!(workgroups_for(Viewport::new(1, 1)), (1, 1));
    }
}
