//! # Pharos
//!
//! **A GPU path tracing toolkit for Rust built on wgpu.**
//!
//! Point a camera at a scene, hand over two ray-generation shaders, and get
//! path-traced frames — with the resource juggling (render targets,
//! acceleration structures, per-pass bindings) handled for you.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pharos::*;
//!
//! let gpu = GpuContext::new();
//!
//! let mut scene = Scene::new();
//! scene.push(TraceMesh::plane(20.0));
//! scene.push(TraceMesh::sphere(32, 16).with_transform(
//!     Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
//! ));
//!
//! let mut tracer = PathTracer::new(&gpu, wgpu::TextureFormat::Rgba8UnormSrgb);
//! # let (gbuffer_wgsl, path_trace_wgsl) = ("", "");
//! // WGSL sources, e.g. via include_str! — see demos/shaders/
//! tracer.set_gbuffer_shader(&gpu, gbuffer_wgsl);
//! tracer.set_path_tracing_shader(&gpu, path_trace_wgsl);
//!
//! // Each frame:
//! //   tracer.update(&gpu, viewport);
//! //   tracer.render_image(&gpu, &mut encoder, &scene, &camera, &src, &dst);
//! ```
//!
//! ## Philosophy
//!
//! - **Lifecycle, not boilerplate** — targets resize themselves, the
//!   acceleration structure rebuilds itself, teardown is one call.
//! - **Shaders stay yours** — the crate defines a binding contract and
//!   dispatch order; the WGSL ray-generation programs are authored by you.
//! - **Degrade, never crash** — no ray-tracing hardware or missing shaders
//!   mean a logged pass-through copy, not a panic.
//! - **Escape hatches everywhere** — every wgpu handle is reachable when you
//!   need to step outside the toolkit.
//!
//! Hardware ray tracing runs through wgpu's experimental acceleration
//! structure and ray-query features; see [`GpuContext::supports_ray_tracing`].

mod accel;
mod blit;
mod camera;
mod environment;
mod geometry;
mod gpu;
mod mesh;
pub mod raygen;
mod resources;
mod scene;
mod target;
mod tracer;

pub use accel::{AccelBindings, MeshInfo, SceneAccel};
pub use blit::BlitPass;
pub use camera::{Camera, Viewport};
pub use environment::EnvironmentMap;
pub use geometry::{GeometryError, GeometryLoader, RawGeometry};
pub use gpu::GpuContext;
pub use mesh::{TraceMesh, Transform, Vertex3d};
pub use raygen::{GBufferParams, GBufferPass, PathTraceParams, PathTracePass};
pub use scene::Scene;
pub use target::{TargetSet, TraceTarget};
pub use tracer::{PathTracer, TraceSettings};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
