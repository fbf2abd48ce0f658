//! The path tracer component: per-frame sequencing and lifecycle.
//!
//! [`PathTracer`] ties the rest of the crate together. A host application
//! drives it with two calls per frame and one at teardown:
//!
//! 1. [`update`](PathTracer::update) — make sure the render targets match
//!    the viewport and the acceleration slot exists;
//! 2. [`render_image`](PathTracer::render_image) — rebuild the acceleration
//!    structure, run the G-buffer and path-trace dispatches in that order,
//!    and composite the result onto the destination image;
//! 3. [`release`](PathTracer::release) — free every GPU resource (also
//!    implied by drop).
//!
//! # Graceful degradation
//!
//! `render_image` never panics over missing prerequisites. Without hardware
//! ray tracing or with a shader program unset it logs an error and copies
//! the source image through unchanged; before the resources exist (normal
//! during startup ordering) it silently skips the frame and leaves the
//! destination untouched.
//!
//! # Example
//!
//! ```no_run
//! use pharos::*;
//!
//! let gpu = GpuContext::new();
//! let mut scene = Scene::new();
//! scene.push(TraceMesh::cube());
//!
//! let mut tracer = PathTracer::new(&gpu, wgpu::TextureFormat::Rgba8UnormSrgb);
//! # let (gbuffer_wgsl, path_trace_wgsl) = ("", "");
//! // WGSL sources, e.g. via include_str! — see demos/shaders/
//! tracer.set_gbuffer_shader(&gpu, gbuffer_wgsl);
//! tracer.set_path_tracing_shader(&gpu, path_trace_wgsl);
//!
//! let camera = Camera::new().at(0.0, 1.0, 4.0).looking_at(0.0, 0.0, 0.0);
//! # let (source, destination): (wgpu::TextureView, wgpu::TextureView) = unimplemented!();
//! let mut encoder = gpu.device.create_command_encoder(&Default::default());
//!
//! tracer.update(&gpu, Viewport::new(1280, 720));
//! tracer.render_image(&gpu, &mut encoder, &scene, &camera, &source, &destination);
//! gpu.queue.submit(Some(encoder.finish()));
//! ```

use crate::blit::BlitPass;
use crate::camera::{Camera, Viewport};
use crate::environment::EnvironmentMap;
use crate::gpu::GpuContext;
use crate::raygen::{GBufferParams, GBufferPass, PathTraceParams, PathTracePass};
use crate::resources::FrameResources;
use crate::scene::Scene;

/// Bounce limits for the path-trace pass.
///
/// Threaded explicitly into every dispatch — changing them takes effect the
/// next frame, and nothing global is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceSettings {
    /// Maximum bounces through opaque surfaces. Valid range 1–100.
    pub bounce_count_opaque: u32,
    /// Maximum bounces through transparent surfaces. Valid range 1–100.
    pub bounce_count_transparent: u32,
}

impl TraceSettings {
    /// Lowest accepted bounce limit.
    pub const MIN_BOUNCES: u32 = 1;
    /// Highest accepted bounce limit.
    pub const MAX_BOUNCES: u32 = 100;

    /// Returns a copy with both limits clamped into the valid range.
    pub fn clamped(self) -> Self {
        Self {
            bounce_count_opaque: self
                .bounce_count_opaque
                .clamp(Self::MIN_BOUNCES, Self::MAX_BOUNCES),
            bounce_count_transparent: self
                .bounce_count_transparent
                .clamp(Self::MIN_BOUNCES, Self::MAX_BOUNCES),
        }
    }
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            bounce_count_opaque: 5,
            bounce_count_transparent: 8,
        }
    }
}

/// Why a frame was degraded to a pass-through copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DegradeReason {
    RayTracingUnsupported,
    ShaderMissing,
}

impl DegradeReason {
    fn message(self) -> &'static str {
        match self {
            DegradeReason::RayTracingUnsupported => {
                "ray tracing is not supported by this GPU or graphics API; copying source through"
            }
            DegradeReason::ShaderMissing => {
                "a ray-generation shader was not set on the tracer; copying source through"
            }
        }
    }
}

/// What `render_image` decided to do with this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FrameDecision {
    /// Run the full trace sequence.
    Trace,
    /// Log a diagnostic and copy source to destination unchanged.
    PassThrough(DegradeReason),
    /// Leave the destination untouched (startup ordering; not an error).
    Skip,
}

/// Pure precondition gate for a frame, in check order.
///
/// Capability and configuration failures degrade loudly; resources that have
/// simply not been created yet skip silently, since the first frames of a
/// session legitimately arrive before `update` has run.
pub(crate) fn frame_decision(
    supports_ray_tracing: bool,
    shaders_ready: bool,
    accel_ready: bool,
    targets_ready: bool,
) -> FrameDecision {
    if !supports_ray_tracing {
        return FrameDecision::PassThrough(DegradeReason::RayTracingUnsupported);
    }
    if !shaders_ready {
        return FrameDecision::PassThrough(DegradeReason::ShaderMissing);
    }
    if !accel_ready || !targets_ready {
        return FrameDecision::Skip;
    }
    FrameDecision::Trace
}

/// The path tracing component.
///
/// Owns the two ray-generation passes (set from externally-authored WGSL),
/// the environment map, the render targets and acceleration structure, and
/// the per-frame sequencing. See the module docs for the frame protocol.
pub struct PathTracer {
    gbuffer: Option<GBufferPass>,
    path_trace: Option<PathTracePass>,
    environment: EnvironmentMap,
    settings: TraceSettings,
    resources: FrameResources,
    blit: BlitPass,
    frame_index: u32,
    supports_ray_tracing: bool,
}

impl PathTracer {
    /// Creates a tracer that composites into images of `output_format`.
    ///
    /// The tracer starts with no shader programs (frames degrade to a
    /// pass-through until both are set) and a neutral gray environment.
    pub fn new(gpu: &GpuContext, output_format: wgpu::TextureFormat) -> Self {
        Self {
            gbuffer: None,
            path_trace: None,
            environment: EnvironmentMap::solid(gpu, [0.5, 0.5, 0.5]),
            settings: TraceSettings::default(),
            resources: FrameResources::new(),
            blit: BlitPass::new(gpu, output_format),
            frame_index: 0,
            supports_ray_tracing: gpu.supports_ray_tracing(),
        }
    }

    /// Sets (or replaces) the G-buffer ray-generation shader.
    ///
    /// See [`raygen`](crate::raygen) for the WGSL contract.
    pub fn set_gbuffer_shader(&mut self, gpu: &GpuContext, shader_source: &str) {
        self.gbuffer = Some(GBufferPass::new(gpu, shader_source));
    }

    /// Sets (or replaces) the path-tracing ray-generation shader.
    ///
    /// See [`raygen`](crate::raygen) for the WGSL contract.
    pub fn set_path_tracing_shader(&mut self, gpu: &GpuContext, shader_source: &str) {
        self.path_trace = Some(PathTracePass::new(gpu, shader_source));
    }

    /// Replaces the environment lighting cubemap.
    pub fn set_environment(&mut self, environment: EnvironmentMap) {
        self.environment = environment;
    }

    /// Sets the bounce limits used from the next frame on.
    pub fn set_settings(&mut self, settings: TraceSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> TraceSettings {
        self.settings
    }

    /// Frames traced so far (wraps at `u32::MAX`). Skipped and degraded
    /// frames do not advance it.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Per-frame resource upkeep. Call before [`render_image`].
    ///
    /// Ensures the acceleration slot exists and the render targets match
    /// `viewport`, reallocating them only when the size actually changed.
    pub fn update(&mut self, gpu: &GpuContext, viewport: Viewport) {
        self.resources.ensure(gpu, viewport);
    }

    /// Traces one frame and composites it onto `destination`.
    ///
    /// Runs the fixed sequence: acceleration rebuild, G-buffer dispatch,
    /// path-trace dispatch, composite blit — all recorded on `encoder`, which
    /// the caller submits. On degraded frames `source` is copied to
    /// `destination` instead; on skipped frames nothing is recorded.
    ///
    /// `destination` must match the `output_format` the tracer was created
    /// with and carry `RENDER_ATTACHMENT` usage.
    pub fn render_image(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        camera: &Camera,
        source: &wgpu::TextureView,
        destination: &wgpu::TextureView,
    ) {
        let shaders_ready = self.gbuffer.is_some() && self.path_trace.is_some();
        let decision = frame_decision(
            self.supports_ray_tracing,
            shaders_ready,
            self.resources.accel_ready(),
            self.resources.targets().is_some(),
        );

        match decision {
            FrameDecision::PassThrough(reason) => {
                log::error!("{}", reason.message());
                self.blit.blit(gpu, encoder, source, destination);
                return;
            }
            FrameDecision::Skip => return,
            FrameDecision::Trace => {}
        }

        // Static scenes do not strictly need this every frame; dynamic ones do.
        if let Some(accel) = self.resources.accel_mut() {
            accel.prepare(gpu, scene);
            accel.build(encoder, scene);
        }

        let (Some(targets), Some(accel), Some(gbuffer), Some(path_trace)) = (
            self.resources.targets(),
            self.resources.accel(),
            self.gbuffer.as_ref(),
            self.path_trace.as_ref(),
        ) else {
            return;
        };
        let Some(bindings) = accel.bindings() else {
            return;
        };

        let viewport = targets.viewport();

        gbuffer.dispatch(
            gpu,
            encoder,
            &bindings,
            GBufferParams::new(camera, viewport),
            targets,
        );

        path_trace.dispatch(
            gpu,
            encoder,
            &bindings,
            PathTraceParams::new(camera, viewport, self.frame_index, self.settings),
            &self.environment,
            targets,
        );

        self.blit
            .blit(gpu, encoder, &targets.radiance.view, destination);

        self.frame_index = self.frame_index.wrapping_add(1);
    }

    /// Releases the acceleration structure and all render targets.
    ///
    /// Idempotent; the tracer is usable again after the next
    /// [`update`](Self::update). Shader programs, environment, and settings
    /// survive a release.
    pub fn release(&mut self) {
        self.resources.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_and_clamp() {
        let settings = TraceSettings::default();
        assert_eq!(settings.bounce_count_opaque, 5);
        assert_eq!(settings.bounce_count_transparent, 8);

        let clamped = TraceSettings {
            bounce_count_opaque: 0,
            bounce_count_transparent: 1000,
        }
        .clamped();
        assert_eq!(clamped.bounce_count_opaque, 1);
        assert_eq!(clamped.bounce_count_transparent, 100);

        // In-range values pass through untouched
        assert_eq!(settings.clamped(), settings);
    }

    #[test]
    fn unsupported_hardware_degrades_first() {
        // Capability beats every other condition, configured or not.
        for shaders in [false, true] {
            for accel in [false, true] {
                for targets in [false, true] {
                    assert_eq!(
                        frame_decision(false, shaders, accel, targets),
                        FrameDecision::PassThrough(DegradeReason::RayTracingUnsupported),
                    );
                }
            }
        }
    }

    #[test]
    fn missing_shaders_degrade_regardless_of_resources() {
        for accel in [false, true] {
            for targets in [false, true] {
                assert_eq!(
                    frame_decision(true, false, accel, targets),
                    FrameDecision::PassThrough(DegradeReason::ShaderMissing),
                );
            }
        }
    }

    #[test]
    fn missing_resources_skip_silently() {
        assert_eq!(frame_decision(true, true, false, true), FrameDecision::Skip);
        assert_eq!(frame_decision(true, true, true, false), FrameDecision::Skip);
        assert_eq!(
            frame_decision(true, true, false, false),
            FrameDecision::Skip
        );
    }

    #[test]
    fn all_preconditions_met_traces() {
        assert_eq!(frame_decision(true, true, true, true), FrameDecision::Trace);
    }
}
