//! Core GPU context and device management.
//!
//! This module provides [`GpuContext`], the central struct that holds all wgpu resources
//! needed for path tracing. It manages the instance, adapter, device, and queue, and is
//! passed to everything in the crate that creates or binds GPU resources.
//!
//! # Initialization
//!
//! A `GpuContext` handles all the wgpu boilerplate: instance creation, adapter selection,
//! and device/queue creation. There is no window or surface here — the tracer renders
//! into caller-provided images, so presentation stays with the host application (which
//! can use [`GpuContext::instance`] and [`GpuContext::adapter`] to configure its own
//! surface).
//!
//! # Ray-tracing capability
//!
//! Hardware ray tracing is exposed through wgpu's experimental acceleration-structure
//! and ray-query features. `GpuContext::new` requests them when the adapter offers
//! them and silently proceeds without them otherwise; query the outcome with
//! [`GpuContext::supports_ray_tracing`]. A context without ray-tracing support is still
//! fully usable — the tracer degrades to a pass-through copy and logs a diagnostic.
//!
//! # Example
//!
//! ```no_run
//! use pharos::GpuContext;
//!
//! let gpu = GpuContext::new();
//!
//! if !gpu.supports_ray_tracing() {
//!     eprintln!("no hardware ray tracing on this adapter");
//! }
//!
//! // Access device for creating resources
//! let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
//!     label: Some("My Buffer"),
//!     size: 1024,
//!     usage: wgpu::BufferUsages::UNIFORM,
//!     mapped_at_creation: false,
//! });
//! ```

/// Core GPU context holding wgpu resources.
///
/// This struct owns the fundamental wgpu objects needed for dispatching work:
/// the device for creating GPU resources and the queue for submitting commands.
/// The instance and adapter are kept so a host application can build a surface
/// on the same device if it wants to present the traced output.
///
/// All fields are public to allow direct access to wgpu APIs when needed.
/// The context is typically created once at startup and passed by reference
/// everywhere else.
pub struct GpuContext {
    /// The wgpu instance the adapter was selected from.
    pub instance: wgpu::Instance,
    /// The physical adapter backing the device.
    pub adapter: wgpu::Adapter,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a new GPU context.
    ///
    /// This performs all wgpu initialization:
    /// 1. Creates a wgpu instance with primary backends (Vulkan, Metal, DX12)
    /// 2. Requests a high-performance GPU adapter
    /// 3. Creates the logical device and command queue, enabling the
    ///    acceleration-structure and ray-query features when available
    ///
    /// # Panics
    ///
    /// Panics if no suitable GPU adapter is found or device creation fails.
    pub fn new() -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .expect("Failed to find a suitable GPU adapter");

        let ray_tracing = Self::ray_tracing_features();
        let required_features = if adapter.features().contains(ray_tracing) {
            ray_tracing
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Pharos Device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .expect("Failed to create device");

        Self {
            instance,
            adapter,
            device,
            queue,
        }
    }

    /// The wgpu feature set required for hardware ray tracing.
    pub fn ray_tracing_features() -> wgpu::Features {
        wgpu::Features::EXPERIMENTAL_RAY_QUERY
    }

    /// Returns whether the device was created with ray-tracing support.
    ///
    /// When this is `false`, [`PathTracer::render_image`](crate::PathTracer::render_image)
    /// copies the source image through unchanged instead of tracing.
    pub fn supports_ray_tracing(&self) -> bool {
        self.device.features().contains(Self::ray_tracing_features())
    }
}

impl Default for GpuContext {
    fn default() -> Self {
        Self::new()
    }
}
