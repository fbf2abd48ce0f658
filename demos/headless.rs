//! Headless path tracing demo: builds a small scene, traces a handful of
//! frames offscreen, and writes the last one to `traced.png`.
//!
//! Run with `cargo run --example headless`. On a GPU without ray-tracing
//! support the tracer logs a diagnostic and the output is the pass-through
//! source color instead of a render.

use pharos::*;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 540;
const FRAMES: u32 = 16;

fn main() {
    env_logger::init();

    let gpu = GpuContext::new();

    let mut scene = Scene::new();
    scene.push(TraceMesh::plane(40.0));
    scene.push(
        TraceMesh::sphere(48, 24)
            .with_transform(Transform::from_position(Vec3::new(-1.2, 0.5, 0.0))),
    );
    scene.push(TraceMesh::cube().with_transform(
        Transform::new()
            .position(Vec3::new(1.2, 0.5, 0.0))
            .rotation(Quat::from_rotation_y(0.6)),
    ));

    let camera = Camera::new()
        .at(0.0, 1.8, 5.0)
        .looking_at(0.0, 0.5, 0.0)
        .with_fov(55.0);

    let mut tracer = PathTracer::new(&gpu, wgpu::TextureFormat::Rgba8UnormSrgb);
    tracer.set_gbuffer_shader(&gpu, include_str!("shaders/gbuffer.wgsl"));
    tracer.set_path_tracing_shader(&gpu, include_str!("shaders/path_trace.wgsl"));
    tracer.set_environment(EnvironmentMap::solid(&gpu, [0.6, 0.7, 0.9]));

    let source = color_texture(&gpu, wgpu::Color::BLACK, "Demo Source");
    let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());

    let destination = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Demo Destination"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let destination_view = destination.create_view(&wgpu::TextureViewDescriptor::default());

    let viewport = Viewport::new(WIDTH, HEIGHT);
    for _ in 0..FRAMES {
        tracer.update(&gpu, viewport);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Demo Frame"),
            });
        tracer.render_image(
            &gpu,
            &mut encoder,
            &scene,
            &camera,
            &source_view,
            &destination_view,
        );
        gpu.queue.submit(Some(encoder.finish()));
    }

    let pixels = read_back(&gpu, &destination);
    image::RgbaImage::from_raw(WIDTH, HEIGHT, pixels)
        .expect("pixel buffer size mismatch")
        .save("traced.png")
        .expect("failed to write traced.png");

    println!("Traced {} frames at {}x{} -> traced.png", FRAMES, WIDTH, HEIGHT);

    tracer.release();
}

/// Creates a texture cleared to a solid color, usable as a blit source.
fn color_texture(gpu: &GpuContext, color: wgpu::Color, label: &str) -> wgpu::Texture {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(label),
        });
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    gpu.queue.submit(Some(encoder.finish()));

    texture
}

/// Copies the destination texture into a mapped buffer and returns the RGBA
/// bytes. WIDTH is chosen so rows are already 256-byte aligned.
fn read_back(gpu: &GpuContext, texture: &wgpu::Texture) -> Vec<u8> {
    let buffer_size = (WIDTH * HEIGHT * 4) as u64;
    let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Demo Readback"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Demo Readback"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(WIDTH * 4),
                rows_per_image: Some(HEIGHT),
            },
        },
        wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(Some(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).expect("readback channel closed");
    });
    gpu.device
        .poll(wgpu::PollType::wait_indefinitely())
        .expect("device poll failed");
    rx.recv()
        .expect("readback channel closed")
        .expect("buffer map failed");

    let pixels = slice.get_mapped_range().to_vec();
    readback.unmap();
    pixels
}
