//! Environment lighting cubemaps.

use crate::gpu::GpuContext;

/// A cube texture providing environment lighting to the path-trace pass.
///
/// Rays that escape the scene sample this map for sky radiance. Face order
/// follows the cube-layer convention: +X, -X, +Y, -Y, +Z, -Z.
///
/// The tracer always has one bound — it starts with a neutral
/// [`solid`](EnvironmentMap::solid) gray map and
/// [`set_environment`](crate::PathTracer::set_environment) swaps in a real
/// one, so a missing user environment never breaks the shader contract.
pub struct EnvironmentMap {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    /// Edge length of each square face in pixels.
    pub face_size: u32,
}

impl EnvironmentMap {
    /// Create a cubemap from six RGBA faces packed contiguously.
    ///
    /// `data` holds the six faces back to back, each `face_size × face_size`
    /// RGBA8 texels, in the face order listed above.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], face_size: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: face_size,
                    height: face_size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            face_size,
        }
    }

    /// Load a cubemap from six image files, one per face.
    ///
    /// Faces are resized to match the first one if their dimensions differ.
    pub fn from_files(
        gpu: &GpuContext,
        paths: [&str; 6],
    ) -> Result<Self, image::ImageError> {
        let mut faces = Vec::with_capacity(6);
        for path in paths {
            faces.push(image::open(path)?.to_rgba8());
        }
        Ok(Self::from_face_images(gpu, faces, paths[0]))
    }

    /// Load a cubemap from six embedded byte slices, one per face.
    pub fn from_bytes(
        gpu: &GpuContext,
        faces: [&[u8]; 6],
        label: &str,
    ) -> Result<Self, image::ImageError> {
        let mut images = Vec::with_capacity(6);
        for bytes in faces {
            images.push(image::load_from_memory(bytes)?.to_rgba8());
        }
        Ok(Self::from_face_images(gpu, images, label))
    }

    fn from_face_images(
        gpu: &GpuContext,
        faces: Vec<image::RgbaImage>,
        label: &str,
    ) -> Self {
        let face_size = faces[0].width().min(faces[0].height()).max(1);

        let mut data = Vec::with_capacity((face_size * face_size * 4 * 6) as usize);
        for face in faces {
            let face = if face.dimensions() == (face_size, face_size) {
                face
            } else {
                image::imageops::resize(
                    &face,
                    face_size,
                    face_size,
                    image::imageops::FilterType::Triangle,
                )
            };
            data.extend_from_slice(&face);
        }

        Self::from_rgba(gpu, &data, face_size, label)
    }

    /// Create a 1×1 single-color cubemap.
    ///
    /// `color` is linear RGB in [0, 1]; useful as a neutral sky or for
    /// furnace-style test renders.
    pub fn solid(gpu: &GpuContext, color: [f32; 3]) -> Self {
        let texel: [u8; 4] = [
            (color[0].clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0) as u8,
            (color[1].clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0) as u8,
            (color[2].clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0) as u8,
            255,
        ];
        let data: Vec<u8> = texel.repeat(6);
        Self::from_rgba(gpu, &data, 1, "Solid Environment")
    }
}
