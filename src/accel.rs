//! Scene acceleration structure: per-mesh BLASes, the TLAS, and the packed
//! geometry tables the ray-generation shaders fetch hit attributes from.
//!
//! [`SceneAccel`] is the GPU half of a [`Scene`](crate::Scene). It owns:
//!
//! - one bottom-level acceleration structure (BLAS) per mesh;
//! - the top-level acceleration structure (TLAS) with one instance per mesh,
//!   transform re-read from the scene every frame;
//! - three storage buffers with every mesh's data packed back to back — a
//!   global vertex table, a global index table, and a per-mesh [`MeshInfo`]
//!   record of offsets into the two.
//!
//! wgpu's ray-query intersections report instance and primitive indices, not
//! surface data, so shaders reconstruct normals by indexing these tables with
//! `instance_custom_data` (the packed mesh index) and `primitive_index`.
//!
//! Packing is CPU-side and happens only when the scene's geometry generation
//! changes; the acceleration structures themselves are rebuilt on the frame
//! encoder every frame, which keeps moving meshes correct at the cost of
//! redundant work for static ones.

use crate::gpu::GpuContext;
use crate::mesh::{TraceMesh, Vertex3d};
use crate::scene::Scene;
use wgpu::util::DeviceExt;

/// Per-mesh offsets into the packed vertex and index tables (16 bytes).
///
/// Bound to both ray-generation passes as a read-only storage buffer, indexed
/// by the TLAS instance's `instance_custom_data`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshInfo {
    /// First vertex of this mesh in the packed vertex table.
    pub vertex_offset: u32,
    /// First index of this mesh in the packed index table.
    pub index_offset: u32,
    pub _pad: [u32; 2],
}

/// One packed mesh: its table offsets plus which scene mesh it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MeshRange {
    pub scene_index: usize,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub first_index: u32,
    pub index_count: u32,
}

/// CPU-side result of packing a scene's meshes into contiguous tables.
#[derive(Default)]
pub(crate) struct PackedGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
    pub infos: Vec<MeshInfo>,
    pub ranges: Vec<MeshRange>,
}

/// Packs all non-empty meshes back to back. Empty meshes are skipped — a
/// zero-triangle BLAS is not buildable and contributes nothing anyway.
pub(crate) fn pack_meshes(meshes: &[TraceMesh]) -> PackedGeometry {
    let mut packed = PackedGeometry::default();

    for (scene_index, mesh) in meshes.iter().enumerate() {
        if mesh.indices().is_empty() || mesh.vertices().is_empty() {
            continue;
        }

        let first_vertex = packed.vertices.len() as u32;
        let first_index = packed.indices.len() as u32;

        packed.vertices.extend_from_slice(mesh.vertices());
        packed.indices.extend_from_slice(mesh.indices());

        packed.infos.push(MeshInfo {
            vertex_offset: first_vertex,
            index_offset: first_index,
            _pad: [0; 2],
        });
        packed.ranges.push(MeshRange {
            scene_index,
            first_vertex,
            vertex_count: mesh.vertex_count(),
            first_index,
            index_count: mesh.index_count(),
        });
    }

    packed
}

/// Borrowed handles to everything a ray-generation pass binds from the
/// acceleration structure.
pub struct AccelBindings<'a> {
    pub tlas: &'a wgpu::Tlas,
    pub vertices: &'a wgpu::Buffer,
    pub indices: &'a wgpu::Buffer,
    pub mesh_info: &'a wgpu::Buffer,
}

/// The scene's GPU acceleration structure and geometry tables.
///
/// Created empty by the resource manager; [`SceneAccel::prepare`] uploads
/// buffers and creates BLAS/TLAS objects lazily and whenever the scene's
/// geometry changes, and [`SceneAccel::build`] records the per-frame
/// acceleration-structure build.
pub struct SceneAccel {
    tlas: Option<wgpu::Tlas>,
    tlas_capacity: u32,
    blases: Vec<wgpu::Blas>,
    blas_sizes: Vec<wgpu::BlasTriangleGeometrySizeDescriptor>,
    ranges: Vec<MeshRange>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    info_buffer: Option<wgpu::Buffer>,
    packed_generation: Option<u64>,
}

impl SceneAccel {
    /// Creates an empty acceleration structure. No GPU work happens until
    /// [`prepare`](Self::prepare) sees a scene.
    pub fn new(_gpu: &GpuContext) -> Self {
        Self {
            tlas: None,
            tlas_capacity: 0,
            blases: Vec::new(),
            blas_sizes: Vec::new(),
            ranges: Vec::new(),
            vertex_buffer: None,
            index_buffer: None,
            info_buffer: None,
            packed_generation: None,
        }
    }

    /// Re-uploads geometry tables and recreates BLAS/TLAS objects if the
    /// scene's geometry changed since the last call. No-op otherwise.
    pub fn prepare(&mut self, gpu: &GpuContext, scene: &Scene) {
        if self.packed_generation == Some(scene.generation()) {
            return;
        }

        let packed = pack_meshes(scene.meshes());
        let device = &gpu.device;

        // Storage buffers reject zero sizes, so an empty scene gets one
        // zeroed element per table.
        let empty_vertex = [Vertex3d::new([0.0; 3], [0.0; 3], [0.0; 2])];
        let empty_index = [0u32];
        let empty_info = [MeshInfo {
            vertex_offset: 0,
            index_offset: 0,
            _pad: [0; 2],
        }];

        let vertices: &[Vertex3d] = if packed.vertices.is_empty() {
            &empty_vertex
        } else {
            &packed.vertices
        };
        let indices: &[u32] = if packed.indices.is_empty() {
            &empty_index
        } else {
            &packed.indices
        };
        let infos: &[MeshInfo] = if packed.infos.is_empty() {
            &empty_info
        } else {
            &packed.infos
        };

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertex Table"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::BLAS_INPUT | wgpu::BufferUsages::STORAGE,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Index Table"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::BLAS_INPUT | wgpu::BufferUsages::STORAGE,
        }));
        self.info_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Mesh Info Table"),
            contents: bytemuck::cast_slice(infos),
            usage: wgpu::BufferUsages::STORAGE,
        }));

        self.blas_sizes = packed
            .ranges
            .iter()
            .map(|range| wgpu::BlasTriangleGeometrySizeDescriptor {
                vertex_format: wgpu::VertexFormat::Float32x3,
                vertex_count: range.vertex_count,
                index_format: Some(wgpu::IndexFormat::Uint32),
                index_count: Some(range.index_count),
                flags: wgpu::AccelerationStructureGeometryFlags::OPAQUE,
            })
            .collect();

        self.blases = self
            .blas_sizes
            .iter()
            .map(|size| {
                device.create_blas(
                    &wgpu::CreateBlasDescriptor {
                        label: Some("Scene BLAS"),
                        flags: wgpu::AccelerationStructureFlags::PREFER_FAST_TRACE,
                        update_mode: wgpu::AccelerationStructureUpdateMode::Build,
                    },
                    wgpu::BlasGeometrySizeDescriptors::Triangles {
                        descriptors: vec![size.clone()],
                    },
                )
            })
            .collect();

        let needed = packed.ranges.len() as u32;
        if self.tlas.is_none() || self.tlas_capacity < needed {
            let capacity = needed.max(1);
            self.tlas = Some(device.create_tlas(&wgpu::CreateTlasDescriptor {
                label: Some("Scene TLAS"),
                max_instances: capacity,
                flags: wgpu::AccelerationStructureFlags::PREFER_FAST_TRACE,
                update_mode: wgpu::AccelerationStructureUpdateMode::Build,
            }));
            self.tlas_capacity = capacity;
        }

        self.ranges = packed.ranges;
        self.packed_generation = Some(scene.generation());
    }

    /// Records a full acceleration-structure rebuild on the frame encoder.
    ///
    /// Instance transforms are read from the scene now, so moving a mesh
    /// between frames needs nothing beyond this call.
    pub fn build(&mut self, encoder: &mut wgpu::CommandEncoder, scene: &Scene) {
        let (Some(tlas), Some(vertex_buffer), Some(index_buffer)) = (
            self.tlas.as_mut(),
            self.vertex_buffer.as_ref(),
            self.index_buffer.as_ref(),
        ) else {
            return;
        };

        let meshes = scene.meshes();
        for (slot, range) in self.ranges.iter().enumerate() {
            let transform = meshes[range.scene_index].transform;
            tlas[slot] = Some(wgpu::TlasInstance::new(
                &self.blases[slot],
                transform.instance_rows(),
                slot as u32,
                0xff,
            ));
        }
        // Unused capacity stays empty.
        for slot in self.ranges.len()..self.tlas_capacity as usize {
            tlas[slot] = None;
        }

        let entries: Vec<wgpu::BlasBuildEntry> = self
            .ranges
            .iter()
            .zip(&self.blases)
            .zip(&self.blas_sizes)
            .map(|((range, blas), size)| wgpu::BlasBuildEntry {
                blas,
                geometry: wgpu::BlasGeometries::TriangleGeometries(vec![
                    wgpu::BlasTriangleGeometry {
                        size,
                        vertex_buffer,
                        first_vertex: range.first_vertex,
                        vertex_stride: Vertex3d::STRIDE,
                        index_buffer: Some(index_buffer),
                        first_index: Some(range.first_index),
                        transform_buffer: None,
                        transform_buffer_offset: None,
                    },
                ]),
            })
            .collect();

        encoder.build_acceleration_structures(entries.iter(), std::iter::once(&*tlas));
    }

    /// Everything a ray-generation pass binds, or `None` before the first
    /// [`prepare`](Self::prepare).
    pub fn bindings(&self) -> Option<AccelBindings<'_>> {
        Some(AccelBindings {
            tlas: self.tlas.as_ref()?,
            vertices: self.vertex_buffer.as_ref()?,
            indices: self.index_buffer.as_ref()?,
            mesh_info: self.info_buffer.as_ref()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TraceMesh;

    #[test]
    fn packing_is_contiguous() {
        let meshes = vec![TraceMesh::cube(), TraceMesh::plane(2.0), TraceMesh::sphere(8, 4)];
        let packed = pack_meshes(&meshes);

        assert_eq!(packed.ranges.len(), 3);
        assert_eq!(packed.infos.len(), 3);

        let mut expected_vertex = 0;
        let mut expected_index = 0;
        for (range, info) in packed.ranges.iter().zip(&packed.infos) {
            assert_eq!(range.first_vertex, expected_vertex);
            assert_eq!(range.first_index, expected_index);
            assert_eq!(info.vertex_offset, expected_vertex);
            assert_eq!(info.index_offset, expected_index);
            expected_vertex += range.vertex_count;
            expected_index += range.index_count;
        }

        assert_eq!(packed.vertices.len() as u32, expected_vertex);
        assert_eq!(packed.indices.len() as u32, expected_index);
    }

    #[test]
    fn packing_skips_empty_meshes() {
        let meshes = vec![
            TraceMesh::cube(),
            TraceMesh::new(Vec::new(), Vec::new()),
            TraceMesh::plane(1.0),
        ];
        let packed = pack_meshes(&meshes);

        assert_eq!(packed.ranges.len(), 2);
        assert_eq!(packed.ranges[0].scene_index, 0);
        assert_eq!(packed.ranges[1].scene_index, 2);
    }

    #[test]
    fn packed_indices_stay_mesh_local() {
        // Index values are not rebased during packing; shaders add
        // vertex_offset themselves, and BLAS builds use first_vertex.
        let meshes = vec![TraceMesh::plane(1.0), TraceMesh::plane(1.0)];
        let packed = pack_meshes(&meshes);

        assert_eq!(&packed.indices[..6], &[0, 1, 2, 2, 3, 0]);
        assert_eq!(&packed.indices[6..], &[0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn mesh_info_is_16_bytes() {
        assert_eq!(std::mem::size_of::<MeshInfo>(), 16);
    }
}
