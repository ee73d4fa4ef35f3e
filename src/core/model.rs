//! GLB loading into one flat, world-space triangle list.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("glTF parse failed: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("model contains no triangle geometry")]
    NoGeometry,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

#[derive(Clone, Debug, Default)]
pub struct CpuMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// One per glTF primitive; each gets its own environment binding.
    pub material_count: usize,
}

impl CpuMesh {
    pub fn triangle_count(&self) -> u64 {
        (self.indices.len() / 3) as u64
    }

    /// Axis-aligned bounds, or `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut it = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Append a primitive, baking `transform` into positions and normals.
    pub fn push_primitive(
        &mut self,
        positions: &[[f32; 3]],
        normals: Option<&[[f32; 3]]>,
        indices: Option<&[u32]>,
        color: [f32; 4],
        transform: Mat4,
    ) {
        if positions.is_empty() {
            return;
        }
        let base = self.vertices.len() as u32;
        let local_indices: Vec<u32> = match indices {
            Some(ix) => ix.to_vec(),
            None => (0..positions.len() as u32).collect(),
        };
        let computed;
        let normals = match normals {
            Some(n) if n.len() == positions.len() => n,
            _ => {
                computed = compute_normals(positions, &local_indices);
                &computed[..]
            }
        };
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
        for (p, n) in positions.iter().zip(normals) {
            let world = transform.transform_point3(Vec3::from(*p));
            let nrm = (normal_matrix * Vec3::from(*n)).normalize_or_zero();
            self.vertices.push(MeshVertex {
                position: world.to_array(),
                normal: nrm.to_array(),
                color,
            });
        }
        self.indices.extend(local_indices.iter().map(|i| base + i));
        self.material_count += 1;
    }
}

/// Area-weighted vertex normals.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from(positions[a]);
        let n = (Vec3::from(positions[b]) - pa).cross(Vec3::from(positions[c]) - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

fn visit_node(
    node: gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    mesh: &mut CpuMesh,
) {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let world = parent * local;
    if let Some(m) = node.mesh() {
        for prim in m.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
            let indices: Option<Vec<u32>> = reader.read_indices().map(|i| i.into_u32().collect());
            let color = prim
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();
            mesh.push_primitive(
                &positions,
                normals.as_deref(),
                indices.as_deref(),
                color,
                world,
            );
        }
    }
    for child in node.children() {
        visit_node(child, world, buffers, mesh);
    }
}

/// Parse a GLB/glTF byte slice and place it at `offset`.
pub fn load_glb(bytes: &[u8], offset: Vec3) -> Result<CpuMesh, ModelError> {
    let (doc, buffers, _images) = gltf::import_slice(bytes)?;
    let root = Mat4::from_translation(offset);
    let mut mesh = CpuMesh::default();
    let scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .ok_or(ModelError::NoGeometry)?;
    for node in scene.nodes() {
        visit_node(node, root, &buffers, &mut mesh);
    }
    if mesh.indices.is_empty() {
        return Err(ModelError::NoGeometry);
    }
    Ok(mesh)
}
