// Host-side tests for model loading. The main crate is wasm-only, so we
// include the pure-Rust module directly.

#![allow(dead_code)]
#[path = "../src/core/model.rs"]
mod model;

use glam::{Mat4, Vec3};
use model::*;

// One triangle, node translated to z = 2, buffer inlined as a data URI.
const TRIANGLE_GLTF: &str = r#"{
  "asset": {"version": "2.0"},
  "scene": 0,
  "scenes": [{"nodes": [0]}],
  "nodes": [{"mesh": 0, "translation": [0, 0, 2]}],
  "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
  "buffers": [{"byteLength": 36, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"}],
  "bufferViews": [{"buffer": 0, "byteLength": 36}],
  "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0, 0, 0], "max": [1, 1, 0]}]
}"#;

#[test]
fn loads_gltf_and_bakes_node_and_offset() {
    let mesh = load_glb(TRIANGLE_GLTF.as_bytes(), Vec3::new(0.0, -1.2, 0.0)).unwrap();
    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.material_count, 1);
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    let (lo, hi) = mesh.bounds().unwrap();
    assert!(lo.distance(Vec3::new(0.0, -1.2, 2.0)) < 1e-5);
    assert!(hi.distance(Vec3::new(1.0, -0.2, 2.0)) < 1e-5);
    for v in &mesh.vertices {
        assert!(Vec3::from(v.normal).distance(Vec3::Z) < 1e-5);
        assert_eq!(v.color, [1.0, 1.0, 1.0, 1.0]);
    }
}

#[test]
fn garbage_bytes_are_rejected() {
    assert!(matches!(
        load_glb(b"definitely not a model", Vec3::ZERO),
        Err(ModelError::Gltf(_))
    ));
}

#[test]
fn scene_without_meshes_has_no_geometry() {
    let empty = r#"{"asset":{"version":"2.0"},"scenes":[{"nodes":[0]}],"nodes":[{}]}"#;
    assert!(matches!(
        load_glb(empty.as_bytes(), Vec3::ZERO),
        Err(ModelError::NoGeometry)
    ));
}

#[test]
fn primitives_append_with_rebased_indices() {
    let mut mesh = CpuMesh::default();
    let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    mesh.push_primitive(&tri, None, Some(&[0, 1, 2]), [1.0; 4], Mat4::IDENTITY);
    mesh.push_primitive(
        &tri,
        None,
        None,
        [0.5; 4],
        Mat4::from_translation(Vec3::X * 3.0),
    );
    assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(mesh.material_count, 2);
    assert_eq!(mesh.vertices[3].position, [3.0, 0.0, 0.0]);
    assert_eq!(mesh.vertices[5].color, [0.5; 4]);

    mesh.push_primitive(&[], None, None, [1.0; 4], Mat4::IDENTITY);
    assert_eq!(mesh.material_count, 2);
}

#[test]
fn normals_are_area_weighted_and_safe() {
    let quad = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 0.0, -1.0],
        [0.0, 0.0, -1.0],
    ];
    let normals = compute_normals(&quad, &[0, 1, 2, 0, 2, 3]);
    for n in normals {
        assert!(Vec3::from(n).distance(Vec3::Y) < 1e-5);
    }
    // out-of-range indices are skipped; isolated vertices point up
    let normals = compute_normals(&quad, &[0, 1, 9]);
    assert!(normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
}

#[test]
fn empty_mesh_has_no_bounds() {
    assert!(CpuMesh::default().bounds().is_none());
    assert_eq!(CpuMesh::default().triangle_count(), 0);
}
