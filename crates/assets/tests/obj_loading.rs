//! Integration tests for OBJ loading.

use std::io::Write;
use std::path::Path;

use aster_assets::MeshData;

/// Writes a small OBJ file and checks that loading deduplicates shared
/// corners and preserves the triangle list.
#[test]
fn test_load_obj_quad_dedup() {
    // A unit quad as two triangles sharing a diagonal. Four unique
    // position/uv pairs referenced by six face corners.
    let obj = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";

    let dir = std::env::temp_dir().join("aster_obj_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("quad.obj");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(obj.as_bytes()).unwrap();

    let mesh = MeshData::load_obj(&path).unwrap();

    assert_eq!(mesh.triangle_count(), 2);
    assert_eq!(mesh.indices.len(), 6);
    // 6 corners collapse to 4 unique vertices
    assert_eq!(mesh.vertices.len(), 4);

    // Every index refers to a valid vertex
    for &index in &mesh.indices {
        assert!((index as usize) < mesh.vertices.len());
    }

    // The shared corners (vertex 1 and 3 of the quad) appear twice
    assert_eq!(mesh.indices[0], mesh.indices[3]);
    assert_eq!(mesh.indices[2], mesh.indices[4]);
}

/// Loading a model shipped with the repository, when present.
#[test]
fn test_load_bundled_model() {
    let model_path = Path::new("../../assets/models/viking_room.obj");

    // Skip if assets are not checked out (CI may not have them)
    if !model_path.exists() {
        println!("Skipping test: model file not found at {:?}", model_path);
        return;
    }

    let mesh = MeshData::load_obj(model_path).expect("Failed to load bundled model");

    assert!(!mesh.is_empty());
    assert!(mesh.vertices.len() <= mesh.indices.len());
    assert_eq!(mesh.indices.len() % 3, 0);
}
