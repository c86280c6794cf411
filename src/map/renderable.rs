use std::collections::HashMap;

use serde::Serialize;

use super::error::{DecodeErrorKind, Result};
use super::geometry::{Mesh, MeshGeometry};

/// Flattened draw-ready buffers for one Rainbow Six mesh. Each output vertex
/// is a unique (position index, parameter index) pair of the source data, so
/// positions shared by faces with different normals or UVs are split.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderableArrays {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub triangles: Vec<[u32; 3]>,
}

impl RenderableArrays {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Build the render arrays for `mesh`, which must belong to `geometry`. Only
/// reads its inputs, so calling it again on the same mesh gives the same
/// arrays.
pub fn generate(geometry: &MeshGeometry, mesh: &Mesh) -> Result<RenderableArrays> {
    let mut arrays = RenderableArrays::default();
    let mut seen: HashMap<(u16, u16), u32> = HashMap::new();

    for &face_index in &mesh.face_indices {
        let face = lookup(&geometry.faces, face_index as usize, "face")?;

        let mut triangle = [0u32; 3];
        for (corner, out) in triangle.iter_mut().enumerate() {
            let key = (face.vertex_indices[corner], face.param_indices[corner]);
            if let Some(&index) = seen.get(&key) {
                *out = index;
                continue;
            }

            let position = lookup(&geometry.vertices, key.0 as usize, "vertex")?;
            let params = lookup(&geometry.vertex_params, key.1 as usize, "vertex params")?;

            let index = arrays.positions.len() as u32;
            arrays.positions.push(position.to_array());
            arrays.normals.push(params.normal.to_array());
            arrays.uvs.push([params.uv.x, params.uv.y]);
            arrays.colors.push(params.color.to_array());
            seen.insert(key, index);
            *out = index;
        }
        arrays.triangles.push(triangle);
    }

    Ok(arrays)
}

fn lookup<'a, T>(items: &'a [T], index: usize, what: &'static str) -> Result<&'a T> {
    items.get(index).ok_or_else(|| {
        DecodeErrorKind::IndexOutOfRange {
            what,
            index,
            len: items.len(),
        }
        .into()
    })
}
