use serde::Serialize;

use super::dialect::Dialect;
use super::error::{Result, ResultExt};
use super::flags::GeometryFlagsEvaluated;
use super::primitives::{Color4f, FaceNormal, Vec2f, Vec3f};
use super::reader::{MapReader, RecordHeader};
use super::renderable::RenderableArrays;
use super::Section;

#[derive(Clone, Debug, Serialize)]
pub struct Geometries {
    pub id: u32,
    pub marker: String,
    pub objects: Vec<GeometryObject>,
}

impl Geometries {
    pub(crate) fn read(r: &mut MapReader, dialect: Dialect) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::GeometryList)?;
        let objects = r.read_list("geometry object", |r| GeometryObject::read(r, dialect))?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            objects,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GeometryObject {
    pub id: u32,
    pub version: Option<u32>,
    pub name: String,
    #[serde(flatten)]
    pub body: GeometryBody,
}

impl GeometryObject {
    fn read(r: &mut MapReader, dialect: Dialect) -> Result<Self> {
        let header = RecordHeader::read(r).context("geometry object header")?;
        let body = match dialect {
            Dialect::RainbowSix => GeometryBody::RainbowSix(MeshGeometry::read(r)?),
            Dialect::RogueSpear => GeometryBody::RogueSpear {
                geometry_data: GeometryData::read(r)?,
            },
        };
        Ok(Self {
            id: header.id,
            version: header.version,
            name: header.name,
            body,
        })
    }
}

/// The layout of a geometry object differs completely between the dialects
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum GeometryBody {
    RainbowSix(MeshGeometry),
    RogueSpear { geometry_data: GeometryData },
}

/// Rainbow Six geometry: shared vertex, parameter and face pools that named
/// meshes select faces from
#[derive(Clone, Debug, Serialize)]
pub struct MeshGeometry {
    pub vertices: Vec<Vec3f>,
    pub vertex_params: Vec<VertexParams>,
    pub faces: Vec<Face>,
    pub meshes: Vec<Mesh>,
}

impl MeshGeometry {
    fn read(r: &mut MapReader) -> Result<Self> {
        let vertices = r.read_list("vertex", Vec3f::read)?;
        let vertex_params = r.read_list("vertex params", VertexParams::read)?;
        let faces = r.read_list("face", Face::read)?;
        let meshes = r.read_list("mesh", Mesh::read)?;
        Ok(Self {
            vertices,
            vertex_params,
            faces,
            meshes,
        })
    }
}

/// Per-corner shading attributes, indexed separately from positions
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VertexParams {
    pub normal: Vec3f,
    pub uv: Vec2f,
    pub color: Color4f,
}

impl VertexParams {
    fn read(r: &mut MapReader) -> Result<Self> {
        let normal = Vec3f::read(r).context("vertex normal")?;
        let uv = Vec2f::read(r).context("UV")?;
        let color = Color4f::read(r).context("vertex color")?;
        Ok(Self { normal, uv, color })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Face {
    pub vertex_indices: [u16; 3],
    pub param_indices: [u16; 3],
    pub face_normal: FaceNormal,
    pub material_index: u32,
}

impl Face {
    fn read(r: &mut MapReader) -> Result<Self> {
        let vertex_indices = r.read_u16_array::<3>().context("vertex indices")?;
        let param_indices = r.read_u16_array::<3>().context("vertex param indices")?;
        let face_normal = FaceNormal::read(r)?;
        let material_index = r.read_u32().context("material index")?;
        Ok(Self {
            vertex_indices,
            param_indices,
            face_normal,
            material_index,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Mesh {
    pub unknown1: u32,
    pub name: String,
    pub geometry_flags: u32,
    pub geometry_flags_evaluated: GeometryFlagsEvaluated,
    /// Indices into the owning object's `faces`
    pub face_indices: Vec<u32>,
    /// Derived from the raw fields above once the whole file is decoded
    pub renderable: RenderableArrays,
}

impl Mesh {
    fn read(r: &mut MapReader) -> Result<Self> {
        let unknown1 = r.read_u32().context("mesh unknown1")?;
        let name = r.read_string().context("mesh name")?;
        let geometry_flags = r.read_u32().context("geometry flags")?;
        let face_indices = r
            .read_list("mesh face index", |r| r.read_u32())
            .with_context(|| format!("mesh {name:?}"))?;
        Ok(Self {
            unknown1,
            name,
            geometry_flags,
            geometry_flags_evaluated: GeometryFlagsEvaluated::evaluate(geometry_flags),
            face_indices,
            renderable: RenderableArrays::default(),
        })
    }
}

/// Rogue Spear geometry: render face groups plus separate collision data
#[derive(Clone, Debug, Serialize)]
pub struct GeometryData {
    pub id: u32,
    pub version: Option<u32>,
    pub name: String,
    pub vertices: Vec<Vec3f>,
    pub face_groups: Vec<FaceGroup>,
    pub collision_information: CollisionInformation,
}

impl GeometryData {
    fn read(r: &mut MapReader) -> Result<Self> {
        // Not sure why there are two headers for Rogue Spear objects
        let header = RecordHeader::read(r).context("geometry data header")?;
        let vertices = r.read_list("vertex", Vec3f::read)?;
        let face_groups = r.read_list("face group", FaceGroup::read)?;
        let collision_information = CollisionInformation::read(r)
            .context("collision information")?;
        Ok(Self {
            id: header.id,
            version: header.version,
            name: header.name,
            vertices,
            face_groups,
            collision_information,
        })
    }
}

/// Faces sharing one material
#[derive(Clone, Debug, Serialize)]
pub struct FaceGroup {
    pub material_index: u32,
    pub face_normals: Vec<FaceNormal>,
    pub vertex_indices: Vec<[u16; 3]>,
    pub param_indices: Vec<[u16; 3]>,
    pub vertex_params: FaceGroupParams,
}

impl FaceGroup {
    fn read(r: &mut MapReader) -> Result<Self> {
        let material_index = r.read_u32().context("material index")?;

        // One count covers the normals and both index lists
        let n = r.read_u32().context("face count")? as usize;
        let face_normals = r.read_counted("face normal", n, |r, _| FaceNormal::read(r))?;
        let vertex_indices =
            r.read_counted("face vertex indices", n, |r, _| r.read_u16_array::<3>())?;
        let param_indices =
            r.read_counted("face param indices", n, |r, _| r.read_u16_array::<3>())?;

        let vertex_params = FaceGroupParams::read(r)?;

        Ok(Self {
            material_index,
            face_normals,
            vertex_indices,
            param_indices,
            vertex_params,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FaceGroupParams {
    pub normals: Vec<Vec3f>,
    pub uvs: Vec<Vec2f>,
    pub colors: Vec<Color4f>,
}

impl FaceGroupParams {
    fn read(r: &mut MapReader) -> Result<Self> {
        let n = r.read_u32().context("vertex params count")? as usize;
        let normals = r.read_counted("vertex normal", n, |r, _| Vec3f::read(r))?;
        let uvs = r.read_counted("UV", n, |r, _| Vec2f::read(r))?;
        let colors = r.read_counted("vertex color", n, |r, _| Color4f::read(r))?;
        Ok(Self { normals, uvs, colors })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CollisionInformation {
    pub vertices: Vec<Vec3f>,
    pub normals: Vec<FaceNormal>,
    pub faces: Vec<CollisionFace>,
    pub collision_mesh_definitions: Vec<CollisionMeshDefinition>,
}

impl CollisionInformation {
    fn read(r: &mut MapReader) -> Result<Self> {
        let vertices = r.read_list("collision vertex", Vec3f::read)?;
        let normals = r.read_list("collision normal", FaceNormal::read)?;
        let faces = r.read_list("collision face", CollisionFace::read)?;
        let collision_mesh_definitions =
            r.read_list("collision mesh definition", CollisionMeshDefinition::read)?;
        Ok(Self {
            vertices,
            normals,
            faces,
            collision_mesh_definitions,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CollisionFace {
    pub vertex_indices: [u16; 3],
    pub normal_index: u16,
    pub face_normal_indices: [u16; 3],
    pub material_index: u16,
}

impl CollisionFace {
    fn read(r: &mut MapReader) -> Result<Self> {
        let vertex_indices = r.read_u16_array::<3>().context("vertex indices")?;
        let normal_index = r.read_u16().context("normal index")?;
        let face_normal_indices = r.read_u16_array::<3>().context("face normal indices")?;
        let material_index = r.read_u16().context("material index")?;
        Ok(Self {
            vertex_indices,
            normal_index,
            face_normal_indices,
            material_index,
        })
    }
}

/// A named subset of the collision faces sharing one set of geometry flags
#[derive(Clone, Debug, Serialize)]
pub struct CollisionMeshDefinition {
    pub name: String,
    pub geometry_flags: u32,
    pub geometry_flags_evaluated: GeometryFlagsEvaluated,
    pub face_indices: Vec<u16>,
}

impl CollisionMeshDefinition {
    fn read(r: &mut MapReader) -> Result<Self> {
        let name = r.read_string().context("collision mesh name")?;
        let geometry_flags = r.read_u32().context("geometry flags")?;
        let face_indices = r
            .read_list("collision face index", |r| r.read_u16())
            .with_context(|| format!("collision mesh {name:?}"))?;
        Ok(Self {
            name,
            geometry_flags,
            geometry_flags_evaluated: GeometryFlagsEvaluated::evaluate(geometry_flags),
            face_indices,
        })
    }
}
