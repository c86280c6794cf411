use serde::Serialize;

use super::error::{Result, ResultExt};
use super::reader::MapReader;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub fn read(r: &mut MapReader) -> Result<Self> {
        let [x, y] = r.read_f32_array::<2>()?;
        Ok(Self { x, y })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub fn read(r: &mut MapReader) -> Result<Self> {
        let [x, y, z] = r.read_f32_array::<3>()?;
        Ok(Self { x, y, z })
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Normalized RGBA color
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Color4f {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4f {
    pub fn read(r: &mut MapReader) -> Result<Self> {
        let [red, green, blue, alpha] = r.read_f32_array::<4>()?;
        Ok(Self { r: red, g: green, b: blue, a: alpha })
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Face or plane normal with the signed distance from the origin to the plane
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FaceNormal {
    pub normal: Vec3f,
    /// Distance from the origin to the face where sign is normal direction
    pub distance_origin_to_face: f32,
}

impl FaceNormal {
    pub fn read(r: &mut MapReader) -> Result<Self> {
        let normal = Vec3f::read(r).context("face normal")?;
        let distance_origin_to_face = r.read_f32().context("distance origin to face")?;
        Ok(Self { normal, distance_origin_to_face })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TransformationMatrix {
    pub x_axis: Vec3f,
    pub y_axis: Vec3f,
    pub z_axis: Vec3f,
    pub position: Vec3f,
}

impl TransformationMatrix {
    pub fn read(r: &mut MapReader) -> Result<Self> {
        let x_axis = Vec3f::read(r).context("transformation matrix x-axis")?;
        let y_axis = Vec3f::read(r).context("transformation matrix y-axis")?;
        let z_axis = Vec3f::read(r).context("transformation matrix z-axis")?;
        let position = Vec3f::read(r).context("transformation matrix position")?;
        Ok(Self { x_axis, y_axis, z_axis, position })
    }
}
