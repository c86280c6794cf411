use serde::Serialize;

use super::error::{Result, ResultExt};
use super::primitives::{TransformationMatrix, Vec3f};
use super::reader::{MapReader, RecordHeader};
use super::Section;

#[derive(Clone, Debug, Serialize)]
pub struct Portals {
    pub id: u32,
    pub marker: String,
    pub portals: Vec<Portal>,
}

impl Portals {
    pub(crate) fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::PortalList)?;
        let portals = r.read_list("portal", Portal::read)?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            portals,
        })
    }
}

/// An opening between two rooms
#[derive(Clone, Debug, Serialize)]
pub struct Portal {
    pub id: u32,
    pub name: String,
    pub coordinates: Vec<Vec3f>,
    pub room: u32,
    pub opposite_room: u32,
}

impl Portal {
    fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read(r).context("portal header")?;
        let coordinates = r.read_list("portal vertex", Vec3f::read)?;
        let room = r.read_u32().context("room")?;
        let opposite_room = r.read_u32().context("opposite room")?;
        Ok(Self {
            id: header.id,
            name: header.name,
            coordinates,
            room,
            opposite_room,
        })
    }
}

// Light count is zero for every Rogue Spear map tested. Rainbow Six maps
// carry their lights here.
#[derive(Clone, Debug, Serialize)]
pub struct Lights {
    pub id: u32,
    pub marker: String,
    pub lights: Vec<Light>,
}

impl Lights {
    pub(crate) fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::LightList)?;
        let lights = r.read_list("light", Light::read)?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            lights,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Light {
    pub id: u32,
    pub version: Option<u32>,
    pub name: String,
    pub tm: TransformationMatrix,
    /// RGB in 0 - 255
    pub color: [u32; 3],
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
    pub falloff: f32,
    pub energy: f32,
    // TODO: convert to enum once all variants are known
    pub light_type: u8,
}

impl Light {
    fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read(r).context("light header")?;
        let tm = TransformationMatrix::read(r)?;
        let color = r.read_u32_array::<3>().context("light color")?;
        let constant_attenuation = r.read_f32().context("constant attenuation")?;
        let linear_attenuation = r.read_f32().context("linear attenuation")?;
        let quadratic_attenuation = r.read_f32().context("quadratic attenuation")?;
        let falloff = r.read_f32().context("falloff")?;
        let energy = r.read_f32().context("energy")?;
        let light_type = r.read_u8().context("light type")?;
        Ok(Self {
            id: header.id,
            version: header.version,
            name: header.name,
            tm,
            color,
            constant_attenuation,
            linear_attenuation,
            quadratic_attenuation,
            falloff,
            energy,
            light_type,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Rooms {
    pub id: u32,
    pub marker: String,
    pub rooms: Vec<Room>,
}

impl Rooms {
    pub(crate) fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::RoomList)?;
        let rooms = r.read_list("room", Room::read)?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            rooms,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Room {
    pub id: u32,
    pub name: String,

    pub unknown1: u8,
    pub unknown2: u8,
    pub unknown3: u8,
    // Optionals below are influenced by the unknown values above
    /// Set when `unknown1 == 0`
    pub unknown4: Option<u8>,
    /// Set when `unknown3 == 1`
    pub unknown5: Option<[f32; 6]>,
    /// Set when `unknown4 == 1`
    pub unknown6: Option<[f32; 6]>,

    pub sherman_levels: Vec<ShermanLevel>,

    pub unknown7: f32,
    pub level_heights: Vec<LevelHeight>,
}

impl Room {
    fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read_short(r).context("room header")?;

        let unknown1 = r.read_u8().context("room unknown1")?;
        let unknown2 = r.read_u8().context("room unknown2")?;
        let unknown3 = r.read_u8().context("room unknown3")?;

        let unknown4 = match unknown1 {
            0 => Some(r.read_u8().context("room unknown4")?),
            _ => None,
        };
        let unknown5 = match unknown3 {
            1 => Some(r.read_f32_array::<6>().context("room unknown5")?),
            _ => None,
        };
        let unknown6 = match unknown4 {
            Some(1) => Some(r.read_f32_array::<6>().context("room unknown6")?),
            _ => None,
        };

        let sherman_levels = r.read_list("sherman level", ShermanLevel::read)?;

        // The height count comes before a lone float
        let n = r.read_u32().context("level heights count")? as usize;
        let unknown7 = r.read_f32().context("room unknown7")?;
        let level_heights = r.read_counted("level height", n, |r, _| LevelHeight::read(r))?;

        Ok(Self {
            id: header.id,
            name: header.name,
            unknown1,
            unknown2,
            unknown3,
            unknown4,
            unknown5,
            unknown6,
            sherman_levels,
            unknown7,
            level_heights,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ShermanLevel {
    pub name: String,
    pub tm_with_aabb: Vec<TransformationWithAabb>,
    // TODO: always 1?
    pub unknown1: Vec<f32>,
    // TODO: has sherman level plan area?
    pub unknown2: u8,
}

impl ShermanLevel {
    fn read(r: &mut MapReader) -> Result<Self> {
        let name = r.read_string().context("level name")?;
        let tm_with_aabb = r.read_list("level TM + AABB", TransformationWithAabb::read)?;
        let unknown1 = r.read_list("level unknown1", |r| r.read_f32())?;
        let unknown2 = r.read_u8().context("level unknown2")?;
        Ok(Self { name, tm_with_aabb, unknown1, unknown2 })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TransformationWithAabb {
    pub tm: TransformationMatrix,
    pub aabb: [f32; 6],
}

impl TransformationWithAabb {
    fn read(r: &mut MapReader) -> Result<Self> {
        let tm = TransformationMatrix::read(r)?;
        let aabb = r.read_f32_array::<6>().context("AABB")?;
        Ok(Self { tm, aabb })
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct LevelHeight {
    pub height: f32,
    pub unknown: f32,
}

impl LevelHeight {
    fn read(r: &mut MapReader) -> Result<Self> {
        let height = r.read_f32().context("level height")?;
        let unknown = r.read_f32().context("level height unknown")?;
        Ok(Self { height, unknown })
    }
}

/// Rogue Spear only
#[derive(Clone, Debug, Serialize)]
pub struct Transitions {
    pub id: u32,
    pub marker: String,
    pub transitions: Vec<Transition>,
}

impl Transitions {
    pub(crate) fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::TransitionList)?;
        let transitions = r.read_list("transition", Transition::read)?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            transitions,
        })
    }
}

/// A stairway or ladder between sherman levels
#[derive(Clone, Debug, Serialize)]
pub struct Transition {
    pub name: String,
    pub p1: Vec3f,
    pub p2: Vec3f,
}

impl Transition {
    fn read(r: &mut MapReader) -> Result<Self> {
        let name = r.read_string().context("transition name")?;
        let p1 = Vec3f::read(r).context("transition coords P1")?;
        let p2 = Vec3f::read(r).context("transition coords P2")?;
        Ok(Self { name, p1, p2 })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlanningLevels {
    pub id: u32,
    pub marker: String,
    pub levels: Vec<PlanningLevel>,
}

impl PlanningLevels {
    pub(crate) fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::PlanningLevelList)?;
        let levels = r.read_list("planning level", PlanningLevel::read)?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            levels,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlanningLevel {
    pub level_number: f32,
    pub floor_height: f32,
    pub room_names: Vec<String>,
}

impl PlanningLevel {
    fn read(r: &mut MapReader) -> Result<Self> {
        let level_number = r.read_f32().context("planning level number")?;
        let floor_height = r.read_f32().context("planning level floor height")?;
        let room_names = r.read_list("planning level room name", |r| r.read_string())?;
        Ok(Self { level_number, floor_height, room_names })
    }
}
