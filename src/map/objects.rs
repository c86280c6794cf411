use serde::Serialize;

use super::dialect::Dialect;
use super::error::{DecodeErrorKind, Result, ResultExt};
use super::primitives::{TransformationMatrix, Vec3f};
use super::reader::{MapReader, RecordHeader};
use super::Section;

#[derive(Clone, Debug, Serialize)]
pub struct Objects {
    pub id: u32,
    pub marker: String,
    pub objects: Vec<MapObject>,
}

impl Objects {
    pub(crate) fn read(r: &mut MapReader, dialect: Dialect) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::ObjectList)?;
        let objects = r.read_list("object", |r| MapObject::read(r, dialect))?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            objects,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MapObject {
    /// Also selects the kind of a Rogue Spear object, see `ObjectKindId`
    pub id: u32,
    pub version: Option<u32>,
    pub name: String,
    pub body: ObjectBody,
}

impl MapObject {
    fn read(r: &mut MapReader, dialect: Dialect) -> Result<Self> {
        let start = r.position();
        let header = RecordHeader::read(r).context("object header")?;

        let kind_id = match dialect {
            Dialect::RainbowSix => None,
            Dialect::RogueSpear => ObjectKindId::from_id(header.id),
        };
        let body = match kind_id {
            Some(kind_id) => ObjectBody::read_dynamic(r, kind_id)
                .with_context(|| format!("{kind_id:?} object {:?}", header.name))?,
            None => {
                log::trace!("object {:?} with id {} kept as opaque bytes", header.name, header.id);
                ObjectBody::Opaque(OpaquePayload::read(r, &header, start)?)
            }
        };

        Ok(Self {
            id: header.id,
            version: header.version,
            name: header.name,
            body,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub enum ObjectBody {
    /// Bytes of a record whose layout is not known. Rainbow Six objects and
    /// unrecognized Rogue Spear kinds end up here.
    Opaque(OpaquePayload),

    Dynamic {
        name: String,
        tm: TransformationMatrix,
        /// The kind of dynamic object this is: television; billboard; smoke,
        /// etc., with object parameters like sounds, collisions, etc.
        kind: DynamicObjectKind,
    },
}

impl ObjectBody {
    fn read_dynamic(r: &mut MapReader, kind_id: ObjectKindId) -> Result<Self> {
        let name = r.read_string().context("name")?;
        let tm = TransformationMatrix::read(r)?;
        let kind = DynamicObjectKind::read(r, kind_id)?;
        Ok(Self::Dynamic { name, tm, kind })
    }
}

/// The rest of a record, bounded by its declared size
#[derive(Clone, Debug, Serialize)]
pub struct OpaquePayload {
    pub len: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl OpaquePayload {
    fn read(r: &mut MapReader, header: &RecordHeader, start: usize) -> Result<Self> {
        let len = header.trailing_len(start, r.position()).ok_or_else(|| {
            DecodeErrorKind::CountMismatch {
                offset: r.position(),
                what: "record bytes",
                declared: header.size.unwrap_or_default() as usize,
                decoded: r.position() - start,
            }
        })?;
        let bytes = r.read_bytes(len).context("object payload")?.to_vec();
        Ok(Self { len, bytes })
    }
}

/// Mappings of record id to the Rogue Spear object type. This list is
/// non-exhaustive and only used for objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKindId {
    /// An object with dynamic properties, such as televisions
    Dynamic = 14,

    /// An object with an attached animation
    Animation = 15,

    /// A door or automatic door that the player can interact with more than
    /// once.
    RepeatableTouchplate = 16,

    /// Breakable glass
    Glass = 20,

    /// A one-time interaction, such as some doors that open once
    OneTimeTouchplate = 25,

    Halo = 31,

    /// Static world effects like manhole steam and smoke stacks
    StaticEffect = 36,
}

impl ObjectKindId {
    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            14 => Self::Dynamic,
            15 => Self::Animation,
            16 => Self::RepeatableTouchplate,
            20 => Self::Glass,
            25 => Self::OneTimeTouchplate,
            31 => Self::Halo,
            36 => Self::StaticEffect,
            _ => return None,
        })
    }
}

fn read_strings(r: &mut MapReader, what: &'static str) -> Result<Vec<String>> {
    r.read_list(what, |r| r.read_string())
}

/// Parameters of a dynamic (id 14) object
#[derive(Clone, Debug, Serialize)]
pub enum DynamicParams {
    /// Count field is greater than zero
    Struct(Vec<DynamicParamStruct>),

    /// Count field is zero
    Flat {
        names: Vec<String>,
        unknown: [f32; 4],
    },
}

impl DynamicParams {
    fn read(r: &mut MapReader) -> Result<Self> {
        let count = r.read_u32().context("dynamic params count")? as usize;
        Ok(if count > 0 {
            Self::Struct(r.read_counted("dynamic params struct", count, |r, _| {
                DynamicParamStruct::read(r)
            })?)
        } else {
            // Yes, another count that shadows the previous one. MAP quirk.
            let names = read_strings(r, "dynamic params flat name")?;
            let unknown = r.read_f32_array::<4>().context("dynamic params flat unknown")?;
            Self::Flat { names, unknown }
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DynamicParamStruct {
    pub name: String,
    pub unknown1: [f32; 9],
    pub unknown2: [u32; 2],
}

impl DynamicParamStruct {
    fn read(r: &mut MapReader) -> Result<Self> {
        let name = r.read_string().context("dynamic params struct name")?;
        let unknown1 = r.read_f32_array::<9>().context("dynamic params struct unknown1")?;
        let unknown2 = r.read_u32_array::<2>().context("dynamic params struct unknown2")?;
        Ok(Self { name, unknown1, unknown2 })
    }
}

/// Fields shared by the interactive object kinds
#[derive(Clone, Debug, Serialize)]
pub struct DynamicObjectCommon {
    pub tm: TransformationMatrix,
    pub name: String,
    pub unknown1: u32,
    pub sounds: [String; 4],
    // TODO: convert these strings to enums once all variants are known
    pub collision_type_2d: String,
    pub collision_type_3d: String,
    pub destruction_action: String,
    pub destruction_category: String,
    pub penetration_type: String,
    pub name2: String,
    pub destruction_category2: String,
}

impl DynamicObjectCommon {
    fn read(r: &mut MapReader) -> Result<Self> {
        let tm = TransformationMatrix::read(r)?;
        let name = r.read_string().context("name")?;
        let unknown1 = r.read_u32().context("unknown1")?;
        let sounds = [
            r.read_string().context("sound 0")?,
            r.read_string().context("sound 1")?,
            r.read_string().context("sound 2")?,
            r.read_string().context("sound 3")?,
        ];
        Ok(Self {
            tm,
            name,
            unknown1,
            sounds,
            collision_type_2d: r.read_string().context("2D collision type")?,
            collision_type_3d: r.read_string().context("3D collision type")?,
            destruction_action: r.read_string().context("destruction action")?,
            destruction_category: r.read_string().context("destruction category")?,
            penetration_type: r.read_string().context("penetration type")?,
            name2: r.read_string().context("name2")?,
            destruction_category2: r.read_string().context("destruction category 2")?,
        })
    }
}

/// Movement shared by animated objects and touchplates
#[derive(Clone, Debug, Serialize)]
pub struct Motion {
    // TODO: convert to enum once all variants are known
    pub animation_type: String,
    pub direction: Vec3f,
    pub distance: f32,
    pub velocity: f32,
}

impl Motion {
    fn read(r: &mut MapReader) -> Result<Self> {
        let animation_type = r.read_string().context("animation type")?;
        let direction = Vec3f::read(r).context("animation direction")?;
        let distance = r.read_f32().context("animation distance")?;
        let velocity = r.read_f32().context("animation velocity")?;
        Ok(Self { animation_type, direction, distance, velocity })
    }
}

#[derive(Clone, Debug, Serialize)]
pub enum DynamicObjectKind {
    /// An object with dynamic properties like a television
    Dynamic {
        common: DynamicObjectCommon,
        params: DynamicParams,
    },

    /// An object with an attached animation
    Animation {
        common: DynamicObjectCommon,
        unknown2: u32,
        names: Vec<String>,
        unknown3: [f32; 3],
        unknown4: u32,
        name3: String,
        name4: String,
        motion: Motion,
    },

    /// A door or automatic door that the player can interact with more than
    /// once. These often have the name "ADT" in MAPs. I think that stands for
    /// "Automatic Door Touchplate".
    RepeatableTouchplate {
        common: DynamicObjectCommon,
        unknown1: u32,
        attachments: Vec<String>,
        unknown2: [f32; 3],
        names: Vec<String>,
        // More sounds
        name2: String,
        name3: String,
        motion: Motion,
    },

    Glass {
        name: String,
    },

    OneTimeTouchplate {
        collision_type_2d: String,
        collision_type_3d: String,
        coordinates: [f32; 6],
        attachments: Vec<String>,
    },

    Halo {
        /// A list of (name, coords) of halos
        halos: Vec<(String, [f32; 8])>,
    },

    StaticEffect,
}

impl DynamicObjectKind {
    fn read(r: &mut MapReader, id: ObjectKindId) -> Result<Self> {
        match id {
            ObjectKindId::Dynamic => {
                let common = DynamicObjectCommon::read(r)?;
                let params = DynamicParams::read(r)?;
                Ok(Self::Dynamic { common, params })
            }
            ObjectKindId::Animation => Self::animation(r),
            ObjectKindId::RepeatableTouchplate => Self::repeatable_touchplate(r),
            ObjectKindId::Glass => {
                let name = r.read_string().context("glass name")?;
                Ok(Self::Glass { name })
            }
            ObjectKindId::OneTimeTouchplate => Self::one_time_touchplate(r),
            ObjectKindId::Halo => {
                let halos = r.read_list("halo", |r| {
                    let name = r.read_string().context("halo name")?;
                    let coords = r.read_f32_array::<8>().context("halo coords")?;
                    Ok((name, coords))
                })?;
                Ok(Self::Halo { halos })
            }
            // nothing follows the transform
            ObjectKindId::StaticEffect => Ok(Self::StaticEffect),
        }
    }

    fn animation(r: &mut MapReader) -> Result<Self> {
        let common = DynamicObjectCommon::read(r)?;
        let unknown2 = r.read_u32().context("unknown2")?;
        let names = read_strings(r, "animation name")?;
        let unknown3 = r.read_f32_array::<3>().context("animation unknown3")?;
        let unknown4 = r.read_u32().context("animation unknown4")?;
        let name3 = r.read_string().context("animation name3")?;
        let name4 = r.read_string().context("animation name4")?;
        let motion = Motion::read(r)?;
        Ok(Self::Animation {
            common,
            unknown2,
            names,
            unknown3,
            unknown4,
            name3,
            name4,
            motion,
        })
    }

    fn repeatable_touchplate(r: &mut MapReader) -> Result<Self> {
        let common = DynamicObjectCommon::read(r)?;
        let unknown1 = r.read_u32().context("ADT unknown1")?;
        let attachments = read_strings(r, "ADT attachment")?;
        let unknown2 = r.read_f32_array::<3>().context("ADT unknown2")?;
        let names = read_strings(r, "ADT name")?;
        let name2 = r.read_string().context("ADT name2")?;
        let name3 = r.read_string().context("ADT name3")?;
        let motion = Motion::read(r)?;
        Ok(Self::RepeatableTouchplate {
            common,
            unknown1,
            attachments,
            unknown2,
            names,
            name2,
            name3,
            motion,
        })
    }

    fn one_time_touchplate(r: &mut MapReader) -> Result<Self> {
        let collision_type_2d = r.read_string().context("one-time touchplate 2D collision type")?;
        let collision_type_3d = r.read_string().context("one-time touchplate 3D collision type")?;
        let coordinates = r.read_f32_array::<6>().context("one-time touchplate coordinates")?;
        let attachments = read_strings(r, "one-time touchplate attachment")?;
        Ok(Self::OneTimeTouchplate {
            collision_type_2d,
            collision_type_3d,
            coordinates,
            attachments,
        })
    }
}
