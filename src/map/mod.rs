//! RSE "MAP" format reader for Rainbow Six, Eagle Watch, Rogue Spear, Urban
//! Ops and Covert Ops levels. Each section of the MAP format is represented
//! with its own structure that knows how to parse itself and its children
//! completely.
//!
//! The `MapFile` type does not represent the on-disk format exactly. Where the
//! on-disk format has list lengths, the in-memory type uses `Vec<T>` and omits
//! the explicit length after checking it against what was decoded.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;

pub mod dialect;
pub mod error;
pub mod flags;
pub mod geometry;
pub mod material;
pub mod objects;
pub mod primitives;
pub mod reader;
pub mod renderable;
pub mod sections;

pub use dialect::Dialect;
pub use error::{DecodeError, DecodeErrorKind, Result, ResultExt};
pub use flags::{GeometryFlags, GeometryFlagsEvaluated};
pub use geometry::{GeometryBody, Geometries, GeometryObject};
pub use material::{Material, Materials};
pub use objects::Objects;
pub use reader::MapReader;
pub use renderable::RenderableArrays;
pub use sections::{Lights, PlanningLevels, Portals, Rooms, Transitions};

/// File name endings of MAP files that are not decoded at all. obstacletest.map
/// is an early test map that was shipped by accident; its data structures are
/// not consistent with the rest of the map files and nothing uses it.
pub const KNOWN_UNSUPPORTED_SUFFIXES: &[&str] = &["obstacletest.map"];

pub fn is_known_unsupported(path: &Path) -> bool {
    let name = path.to_string_lossy().to_ascii_lowercase();
    KNOWN_UNSUPPORTED_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// The sections of a MAP file in file order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    Header,
    MaterialList,
    GeometryList,
    PortalList,
    LightList,
    ObjectList,
    RoomList,
    /// Rogue Spear only
    TransitionList,
    PlanningLevelList,
    Footer,
}

impl Section {
    /// The literal string that opens the section in the file
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Header => "BeginMapv2.1",
            Self::MaterialList => "MaterialList",
            Self::GeometryList => "GeometryList",
            Self::PortalList => "PortalList",
            Self::LightList => "LightList",
            Self::ObjectList => "ObjectList",
            Self::RoomList => "RoomList",
            Self::TransitionList => "TransitionList",
            Self::PlanningLevelList => "PlanningLevelList",
            Self::Footer => "EndMap",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker())
    }
}

/// A fully decoded MAP file
#[derive(Clone, Debug, Serialize)]
pub struct MapFile {
    pub dialect: Dialect,
    pub header: MapHeader,
    pub materials: Materials,
    pub geometries: Geometries,
    pub portals: Portals,
    pub lights: Lights,
    pub objects: Objects,
    pub rooms: Rooms,
    /// Only present in Rogue Spear files
    pub transitions: Option<Transitions>,
    pub planning_levels: PlanningLevels,
    /// `None` when decoding stopped after the planning levels because no
    /// footer could be read there
    pub footer: Option<MapFooter>,
}

/// Result of decoding one file
#[derive(Clone, Debug)]
pub struct DecodedMap {
    pub map: MapFile,
    /// Whether decoding read the footer and consumed the buffer exactly. A
    /// few shipped maps carry bytes nothing is known about, either after
    /// "EndMap" or between the planning levels and the footer; those decode
    /// fine and report `false`.
    pub end_of_file_reached: bool,
}

impl MapFile {
    /// Read and decode the file at `path`. Files on the known-skip list are
    /// rejected before they are opened.
    pub fn read_file(path: &Path) -> Result<DecodedMap> {
        if is_known_unsupported(path) {
            return Err(DecodeError::from(DecodeErrorKind::KnownUnsupported).with_path(path));
        }

        let buf = read_bytes(path).map_err(|err| err.with_path(path))?;
        Self::decode(path, &buf)
    }

    /// Decode a MAP file already in memory. `path` is only used for the
    /// known-skip check and for error messages.
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<DecodedMap> {
        if is_known_unsupported(path) {
            return Err(DecodeError::from(DecodeErrorKind::KnownUnsupported).with_path(path));
        }
        Self::from_bytes(bytes).map_err(|err| err.with_path(path))
    }

    /// Decode a MAP file from a buffer with no associated path
    pub fn from_bytes(bytes: &[u8]) -> Result<DecodedMap> {
        let mut r = MapReader::new(bytes);
        let map = Self::read(&mut r)?;

        let end_of_file_reached = map.footer.is_some() && r.at_end();
        if map.footer.is_some() && !end_of_file_reached {
            log::warn!(
                "{} MAP stopped at offset {} with {} bytes left over",
                map.dialect,
                r.position(),
                r.remaining(),
            );
        }

        Ok(DecodedMap { map, end_of_file_reached })
    }

    fn read(r: &mut MapReader) -> Result<Self> {
        let header = MapHeader::read(r).in_section(Section::Header)?;

        let materials_offset = r.position();
        let materials = Materials::read(r).in_section(Section::MaterialList)?;
        let dialect = dialect::detect(&materials.materials, materials_offset)
            .in_section(Section::MaterialList)?;
        log::debug!("{} materials, {dialect} layout", materials.materials.len());

        let mut geometries = Geometries::read(r, dialect).in_section(Section::GeometryList)?;
        log::debug!("{} geometry objects", geometries.objects.len());

        let portals = Portals::read(r).in_section(Section::PortalList)?;
        let lights = Lights::read(r).in_section(Section::LightList)?;
        let objects = Objects::read(r, dialect).in_section(Section::ObjectList)?;
        let rooms = Rooms::read(r).in_section(Section::RoomList)?;
        let transitions = match dialect {
            Dialect::RainbowSix => None,
            Dialect::RogueSpear => {
                Some(Transitions::read(r).in_section(Section::TransitionList)?)
            }
        };
        let planning_levels = PlanningLevels::read(r).in_section(Section::PlanningLevelList)?;
        log::debug!(
            "{} portals, {} lights, {} objects, {} rooms, {} planning levels",
            portals.portals.len(),
            lights.lights.len(),
            objects.objects.len(),
            rooms.rooms.len(),
            planning_levels.levels.len(),
        );

        let footer_offset = r.position();
        let footer = match MapFooter::read(r) {
            Ok(footer) => Some(footer),
            Err(err) => {
                log::warn!(
                    "{dialect} MAP has no readable footer at offset {footer_offset} \
                     ({} bytes left): {}",
                    r.len() - footer_offset,
                    err.kind,
                );
                None
            }
        };

        generate_renderable_arrays(&mut geometries).in_section(Section::GeometryList)?;

        Ok(Self {
            dialect,
            header,
            materials,
            geometries,
            portals,
            lights,
            objects,
            rooms,
            transitions,
            planning_levels,
            footer,
        })
    }

    /// Every mesh or collision mesh whose geometry flags have bits outside
    /// the known set
    pub fn unevaluated_flags(&self) -> Vec<UnevaluatedFlagsWarning<'_>> {
        let mut warnings = Vec::new();
        for object in &self.geometries.objects {
            match &object.body {
                GeometryBody::RainbowSix(geometry) => {
                    warnings.extend(geometry.meshes.iter().filter_map(|mesh| {
                        UnevaluatedFlagsWarning::check(
                            object,
                            &mesh.name,
                            FlagOwner::Mesh,
                            mesh.geometry_flags_evaluated,
                        )
                    }));
                }
                GeometryBody::RogueSpear { geometry_data } => {
                    let collision = &geometry_data.collision_information;
                    let definitions = collision.collision_mesh_definitions.iter();
                    warnings.extend(definitions.filter_map(|definition| {
                        UnevaluatedFlagsWarning::check(
                            object,
                            &definition.name,
                            FlagOwner::CollisionMesh,
                            definition.geometry_flags_evaluated,
                        )
                    }));
                }
            }
        }
        warnings
    }

    /// The type of every light in the file, in file order
    pub fn light_types(&self) -> impl Iterator<Item = u8> + '_ {
        self.lights.lights.iter().map(|light| light.light_type)
    }
}

/// Dialect A meshes get their render arrays once the file is known to be
/// complete. The raw fields are left untouched.
fn generate_renderable_arrays(geometries: &mut Geometries) -> Result<()> {
    for object in &mut geometries.objects {
        let GeometryBody::RainbowSix(geometry) = &mut object.body else {
            continue;
        };

        let arrays = geometry
            .meshes
            .iter()
            .map(|mesh| {
                renderable::generate(geometry, mesh)
                    .with_context(|| format!("render arrays of {}_{}", object.name, mesh.name))
            })
            .collect::<Result<Vec<_>>>()?;

        for (mesh, arrays) in geometry.meshes.iter_mut().zip(arrays) {
            mesh.renderable = arrays;
        }
    }
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FlagOwner {
    /// A Rainbow Six mesh
    Mesh,
    /// A Rogue Spear collision mesh definition
    CollisionMesh,
}

/// Geometry flags that could not be fully evaluated. Never fatal; the caller
/// decides how to report it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnevaluatedFlagsWarning<'a> {
    pub object_name: &'a str,
    pub owner_name: &'a str,
    pub owner: FlagOwner,
    pub unevaluated_bits: u32,
}

impl<'a> UnevaluatedFlagsWarning<'a> {
    fn check(
        object: &'a GeometryObject,
        owner_name: &'a str,
        owner: FlagOwner,
        flags: GeometryFlagsEvaluated,
    ) -> Option<Self> {
        flags.unevaluated_flags().then(|| Self {
            object_name: &object.name,
            owner_name,
            owner,
            unevaluated_bits: flags.unevaluated_bits(),
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MapHeader {
    pub marker: String,
    /// Unix timestamp of when the MAP file was created
    pub timestamp: u32,
}

impl MapHeader {
    fn read(r: &mut MapReader) -> Result<Self> {
        let marker = r.expect_marker(Section::Header.marker())?;
        let timestamp = r.read_u32().context("file creation timestamp")?;
        Ok(Self { marker, timestamp })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MapFooter {
    pub marker: String,
}

impl MapFooter {
    fn read(r: &mut MapReader) -> Result<Self> {
        let marker = r.expect_marker(Section::Footer.marker())?;
        Ok(Self { marker })
    }
}
