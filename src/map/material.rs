use serde::Serialize;

use super::dialect::Dialect;
use super::error::{DecodeErrorKind, Result, ResultExt};
use super::primitives::Color4f;
use super::reader::{MapReader, RecordHeader};
use super::Section;

/// List of all `Material`s for the level
#[derive(Clone, Debug, Serialize)]
pub struct Materials {
    pub id: u32,
    pub marker: String,
    pub materials: Vec<Material>,
}

impl Materials {
    pub(crate) fn read(r: &mut MapReader) -> Result<Self> {
        let header = RecordHeader::read_section(r, Section::MaterialList)?;
        let materials = r.read_list("material", Material::read)?;
        Ok(Self {
            id: header.id,
            marker: header.name,
            materials,
        })
    }
}

/// Texture material reference and rendering parameters
#[derive(Clone, Debug, Serialize)]
pub struct Material {
    /// Declared size of the material record
    pub size: u32,
    /// Bytes from the start of the record through the texture name
    pub header_len: u32,
    pub id: u32,
    pub version: Option<u32>,
    pub name: String,
    pub texture_name: String,
    pub opacity: f32,
    pub emissive_strength: f32,
    pub address_mode: TextureAddressMode,
    pub colors: MaterialColors,
    pub specular_level: f32,
    pub two_sided: bool,
}

impl Material {
    fn read(r: &mut MapReader) -> Result<Self> {
        let start = r.position();
        let header = RecordHeader::read(r).context("material header")?;
        let texture_name = r.read_string().context("texture name")?;

        let header_len = r.position() - start;
        let dialect = header
            .trailing_len(start, r.position())
            .and_then(Dialect::from_material_trailing_len)
            .ok_or_else(|| DecodeErrorKind::UnknownDialect {
                offset: start,
                reason: format!(
                    "material {:?} declares {} bytes, {header_len} before its colors",
                    header.name,
                    header.size.unwrap_or_default(),
                ),
            })?;

        let opacity = r.read_f32().context("opacity")?;
        let emissive_strength = r.read_f32().context("emissive strength")?;
        let address_mode = TextureAddressMode::from(r.read_u32().context("texture address mode")?);
        let colors = MaterialColors::read(r, dialect)?;
        let specular_level = r.read_f32().context("specular level")?;
        let two_sided = r.read_bool().context("two sided")?;

        Ok(Self {
            size: header.size.unwrap_or_default(),
            header_len: header_len as u32,
            id: header.id,
            version: header.version,
            name: header.name,
            texture_name,
            opacity,
            emissive_strength,
            address_mode,
            colors,
            specular_level,
            two_sided,
        })
    }

    /// The game whose material layout this record has, worked out from the
    /// record size alone
    pub fn game_version(&self) -> Option<Dialect> {
        let trailing = self.size.checked_sub(self.header_len)?;
        Dialect::from_material_trailing_len(trailing as usize)
    }

    /// Whether colors are stored as 0.0 - 1.0 floats rather than 0 - 255
    pub fn normalized_colors(&self) -> bool {
        matches!(self.colors, MaterialColors::Normalized { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TextureAddressMode {
    Opaque,
    Wrap,
    Mirror,
    Clamp,
    Other(u32),
}

impl From<u32> for TextureAddressMode {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Opaque,
            1 => Self::Wrap,
            2 => Self::Mirror,
            3 => Self::Clamp,
            e => Self::Other(e),
        }
    }
}

impl From<TextureAddressMode> for u32 {
    fn from(mode: TextureAddressMode) -> Self {
        match mode {
            TextureAddressMode::Opaque => 0,
            TextureAddressMode::Wrap => 1,
            TextureAddressMode::Mirror => 2,
            TextureAddressMode::Clamp => 3,
            TextureAddressMode::Other(e) => e,
        }
    }
}

/// Ambient, diffuse and specular colors in the representation of the dialect
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MaterialColors {
    /// Rainbow Six: RGB in 0 - 255
    Unnormalized {
        ambient: [u32; 3],
        diffuse: [u32; 3],
        specular: [u32; 3],
    },
    /// Rogue Spear: RGBA in 0.0 - 1.0
    Normalized {
        ambient: Color4f,
        diffuse: Color4f,
        specular: Color4f,
    },
}

impl MaterialColors {
    fn read(r: &mut MapReader, dialect: Dialect) -> Result<Self> {
        Ok(match dialect {
            Dialect::RainbowSix => Self::Unnormalized {
                ambient: r.read_u32_array::<3>().context("ambient")?,
                diffuse: r.read_u32_array::<3>().context("diffuse")?,
                specular: r.read_u32_array::<3>().context("specular")?,
            },
            Dialect::RogueSpear => Self::Normalized {
                ambient: Color4f::read(r).context("ambient")?,
                diffuse: Color4f::read(r).context("diffuse")?,
                specular: Color4f::read(r).context("specular")?,
            },
        })
    }
}
