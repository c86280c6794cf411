use serde::Serialize;

use super::error::{DecodeErrorKind, Result};
use super::material::Material;

/// Bytes following the texture name of a Rainbow Six material: opacity,
/// emissive strength, address mode, three `u32` RGB colors, specular level and
/// the two-sided flag.
pub const RAINBOW_SIX_MATERIAL_TRAILING_LEN: usize = 4 + 4 + 4 + 3 * 12 + 4 + 1;

/// Bytes following the texture name of a Rogue Spear material. Colors are
/// normalized RGBA floats.
pub const ROGUE_SPEAR_MATERIAL_TRAILING_LEN: usize = 4 + 4 + 4 + 3 * 16 + 4 + 1;

/// The two incompatible layouts of the MAP format. Both start with
/// "BeginMapv2.1" so the dialect is inferred from the shape of the material
/// records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    /// Rainbow Six (1998) and Eagle Watch
    RainbowSix,
    /// Rogue Spear, Urban Ops and Covert Ops
    RogueSpear,
}

impl Dialect {
    /// Classify a material by the number of bytes its record declares after
    /// the texture name
    pub fn from_material_trailing_len(len: usize) -> Option<Self> {
        match len {
            RAINBOW_SIX_MATERIAL_TRAILING_LEN => Some(Self::RainbowSix),
            ROGUE_SPEAR_MATERIAL_TRAILING_LEN => Some(Self::RogueSpear),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::RainbowSix => "Rainbow Six",
            Self::RogueSpear => "Rogue Spear",
        })
    }
}

/// Decide the dialect of a whole file from its material list. Every material
/// must agree with the first one. `offset` locates the material list in
/// errors.
pub fn detect(materials: &[Material], offset: usize) -> Result<Dialect> {
    let Some(first) = materials.first() else {
        return Err(DecodeErrorKind::UnknownDialect {
            offset,
            reason: "no materials to infer the dialect from".to_string(),
        }
        .into());
    };

    let dialect = first.game_version().ok_or_else(|| DecodeErrorKind::UnknownDialect {
        offset,
        reason: format!("material {:?} has an unrecognized layout", first.name),
    })?;

    for (i, material) in materials.iter().enumerate().skip(1) {
        if material.game_version() != Some(dialect) {
            return Err(DecodeErrorKind::UnknownDialect {
                offset,
                reason: format!(
                    "material {i} {:?} does not match the {dialect} layout of material 0",
                    material.name,
                ),
            }
            .into());
        }
    }

    Ok(dialect)
}
