use bitflags::bitflags;
use serde::ser::{Serialize, SerializeMap, Serializer};

bitflags! {
    /// Geometry flag bits whose meaning is understood. The format has more bits
    /// in use than are listed here; those show up as unevaluated.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GeometryFlags: u32 {
        /// Ladders and other surfaces the player can climb
        const CLIMBABLE      = 1 << 0;
        /// Ignored by 2D (planning map) collision
        const NO_COLLIDE_2D  = 1 << 1;
        /// Ignored by 3D collision
        const NO_COLLIDE_3D  = 1 << 2;
        const INVISIBLE      = 1 << 3;
        /// Walkable floor
        const FLOOR_POLYGON  = 1 << 4;
    }
}

/// Key used for the catch-all flag when serialized
pub const UNEVALUATED_FLAGS: &str = "UnevaluatedFlags";

/// A geometry flag field decoded against the known `GeometryFlags`. Bits
/// outside the known set are kept and reported, never rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryFlagsEvaluated {
    raw: u32,
}

impl GeometryFlagsEvaluated {
    pub fn evaluate(raw: u32) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    pub fn known(&self) -> GeometryFlags {
        GeometryFlags::from_bits_truncate(self.raw)
    }

    pub fn contains(&self, flag: GeometryFlags) -> bool {
        self.known().contains(flag)
    }

    /// Bits set in the field that have no entry in `GeometryFlags`
    pub fn unevaluated_bits(&self) -> u32 {
        self.raw & !GeometryFlags::all().bits()
    }

    pub fn unevaluated_flags(&self) -> bool {
        self.unevaluated_bits() != 0
    }

    /// Look up a flag by name, including `UnevaluatedFlags`
    pub fn get(&self, name: &str) -> Option<bool> {
        if name == UNEVALUATED_FLAGS {
            return Some(self.unevaluated_flags());
        }
        GeometryFlags::from_name(name).map(|flag| self.contains(flag))
    }

    /// Every known flag name with its value, followed by `UnevaluatedFlags`
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        GeometryFlags::all()
            .iter_names()
            .map(|(name, flag)| (name, self.contains(flag)))
            .chain(std::iter::once((UNEVALUATED_FLAGS, self.unevaluated_flags())))
    }
}

impl Serialize for GeometryFlagsEvaluated {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
