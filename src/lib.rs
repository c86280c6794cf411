//! Readers for the RSE level format used by Rainbow Six and Rogue Spear, and
//! a converter that turns decoded levels into JSON.

pub mod convert;
pub mod map;
