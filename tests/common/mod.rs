//! Builds small MAP files in memory for the integration tests

#![allow(dead_code)]

use rse_map::map::Dialect;

/// Little-endian writer with the MAP string and record conventions
#[derive(Default)]
pub struct Writer {
    pub buf: Vec<u8>,
}

impl Writer {
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u16s(&mut self, vs: &[u16]) -> &mut Self {
        vs.iter().for_each(|&v| {
            self.u16(v);
        });
        self
    }

    pub fn u32s(&mut self, vs: &[u32]) -> &mut Self {
        vs.iter().for_each(|&v| {
            self.u32(v);
        });
        self
    }

    pub fn f32s(&mut self, vs: &[f32]) -> &mut Self {
        vs.iter().for_each(|&v| {
            self.f32(v);
        });
        self
    }

    /// Length includes the NUL terminator
    pub fn cstring(&mut self, s: &str) -> &mut Self {
        self.u32(s.len() as u32 + 1);
        self.buf.extend_from_slice(s.as_bytes());
        self.u8(0)
    }

    /// `id`, then the name with an optional "Version" prefix
    pub fn short_header(&mut self, id: u32, name: &str, version: Option<u32>) -> &mut Self {
        self.u32(id);
        if let Some(version) = version {
            self.cstring("Version").u32(version);
        }
        self.cstring(name)
    }

    /// A sized record whose size field is patched in once `body` is written
    pub fn record(
        &mut self,
        id: u32,
        name: &str,
        version: Option<u32>,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        let start = self.buf.len();
        self.u32(0);
        self.short_header(id, name, version);
        body(self);
        let size = (self.buf.len() - start) as u32;
        self.buf[start..start + 4].copy_from_slice(&size.to_le_bytes());
        self
    }

    /// Like `record` but with a size field that does not match the bytes
    pub fn record_with_size(
        &mut self,
        size: u32,
        id: u32,
        name: &str,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.u32(size);
        self.short_header(id, name, None);
        body(self);
        self
    }

    /// Section header followed by a count and the entries
    pub fn section(
        &mut self,
        id: u32,
        marker: &str,
        count: u32,
        entries: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.record(id, marker, None, |w| {
            w.u32(count);
            entries(w);
        })
    }

    /// Identity rotation at `position`
    pub fn transform(&mut self, position: [f32; 3]) -> &mut Self {
        self.f32s(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).f32s(&position)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

pub const TIMESTAMP: u32 = 946_684_800;

/// A small but complete level. Fields can be changed before `build` to
/// produce broken or unusual files.
#[derive(Clone, Debug)]
pub struct Level {
    pub dialect: Dialect,
    /// Color layout of each material, normally all `dialect`
    pub materials: Vec<Dialect>,
    pub geometry_flags: u32,
    pub light_types: Vec<u8>,
    /// Overrides the size of the opaque object record
    pub opaque_object_size: Option<u32>,
    pub footer: &'static str,
}

impl Level {
    pub fn rainbow_six() -> Self {
        Self {
            dialect: Dialect::RainbowSix,
            materials: vec![Dialect::RainbowSix, Dialect::RainbowSix],
            geometry_flags: 0b1_0001,
            light_types: vec![1, 3, 1],
            opaque_object_size: None,
            footer: "EndMap",
        }
    }

    pub fn rogue_spear() -> Self {
        Self {
            dialect: Dialect::RogueSpear,
            materials: vec![Dialect::RogueSpear, Dialect::RogueSpear],
            geometry_flags: 0b0_0110,
            light_types: Vec::new(),
            opaque_object_size: None,
            footer: "EndMap",
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.cstring("BeginMapv2.1").u32(TIMESTAMP);

        w.section(1, "MaterialList", self.materials.len() as u32, |w| {
            for (i, layout) in self.materials.iter().enumerate() {
                material(w, i, *layout);
            }
        });

        w.section(2, "GeometryList", 1, |w| match self.dialect {
            Dialect::RainbowSix => rainbow_six_geometry(w, self.geometry_flags),
            Dialect::RogueSpear => rogue_spear_geometry(w, self.geometry_flags),
        });

        w.section(3, "PortalList", 1, |w| {
            w.record(4, "portal01", None, |w| {
                w.u32(4)
                    .f32s(&[0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 1.0, 0.0, 2.0, 1.0, 0.0, 0.0])
                    .u32(0)
                    .u32(1);
            });
        });

        w.section(5, "LightList", self.light_types.len() as u32, |w| {
            for (i, &light_type) in self.light_types.iter().enumerate() {
                w.record(6, &format!("light{i:02}"), Some(1), |w| {
                    w.transform([i as f32, 2.5, 0.0])
                        .u32s(&[255, 240, 200])
                        .f32s(&[1.0, 0.05, 0.0, 10.0, 1.5])
                        .u8(light_type);
                });
            }
        });

        let objects = match self.dialect {
            Dialect::RainbowSix => 1,
            Dialect::RogueSpear => 2,
        };
        w.section(7, "ObjectList", objects, |w| {
            let payload = [9u8; 12];
            match self.opaque_object_size {
                Some(size) => {
                    w.record_with_size(size, 99, "mystery", |w| w.buf.extend_from_slice(&payload));
                }
                None => {
                    w.record(99, "mystery", None, |w| w.buf.extend_from_slice(&payload));
                }
            }
            if self.dialect == Dialect::RogueSpear {
                w.record(20, "window01", Some(1), |w| {
                    w.cstring("window01").transform([4.0, 1.0, 0.0]).cstring("glass_shatter");
                });
            }
        });

        w.section(8, "RoomList", 1, |w| {
            w.short_header(9, "room01", None);
            // unknown1 = 0 brings in unknown4, which is 1 and brings in unknown6
            w.u8(0).u8(0).u8(1).u8(1);
            w.f32s(&[0.0, 0.0, 0.0, 4.0, 3.0, 4.0]);
            w.f32s(&[0.5, 0.5, 0.5, 3.5, 2.5, 3.5]);
            w.u32(1).cstring("level1");
            w.u32(1).transform([0.0, 0.0, 0.0]).f32s(&[0.0, 0.0, 0.0, 4.0, 3.0, 4.0]);
            w.u32(1).f32(1.0).u8(0);
            w.u32(1).f32(0.25).f32s(&[0.0, 3.0]);
        });

        if self.dialect == Dialect::RogueSpear {
            w.section(10, "TransitionList", 1, |w| {
                w.cstring("stairs01").f32s(&[1.0, 0.0, 1.0]).f32s(&[1.0, 3.0, 3.0]);
            });
        }

        w.section(11, "PlanningLevelList", 1, |w| {
            w.f32(1.0).f32(0.0).u32(1).cstring("room01");
        });

        w.cstring(self.footer);
        w.finish()
    }
}

pub fn material(w: &mut Writer, i: usize, layout: Dialect) {
    let (name, version) = if i == 0 { ("WI_plain5", Some(1)) } else { ("glass", None) };
    w.record(100 + i as u32, name, version, |w| {
        w.cstring(&format!("{name}.BMP")).f32(1.0).f32(0.0).u32(3);
        match layout {
            Dialect::RainbowSix => {
                w.u32s(&[25, 25, 25, 255, 255, 255, 229, 229, 229]);
            }
            Dialect::RogueSpear => {
                w.f32s(&[0.1, 0.1, 0.1, 1.0])
                    .f32s(&[1.0, 1.0, 1.0, 1.0])
                    .f32s(&[0.9, 0.9, 0.9, 1.0]);
            }
        }
        w.f32(0.0).u8(0);
    });
}

/// A unit quad with two triangles. The second triangle uses a different
/// parameter for vertex 0.
fn rainbow_six_geometry(w: &mut Writer, flags: u32) {
    w.record(12, "wall", Some(1), |w| {
        w.u32(4).f32s(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        w.u32(4);
        for u in [0.0, 0.25, 0.5, 0.75] {
            w.f32s(&[0.0, 0.0, 1.0]).f32s(&[u, 1.0 - u]).f32s(&[1.0, 1.0, 1.0, 1.0]);
        }
        w.u32(2);
        w.u16s(&[0, 1, 2]).u16s(&[0, 1, 2]).f32s(&[0.0, 0.0, 1.0, 0.0]).u32(0);
        w.u16s(&[2, 3, 0]).u16s(&[2, 3, 3]).f32s(&[0.0, 0.0, 1.0, 0.0]).u32(1);
        w.u32(1).u32(0).cstring("wall_mesh").u32(flags).u32(2).u32s(&[0, 1]);
    });
}

fn rogue_spear_geometry(w: &mut Writer, flags: u32) {
    w.record(12, "crate", Some(1), |w| {
        w.record(13, "crate", Some(1), |w| {
            w.u32(3).f32s(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

            w.u32(1).u32(0);
            w.u32(1).f32s(&[0.0, 0.0, 1.0, 0.0]).u16s(&[0, 1, 2]).u16s(&[0, 1, 2]);
            w.u32(3);
            w.f32s(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
            w.f32s(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
            w.f32s(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);

            w.u32(3).f32s(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
            w.u32(1).f32s(&[0.0, 0.0, 1.0, 0.0]);
            w.u32(1).u16s(&[0, 1, 2]).u16(0).u16s(&[0, 0, 0]).u16(1);
            w.u32(1).cstring("crate_col").u32(flags).u32(1).u16(0);
        });
    });
}
