//! Named false-color palettes and lookup-table mapping.
//!
//! Every palette is materialized once into a 256-entry
//! table of `[r, g, b]` triplets. Images produced here are
//! always in red-green-blue channel order, both for display
//! and for anything written to disk.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use lazy_static::lazy_static;
use serde_derive::*;
use tracing::warn;

use crate::normalize::IndexFrame;

pub type Lut = [[u8; 3]; 256];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Palette {
    Jet,
    /// Inferno ramp, the closest open match to FLIR's
    /// ironbow.
    #[serde(alias = "Inferno")]
    Ironbow,
    #[serde(alias = "Hot")]
    Lava,
    #[serde(alias = "Ocean")]
    Arctic,
    Rainbow,
    Viridis,
    Plasma,
    Bone,
    #[serde(alias = "Deep Green")]
    DeepGreen,
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Jet
    }
}

impl Palette {
    pub const ALL: [Palette; 9] = [
        Palette::Jet,
        Palette::Ironbow,
        Palette::Lava,
        Palette::Arctic,
        Palette::Rainbow,
        Palette::Viridis,
        Palette::Plasma,
        Palette::Bone,
        Palette::DeepGreen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Palette::Jet => "Jet",
            Palette::Ironbow => "Ironbow",
            Palette::Lava => "Lava",
            Palette::Arctic => "Arctic",
            Palette::Rainbow => "Rainbow",
            Palette::Viridis => "Viridis",
            Palette::Plasma => "Plasma",
            Palette::Bone => "Bone",
            Palette::DeepGreen => "Deep Green",
        }
    }

    /// Resolve a palette by name, falling back to
    /// [`Palette::Jet`] for unknown names.
    pub fn from_name(name: &str) -> Palette {
        name.parse().unwrap_or_else(|_| {
            warn!(name, "unknown palette, using Jet");
            Palette::Jet
        })
    }

    pub fn lut(self) -> &'static Lut {
        &TABLES[self as usize]
    }

    pub fn color(self, index: u8) -> [u8; 3] {
        self.lut()[index as usize]
    }

    fn build_lut(self) -> Lut {
        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let t = i as f64 / 255.;
            let rgb = self.sample(t);
            *entry = [to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2])];
        }
        lut
    }

    /// Color at `t` in `[0, 1]` as unit floats.
    fn sample(self, t: f64) -> [f64; 3] {
        match self {
            // piecewise-linear ramps of the classic Jet colormap
            Palette::Jet => [
                unit(1.5 - (4. * t - 3.).abs()),
                unit(1.5 - (4. * t - 2.).abs()),
                unit(1.5 - (4. * t - 1.).abs()),
            ],
            Palette::Lava => [unit(3. * t), unit(3. * t - 1.), unit(3. * t - 2.)],
            Palette::Arctic => [unit(3. * t - 2.), unit(((3. * t - 1.) / 2.).abs()), unit(t)],
            Palette::Rainbow => hsv_to_rgb(270. * (1. - t), 1., 1.),
            Palette::Bone => [
                interpolate_channel(&[(0., 0.), (0.746, 0.652), (1., 1.)], t),
                interpolate_channel(&[(0., 0.), (0.365, 0.319), (0.746, 0.777), (1., 1.)], t),
                interpolate_channel(&[(0., 0.), (0.365, 0.444), (1., 1.)], t),
            ],
            Palette::Ironbow => interpolate_stops(&INFERNO_STOPS, t),
            Palette::Viridis => interpolate_stops(&VIRIDIS_STOPS, t),
            Palette::Plasma => interpolate_stops(&PLASMA_STOPS, t),
            Palette::DeepGreen => interpolate_stops(&DEEP_GREEN_STOPS, t),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        let palette = match key.as_str() {
            "jet" => Palette::Jet,
            "ironbow" | "inferno" => Palette::Ironbow,
            "lava" | "hot" => Palette::Lava,
            "arctic" | "ocean" => Palette::Arctic,
            "rainbow" => Palette::Rainbow,
            "viridis" => Palette::Viridis,
            "plasma" => Palette::Plasma,
            "bone" => Palette::Bone,
            "deepgreen" => Palette::DeepGreen,
            _ => return Err(anyhow!("unknown palette `{}`", s)),
        };
        Ok(palette)
    }
}

lazy_static! {
    static ref TABLES: Vec<Lut> = Palette::ALL.iter().map(|p| p.build_lut()).collect();
}

/// Color an index frame with a palette.
pub fn apply_palette(indices: &IndexFrame, palette: Palette) -> RgbImage {
    let lut = palette.lut();
    let (height, width) = indices.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        Rgb(lut[indices[(y as usize, x as usize)] as usize])
    })
}

/// Evenly spaced sRGB stops of the matplotlib perceptual
/// colormaps.
const INFERNO_STOPS: [u32; 10] = [
    0x000004, 0x1b0c41, 0x4a0c6b, 0x781c6d, 0xa52c60, 0xcf4446, 0xed6925, 0xfb9b06, 0xf7d13d,
    0xfcffa4,
];
const VIRIDIS_STOPS: [u32; 10] = [
    0x440154, 0x482878, 0x3e4a89, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6dcd59, 0xb4de2c,
    0xfde725,
];
const PLASMA_STOPS: [u32; 10] = [
    0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26,
    0xf0f921,
];
const DEEP_GREEN_STOPS: [u32; 7] = [
    0x000400, 0x05260c, 0x0d5318, 0x1d8a2a, 0x4fbd4a, 0xa6e38c, 0xf4fbe4,
];

fn interpolate_stops(stops: &[u32], t: f64) -> [f64; 3] {
    let last = stops.len() - 1;
    let pos = t.max(0.).min(1.) * last as f64;
    let lo = (pos.floor() as usize).min(last - 1);
    let frac = pos - lo as f64;
    let (a, b) = (hex_to_unit(stops[lo]), hex_to_unit(stops[lo + 1]));
    [
        a[0] + (b[0] - a[0]) * frac,
        a[1] + (b[1] - a[1]) * frac,
        a[2] + (b[2] - a[2]) * frac,
    ]
}

/// Linear interpolation through `(t, value)` knots.
fn interpolate_channel(knots: &[(f64, f64)], t: f64) -> f64 {
    for pair in knots.windows(2) {
        let ((t0, v0), (t1, v1)) = (pair[0], pair[1]);
        if t <= t1 {
            return v0 + (v1 - v0) * (t - t0) / (t1 - t0);
        }
    }
    knots.last().map_or(0., |k| k.1)
}

fn hex_to_unit(hex: u32) -> [f64; 3] {
    [
        ((hex >> 16) & 0xff) as f64 / 255.,
        ((hex >> 8) & 0xff) as f64 / 255.,
        (hex & 0xff) as f64 / 255.,
    ]
}

/// HSV (hue in degrees) to unit RGB.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let h = h.rem_euclid(360.);
    let c = v * s;
    let x = c * (1. - ((h / 60.) % 2. - 1.).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.) as u32 {
        0 => (c, x, 0.),
        1 => (x, c, 0.),
        2 => (0., c, x),
        3 => (0., x, c),
        4 => (x, 0., c),
        _ => (c, 0., x),
    };
    [r + m, g + m, b + m]
}

#[inline]
fn unit(v: f64) -> f64 {
    v.max(0.).min(1.)
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (unit(v) * 255.).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn jet_runs_blue_to_red() {
        assert_eq!(Palette::Jet.color(0), [0, 0, 128]);
        assert_eq!(Palette::Jet.color(255), [128, 0, 0]);
        let mid = Palette::Jet.color(128);
        assert!(mid[1] > 250, "green peaks mid-ramp: {:?}", mid);
    }

    #[test]
    fn stop_palettes_hit_their_endpoints() {
        assert_eq!(Palette::Viridis.color(0), [0x44, 0x01, 0x54]);
        assert_eq!(Palette::Viridis.color(255), [0xfd, 0xe7, 0x25]);
        assert_eq!(Palette::Ironbow.color(255), [0xfc, 0xff, 0xa4]);
        assert_eq!(Palette::Lava.color(255), [255, 255, 255]);
        assert_eq!(Palette::Bone.color(0), [0, 0, 0]);
    }

    #[test]
    fn names_and_aliases() {
        for p in Palette::ALL.iter() {
            assert_eq!(Palette::from_name(p.name()), *p);
        }
        assert_eq!(Palette::from_name("inferno"), Palette::Ironbow);
        assert_eq!(Palette::from_name("HOT"), Palette::Lava);
        assert_eq!(Palette::from_name("ocean"), Palette::Arctic);
        assert_eq!(Palette::from_name("deep_green"), Palette::DeepGreen);
        assert_eq!(Palette::from_name("no such palette"), Palette::Jet);
    }

    #[test]
    fn apply_is_rgb_and_deterministic() {
        let indices = array![[0u8, 255, 7], [128, 64, 200]];
        let first = apply_palette(&indices, Palette::Viridis);
        let second = apply_palette(&indices, Palette::Viridis);
        assert_eq!(first.dimensions(), (3, 2));
        assert_eq!(first.as_raw(), second.as_raw());
        assert_eq!(first.get_pixel(1, 0).0, [0xfd, 0xe7, 0x25]);
        assert_eq!(first.get_pixel(0, 1).0, Palette::Viridis.color(128));
    }
}
