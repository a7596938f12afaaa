//! Intensity-to-color mapping.
//!
//! Schemes form a closed set dispatched through a static table of pure gradient
//! functions. The renderer never evaluates them per vertex: it receives a baked
//! 256-entry [`Palette`], one entry per possible height byte.

use std::fmt;
use std::str::FromStr;

/// Intensities below this map to the scheme's dark tint
pub const DARK_THRESHOLD: f32 = 0.01;

/// Linear RGB color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    fn scale(self, k: f32) -> Rgb {
        Rgb::new(self.r * k, self.g * k, self.b * k)
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

/// Selectable color schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorScheme {
    #[default]
    Rainbow,
    Fire,
    Grayscale,
    Ocean,
    Sunset,
    Forest,
    Ice,
    Neon,
    Crimson,
    Emerald,
    Azure,
}

/// Table entry: name, empty-region tint, gradient
struct SchemeEntry {
    name: &'static str,
    dark_tint: Rgb,
    gradient: fn(f32) -> Rgb,
}

/// Indexed by `ColorScheme as usize`
static SCHEMES: [SchemeEntry; 11] = [
    SchemeEntry {
        name: "rainbow",
        dark_tint: Rgb::new(0.05, 0.02, 0.08),
        gradient: rainbow,
    },
    SchemeEntry {
        name: "fire",
        dark_tint: Rgb::new(0.08, 0.02, 0.01),
        gradient: fire,
    },
    SchemeEntry {
        name: "grayscale",
        dark_tint: Rgb::new(0.05, 0.05, 0.06),
        gradient: grayscale,
    },
    SchemeEntry {
        name: "ocean",
        dark_tint: Rgb::new(0.01, 0.03, 0.10),
        gradient: ocean,
    },
    SchemeEntry {
        name: "sunset",
        dark_tint: Rgb::new(0.07, 0.02, 0.09),
        gradient: sunset,
    },
    SchemeEntry {
        name: "forest",
        dark_tint: Rgb::new(0.01, 0.06, 0.02),
        gradient: forest,
    },
    SchemeEntry {
        name: "ice",
        dark_tint: Rgb::new(0.03, 0.05, 0.09),
        gradient: ice,
    },
    SchemeEntry {
        name: "neon",
        dark_tint: Rgb::new(0.06, 0.01, 0.07),
        gradient: neon,
    },
    SchemeEntry {
        name: "crimson",
        dark_tint: Rgb::new(0.07, 0.01, 0.02),
        gradient: crimson,
    },
    SchemeEntry {
        name: "emerald",
        dark_tint: Rgb::new(0.01, 0.07, 0.04),
        gradient: emerald,
    },
    SchemeEntry {
        name: "azure",
        dark_tint: Rgb::new(0.01, 0.04, 0.08),
        gradient: azure,
    },
];

impl ColorScheme {
    pub const ALL: [ColorScheme; 11] = [
        ColorScheme::Rainbow,
        ColorScheme::Fire,
        ColorScheme::Grayscale,
        ColorScheme::Ocean,
        ColorScheme::Sunset,
        ColorScheme::Forest,
        ColorScheme::Ice,
        ColorScheme::Neon,
        ColorScheme::Crimson,
        ColorScheme::Emerald,
        ColorScheme::Azure,
    ];

    fn entry(self) -> &'static SchemeEntry {
        &SCHEMES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Color used for (near-)silent regions
    pub fn dark_tint(self) -> Rgb {
        self.entry().dark_tint
    }

    /// Raw gradient value, without the dark-tint special case
    pub fn gradient(self, t: f32) -> Rgb {
        (self.entry().gradient)(t.clamp(0.0, 1.0))
    }

    /// Next scheme, wrapping around
    pub fn next(self) -> ColorScheme {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ColorScheme::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = ColorScheme::ALL.iter().map(|s| s.name()).collect();
                format!("unknown color scheme '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// Map a normalized intensity to a color under `scheme`
pub fn color_for(intensity: f32, scheme: ColorScheme) -> Rgb {
    let t = if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    };
    if t < DARK_THRESHOLD {
        return scheme.dark_tint();
    }
    scheme.gradient(t)
}

/// Palette lookup table: one RGBA entry per height byte
///
/// Laid out as `vec4<f32>` so it can be uploaded as a uniform array as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub scheme: ColorScheme,
    pub entries: Vec<[f32; 4]>,
}

impl Palette {
    pub const SIZE: usize = 256;

    pub fn for_scheme(scheme: ColorScheme) -> Self {
        let entries = (0..Self::SIZE)
            .map(|i| {
                let c = color_for(i as f32 / (Self::SIZE - 1) as f32, scheme);
                [c.r, c.g, c.b, 1.0]
            })
            .collect();
        Self { scheme, entries }
    }

    /// Color of a height byte
    pub fn lookup(&self, height: u8) -> [f32; 4] {
        self.entries[height as usize]
    }
}

fn two_color(from: Rgb, to: Rgb, t: f32) -> Rgb {
    from.lerp(to, t)
}

/// HSV to RGB, hue in [0, 1) split into six segments
fn hsv(h: f32, s: f32, v: f32) -> Rgb {
    let h6 = (h.rem_euclid(1.0)) * 6.0;
    let segment = h6.floor() as u32 % 6;
    let f = h6 - h6.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let u = v * (1.0 - s * (1.0 - f));
    match segment {
        0 => Rgb::new(v, u, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, u),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(u, p, v),
        _ => Rgb::new(v, p, q),
    }
}

// Blue (quiet) sweeping through cyan, green, yellow to red (loud)
fn rainbow(t: f32) -> Rgb {
    hsv((1.0 - t) * (2.0 / 3.0), 1.0, 1.0)
}

fn fire(t: f32) -> Rgb {
    const STOPS: [(f32, Rgb); 4] = [
        (0.0, Rgb::new(0.0, 0.0, 0.0)),
        (0.4, Rgb::new(0.9, 0.1, 0.0)),
        (0.75, Rgb::new(1.0, 0.85, 0.0)),
        (1.0, Rgb::new(1.0, 1.0, 1.0)),
    ];
    for pair in STOPS.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            return c0.lerp(c1, (t - p0) / (p1 - p0));
        }
    }
    STOPS[STOPS.len() - 1].1
}

fn grayscale(t: f32) -> Rgb {
    Rgb::new(t, t, t)
}

fn ocean(t: f32) -> Rgb {
    two_color(Rgb::new(0.0, 0.05, 0.3), Rgb::new(0.0, 1.0, 1.0), t)
}

fn sunset(t: f32) -> Rgb {
    two_color(Rgb::new(0.3, 0.0, 0.5), Rgb::new(1.0, 0.6, 0.1), t)
}

fn forest(t: f32) -> Rgb {
    two_color(Rgb::new(0.0, 0.2, 0.05), Rgb::new(0.7, 1.0, 0.2), t)
}

fn ice(t: f32) -> Rgb {
    two_color(Rgb::new(0.15, 0.3, 0.5), Rgb::new(1.0, 1.0, 1.0), t)
}

fn neon(t: f32) -> Rgb {
    two_color(Rgb::new(1.0, 0.0, 0.8), Rgb::new(0.0, 1.0, 1.0), t)
}

fn crimson(t: f32) -> Rgb {
    hsv(0.98, 0.9, 1.0).scale(t)
}

fn emerald(t: f32) -> Rgb {
    hsv(0.4, 0.85, 1.0).scale(t)
}

fn azure(t: f32) -> Rgb {
    hsv(0.58, 0.85, 1.0).scale(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn test_zero_intensity_uses_dark_tint() {
        for scheme in ColorScheme::ALL {
            let color = color_for(0.0, scheme);
            assert_eq!(color, scheme.dark_tint(), "{scheme}");
            assert!(!close(color, scheme.gradient(0.0)), "{scheme}");
        }
    }

    #[test]
    fn test_threshold_boundary() {
        for scheme in ColorScheme::ALL {
            assert_eq!(color_for(0.009, scheme), scheme.dark_tint());
            assert_eq!(color_for(0.5, scheme), scheme.gradient(0.5));
        }
    }

    #[test]
    fn test_grayscale_full_is_white() {
        assert_eq!(color_for(1.0, ColorScheme::Grayscale), Rgb::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_out_of_range_intensity_is_clamped() {
        for scheme in ColorScheme::ALL {
            assert_eq!(color_for(7.0, scheme), color_for(1.0, scheme));
            assert_eq!(color_for(-1.0, scheme), scheme.dark_tint());
            assert_eq!(color_for(f32::NAN, scheme), scheme.dark_tint());
        }
    }

    #[test]
    fn test_components_in_unit_range() {
        for scheme in ColorScheme::ALL {
            for i in 0..=100 {
                let c = color_for(i as f32 / 100.0, scheme);
                for v in [c.r, c.g, c.b] {
                    assert!((0.0..=1.0 + 1e-6).contains(&v), "{scheme} {i}: {c:?}");
                }
            }
        }
    }

    #[test]
    fn test_schemes_are_distinct() {
        for (i, a) in ColorScheme::ALL.iter().enumerate() {
            for b in &ColorScheme::ALL[i + 1..] {
                let differs = (1..10)
                    .map(|k| k as f32 / 10.0)
                    .any(|t| !close(a.gradient(t), b.gradient(t)));
                assert!(differs, "{a} and {b} look identical");
            }
        }
    }

    #[test]
    fn test_rainbow_sweeps_blue_to_red() {
        let quiet = ColorScheme::Rainbow.gradient(0.0);
        let loud = ColorScheme::Rainbow.gradient(1.0);
        assert!(close(quiet, Rgb::new(0.0, 0.0, 1.0)));
        assert!(close(loud, Rgb::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_names_round_trip_and_cycle() {
        for scheme in ColorScheme::ALL {
            assert_eq!(scheme.name().parse::<ColorScheme>(), Ok(scheme));
        }
        assert!("plaid".parse::<ColorScheme>().is_err());
        assert_eq!(ColorScheme::Azure.next(), ColorScheme::Rainbow);
        assert_eq!(ColorScheme::Rainbow.next(), ColorScheme::Fire);
    }

    #[test]
    fn test_palette_matches_mapper() {
        let palette = Palette::for_scheme(ColorScheme::Fire);
        assert_eq!(palette.entries.len(), Palette::SIZE);

        let tint = ColorScheme::Fire.dark_tint();
        assert_eq!(palette.lookup(0), [tint.r, tint.g, tint.b, 1.0]);

        let full = color_for(1.0, ColorScheme::Fire);
        assert_eq!(palette.lookup(255), [full.r, full.g, full.b, 1.0]);
    }
}
