//! Continuous colour maps for value-to-colour mapping.

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb` form for SVG attributes.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Anchor points `(x, y)` of one channel, x ascending from 0 to 1.
type Segments = &'static [(f32, f32)];

const JET_RED: Segments = &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
const JET_GREEN: Segments = &[
    (0.0, 0.0),
    (0.125, 0.0),
    (0.375, 1.0),
    (0.64, 1.0),
    (0.91, 0.0),
    (1.0, 0.0),
];
const JET_BLUE: Segments = &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

/// Number of discrete levels a colour map is sampled at.
pub const LUT_SIZE: usize = 256;

fn interpolate(segments: Segments, x: f32) -> f32 {
    for pair in segments.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            if x1 <= x0 {
                return y1;
            }
            return y0 + (x - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    segments.last().map_or(0.0, |&(_, y)| y)
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Blue → cyan → yellow → red, sampled at [`LUT_SIZE`] levels.
#[derive(Debug, Clone)]
pub struct Jet {
    lut: Vec<Color>,
}

impl Jet {
    pub fn new() -> Self {
        let lut = (0..LUT_SIZE)
            .map(|i| {
                let x = i as f32 / (LUT_SIZE - 1) as f32;
                Color::rgb(
                    channel(interpolate(JET_RED, x)),
                    channel(interpolate(JET_GREEN, x)),
                    channel(interpolate(JET_BLUE, x)),
                )
            })
            .collect();
        Self { lut }
    }

    /// Colour for a normalised value in `[0, 1]`; out of range values clamp.
    pub fn color(&self, t: f64) -> Color {
        let idx = if t.is_nan() {
            0
        } else {
            ((t * LUT_SIZE as f64) as isize).clamp(0, LUT_SIZE as isize - 1) as usize
        };
        self.lut[idx]
    }
}

impl Default for Jet {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear mapping of data values onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// Limits spanning the finite values; `None` when there are none.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        (lo <= hi).then(|| Self::new(lo, hi))
    }

    /// Equal limits map every value to 0.
    pub fn apply(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span <= 0.0 {
            return 0.0;
        }
        (value - self.vmin) / span
    }

    /// Limits usable for an axis: never zero width.
    pub fn nonsingular(&self) -> (f64, f64) {
        if self.vmax > self.vmin {
            return (self.vmin, self.vmax);
        }
        let pad = (self.vmin.abs() * 0.05).max(0.5);
        (self.vmin - pad, self.vmax + pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jet_endpoints() {
        let jet = Jet::new();
        assert_eq!(jet.color(0.0), Color::rgb(0, 0, 128));
        assert_eq!(jet.color(1.0), Color::rgb(128, 0, 0));
    }

    #[test]
    fn test_jet_midpoint_is_greenish() {
        let c = Jet::new().color(0.5);
        assert_eq!(c.g, 255);
        assert!((115..135).contains(&c.r), "{:?}", c);
        assert!((115..135).contains(&c.b), "{:?}", c);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let jet = Jet::new();
        assert_eq!(jet.color(-3.0), jet.color(0.0));
        assert_eq!(jet.color(7.0), jet.color(1.0));
    }

    #[test]
    fn test_normalize() {
        let norm = Normalize::from_values([40.0, 10.0, f64::NAN, 30.0]).unwrap();
        assert_eq!(norm, Normalize::new(10.0, 40.0));
        assert_eq!(norm.apply(25.0), 0.5);
        assert!(Normalize::from_values([f64::NAN]).is_none());
    }

    #[test]
    fn test_single_value_limits() {
        let norm = Normalize::new(42.0, 42.0);
        assert_eq!(norm.apply(42.0), 0.0);
        let (lo, hi) = norm.nonsingular();
        assert!(lo < 42.0 && hi > 42.0);
    }

    #[test]
    fn test_hex_form() {
        assert_eq!(Color::rgb(0x1f, 0x77, 0xb4).to_hex(), "#1f77b4");
        assert_eq!(Color::rgb(0, 0, 128).to_hex(), "#000080");
    }
}
