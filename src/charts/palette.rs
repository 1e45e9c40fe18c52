//! Continuous colour scale for the temperature map.

/// Plain RGB triple shared by the interactive and static renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Plasma sequence, evenly spaced from low to high.
pub const PLASMA: [Rgb; 10] = [
    Rgb(13, 8, 135),
    Rgb(70, 3, 159),
    Rgb(114, 1, 168),
    Rgb(156, 23, 158),
    Rgb(189, 55, 134),
    Rgb(216, 87, 107),
    Rgb(237, 121, 83),
    Rgb(251, 159, 58),
    Rgb(253, 202, 38),
    Rgb(240, 249, 33),
];

/// Fill for regions without a value.
pub const NO_DATA: Rgb = Rgb(229, 229, 229);

/// Maps a value range onto the Plasma sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Scale spanning `values`, or `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |range, v| match range {
            None => Some(Self { min: v, max: v }),
            Some(s) => Some(Self {
                min: s.min.min(v),
                max: s.max.max(v),
            }),
        })
    }

    pub fn color_for(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        let t = if span > 0.0 {
            (value - self.min) / span
        } else {
            0.5
        };
        plasma(t)
    }
}

/// Interpolate the Plasma sequence at `t` in [0, 1].
pub fn plasma(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (PLASMA.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(PLASMA.len() - 1);
    let frac = scaled - lower as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (PLASMA[lower], PLASMA[upper]);
    Rgb(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}
