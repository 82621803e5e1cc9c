//! Great-circle distance kernel.

use crate::SkyPoint;

/// A sky position with its declination trig precomputed.
///
/// Callers build these once per point (or once per grid row) so the
/// inner loops only pay for the right-ascension terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrigPoint {
    pub ra: f64,
    pub cos_dec: f64,
    pub sin_dec: f64,
}

impl TrigPoint {
    pub fn new(dec: f64, ra: f64) -> Self {
        let (sin_dec, cos_dec) = dec.sin_cos();
        Self { ra, cos_dec, sin_dec }
    }

    /// Reuse an already computed declination trig pair with a new right ascension.
    #[inline]
    pub fn with_ra(self, ra: f64) -> Self {
        Self { ra, ..self }
    }
}

impl From<SkyPoint> for TrigPoint {
    fn from(p: SkyPoint) -> Self {
        Self::new(p.dec, p.ra)
    }
}

/// Angular separation in radians, in `[0, π]`.
///
/// Vincenty form: stays accurate for both tiny and near-antipodal
/// separations, where the spherical law of cosines loses precision.
#[inline]
pub fn angular_distance(a: &TrigPoint, b: &TrigPoint) -> f64 {
    let (sin_dra, cos_dra) = (b.ra - a.ra).sin_cos();
    let y1 = a.cos_dec * sin_dra;
    let y2 = b.cos_dec * a.sin_dec - b.sin_dec * a.cos_dec * cos_dra;
    let y = (y1 * y1 + y2 * y2).sqrt();
    let x = b.sin_dec * a.sin_dec + b.cos_dec * a.cos_dec * cos_dra;
    y.atan2(x)
}
