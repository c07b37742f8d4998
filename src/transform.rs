use ndarray::{ArrayD, ArrayViewD};
use serde::{Deserialize, Serialize};

/// Calibration constants of the affine uint16 -> float32 inverse quantization.
///
/// A stored value `v` maps to `v / factor - offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub factor: f64,
    pub offset: f64,
}

impl Calibration {
    /// The fixed calibration used to quantize QCL hyperspectral cubes.
    pub const QCL: Self = Self {
        factor: 65535.0 / 45535.0 * 10000.0,
        offset: 0.5535,
    };
}

impl Default for Calibration {
    fn default() -> Self {
        Self::QCL
    }
}

/// Elementwise inverse quantization.
#[derive(Debug, Clone, Copy)]
pub struct ValueTransform {
    calibration: Calibration,
}

impl ValueTransform {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Map a single stored value.
    ///
    /// Evaluated in double precision and narrowed afterwards.
    #[inline]
    pub fn apply_value(&self, value: u16) -> f32 {
        (f64::from(value) / self.calibration.factor - self.calibration.offset) as f32
    }

    pub fn apply_slice(&self, values: &[u16]) -> Vec<f32> {
        values.iter().map(|&v| self.apply_value(v)).collect()
    }

    pub fn apply(&self, chunk: ArrayViewD<'_, u16>) -> ArrayD<f32> {
        chunk.mapv(|v| self.apply_value(v))
    }
}

impl Default for ValueTransform {
    fn default() -> Self {
        Self::new(Calibration::QCL)
    }
}
