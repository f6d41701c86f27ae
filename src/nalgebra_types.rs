pub use nalgebra::base::dimension::*;
pub use nalgebra::base::*;
pub use nalgebra::*;
pub use num_traits::identities::{One, Zero};

// RealField only offers fallible conversions to and from primitive floats.
// Every file format we write stores f32 or f64, so give the scalar type
// infallible versions of those.
pub trait FloatField: RealField + Copy {
    fn as_f32(self) -> f32;
    fn frm_f32(x: f32) -> Self;
    fn as_f64(self) -> f64;
    fn frm_f64(x: f64) -> Self;
}

impl FloatField for f32 {
    fn as_f32(self) -> f32 {
        self
    }

    fn frm_f32(x: f32) -> f32 {
        x
    }

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn frm_f64(x: f64) -> f32 {
        x as f32
    }
}

impl FloatField for f64 {
    fn as_f32(self) -> f32 {
        self as f32
    }

    fn frm_f32(x: f32) -> f64 {
        x as f64
    }

    fn as_f64(self) -> f64 {
        self
    }

    fn frm_f64(x: f64) -> f64 {
        x
    }
}
