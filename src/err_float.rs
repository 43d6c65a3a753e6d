use crate::Float;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub const MACHINE_EPSILON: Float = Float::EPSILON * 0.5;

pub const SHADOW_EPSILON: Float = 0.0001;

pub fn gamma(n: i32) -> Float {
    let n = n as Float;
    (n * MACHINE_EPSILON) / (1.0 - n * MACHINE_EPSILON)
}

pub fn next_float_up(mut v: f32) -> f32 {
    if v == f32::INFINITY { return v; }

    if v == -0.0 { v = 0.0 }

    let bits = v.to_bits();
    let bits = if v >= 0.0 { bits + 1 } else { bits - 1 };
    f32::from_bits(bits)
}

pub fn next_float_down(mut v: f32) -> f32 {
    if v == f32::NEG_INFINITY { return v; }

    if v == 0.0 { v = -0.0 }

    let bits = v.to_bits();
    let bits = if v > 0.0 { bits - 1 } else { bits + 1 };
    f32::from_bits(bits)
}

/// A floating point value that carries a conservative interval bounding the rounding error
/// accumulated while computing it.
#[derive(Clone, Copy, Debug)]
pub struct EFloat {
    pub v: Float,
    low: Float,
    high: Float,
}

impl EFloat {
    pub fn new(v: Float) -> Self {
        Self { v, low: v, high: v }
    }

    pub fn with_err(v: Float, err: Float) -> Self {
        if err == 0.0 {
            Self::new(v)
        } else {
            Self {
                v,
                low: next_float_down(v - err),
                high: next_float_up(v + err),
            }
        }
    }

    pub fn lower_bound(&self) -> Float { self.low }

    pub fn upper_bound(&self) -> Float { self.high }

    pub fn absolute_error(&self) -> Float {
        next_float_up(Float::max((self.high - self.v).abs(), (self.v - self.low).abs()))
    }

    pub fn sqrt(self) -> Self {
        Self {
            v: self.v.sqrt(),
            low: next_float_down(self.low.sqrt()),
            high: next_float_up(self.high.sqrt()),
        }
    }
}

impl PartialEq for EFloat {
    fn eq(&self, other: &Self) -> bool {
        self.v == other.v
    }
}

impl From<EFloat> for Float {
    fn from(e: EFloat) -> Self {
        e.v
    }
}

impl From<Float> for EFloat {
    fn from(v: Float) -> Self {
        EFloat::new(v)
    }
}

impl Add for EFloat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            v: self.v + rhs.v,
            low: next_float_down(self.low + rhs.low),
            high: next_float_up(self.high + rhs.high),
        }
    }
}

impl Sub for EFloat {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            v: self.v - rhs.v,
            low: next_float_down(self.low - rhs.high),
            high: next_float_up(self.high - rhs.low),
        }
    }
}

impl Mul for EFloat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let prods = [
            self.low * rhs.low,
            self.high * rhs.low,
            self.low * rhs.high,
            self.high * rhs.high,
        ];
        let low = prods.iter().copied().fold(Float::INFINITY, Float::min);
        let high = prods.iter().copied().fold(Float::NEG_INFINITY, Float::max);
        Self {
            v: self.v * rhs.v,
            low: next_float_down(low),
            high: next_float_up(high),
        }
    }
}

impl Div for EFloat {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let v = self.v / rhs.v;
        if rhs.low < 0.0 && rhs.high > 0.0 {
            // the interval we're dividing by straddles zero so just return an infinite interval
            return Self { v, low: Float::NEG_INFINITY, high: Float::INFINITY };
        }
        let quots = [
            self.low / rhs.low,
            self.high / rhs.low,
            self.low / rhs.high,
            self.high / rhs.high,
        ];
        let low = quots.iter().copied().fold(Float::INFINITY, Float::min);
        let high = quots.iter().copied().fold(Float::NEG_INFINITY, Float::max);
        Self {
            v,
            low: next_float_down(low),
            high: next_float_up(high),
        }
    }
}

impl Neg for EFloat {
    type Output = Self;

    fn neg(self) -> Self {
        Self { v: -self.v, low: -self.high, high: -self.low }
    }
}

impl Mul<EFloat> for Float {
    type Output = EFloat;

    fn mul(self, rhs: EFloat) -> EFloat {
        EFloat::new(self) * rhs
    }
}

impl Add<EFloat> for Float {
    type Output = EFloat;

    fn add(self, rhs: EFloat) -> EFloat {
        EFloat::new(self) + rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_float() {
        assert!(next_float_up(1.0) > 1.0);
        assert!(next_float_down(1.0) < 1.0);
        assert!(next_float_up(0.0) > 0.0);
        assert!(next_float_down(0.0) < 0.0);
        assert!(next_float_down(-1.0) < -1.0);
        assert_eq!(next_float_up(f32::INFINITY), f32::INFINITY);
    }

    #[test]
    fn test_efloat_bounds_contain_value() {
        let a = EFloat::with_err(0.1, 1.0e-6);
        let b = EFloat::new(3.0);
        for e in [a + b, a - b, a * b, a / b, (a * a).sqrt()] {
            assert!(e.lower_bound() <= e.v && e.v <= e.upper_bound());
        }
    }
}
