use crate::Float;

#[allow(clippy::excessive_precision)]
pub fn rgb_to_xyz(rgb: [Float; 3]) -> [Float; 3] {
    [
        0.412453 * rgb[0] + 0.357580 * rgb[1] + 0.180423 * rgb[2],
        0.212671 * rgb[0] + 0.715160 * rgb[1] + 0.072169 * rgb[2],
        0.019334 * rgb[0] + 0.119193 * rgb[1] + 0.950227 * rgb[2],
    ]
}

/// A spectrum represented by `N` coefficients. Only the RGB instantiation is used for rendering.
#[derive(Clone, Copy)]
pub struct CoefficientSpectrum<const N: usize>([Float; N]);

pub type Spectrum = CoefficientSpectrum<3>;

impl<const N: usize> CoefficientSpectrum<N> {

    #[inline]
    pub fn new_with<F: FnMut(usize) -> Float>(init: F) -> Self {
        Self(std::array::from_fn(init))
    }

    #[inline]
    pub fn zip<F: Fn(Float, Float) -> Float>(&self, other: &Self, f: F) -> Self {
        Self::new_with(|i| f(self[i], other[i]))
    }

    pub fn uniform(val: Float) -> Self {
        Self([val; N])
    }

    pub fn zero() -> Self {
        Self::uniform(0.0)
    }

    pub fn map<F: Fn(Float) -> Float>(&self, f: F) -> Self {
        Self::new_with(|i| f(self[i]))
    }

    pub fn is_black(&self) -> bool {
        self.0.iter().all(|&x| x == 0.0)
    }

    pub fn has_nans(&self) -> bool {
        self.0.iter().any(|&x| x.is_nan())
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|&x| x.is_finite())
    }

    pub fn has_negative(&self) -> bool {
        self.0.iter().any(|&x| x < 0.0)
    }

    pub fn max_component_value(&self) -> Float {
        self.0.iter().copied().fold(Float::NEG_INFINITY, Float::max)
    }

    pub fn average(&self) -> Float {
        self.0.iter().sum::<Float>() / N as Float
    }

    pub fn lerp(t: Float, s1: Self, s2: Self) -> Self {
        (1.0 - t) * s1 + t * s2
    }

    pub fn sqrt(self) -> Self {
        self.map(Float::sqrt)
    }

    pub fn exp(self) -> Self {
        self.map(Float::exp)
    }

    pub fn clamp(self, low: Float, high: Float) -> Self {
        self.map(|x| x.clamp(low, high))
    }

    pub fn clamp_positive(self) -> Self {
        self.clamp(0.0, Float::INFINITY)
    }

    pub fn coefficients(&self) -> [Float; N] {
        self.0
    }
}

impl CoefficientSpectrum<3> {
    pub fn rgb(r: Float, g: Float, b: Float) -> Self {
        Self([r, g, b])
    }

    pub fn to_xyz(self) -> [Float; 3] {
        rgb_to_xyz(self.0)
    }

    pub fn to_rgb(self) -> [Float; 3] {
        self.0
    }

    /// The Y (luminance) coordinate of the color.
    pub fn luminance(&self) -> Float {
        self.to_xyz()[1]
    }
}

impl<const N: usize> std::ops::Index<usize> for CoefficientSpectrum<N> {
    type Output = Float;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const N: usize> std::ops::IndexMut<usize> for CoefficientSpectrum<N> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const N: usize> PartialEq for CoefficientSpectrum<N> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<const N: usize> Default for CoefficientSpectrum<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> std::fmt::Debug for CoefficientSpectrum<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<const N: usize> From<[Float; N]> for CoefficientSpectrum<N> {
    fn from(a: [Float; N]) -> Self {
        Self(a)
    }
}

impl<const N: usize> From<Float> for CoefficientSpectrum<N> {
    fn from(x: Float) -> Self {
        Self::uniform(x)
    }
}

impl<const N: usize> From<CoefficientSpectrum<N>> for [Float; N] {
    fn from(s: CoefficientSpectrum<N>) -> Self {
        s.0
    }
}

impl<const N: usize> std::iter::Sum for CoefficientSpectrum<N> {
    fn sum<I: Iterator<Item=Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), std::ops::Add::add)
    }
}

impl<const N: usize> std::ops::Neg for CoefficientSpectrum<N> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.map(|x| -x)
    }
}

macro_rules! impl_op {
    ($op:ident, $name:ident, $sym:tt) => {
        impl<const N: usize> std::ops::$op for CoefficientSpectrum<N> {
            type Output = Self;

            fn $name(self, rhs: Self) -> Self::Output {
                Self::zip(&self, &rhs, |x, y| x $sym y)
            }
        }

        impl<const N: usize> std::ops::$op<Float> for CoefficientSpectrum<N> {
            type Output = Self;

            fn $name(self, rhs: Float) -> Self::Output {
                self.map(|x| x $sym rhs)
            }
        }

        impl<const N: usize> std::ops::$op<CoefficientSpectrum<N>> for Float {
            type Output = CoefficientSpectrum<N>;

            fn $name(self, rhs: CoefficientSpectrum<N>) -> Self::Output {
                rhs.map(|x| self $sym x)
            }
        }
    }
}

macro_rules! impl_assign_op {
    ($op:ident, $name:ident, $sym:tt) => {
        impl<const N: usize> std::ops::$op for CoefficientSpectrum<N> {
            fn $name(&mut self, rhs: Self) {
                for i in 0..N {
                    self[i] $sym rhs[i];
                }
            }
        }

        impl<const N: usize> std::ops::$op<Float> for CoefficientSpectrum<N> {
            fn $name(&mut self, rhs: Float) {
                for i in 0..N {
                    self[i] $sym rhs;
                }
            }
        }
    }
}

impl_op!(Add, add, +);
impl_op!(Sub, sub, -);
impl_op!(Mul, mul, *);
impl_op!(Div, div, /);
impl_assign_op!(AddAssign, add_assign, +=);
impl_assign_op!(SubAssign, sub_assign, -=);
impl_assign_op!(MulAssign, mul_assign, *=);
impl_assign_op!(DivAssign, div_assign, /=);


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_iter_sum() {
        let spectra = vec![Spectrum::uniform(1.0), Spectrum::from([0.0, 1.0, 0.5])];
        let sum: Spectrum = spectra.into_iter().sum();
        assert_eq!(sum, Spectrum::from([1.0, 2.0, 1.5]));
    }

    #[test]
    fn test_luminance_of_white() {
        assert_abs_diff_eq!(Spectrum::uniform(1.0).luminance(), 1.0, epsilon = 1.0e-4);
    }
}
