//! Utility types, used throughout the crate.

/// A float which is neither NaN nor infinite.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[repr(transparent)]
pub struct FiniteF32(f32);
impl FiniteF32 {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);
    pub fn new(val: f32) -> Result<Self, NumberError> {
        if val.is_finite() {
            Ok(Self(val))
        } else {
            Err(NumberError::NotFinite)
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}
impl TryFrom<f32> for FiniteF32 {
    type Error = NumberError;
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
impl From<FiniteF32> for f32 {
    fn from(value: FiniteF32) -> Self {
        value.get()
    }
}
// Even though f32 is !Eq, no value is ever NaN, so PartialEq can act like Eq.
impl Eq for FiniteF32 {}
impl std::hash::Hash for FiniteF32 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // -0.0 == 0.0 but their bits differ, normalize so Hash agrees with Eq.
        let bits = if self.0 == 0.0 { 0 } else { self.0.to_bits() };
        state.write_u32(bits);
    }
}

/// A finite float strictly greater than zero. Used for widths and intervals.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
#[repr(transparent)]
pub struct PositiveF32(FiniteF32);
impl PositiveF32 {
    pub const ONE: Self = Self(FiniteF32::ONE);
    pub fn new(val: f32) -> Result<Self, NumberError> {
        let finite = FiniteF32::new(val)?;
        if finite.get() > 0.0 {
            Ok(Self(finite))
        } else {
            Err(NumberError::NotPositive)
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0.get()
    }
}
impl Default for PositiveF32 {
    fn default() -> Self {
        Self::ONE
    }
}
impl Eq for PositiveF32 {}
impl TryFrom<f32> for PositiveF32 {
    type Error = NumberError;
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberError {
    #[error("not finite")]
    NotFinite,
    #[error("not greater than zero")]
    NotPositive,
    #[error("negative")]
    Negative,
}

/// Clamp a host-reported dimension into `[0, inf)`, mapping garbage to zero.
#[must_use]
pub fn sanitize_dimension(val: f32) -> f32 {
    if val.is_finite() {
        val.max(0.0)
    } else {
        0.0
    }
}
