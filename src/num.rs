use std::fmt::{Debug, Display};

use bytemuck::Pod;
use derive_more::Display;
use half::f16;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Descriptor of an element type that may cross the native call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
}

impl DataType {
    /// Returns the size of the element in bytes.
    pub const fn size(self) -> usize {
        match self {
            DataType::I8 => size_of::<i8>(),
            DataType::I16 => size_of::<i16>(),
            DataType::I32 => size_of::<i32>(),
            DataType::I64 => size_of::<i64>(),
            DataType::U8 => size_of::<u8>(),
            DataType::U16 => size_of::<u16>(),
            DataType::U32 => size_of::<u32>(),
            DataType::U64 => size_of::<u64>(),
            DataType::F16 => size_of::<f16>(),
            DataType::F32 => size_of::<f32>(),
            DataType::F64 => size_of::<f64>(),
        }
    }

    /// Returns the natural alignment of the element in bytes.
    pub const fn align(self) -> usize {
        match self {
            DataType::I8 => align_of::<i8>(),
            DataType::I16 => align_of::<i16>(),
            DataType::I32 => align_of::<i32>(),
            DataType::I64 => align_of::<i64>(),
            DataType::U8 => align_of::<u8>(),
            DataType::U16 => align_of::<u16>(),
            DataType::U32 => align_of::<u32>(),
            DataType::U64 => align_of::<u64>(),
            DataType::F16 => align_of::<f16>(),
            DataType::F32 => align_of::<f32>(),
            DataType::F64 => align_of::<f64>(),
        }
    }
}

/// A value that can be stored in a [`DataBlock`](crate::block) or a vector.
///
/// Elements compare by value and expose a hash code that is consistent with their equality.
pub trait Element: Copy + PartialEq + Default + Debug + Display + Send + Sync + 'static {
    /// Returns a hash code such that `a == b` implies `a.hash_code() == b.hash_code()`.
    fn hash_code(&self) -> u64;
}

macro_rules! impl_element_int {
    ($($ty:ty),+) => {
        $(
            impl Element for $ty {
                #[inline]
                fn hash_code(&self) -> u64 {
                    *self as u64
                }
            }
        )+
    };
}

impl_element_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl Element for bool {
    #[inline]
    fn hash_code(&self) -> u64 {
        *self as u64
    }
}

// `0.0 == -0.0`, so both zeros must share a hash code.
impl Element for f16 {
    #[inline]
    fn hash_code(&self) -> u64 {
        match *self == f16::ZERO {
            true => 0,
            false => self.to_bits() as u64,
        }
    }
}

impl Element for f32 {
    #[inline]
    fn hash_code(&self) -> u64 {
        match *self == 0.0 {
            true => 0,
            false => self.to_bits() as u64,
        }
    }
}

impl Element for f64 {
    #[inline]
    fn hash_code(&self) -> u64 {
        match *self == 0.0 {
            true => 0,
            false => self.to_bits(),
        }
    }
}

pub trait Zero {
    fn zero() -> Self;
}

pub trait One {
    fn one() -> Self;
}

macro_rules! impl_zero_one {
    ($($ty:ty => $zero:expr, $one:expr);+ $(;)?) => {
        $(
            impl Zero for $ty {
                #[inline]
                fn zero() -> Self {
                    $zero
                }
            }

            impl One for $ty {
                #[inline]
                fn one() -> Self {
                    $one
                }
            }
        )+
    };
}

impl_zero_one! {
    i8 => 0, 1;
    i16 => 0, 1;
    i32 => 0, 1;
    i64 => 0, 1;
    u8 => 0, 1;
    u16 => 0, 1;
    u32 => 0, 1;
    u64 => 0, 1;
    f16 => f16::ZERO, f16::ONE;
    f32 => 0.0, 1.0;
    f64 => 0.0, 1.0;
}

/// Elementwise arithmetic with the element type's native semantics.
///
/// Integer addition, subtraction and multiplication wrap. Integer division truncates and panics on
/// a zero divisor. Floating point operations follow IEEE 754.
pub trait Arithmetic: Copy {
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn div(self, rhs: Self) -> Self;
}

macro_rules! impl_arithmetic_int {
    ($($ty:ty),+) => {
        $(
            impl Arithmetic for $ty {
                #[inline]
                fn add(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                #[inline]
                fn sub(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }

                #[inline]
                fn mul(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }

                #[inline]
                fn div(self, rhs: Self) -> Self {
                    self / rhs
                }
            }
        )+
    };
}

macro_rules! impl_arithmetic_float {
    ($($ty:ty),+) => {
        $(
            impl Arithmetic for $ty {
                #[inline]
                fn add(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline]
                fn sub(self, rhs: Self) -> Self {
                    self - rhs
                }

                #[inline]
                fn mul(self, rhs: Self) -> Self {
                    self * rhs
                }

                #[inline]
                fn div(self, rhs: Self) -> Self {
                    self / rhs
                }
            }
        )+
    };
}

impl_arithmetic_int!(i16, i32, i64);
impl_arithmetic_float!(f16, f32, f64);

/// A primitive element with a runtime [`DataType`] descriptor.
pub trait Scalar: Element + Pod + Zero + One + sealed::Sealed {
    const DATA_TYPE: DataType;
}

macro_rules! impl_scalar {
    ($($ty:ty => $data_type:ident),+ $(,)?) => {
        $(
            impl Scalar for $ty {
                const DATA_TYPE: DataType = DataType::$data_type;
            }
        )+
    };
}

impl_scalar! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f16 => F16,
    f32 => F32,
    f64 => F64,
}

mod sealed {
    use half::f16;

    pub trait Sealed {}

    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for f16 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
