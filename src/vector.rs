//! Primitive vector types built on top of the value blocks.
//!
//! Each vector wraps exactly one [`DataBlock2`], [`DataBlock3`] or [`DataBlock4`] of a homogeneous
//! scalar, so it has the same size and layout as the block and as the native vector of the kernel
//! language. Operators apply elementwise with [`Arithmetic`] semantics; the right-hand side of every
//! operator may be anything convertible into the vector, including a scalar which is broadcast.

use derive_more::{Deref, DerefMut, From, Into};
use half::f16;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    block::{DataBlock2, DataBlock3, DataBlock4},
    num::{Arithmetic, Element, One, Zero},
};

macro_rules! impl_bytemuck {
    ($ty:ty) => {
        unsafe impl ::bytemuck::Zeroable for $ty {}
        unsafe impl ::bytemuck::Pod for $ty {}
    };
}

macro_rules! impl_vector_op {
    ($name:ident, $block:ident, $scalar:ty, $op:ident, $method:ident, $op_assign:ident, $method_assign:ident, [$($item:ident),+]) => {
        impl<R: Into<$name>> std::ops::$op<R> for $name {
            type Output = $name;

            #[inline]
            fn $method(self, rhs: R) -> Self::Output {
                let rhs: $name = rhs.into();
                Self($block {
                    $($item: Arithmetic::$method(self.0.$item, rhs.0.$item)),+
                })
            }
        }

        impl std::ops::$op<$name> for $scalar {
            type Output = $name;

            #[inline]
            fn $method(self, rhs: $name) -> Self::Output {
                std::ops::$op::$method($name::splat(self), rhs)
            }
        }

        impl<R: Into<$name>> std::ops::$op_assign<R> for $name {
            #[inline]
            fn $method_assign(&mut self, rhs: R) {
                *self = std::ops::$op::$method(*self, rhs);
            }
        }
    };
}

macro_rules! impl_vector {
    (@scalar $field:ident $scalar:ty) => {
        $scalar
    };
    ($name:ident, $block:ident, $scalar:ty, $lanes:literal, [$($field:ident, $set:ident => $item:ident),+]) => {
        #[derive(Debug, Default, Clone, Copy, PartialEq, Deref, DerefMut, From, Into)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[repr(transparent)]
        pub struct $name(pub $block<$(impl_vector!(@scalar $field $scalar)),+>);

        impl $name {
            /// Number of lanes.
            pub const LANES: usize = $lanes;
            /// Native size of the vector in bytes.
            pub const ELEMENT_SIZE: usize = size_of::<Self>();

            #[inline]
            pub const fn new($($field: $scalar),+) -> Self {
                Self($block::new($($field),+))
            }

            /// Creates a vector with every lane set to `value`.
            #[inline]
            pub const fn splat(value: $scalar) -> Self {
                Self::from_array([value; $lanes])
            }

            #[inline]
            pub const fn from_array(array: [$scalar; $lanes]) -> Self {
                let [$($field),+] = array;
                Self::new($($field),+)
            }

            #[inline]
            pub const fn to_array(self) -> [$scalar; $lanes] {
                [$(self.0.$item),+]
            }

            $(
                #[inline]
                pub const fn $field(&self) -> $scalar {
                    self.0.$item
                }

                #[inline]
                pub fn $set(&mut self, value: $scalar) {
                    self.0.$item = value;
                }
            )+
        }

        impl From<$scalar> for $name {
            #[inline]
            fn from(value: $scalar) -> Self {
                Self::splat(value)
            }
        }

        impl From<($(impl_vector!(@scalar $field $scalar),)+)> for $name {
            #[inline]
            fn from(($($field,)+): ($(impl_vector!(@scalar $field $scalar),)+)) -> Self {
                Self::new($($field),+)
            }
        }

        impl From<$name> for ($(impl_vector!(@scalar $field $scalar),)+) {
            #[inline]
            fn from(value: $name) -> Self {
                ($(value.0.$item,)+)
            }
        }

        impl From<[$scalar; $lanes]> for $name {
            #[inline]
            fn from(value: [$scalar; $lanes]) -> Self {
                Self::from_array(value)
            }
        }

        impl Element for $name {
            #[inline]
            fn hash_code(&self) -> u64 {
                self.0.hash_code()
            }
        }

        impl std::hash::Hash for $name {
            #[inline]
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.0, state);
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl Zero for $name {
            #[inline]
            fn zero() -> Self {
                Self::splat(<$scalar as Zero>::zero())
            }
        }

        impl One for $name {
            #[inline]
            fn one() -> Self {
                Self::splat(<$scalar as One>::one())
            }
        }

        impl_bytemuck!($name);

        impl_vector_op!($name, $block, $scalar, Add, add, AddAssign, add_assign, [$($item),+]);
        impl_vector_op!($name, $block, $scalar, Sub, sub, SubAssign, sub_assign, [$($item),+]);
        impl_vector_op!($name, $block, $scalar, Mul, mul, MulAssign, mul_assign, [$($item),+]);
        impl_vector_op!($name, $block, $scalar, Div, div, DivAssign, div_assign, [$($item),+]);
    };
}

macro_rules! impl_vector_family {
    ($scalar:ty => $name2:ident, $name3:ident, $name4:ident) => {
        impl_vector!($name2, DataBlock2, $scalar, 2, [x, set_x => item1, y, set_y => item2]);
        impl_vector!($name3, DataBlock3, $scalar, 3, [x, set_x => item1, y, set_y => item2, z, set_z => item3]);
        impl_vector!($name4, DataBlock4, $scalar, 4, [x, set_x => item1, y, set_y => item2, z, set_z => item3, w, set_w => item4]);
    };
}

impl_vector_family!(i16 => Short2, Short3, Short4);
impl_vector_family!(i32 => Int2, Int3, Int4);
impl_vector_family!(i64 => Long2, Long3, Long4);
impl_vector_family!(f16 => Half2, Half3, Half4);
impl_vector_family!(f32 => Float2, Float3, Float4);
impl_vector_family!(f64 => Double2, Double3, Double4);

impl Eq for Short2 {}
impl Eq for Short3 {}
impl Eq for Short4 {}
impl Eq for Int2 {}
impl Eq for Int3 {}
impl Eq for Int4 {}
impl Eq for Long2 {}
impl Eq for Long3 {}
impl Eq for Long4 {}

#[cfg(test)]
mod tests {
    use half::f16;

    use super::{Double3, Float2, Float3, Float4, Half2, Half4, Int2, Int3, Long4, Short2};
    use crate::{
        block::{DataBlock3, ValueBlock},
        num::{Element, One, Zero},
    };

    #[test]
    fn test_element_size() {
        assert_eq!(Float4::ELEMENT_SIZE, 16);
        assert_eq!(Int2::ELEMENT_SIZE, 8);
        assert_eq!(Short2::ELEMENT_SIZE, 4);
        assert_eq!(Half4::ELEMENT_SIZE, 8);
        assert_eq!(Double3::ELEMENT_SIZE, 24);
        assert_eq!(Long4::ELEMENT_SIZE, 32);
        assert_eq!(Float3::ELEMENT_SIZE, DataBlock3::<f32, f32, f32>::ELEMENT_SIZE);
    }

    #[test]
    fn test_elementwise_ops() {
        for _ in 0..64 {
            let a = Float3::new(fastrand::f32(), fastrand::f32(), fastrand::f32());
            let b = Float3::new(fastrand::f32() + 1.0, fastrand::f32() + 1.0, 2.0);

            let c = a + b;
            assert_eq!(c.to_array(), [a.x() + b.x(), a.y() + b.y(), a.z() + b.z()]);
            let c = a - b;
            assert_eq!(c.to_array(), [a.x() - b.x(), a.y() - b.y(), a.z() - b.z()]);
            let c = a * b;
            assert_eq!(c.to_array(), [a.x() * b.x(), a.y() * b.y(), a.z() * b.z()]);
            let c = a / b;
            assert_eq!(c.to_array(), [a.x() / b.x(), a.y() / b.y(), a.z() / b.z()]);
        }

        for _ in 0..64 {
            let a = Int2::new(fastrand::i32(..), fastrand::i32(..));
            let b = Int2::new(fastrand::i32(1..), fastrand::i32(1..));
            assert_eq!((a + b).x(), a.x().wrapping_add(b.x()));
            assert_eq!((a * b).y(), a.y().wrapping_mul(b.y()));
            assert_eq!((a / b).x(), a.x() / b.x());
        }
    }

    #[test]
    fn test_broadcast() {
        let a = Float4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a + 1.0f32, Float4::new(2.0, 3.0, 4.0, 5.0));
        assert_eq!(2.0f32 * a, Float4::new(2.0, 4.0, 6.0, 8.0));
        assert_eq!(Float4::from(0.5f32), Float4::splat(0.5));

        let mut b = Int3::new(4, 8, 12);
        b /= 4i32;
        assert_eq!(b, Int3::new(1, 2, 3));
        b -= Int3::new(1, 1, 1);
        assert_eq!(b, Int3::new(0, 1, 2));
    }

    #[test]
    fn test_integer_overflow_wraps() {
        let a = Short2::new(i16::MAX, i16::MIN);
        assert_eq!(a + 1i16, Short2::new(i16::MIN, i16::MIN + 1));
        assert_eq!(a - 1i16, Short2::new(i16::MAX - 1, i16::MAX));
    }

    #[test]
    #[should_panic]
    fn test_integer_division_by_zero() {
        let zero = std::hint::black_box(0);
        _ = Int2::new(1, 2) / Int2::new(1, zero);
    }

    #[test]
    fn test_float_division_by_zero() {
        let a = Float2::new(1.0, 0.0) / 0.0f32;
        assert_eq!(a.x(), f32::INFINITY);
        assert!(a.y().is_nan());
    }

    #[test]
    fn test_half() {
        let a = Half2::new(f16::from_f32(1.5), f16::from_f32(-2.0));
        let b = a * f16::from_f32(2.0);
        assert_eq!(b, Half2::new(f16::from_f32(3.0), f16::from_f32(-4.0)));
        assert_eq!(Half2::one() - Half2::one(), Half2::zero());
    }

    #[test]
    fn test_conversions() {
        let tuple = (1.0f32, 2.0f32, 3.0f32);
        let a = Float3::from(tuple);
        let back: (f32, f32, f32) = a.into();
        assert_eq!(back, tuple);

        let block: DataBlock3<f32, f32, f32> = a.into();
        assert_eq!(Float3::from(block), a);
        assert_eq!(block.into_tuple(), tuple);
        assert_eq!(a.item2, 2.0);
    }

    #[test]
    fn test_accessors() {
        let mut a = Float4::default();
        a.set_x(1.0);
        a.set_y(2.0);
        a.set_z(3.0);
        a.set_w(4.0);
        assert_eq!(a.to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.to_string(), "(1, 2, 3, 4)");
        assert_eq!(a.hash_code(), a.0.hash_code());
    }

    #[test]
    fn test_bytemuck_cast() {
        let vectors = [Float2::new(1.0, 2.0), Float2::new(3.0, 4.0)];
        let floats: &[f32] = bytemuck::cast_slice(&vectors);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);

        let ints: &[Int2] = bytemuck::cast_slice(&[5i32, 6, 7, 8]);
        assert_eq!(ints, &[Int2::new(5, 6), Int2::new(7, 8)]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde() {
        let a = Int3::new(1, -2, 3);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"item1":1,"item2":-2,"item3":3}"#);
        assert_eq!(serde_json::from_str::<Int3>(&json).unwrap(), a);
    }
}
