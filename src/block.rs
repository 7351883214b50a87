//! Fixed-arity value blocks.
//!
//! `DataBlock1..DataBlock15` are `repr(C)` aggregates whose fields are laid out in declaration order,
//! so that a block has exactly the memory shape a native kernel expects for the same sequence of
//! members. Every arity is expanded from the same template by [`weft_derive::data_block`].
//!
//! Equality is the conjunction of elementwise equality. The hash code is the XOR of the element
//! hash codes, which means permutations of the same elements collide (they still compare unequal).

use std::sync::Arc;

use weft_derive::data_block;

use crate::{layout, num::Element};

/// Behavior shared by every arity of the value block family.
pub trait ValueBlock: Element {
    /// Number of elements in the block.
    const ARITY: usize;
    /// Native size of the whole aggregate, including alignment padding.
    const ELEMENT_SIZE: usize = size_of::<Self>();

    /// The plain tuple with the same elements.
    type Tuple;

    fn from_tuple(tuple: Self::Tuple) -> Self;

    fn into_tuple(self) -> Self::Tuple;

    /// Measures the byte offset of every field on a fresh instance of the block.
    #[doc(hidden)]
    fn measure_offsets() -> Vec<usize>;

    /// Byte offset of every field from the start of the block. Measured the first time it is
    /// asked for and shared afterwards.
    #[inline]
    fn field_offsets() -> Arc<[usize]> {
        layout::measured::<Self>()
    }
}

data_block!(1);
data_block!(2);
data_block!(3);
data_block!(4);
data_block!(5);
data_block!(6);
data_block!(7);
data_block!(8);
data_block!(9);
data_block!(10);
data_block!(11);
data_block!(12);
data_block!(13);
data_block!(14);
data_block!(15);

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        hash::{BuildHasher, BuildHasherDefault},
        sync::Arc,
    };

    use half::f16;
    use rustc_hash::FxHasher;

    use super::{DataBlock1, DataBlock2, DataBlock3, DataBlock4, DataBlock8, DataBlock15, ValueBlock};
    use crate::num::Element;

    #[test]
    fn test_items_round_trip() {
        for _ in 0..64 {
            let (a, b, c) = (fastrand::i32(..), fastrand::f64(), fastrand::u8(..));
            let block = DataBlock3::new(a, b, c);
            assert_eq!(block.item1, a);
            assert_eq!(block.item2, b);
            assert_eq!(block.item3, c);
        }

        let values: Vec<i64> = (0..15).map(|_| fastrand::i64(..)).collect();
        let block = DataBlock15::new(
            values[0], values[1], values[2], values[3], values[4], values[5], values[6],
            values[7], values[8], values[9], values[10], values[11], values[12], values[13],
            values[14],
        );
        assert_eq!(block.item1, values[0]);
        assert_eq!(block.item8, values[7]);
        assert_eq!(block.item15, values[14]);
    }

    #[test]
    fn test_tuple_round_trip() {
        let tuple = (1u8, -2i16, 3.5f32, f16::from_f32(0.25), 5u64, -6i8, 7u32, 8.0f64);
        let block: DataBlock8<_, _, _, _, _, _, _, _> = tuple.into();
        assert_eq!(block.into_tuple(), tuple);
        assert_eq!(DataBlock8::from_tuple(tuple), block);

        let block = DataBlock1::new(42i32);
        let (x,): (i32,) = block.into();
        assert_eq!(x, 42);
    }

    #[test]
    fn test_equality() {
        let a = DataBlock3::new(1i32, 2.0f32, 3u16);
        let b = DataBlock3::new(1i32, 2.0f32, 3u16);
        let c = DataBlock3::new(1i32, 2.5f32, 3u16);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let nan = DataBlock1::new(f32::NAN);
        let copy = nan;
        assert_ne!(nan, copy);
    }

    #[test]
    fn test_hash_consistency() {
        let hasher = BuildHasherDefault::<FxHasher>::default();
        for _ in 0..64 {
            let (x, y) = (fastrand::i32(..), fastrand::u32(..));
            let a = DataBlock2::new(x, y);
            let b = DataBlock2::new(x, y);
            assert_eq!(a, b);
            assert_eq!(a.hash_code(), b.hash_code());
            assert_eq!(hasher.hash_one(a), hasher.hash_one(b));
        }

        let a = DataBlock2::new(0.0f64, 1.0f64);
        let b = DataBlock2::new(-0.0f64, 1.0f64);
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
    }

    #[test]
    fn test_hash_is_order_insensitive() {
        let a = DataBlock2::new(1i32, 2i32);
        let b = DataBlock2::new(2i32, 1i32);
        assert_ne!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());

        let set: HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataBlock3::new(1, 2, 3).to_string(), "(1, 2, 3)");
        assert_eq!(DataBlock2::new(1.5f32, -2i8).to_string(), "(1.5, -2)");
        assert_eq!(DataBlock1::new(7u8).to_string(), "(7)");
    }

    #[test]
    fn test_element_size() {
        assert_eq!(DataBlock2::<i32, i32>::ELEMENT_SIZE, 8);
        assert_eq!(DataBlock3::<f32, f32, f32>::ELEMENT_SIZE, 12);
        assert_eq!(DataBlock2::<u8, u8>::ELEMENT_SIZE, 2);
        assert_eq!(
            DataBlock2::<u8, i32>::ELEMENT_SIZE,
            size_of::<DataBlock2<u8, i32>>()
        );
        assert_eq!(DataBlock15::<u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8>::ARITY, 15);
    }

    #[test]
    fn test_field_offsets() {
        assert_eq!(*DataBlock2::<i32, i32>::field_offsets(), [0, 4]);
        assert_eq!(*DataBlock3::<u8, u16, u32>::field_offsets(), [0, 2, 4]);
        assert_eq!(*DataBlock2::<u8, f64>::field_offsets(), [0, align_of::<f64>()]);
    }

    #[test]
    fn test_field_offsets_cached() {
        type Block = DataBlock3<u8, f64, u16>;
        let a = Block::field_offsets();
        let b = Block::field_offsets();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, Block::measure_offsets());

        // same shape, distinct type
        let c = DataBlock3::<i8, f64, i16>::field_offsets();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a, c);
    }

    #[test]
    fn test_field_offsets_concurrent() {
        use rayon::prelude::*;

        type Block = DataBlock4<u16, u8, f32, i64>;
        let first = Block::field_offsets();
        let all: Vec<_> = (0..64)
            .into_par_iter()
            .map(|_| Block::field_offsets())
            .collect();
        assert!(all.iter().all(|offsets| Arc::ptr_eq(offsets, &first)));
    }

    #[test]
    fn test_nested_blocks() {
        type Pair = DataBlock2<i32, i32>;
        let inner = Pair::new(3, 4);
        let outer = DataBlock2::new(inner, 5u8);
        assert_eq!(outer.to_string(), "((3, 4), 5)");
        assert_eq!(outer.hash_code(), inner.hash_code() ^ 5);
        assert_eq!(*DataBlock2::<Pair, u8>::field_offsets(), [0, 8]);
    }

    #[test]
    fn test_zeroed() {
        let block: DataBlock3<f32, i64, u8> = bytemuck::Zeroable::zeroed();
        assert_eq!(block, DataBlock3::new(0.0, 0, 0));
        assert_eq!(block, Default::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde() {
        let block = DataBlock2::new(7u8, f16::from_f32(0.5));
        let json = serde_json::to_string(&block).unwrap();
        let back: DataBlock2<u8, f16> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }
}
