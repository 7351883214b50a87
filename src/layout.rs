//! Field offsets of native tuple layouts.
//!
//! The statically typed path is [`ValueBlock::field_offsets`], which measures the address of every
//! field of one block instance. [`offsets`] answers the same question for a runtime list of
//! [`DataType`] descriptors, following the `repr(C)` rules the blocks are declared with. Layouts
//! never change while the process runs, so each combination is computed once and cached.

use std::{
    any::TypeId,
    hash::Hash,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;

use crate::{block::ValueBlock, num::DataType};

/// Arities supported by the value block family.
pub const ARITY: std::ops::RangeInclusive<usize> = 1..=15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout arity error: {0} fields is outside of {min}..={max}", min = ARITY.start(), max = ARITY.end())]
    Arity(usize),
}

type Cache<K> = RwLock<HashMap<K, Arc<[usize]>>>;

fn descriptor_cache() -> &'static Cache<Vec<DataType>> {
    static CACHE: OnceLock<Cache<Vec<DataType>>> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

fn block_cache() -> &'static Cache<TypeId> {
    static CACHE: OnceLock<Cache<TypeId>> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Looks `key` up in `cache`, running `compute` and storing its result on a miss. A concurrent
/// miss on the same key keeps whichever result was stored first.
fn cached<K, Q>(cache: &Cache<K>, key: &Q, compute: impl FnOnce() -> Vec<usize>) -> Arc<[usize]>
where
    K: Eq + Hash + std::borrow::Borrow<Q>,
    Q: Eq + Hash + ToOwned<Owned = K> + ?Sized,
{
    if let Some(offsets) = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
    {
        return offsets.clone();
    }

    let offsets: Arc<[usize]> = compute().into();
    let mut cache = cache.write().unwrap_or_else(PoisonError::into_inner);
    cache.entry(key.to_owned()).or_insert(offsets).clone()
}

/// Offsets of `B` measured on one instance, shared by every later caller.
pub(crate) fn measured<B: ValueBlock>() -> Arc<[usize]> {
    cached(block_cache(), &TypeId::of::<B>(), B::measure_offsets)
}

/// Computes the offsets of `fields` laid out one after another with natural alignment.
fn compute(fields: &[DataType]) -> Vec<usize> {
    let mut end: usize = 0;
    fields
        .iter()
        .map(|field| {
            let offset = end.next_multiple_of(field.align());
            end = offset + field.size();
            offset
        })
        .collect()
}

/// Returns the byte offset of every field of a block with the given element types.
///
/// # Errors
/// Returns [`LayoutError::Arity`] if the number of fields is not within [`ARITY`].
pub fn offsets(fields: &[DataType]) -> Result<Arc<[usize]>, LayoutError> {
    if !ARITY.contains(&fields.len()) {
        return Err(LayoutError::Arity(fields.len()));
    }
    Ok(cached(descriptor_cache(), fields, || compute(fields)))
}

/// Returns the native size of a block with the given element types, including trailing padding.
pub fn size(fields: &[DataType]) -> Result<usize, LayoutError> {
    let offsets = offsets(fields)?;
    let end = fields
        .iter()
        .zip(offsets.iter())
        .map(|(field, offset)| offset + field.size())
        .max()
        .unwrap_or(0);
    let align = fields.iter().map(|field| field.align()).max().unwrap_or(1);
    Ok(end.next_multiple_of(align))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use half::f16;

    use super::{LayoutError, offsets, size};
    use crate::{
        block::{DataBlock2, DataBlock3, DataBlock8, ValueBlock},
        num::{DataType, Scalar},
        vector::Double3,
    };

    #[test]
    fn test_int_int() {
        let offsets = offsets(&[DataType::I32, DataType::I32]).unwrap();
        assert_eq!(&offsets[..], &[0, 4]);
    }

    #[test]
    fn test_padding() {
        // `u8` followed by `i32`: the `i32` starts at its natural alignment, 4 on every target
        // the driver bindings are built for.
        let pair = offsets(&[DataType::U8, DataType::I32]).unwrap();
        assert_eq!(&pair[..], &[0, align_of::<i32>()]);
        assert_eq!(&pair[..], &DataBlock2::<u8, i32>::field_offsets()[..]);
        assert_eq!(size(&[DataType::U8, DataType::I32]), Ok(size_of::<DataBlock2<u8, i32>>()));

        let triple = offsets(&[DataType::U8, DataType::F64, DataType::U16]).unwrap();
        assert_eq!(&triple[..], &DataBlock3::<u8, f64, u16>::field_offsets()[..]);
        assert_eq!(
            size(&[DataType::U8, DataType::F64, DataType::U16]),
            Ok(size_of::<DataBlock3<u8, f64, u16>>())
        );
    }

    #[test]
    fn test_matches_measured_offsets() {
        type Block = DataBlock8<u8, f16, i64, u16, f32, i8, f64, u32>;
        let fields = [
            u8::DATA_TYPE,
            f16::DATA_TYPE,
            i64::DATA_TYPE,
            u16::DATA_TYPE,
            f32::DATA_TYPE,
            i8::DATA_TYPE,
            f64::DATA_TYPE,
            u32::DATA_TYPE,
        ];
        let offsets = offsets(&fields).unwrap();
        assert_eq!(&offsets[..], &Block::field_offsets()[..]);
        assert_eq!(size(&fields), Ok(Block::ELEMENT_SIZE));
    }

    #[test]
    fn test_vector_offsets() {
        assert_eq!(Double3::ELEMENT_SIZE, 24);
        assert_eq!(
            &offsets(&[DataType::F64; 3]).unwrap()[..],
            &DataBlock3::<f64, f64, f64>::field_offsets()[..]
        );
    }

    #[test]
    fn test_cached() {
        let fields = [DataType::I16, DataType::F32, DataType::U8];
        let a = offsets(&fields).unwrap();
        let b = offsets(&fields).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_size() {
        assert_eq!(size(&[DataType::U8]), Ok(1));
        assert_eq!(size(&[DataType::I16, DataType::F32, DataType::U8]), Ok(12));
        assert_eq!(size(&[DataType::F64, DataType::U8]), Ok(size_of::<DataBlock2<f64, u8>>()));
        assert_eq!(size(&[]), Err(LayoutError::Arity(0)));
    }

    #[test]
    fn test_arity() {
        assert_eq!(offsets(&[]), Err(LayoutError::Arity(0)));
        assert_eq!(offsets(&[DataType::U8; 16]), Err(LayoutError::Arity(16)));
        assert!(offsets(&[DataType::U8; 15]).is_ok());
    }
}
