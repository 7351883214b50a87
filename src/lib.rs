//! Native-layout value types and driver bindings for GPU compute backends.
//!
//! - [`block`] and [`vector`] are plain values whose memory shape matches what kernels expect.
//! - [`layout`] reports field offsets of those shapes.
//! - [`capability`] describes the optional features of a device.
//! - [`runtime`], [`cuda`] and [`opencl`] resolve and call into the native drivers.

pub mod block;
pub mod capability;
pub mod cuda;
pub mod layout;
pub mod num;
pub mod opencl;
pub mod runtime;
pub mod vector;

pub use block::*;
pub use num::{DataType, Element, Scalar};
pub use vector::*;
