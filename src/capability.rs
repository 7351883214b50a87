//! Optional device features and the contexts that report them.
//!
//! A capability context is computed once for a device and never changes. Call sites ask it before
//! emitting an optional intrinsic and raise the [`CapabilityError`] it builds when the feature is
//! missing, without issuing any native call.

use std::fmt::Debug;

use derive_more::Display;
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cuda::CudaArchitecture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Capability {
    /// Half precision arithmetic.
    Float16,
    /// Half precision `min` intrinsic.
    Float16Min,
    /// Half precision `max` intrinsic.
    Float16Max,
    /// Half precision `tanh` intrinsic.
    Float16Tanh,
    /// Double precision arithmetic.
    Float64,
    GenericAddressSpace,
    Int64Atomics,
    SubGroups,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::Float16,
        Capability::Float16Min,
        Capability::Float16Max,
        Capability::Float16Tanh,
        Capability::Float64,
        Capability::GenericAddressSpace,
        Capability::Int64Atomics,
        Capability::SubGroups,
    ];
}

/// What a device needs to provide a capability.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Requirement {
    #[display("architecture {_0} or newer")]
    Architecture(CudaArchitecture),
    #[display("extensions [{}]", _0.iter().format(", "))]
    Extensions(Vec<&'static str>),
    #[display("a device that provides it")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("{capability} is not supported: requires {requirement}")]
    NotSupported {
        capability: Capability,
        requirement: Requirement,
    },
}

pub trait CapabilityContext: Debug + Send + Sync {
    fn supports(&self, capability: Capability) -> bool;

    /// The minimum a device must provide for `capability`.
    fn requirement(&self, capability: Capability) -> Requirement;

    /// Builds the error to raise when `capability` is used although it isn't supported.
    fn not_supported(&self, capability: Capability) -> CapabilityError {
        CapabilityError::NotSupported {
            capability,
            requirement: self.requirement(capability),
        }
    }

    fn require(&self, capability: Capability) -> Result<(), CapabilityError> {
        match self.supports(capability) {
            true => Ok(()),
            false => Err(self.not_supported(capability)),
        }
    }

    /// All capabilities the context supports.
    fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|&capability| self.supports(capability))
            .collect()
    }
}

/// Context of host execution, which has no optional features.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CpuCapabilityContext;

impl CapabilityContext for CpuCapabilityContext {
    #[inline]
    fn supports(&self, _capability: Capability) -> bool {
        false
    }

    #[inline]
    fn requirement(&self, _capability: Capability) -> Requirement {
        Requirement::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Capability, CapabilityContext, CapabilityError, CpuCapabilityContext, Requirement,
    };
    use crate::cuda::CudaArchitecture;

    #[test]
    fn test_cpu_context() {
        let context = CpuCapabilityContext;
        assert!(context.capabilities().is_empty());
        for capability in Capability::ALL {
            assert!(!context.supports(capability));
            assert_eq!(
                context.require(capability),
                Err(CapabilityError::NotSupported {
                    capability,
                    requirement: Requirement::Unavailable
                })
            );
        }
    }

    #[test]
    fn test_error_display() {
        let err = CapabilityError::NotSupported {
            capability: Capability::Float16Tanh,
            requirement: Requirement::Architecture(CudaArchitecture::SM_75),
        };
        assert_eq!(
            err.to_string(),
            "Float16Tanh is not supported: requires architecture SM_75 or newer"
        );

        let err = CapabilityError::NotSupported {
            capability: Capability::Int64Atomics,
            requirement: Requirement::Extensions(vec![
                "cl_khr_int64_base_atomics",
                "cl_khr_int64_extended_atomics",
            ]),
        };
        assert_eq!(
            err.to_string(),
            "Int64Atomics is not supported: requires extensions \
             [cl_khr_int64_base_atomics, cl_khr_int64_extended_atomics]"
        );
    }

    #[test]
    fn test_dyn_context() {
        let contexts: Vec<Box<dyn CapabilityContext>> = vec![Box::new(CpuCapabilityContext)];
        for context in &contexts {
            assert!(context.require(Capability::Float64).is_err());
        }
    }
}
