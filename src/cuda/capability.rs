#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{CuDevice, CudaApi, CudaArchitecture};
use crate::{
    capability::{Capability, CapabilityContext, CapabilityError, Requirement},
    runtime::ApiError,
};

/// Capabilities of a CUDA device, gated by its architecture.
///
/// Every capability is available from a fixed architecture on, so a newer device never loses one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CudaCapabilityContext {
    architecture: CudaArchitecture,
}

impl CudaCapabilityContext {
    /// Oldest architecture the driver bindings target; baseline capabilities start here.
    pub const BASELINE: CudaArchitecture = CudaArchitecture::SM_30;

    #[inline]
    pub const fn new(architecture: CudaArchitecture) -> Self {
        Self { architecture }
    }

    /// Reads the compute capability of `device`.
    pub fn query(api: &CudaApi, device: CuDevice) -> Result<Self, ApiError> {
        let architecture = api.architecture(device)?;
        log::info!("cuda device {device}: {architecture}");
        Ok(Self::new(architecture))
    }

    /// The oldest architecture providing `capability`.
    pub const fn threshold(capability: Capability) -> CudaArchitecture {
        match capability {
            Capability::Float16 => CudaArchitecture::SM_53,
            Capability::Float16Tanh => CudaArchitecture::SM_75,
            Capability::Float16Min | Capability::Float16Max => CudaArchitecture::SM_80,
            Capability::Float64
            | Capability::GenericAddressSpace
            | Capability::Int64Atomics
            | Capability::SubGroups => Self::BASELINE,
        }
    }

    #[inline]
    pub fn architecture(&self) -> CudaArchitecture {
        self.architecture
    }

    #[inline]
    pub fn float16(&self) -> bool {
        self.supports(Capability::Float16)
    }

    #[inline]
    pub fn float16_min(&self) -> bool {
        self.supports(Capability::Float16Min)
    }

    #[inline]
    pub fn float16_max(&self) -> bool {
        self.supports(Capability::Float16Max)
    }

    #[inline]
    pub fn float16_tanh(&self) -> bool {
        self.supports(Capability::Float16Tanh)
    }

    pub fn float16_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::Float16)
    }

    pub fn float16_min_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::Float16Min)
    }

    pub fn float16_max_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::Float16Max)
    }

    pub fn float16_tanh_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::Float16Tanh)
    }

    fn not_supported_error(capability: Capability) -> CapabilityError {
        CapabilityError::NotSupported {
            capability,
            requirement: Requirement::Architecture(Self::threshold(capability)),
        }
    }
}

impl CapabilityContext for CudaCapabilityContext {
    #[inline]
    fn supports(&self, capability: Capability) -> bool {
        self.architecture >= Self::threshold(capability)
    }

    #[inline]
    fn requirement(&self, capability: Capability) -> Requirement {
        Requirement::Architecture(Self::threshold(capability))
    }
}
