use itertools::Itertools;
use rustc_hash::FxHashSet as HashSet;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ClApi, ClDeviceId};
use crate::{
    capability::{Capability, CapabilityContext, CapabilityError, Requirement},
    runtime::ApiError,
};

/// Optional features of an OpenCL device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClFeatures {
    pub float16: bool,
    pub float64: bool,
    pub generic_address_space: bool,
    pub int64_atomics: bool,
    pub sub_groups: bool,
}

/// Capabilities of an OpenCL device, gated by the extensions it advertises.
///
/// Serialized as its [`ClFeatures`]; the extension list follows from them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "ClFeatures", into = "ClFeatures")
)]
pub struct ClCapabilityContext {
    features: ClFeatures,
    extensions: Vec<&'static str>,
}

impl ClCapabilityContext {
    pub const FLOAT16_EXTENSIONS: &'static [&'static str] = &["cl_khr_fp16"];
    pub const FLOAT64_EXTENSIONS: &'static [&'static str] = &["cl_khr_fp64"];
    pub const GENERIC_ADDRESS_SPACE_EXTENSIONS: &'static [&'static str] = &["__opencl_c_generic_address_space"];
    pub const INT64_ATOMICS_EXTENSIONS: &'static [&'static str] =
        &["cl_khr_int64_base_atomics", "cl_khr_int64_extended_atomics"];
    pub const SUB_GROUPS_EXTENSIONS: &'static [&'static str] = &["cl_khr_subgroups"];

    /// Builds the context from explicit feature flags.
    pub fn new(features: ClFeatures) -> Self {
        let enabled = [
            (features.float16, Self::FLOAT16_EXTENSIONS),
            (features.float64, Self::FLOAT64_EXTENSIONS),
            (
                features.generic_address_space,
                Self::GENERIC_ADDRESS_SPACE_EXTENSIONS,
            ),
            (features.int64_atomics, Self::INT64_ATOMICS_EXTENSIONS),
            (features.sub_groups, Self::SUB_GROUPS_EXTENSIONS),
        ];
        let extensions = enabled
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .flat_map(|(_, extensions)| extensions.iter().copied())
            .unique()
            .collect();
        Self {
            features,
            extensions,
        }
    }

    /// Builds the context from the extension names a device advertises. A feature is enabled
    /// only if every extension it requires is present.
    pub fn from_extensions<S: AsRef<str>>(extensions: impl IntoIterator<Item = S>) -> Self {
        let advertised: Vec<S> = extensions.into_iter().collect();
        let advertised: HashSet<&str> = advertised.iter().map(|x| x.as_ref()).collect();
        let all = |required: &[&str]| required.iter().all(|x| advertised.contains(x));
        Self::new(ClFeatures {
            float16: all(Self::FLOAT16_EXTENSIONS),
            float64: all(Self::FLOAT64_EXTENSIONS),
            generic_address_space: all(Self::GENERIC_ADDRESS_SPACE_EXTENSIONS),
            int64_atomics: all(Self::INT64_ATOMICS_EXTENSIONS),
            sub_groups: all(Self::SUB_GROUPS_EXTENSIONS),
        })
    }

    /// Reads the extensions `device` advertises.
    pub fn query(api: &ClApi, device: ClDeviceId) -> Result<Self, ApiError> {
        let extensions = api.device_extensions(device)?;
        let context = Self::from_extensions(&extensions);
        log::info!("opencl device features: {:?}", context.features);
        Ok(context)
    }

    /// Extensions a device must advertise for `capability`.
    pub const fn required_extensions(capability: Capability) -> &'static [&'static str] {
        match capability {
            Capability::Float16
            | Capability::Float16Min
            | Capability::Float16Max
            | Capability::Float16Tanh => Self::FLOAT16_EXTENSIONS,
            Capability::Float64 => Self::FLOAT64_EXTENSIONS,
            Capability::GenericAddressSpace => Self::GENERIC_ADDRESS_SPACE_EXTENSIONS,
            Capability::Int64Atomics => Self::INT64_ATOMICS_EXTENSIONS,
            Capability::SubGroups => Self::SUB_GROUPS_EXTENSIONS,
        }
    }

    #[inline]
    pub fn features(&self) -> ClFeatures {
        self.features
    }

    /// Extensions required by the enabled features, each listed once.
    #[inline]
    pub fn extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    /// `#pragma` lines enabling every extension in [`extensions`](Self::extensions) for a program
    /// source. Feature macros (`__opencl_c_*`) need no pragma and are left out.
    pub fn extension_pragmas(&self) -> String {
        self.extensions
            .iter()
            .filter(|name| name.starts_with("cl_"))
            .map(|name| format!("#pragma OPENCL EXTENSION {name} : enable\n"))
            .collect()
    }

    #[inline]
    pub fn float16(&self) -> bool {
        self.features.float16
    }

    #[inline]
    pub fn float64(&self) -> bool {
        self.features.float64
    }

    #[inline]
    pub fn generic_address_space(&self) -> bool {
        self.features.generic_address_space
    }

    #[inline]
    pub fn int64_atomics(&self) -> bool {
        self.features.int64_atomics
    }

    #[inline]
    pub fn sub_groups(&self) -> bool {
        self.features.sub_groups
    }

    pub fn float16_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::Float16)
    }

    pub fn float64_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::Float64)
    }

    pub fn generic_address_space_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::GenericAddressSpace)
    }

    pub fn int64_atomics_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::Int64Atomics)
    }

    pub fn sub_groups_not_supported() -> CapabilityError {
        Self::not_supported_error(Capability::SubGroups)
    }

    fn not_supported_error(capability: Capability) -> CapabilityError {
        CapabilityError::NotSupported {
            capability,
            requirement: Requirement::Extensions(Self::required_extensions(capability).to_vec()),
        }
    }
}

impl From<ClFeatures> for ClCapabilityContext {
    fn from(features: ClFeatures) -> Self {
        Self::new(features)
    }
}

impl From<ClCapabilityContext> for ClFeatures {
    fn from(context: ClCapabilityContext) -> Self {
        context.features
    }
}

impl CapabilityContext for ClCapabilityContext {
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Float16
            | Capability::Float16Min
            | Capability::Float16Max
            | Capability::Float16Tanh => self.features.float16,
            Capability::Float64 => self.features.float64,
            Capability::GenericAddressSpace => self.features.generic_address_space,
            Capability::Int64Atomics => self.features.int64_atomics,
            Capability::SubGroups => self.features.sub_groups,
        }
    }

    fn requirement(&self, capability: Capability) -> Requirement {
        Requirement::Extensions(Self::required_extensions(capability).to_vec())
    }
}
