//! CUDA driver API.

use std::ffi::c_void;

use crate::runtime::{Backend, status_code};

mod api;
mod arch;
mod capability;

pub use api::CudaApi;
pub use arch::{CudaArchitecture, ParseArchitectureError};
pub use capability::CudaCapabilityContext;

pub type CuDevice = i32;
pub type CuDevicePtr = u64;
pub type CuContext = *mut c_void;
pub type CuModule = *mut c_void;
pub type CuFunction = *mut c_void;
pub type CuStream = *mut c_void;
pub type CuEvent = *mut c_void;

pub type CuStreamCallback =
    unsafe extern "system" fn(stream: CuStream, status: CuResult, user_data: *mut c_void);
pub type CuOccupancyB2DSize = unsafe extern "system" fn(block_size: i32) -> usize;

status_code! {
    /// Status returned by every CUDA driver call.
    pub struct CuResult("CUDA_") for Backend::Cuda {
        SUCCESS = 0,
        ERROR_INVALID_VALUE = 1,
        ERROR_OUT_OF_MEMORY = 2,
        ERROR_NOT_INITIALIZED = 3,
        ERROR_DEINITIALIZED = 4,
        ERROR_PROFILER_DISABLED = 5,
        ERROR_STUB_LIBRARY = 34,
        ERROR_NO_DEVICE = 100,
        ERROR_INVALID_DEVICE = 101,
        ERROR_DEVICE_NOT_LICENSED = 102,
        ERROR_INVALID_IMAGE = 200,
        ERROR_INVALID_CONTEXT = 201,
        ERROR_CONTEXT_ALREADY_CURRENT = 202,
        ERROR_MAP_FAILED = 205,
        ERROR_UNMAP_FAILED = 206,
        ERROR_ALREADY_MAPPED = 208,
        ERROR_NO_BINARY_FOR_GPU = 209,
        ERROR_ALREADY_ACQUIRED = 210,
        ERROR_NOT_MAPPED = 211,
        ERROR_UNSUPPORTED_PTX_VERSION = 222,
        ERROR_INVALID_PTX = 218,
        ERROR_INVALID_SOURCE = 300,
        ERROR_FILE_NOT_FOUND = 301,
        ERROR_INVALID_HANDLE = 400,
        ERROR_NOT_FOUND = 500,
        ERROR_NOT_READY = 600,
        ERROR_ILLEGAL_ADDRESS = 700,
        ERROR_LAUNCH_OUT_OF_RESOURCES = 701,
        ERROR_LAUNCH_TIMEOUT = 702,
        ERROR_PEER_ACCESS_ALREADY_ENABLED = 704,
        ERROR_PEER_ACCESS_NOT_ENABLED = 705,
        ERROR_PRIMARY_CONTEXT_ACTIVE = 708,
        ERROR_CONTEXT_IS_DESTROYED = 709,
        ERROR_ASSERT = 710,
        ERROR_HOST_MEMORY_ALREADY_REGISTERED = 712,
        ERROR_HOST_MEMORY_NOT_REGISTERED = 713,
        ERROR_LAUNCH_FAILED = 719,
        ERROR_NOT_PERMITTED = 800,
        ERROR_NOT_SUPPORTED = 801,
        ERROR_UNKNOWN = 999,
    }
}

/// Device attribute queried with [`CudaApi::cu_device_get_attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CuDeviceAttribute(pub i32);

impl CuDeviceAttribute {
    pub const MAX_THREADS_PER_BLOCK: Self = Self(1);
    pub const MAX_BLOCK_DIM_X: Self = Self(2);
    pub const MAX_BLOCK_DIM_Y: Self = Self(3);
    pub const MAX_BLOCK_DIM_Z: Self = Self(4);
    pub const MAX_GRID_DIM_X: Self = Self(5);
    pub const MAX_GRID_DIM_Y: Self = Self(6);
    pub const MAX_GRID_DIM_Z: Self = Self(7);
    pub const MAX_SHARED_MEMORY_PER_BLOCK: Self = Self(8);
    pub const TOTAL_CONSTANT_MEMORY: Self = Self(9);
    pub const WARP_SIZE: Self = Self(10);
    pub const MAX_PITCH: Self = Self(11);
    pub const MAX_REGISTERS_PER_BLOCK: Self = Self(12);
    pub const CLOCK_RATE: Self = Self(13);
    pub const MULTIPROCESSOR_COUNT: Self = Self(16);
    pub const INTEGRATED: Self = Self(18);
    pub const CAN_MAP_HOST_MEMORY: Self = Self(19);
    pub const CONCURRENT_KERNELS: Self = Self(31);
    pub const PCI_BUS_ID: Self = Self(33);
    pub const PCI_DEVICE_ID: Self = Self(34);
    pub const MEMORY_CLOCK_RATE: Self = Self(36);
    pub const GLOBAL_MEMORY_BUS_WIDTH: Self = Self(37);
    pub const L2_CACHE_SIZE: Self = Self(38);
    pub const MAX_THREADS_PER_MULTIPROCESSOR: Self = Self(39);
    pub const UNIFIED_ADDRESSING: Self = Self(41);
    pub const PCI_DOMAIN_ID: Self = Self(50);
    pub const COMPUTE_CAPABILITY_MAJOR: Self = Self(75);
    pub const COMPUTE_CAPABILITY_MINOR: Self = Self(76);
    pub const MAX_SHARED_MEMORY_PER_MULTIPROCESSOR: Self = Self(81);
    pub const MANAGED_MEMORY: Self = Self(83);
    pub const CONCURRENT_MANAGED_ACCESS: Self = Self(89);
}

/// Flags of [`CudaApi::cu_stream_create`].
pub mod stream_flags {
    pub const DEFAULT: u32 = 0x0;
    pub const NON_BLOCKING: u32 = 0x1;
}

/// Flags of [`CudaApi::cu_event_create`].
pub mod event_flags {
    pub const DEFAULT: u32 = 0x0;
    pub const BLOCKING_SYNC: u32 = 0x1;
    pub const DISABLE_TIMING: u32 = 0x2;
    pub const INTERPROCESS: u32 = 0x4;
}

/// Flags of [`CudaApi::cu_mem_alloc_managed`].
pub mod mem_attach_flags {
    pub const GLOBAL: u32 = 0x1;
    pub const HOST: u32 = 0x2;
    pub const SINGLE: u32 = 0x4;
}

#[cfg(test)]
mod tests {
    use super::CuResult;
    use crate::runtime::{ApiError, Backend};

    #[test]
    fn test_status_names() {
        assert_eq!(CuResult::SUCCESS.name(), Some("CUDA_SUCCESS"));
        assert_eq!(
            CuResult::ERROR_OUT_OF_MEMORY.name(),
            Some("CUDA_ERROR_OUT_OF_MEMORY")
        );
        assert_eq!(CuResult(12345).name(), None);
        assert_eq!(CuResult::ERROR_NO_DEVICE.to_string(), "CUDA_ERROR_NO_DEVICE (100)");
        assert_eq!(CuResult(-3).to_string(), "unrecognized status (-3)");
        assert_eq!(i32::from(CuResult::ERROR_LAUNCH_FAILED), 719);
    }

    #[test]
    fn test_check() {
        assert!(CuResult::SUCCESS.is_success());
        assert_eq!(CuResult::SUCCESS.check("cuInit"), Ok(()));
        assert_eq!(
            CuResult::ERROR_NOT_INITIALIZED.check("cuDeviceGet"),
            Err(ApiError::Driver {
                backend: Backend::Cuda,
                call: "cuDeviceGet",
                status: 3,
                name: "CUDA_ERROR_NOT_INITIALIZED",
            })
        );
    }
}
