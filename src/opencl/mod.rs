//! OpenCL driver API.

use std::ffi::{c_char, c_void};

use crate::runtime::{Backend, status_code};

mod api;
mod capability;

pub use api::ClApi;
pub use capability::{ClCapabilityContext, ClFeatures};

pub type ClPlatformId = *mut c_void;
pub type ClDeviceId = *mut c_void;
pub type ClContext = *mut c_void;
pub type ClCommandQueue = *mut c_void;
pub type ClMem = *mut c_void;
pub type ClProgram = *mut c_void;
pub type ClKernel = *mut c_void;
pub type ClEvent = *mut c_void;

pub type ClBool = u32;
pub type ClBitfield = u64;
pub type ClContextProperties = isize;
pub type ClQueueProperties = u64;

pub const CL_FALSE: ClBool = 0;
pub const CL_TRUE: ClBool = 1;

pub type ClContextCallback = unsafe extern "system" fn(
    error_info: *const c_char,
    private_info: *const c_void,
    private_info_size: usize,
    user_data: *mut c_void,
);
pub type ClProgramCallback = unsafe extern "system" fn(program: ClProgram, user_data: *mut c_void);
pub type ClEventCallback =
    unsafe extern "system" fn(event: ClEvent, status: i32, user_data: *mut c_void);

status_code! {
    /// Status returned by OpenCL calls, either directly or through an `errcode_ret` pointer.
    pub struct ClStatus("CL_") for Backend::OpenCl {
        SUCCESS = 0,
        DEVICE_NOT_FOUND = -1,
        DEVICE_NOT_AVAILABLE = -2,
        COMPILER_NOT_AVAILABLE = -3,
        MEM_OBJECT_ALLOCATION_FAILURE = -4,
        OUT_OF_RESOURCES = -5,
        OUT_OF_HOST_MEMORY = -6,
        PROFILING_INFO_NOT_AVAILABLE = -7,
        MEM_COPY_OVERLAP = -8,
        BUILD_PROGRAM_FAILURE = -11,
        MAP_FAILURE = -12,
        MISALIGNED_SUB_BUFFER_OFFSET = -13,
        EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST = -14,
        COMPILE_PROGRAM_FAILURE = -15,
        LINKER_NOT_AVAILABLE = -16,
        LINK_PROGRAM_FAILURE = -17,
        INVALID_VALUE = -30,
        INVALID_DEVICE_TYPE = -31,
        INVALID_PLATFORM = -32,
        INVALID_DEVICE = -33,
        INVALID_CONTEXT = -34,
        INVALID_QUEUE_PROPERTIES = -35,
        INVALID_COMMAND_QUEUE = -36,
        INVALID_HOST_PTR = -37,
        INVALID_MEM_OBJECT = -38,
        INVALID_BINARY = -42,
        INVALID_BUILD_OPTIONS = -43,
        INVALID_PROGRAM = -44,
        INVALID_PROGRAM_EXECUTABLE = -45,
        INVALID_KERNEL_NAME = -46,
        INVALID_KERNEL_DEFINITION = -47,
        INVALID_KERNEL = -48,
        INVALID_ARG_INDEX = -49,
        INVALID_ARG_VALUE = -50,
        INVALID_ARG_SIZE = -51,
        INVALID_KERNEL_ARGS = -52,
        INVALID_WORK_DIMENSION = -53,
        INVALID_WORK_GROUP_SIZE = -54,
        INVALID_WORK_ITEM_SIZE = -55,
        INVALID_GLOBAL_OFFSET = -56,
        INVALID_EVENT_WAIT_LIST = -57,
        INVALID_EVENT = -58,
        INVALID_OPERATION = -59,
        INVALID_BUFFER_SIZE = -61,
        INVALID_GLOBAL_WORK_SIZE = -63,
        INVALID_PROPERTY = -64,
        INVALID_COMPILER_OPTIONS = -66,
        INVALID_LINKER_OPTIONS = -67,
        /// Returned by the ICD loader when no platform is installed.
        PLATFORM_NOT_FOUND_KHR = -1001,
    }
}

/// Parameter of [`ClApi::cl_get_platform_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClPlatformInfo(pub u32);

impl ClPlatformInfo {
    pub const PROFILE: Self = Self(0x0900);
    pub const VERSION: Self = Self(0x0901);
    pub const NAME: Self = Self(0x0902);
    pub const VENDOR: Self = Self(0x0903);
    pub const EXTENSIONS: Self = Self(0x0904);
}

/// Parameter of [`ClApi::cl_get_device_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClDeviceInfo(pub u32);

impl ClDeviceInfo {
    pub const TYPE: Self = Self(0x1000);
    pub const VENDOR_ID: Self = Self(0x1001);
    pub const MAX_COMPUTE_UNITS: Self = Self(0x1002);
    pub const MAX_WORK_ITEM_DIMENSIONS: Self = Self(0x1003);
    pub const MAX_WORK_GROUP_SIZE: Self = Self(0x1004);
    pub const MAX_WORK_ITEM_SIZES: Self = Self(0x1005);
    pub const MAX_CLOCK_FREQUENCY: Self = Self(0x100C);
    pub const ADDRESS_BITS: Self = Self(0x100D);
    pub const MAX_MEM_ALLOC_SIZE: Self = Self(0x1010);
    pub const GLOBAL_MEM_SIZE: Self = Self(0x101F);
    pub const MAX_CONSTANT_BUFFER_SIZE: Self = Self(0x1020);
    pub const LOCAL_MEM_SIZE: Self = Self(0x1023);
    pub const AVAILABLE: Self = Self(0x1027);
    pub const NAME: Self = Self(0x102B);
    pub const VENDOR: Self = Self(0x102C);
    pub const DRIVER_VERSION: Self = Self(0x102D);
    pub const PROFILE: Self = Self(0x102E);
    pub const VERSION: Self = Self(0x102F);
    pub const EXTENSIONS: Self = Self(0x1030);
    pub const PLATFORM: Self = Self(0x1031);
    pub const OPENCL_C_VERSION: Self = Self(0x103D);
}

/// Device type filter of [`ClApi::cl_get_device_ids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClDeviceType(pub ClBitfield);

impl ClDeviceType {
    pub const DEFAULT: Self = Self(1 << 0);
    pub const CPU: Self = Self(1 << 1);
    pub const GPU: Self = Self(1 << 2);
    pub const ACCELERATOR: Self = Self(1 << 3);
    pub const ALL: Self = Self(0xFFFF_FFFF);
}

/// Flags of [`ClApi::cl_create_buffer`].
pub mod mem_flags {
    use super::ClBitfield;

    pub const READ_WRITE: ClBitfield = 1 << 0;
    pub const WRITE_ONLY: ClBitfield = 1 << 1;
    pub const READ_ONLY: ClBitfield = 1 << 2;
    pub const USE_HOST_PTR: ClBitfield = 1 << 3;
    pub const ALLOC_HOST_PTR: ClBitfield = 1 << 4;
    pub const COPY_HOST_PTR: ClBitfield = 1 << 5;
}

/// Properties of [`ClApi::cl_create_command_queue`].
pub mod queue_properties {
    use super::ClQueueProperties;

    pub const OUT_OF_ORDER_EXEC_MODE_ENABLE: ClQueueProperties = 1 << 0;
    pub const PROFILING_ENABLE: ClQueueProperties = 1 << 1;
}

/// Parameter of [`ClApi::cl_get_event_profiling_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClProfilingInfo(pub u32);

impl ClProfilingInfo {
    pub const COMMAND_QUEUED: Self = Self(0x1280);
    pub const COMMAND_SUBMIT: Self = Self(0x1281);
    pub const COMMAND_START: Self = Self(0x1282);
    pub const COMMAND_END: Self = Self(0x1283);
}

/// Parameter of [`ClApi::cl_get_program_build_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClProgramBuildInfo(pub u32);

impl ClProgramBuildInfo {
    pub const STATUS: Self = Self(0x1181);
    pub const OPTIONS: Self = Self(0x1182);
    pub const LOG: Self = Self(0x1183);
}
