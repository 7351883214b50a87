use std::ffi::{CStr, c_char, c_void};

use super::{
    CuContext, CuDevice, CuDeviceAttribute, CuDevicePtr, CuEvent, CuFunction, CuModule,
    CuOccupancyB2DSize, CuResult, CuStream, CuStreamCallback, CudaArchitecture,
};
use crate::runtime::{ApiError, Backend, Platform, runtime_api, string_from_buffer};

runtime_api! {
    /// Entry points of the CUDA driver.
    pub struct CudaApi(CudaTable) for Backend::Cuda {
        Platform::Windows => ["nvcuda.dll"],
        Platform::Linux => ["libcuda.so.1", "libcuda.so"],
        Platform::MacOs => ["libcuda.dylib"],
    }

    fn cu_init = cuInit(flags: u32) -> CuResult;
    fn cu_driver_get_version = cuDriverGetVersion(version: *mut i32) -> CuResult;

    fn cu_device_get = cuDeviceGet(device: *mut CuDevice, ordinal: i32) -> CuResult;
    fn cu_device_get_count = cuDeviceGetCount(count: *mut i32) -> CuResult;
    /// Writes at most `len` bytes of the nul-terminated device name into `name`.
    fn cu_device_get_name = cuDeviceGetName(name: *mut c_char, len: i32, device: CuDevice) -> CuResult;
    fn cu_device_total_mem = cuDeviceTotalMem_v2(bytes: *mut usize, device: CuDevice) -> CuResult;
    fn cu_device_get_attribute = cuDeviceGetAttribute(
        value: *mut i32,
        attribute: CuDeviceAttribute,
        device: CuDevice,
    ) -> CuResult;
    fn cu_device_can_access_peer = cuDeviceCanAccessPeer(
        can_access_peer: *mut i32,
        device: CuDevice,
        peer_device: CuDevice,
    ) -> CuResult;
    fn cu_device_get_pci_bus_id = cuDeviceGetPCIBusId(
        pci_bus_id: *mut c_char,
        len: i32,
        device: CuDevice,
    ) -> CuResult;
    fn cu_device_primary_ctx_retain = cuDevicePrimaryCtxRetain(
        context: *mut CuContext,
        device: CuDevice,
    ) -> CuResult;
    fn cu_device_primary_ctx_release = cuDevicePrimaryCtxRelease_v2(device: CuDevice) -> CuResult;

    fn cu_ctx_create = cuCtxCreate_v2(context: *mut CuContext, flags: u32, device: CuDevice) -> CuResult;
    fn cu_ctx_destroy = cuCtxDestroy_v2(context: CuContext) -> CuResult;
    fn cu_ctx_get_current = cuCtxGetCurrent(context: *mut CuContext) -> CuResult;
    fn cu_ctx_set_current = cuCtxSetCurrent(context: CuContext) -> CuResult;
    fn cu_ctx_push_current = cuCtxPushCurrent_v2(context: CuContext) -> CuResult;
    fn cu_ctx_pop_current = cuCtxPopCurrent_v2(context: *mut CuContext) -> CuResult;
    fn cu_ctx_get_device = cuCtxGetDevice(device: *mut CuDevice) -> CuResult;
    /// Blocks until every preceding task of the current context has completed.
    fn cu_ctx_synchronize = cuCtxSynchronize() -> CuResult;
    fn cu_ctx_get_cache_config = cuCtxGetCacheConfig(config: *mut i32) -> CuResult;
    fn cu_ctx_set_cache_config = cuCtxSetCacheConfig(config: i32) -> CuResult;
    fn cu_ctx_enable_peer_access = cuCtxEnablePeerAccess(peer_context: CuContext, flags: u32) -> CuResult;
    fn cu_ctx_disable_peer_access = cuCtxDisablePeerAccess(peer_context: CuContext) -> CuResult;

    fn cu_mem_get_info = cuMemGetInfo_v2(free: *mut usize, total: *mut usize) -> CuResult;
    fn cu_mem_alloc = cuMemAlloc_v2(ptr: *mut CuDevicePtr, bytes: usize) -> CuResult;
    fn cu_mem_free = cuMemFree_v2(ptr: CuDevicePtr) -> CuResult;
    fn cu_mem_alloc_host = cuMemAllocHost_v2(ptr: *mut *mut c_void, bytes: usize) -> CuResult;
    fn cu_mem_free_host = cuMemFreeHost(ptr: *mut c_void) -> CuResult;
    fn cu_mem_alloc_managed = cuMemAllocManaged(ptr: *mut CuDevicePtr, bytes: usize, flags: u32) -> CuResult;
    fn cu_mem_host_register = cuMemHostRegister_v2(ptr: *mut c_void, bytes: usize, flags: u32) -> CuResult;
    fn cu_mem_host_unregister = cuMemHostUnregister(ptr: *mut c_void) -> CuResult;
    fn cu_mem_host_get_device_pointer = cuMemHostGetDevicePointer_v2(
        device_ptr: *mut CuDevicePtr,
        host_ptr: *mut c_void,
        flags: u32,
    ) -> CuResult;
    fn cu_memcpy = cuMemcpy(dst: CuDevicePtr, src: CuDevicePtr, bytes: usize) -> CuResult;
    fn cu_memcpy_async = cuMemcpyAsync(
        dst: CuDevicePtr,
        src: CuDevicePtr,
        bytes: usize,
        stream: CuStream,
    ) -> CuResult;
    fn cu_memcpy_htod = cuMemcpyHtoD_v2(dst: CuDevicePtr, src: *const c_void, bytes: usize) -> CuResult;
    fn cu_memcpy_dtoh = cuMemcpyDtoH_v2(dst: *mut c_void, src: CuDevicePtr, bytes: usize) -> CuResult;
    fn cu_memcpy_dtod = cuMemcpyDtoD_v2(dst: CuDevicePtr, src: CuDevicePtr, bytes: usize) -> CuResult;
    fn cu_memcpy_htod_async = cuMemcpyHtoDAsync_v2(
        dst: CuDevicePtr,
        src: *const c_void,
        bytes: usize,
        stream: CuStream,
    ) -> CuResult;
    fn cu_memcpy_dtoh_async = cuMemcpyDtoHAsync_v2(
        dst: *mut c_void,
        src: CuDevicePtr,
        bytes: usize,
        stream: CuStream,
    ) -> CuResult;
    fn cu_memcpy_dtod_async = cuMemcpyDtoDAsync_v2(
        dst: CuDevicePtr,
        src: CuDevicePtr,
        bytes: usize,
        stream: CuStream,
    ) -> CuResult;
    fn cu_memset_d8 = cuMemsetD8_v2(dst: CuDevicePtr, value: u8, count: usize) -> CuResult;
    fn cu_memset_d8_async = cuMemsetD8Async(
        dst: CuDevicePtr,
        value: u8,
        count: usize,
        stream: CuStream,
    ) -> CuResult;
    fn cu_memset_d32 = cuMemsetD32_v2(dst: CuDevicePtr, value: u32, count: usize) -> CuResult;
    fn cu_memset_d32_async = cuMemsetD32Async(
        dst: CuDevicePtr,
        value: u32,
        count: usize,
        stream: CuStream,
    ) -> CuResult;
    fn cu_mem_get_address_range = cuMemGetAddressRange_v2(
        base: *mut CuDevicePtr,
        size: *mut usize,
        ptr: CuDevicePtr,
    ) -> CuResult;
    fn cu_pointer_get_attribute = cuPointerGetAttribute(
        data: *mut c_void,
        attribute: i32,
        ptr: CuDevicePtr,
    ) -> CuResult;
    fn cu_mem_prefetch_async = cuMemPrefetchAsync(
        ptr: CuDevicePtr,
        count: usize,
        dst_device: CuDevice,
        stream: CuStream,
    ) -> CuResult;

    fn cu_stream_create = cuStreamCreate(stream: *mut CuStream, flags: u32) -> CuResult;
    fn cu_stream_create_with_priority = cuStreamCreateWithPriority(
        stream: *mut CuStream,
        flags: u32,
        priority: i32,
    ) -> CuResult;
    fn cu_stream_destroy = cuStreamDestroy_v2(stream: CuStream) -> CuResult;
    fn cu_stream_query = cuStreamQuery(stream: CuStream) -> CuResult;
    /// Blocks until every preceding task of `stream` has completed.
    fn cu_stream_synchronize = cuStreamSynchronize(stream: CuStream) -> CuResult;
    fn cu_stream_wait_event = cuStreamWaitEvent(stream: CuStream, event: CuEvent, flags: u32) -> CuResult;
    fn cu_stream_add_callback = cuStreamAddCallback(
        stream: CuStream,
        callback: Option<CuStreamCallback>,
        user_data: *mut c_void,
        flags: u32,
    ) -> CuResult;

    fn cu_event_create = cuEventCreate(event: *mut CuEvent, flags: u32) -> CuResult;
    fn cu_event_destroy = cuEventDestroy_v2(event: CuEvent) -> CuResult;
    fn cu_event_query = cuEventQuery(event: CuEvent) -> CuResult;
    fn cu_event_record = cuEventRecord(event: CuEvent, stream: CuStream) -> CuResult;
    /// Blocks until `event` has been reached.
    fn cu_event_synchronize = cuEventSynchronize(event: CuEvent) -> CuResult;
    /// Milliseconds between two recorded events.
    fn cu_event_elapsed_time = cuEventElapsedTime(ms: *mut f32, start: CuEvent, end: CuEvent) -> CuResult;

    /// Loads a module from a PTX or cubin image, passed through untouched.
    fn cu_module_load_data = cuModuleLoadData(module: *mut CuModule, image: *const c_void) -> CuResult;
    fn cu_module_load_data_ex = cuModuleLoadDataEx(
        module: *mut CuModule,
        image: *const c_void,
        num_options: u32,
        options: *mut i32,
        option_values: *mut *mut c_void,
    ) -> CuResult;
    fn cu_module_unload = cuModuleUnload(module: CuModule) -> CuResult;
    fn cu_module_get_function = cuModuleGetFunction(
        function: *mut CuFunction,
        module: CuModule,
        name: *const c_char,
    ) -> CuResult;
    fn cu_module_get_global = cuModuleGetGlobal_v2(
        ptr: *mut CuDevicePtr,
        bytes: *mut usize,
        module: CuModule,
        name: *const c_char,
    ) -> CuResult;
    fn cu_func_get_attribute = cuFuncGetAttribute(value: *mut i32, attribute: i32, function: CuFunction) -> CuResult;
    fn cu_func_set_attribute = cuFuncSetAttribute(function: CuFunction, attribute: i32, value: i32) -> CuResult;
    fn cu_func_set_cache_config = cuFuncSetCacheConfig(function: CuFunction, config: i32) -> CuResult;

    /// Launches `function` on a grid of `grid_dim_*` blocks of `block_dim_*` threads each.
    fn cu_launch_kernel = cuLaunchKernel(
        function: CuFunction,
        grid_dim_x: u32,
        grid_dim_y: u32,
        grid_dim_z: u32,
        block_dim_x: u32,
        block_dim_y: u32,
        block_dim_z: u32,
        shared_mem_bytes: u32,
        stream: CuStream,
        kernel_params: *mut *mut c_void,
        extra: *mut *mut c_void,
    ) -> CuResult;
    fn cu_occupancy_max_active_blocks_per_multiprocessor = cuOccupancyMaxActiveBlocksPerMultiprocessor(
        num_blocks: *mut i32,
        function: CuFunction,
        block_size: i32,
        dynamic_shared_mem_bytes: usize,
    ) -> CuResult;
    fn cu_occupancy_max_potential_block_size = cuOccupancyMaxPotentialBlockSize(
        min_grid_size: *mut i32,
        block_size: *mut i32,
        function: CuFunction,
        block_size_to_dynamic_shared_mem: Option<CuOccupancyB2DSize>,
        dynamic_shared_mem_bytes: usize,
        block_size_limit: i32,
    ) -> CuResult;

    fn cu_get_error_string = cuGetErrorString(error: CuResult, message: *mut *const c_char) -> CuResult;
    fn cu_get_error_name = cuGetErrorName(error: CuResult, name: *mut *const c_char) -> CuResult;
}

/// Capacity of the name buffers handed to the driver.
const NAME_CAPACITY: usize = 256;

impl CudaApi {
    pub fn init(&self) -> Result<(), ApiError> {
        unsafe { self.cu_init(0) }?.check("cuInit")
    }

    /// Version of the installed driver, encoded as `1000 * major + 10 * minor`.
    pub fn driver_version(&self) -> Result<i32, ApiError> {
        let mut version: i32 = 0;
        unsafe { self.cu_driver_get_version(&mut version) }?.check("cuDriverGetVersion")?;
        Ok(version)
    }

    pub fn device_count(&self) -> Result<usize, ApiError> {
        let mut count: i32 = 0;
        unsafe { self.cu_device_get_count(&mut count) }?.check("cuDeviceGetCount")?;
        Ok(count.max(0) as usize)
    }

    pub fn device(&self, ordinal: usize) -> Result<CuDevice, ApiError> {
        let mut device: CuDevice = 0;
        let ordinal = i32::try_from(ordinal).unwrap_or(i32::MAX);
        unsafe { self.cu_device_get(&mut device, ordinal) }?.check("cuDeviceGet")?;
        Ok(device)
    }

    pub fn device_name(&self, device: CuDevice) -> Result<String, ApiError> {
        let mut name = vec![0u8; NAME_CAPACITY];
        unsafe { self.cu_device_get_name(name.as_mut_ptr().cast(), name.len() as i32, device) }?
            .check("cuDeviceGetName")?;
        Ok(string_from_buffer(&name))
    }

    pub fn device_attribute(
        &self,
        attribute: CuDeviceAttribute,
        device: CuDevice,
    ) -> Result<i32, ApiError> {
        let mut value: i32 = 0;
        unsafe { self.cu_device_get_attribute(&mut value, attribute, device) }?
            .check("cuDeviceGetAttribute")?;
        Ok(value)
    }

    /// Total memory of `device` in bytes.
    pub fn total_memory(&self, device: CuDevice) -> Result<usize, ApiError> {
        let mut bytes: usize = 0;
        unsafe { self.cu_device_total_mem(&mut bytes, device) }?.check("cuDeviceTotalMem_v2")?;
        Ok(bytes)
    }

    /// Compute capability of `device`.
    pub fn architecture(&self, device: CuDevice) -> Result<CudaArchitecture, ApiError> {
        let major = self.device_attribute(CuDeviceAttribute::COMPUTE_CAPABILITY_MAJOR, device)?;
        let minor = self.device_attribute(CuDeviceAttribute::COMPUTE_CAPABILITY_MINOR, device)?;
        Ok(CudaArchitecture::new(major.max(0) as u32, minor.max(0) as u32))
    }

    /// Description of `error` provided by the driver.
    pub fn error_string(&self, error: CuResult) -> Result<String, ApiError> {
        let mut message: *const c_char = std::ptr::null();
        unsafe { self.cu_get_error_string(error, &mut message) }?.check("cuGetErrorString")?;
        Ok(Self::static_string(message))
    }

    /// Symbolic name of `error` provided by the driver.
    pub fn error_name(&self, error: CuResult) -> Result<String, ApiError> {
        let mut name: *const c_char = std::ptr::null();
        unsafe { self.cu_get_error_name(error, &mut name) }?.check("cuGetErrorName")?;
        Ok(Self::static_string(name))
    }

    fn static_string(ptr: *const c_char) -> String {
        match ptr.is_null() {
            true => String::new(),
            // SAFETY: the driver returns pointers to static nul-terminated strings.
            false => unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::CudaApi;
    use crate::{
        cuda::{CuDeviceAttribute, CuResult},
        runtime::{ApiConfig, ApiError, Backend, Platform, RuntimeApi},
    };

    fn not_supported() -> ApiError {
        ApiError::NotSupported {
            backend: Backend::Cuda,
            platform: Platform::Other,
        }
    }

    #[test]
    fn test_unknown_platform_falls_back_to_stub() {
        let api = CudaApi::load(&ApiConfig::new().platform(Platform::Other));
        assert!(!api.is_supported());
        assert_eq!(api.platform(), Platform::Other);
        assert_eq!(api.probe(), Err(not_supported()));

        assert_eq!(unsafe { api.cu_init(0) }, Err(not_supported()));
        let mut count: i32 = 0;
        assert_eq!(
            unsafe { api.cu_device_get_count(&mut count) },
            Err(not_supported())
        );
        assert_eq!(count, 0);

        assert_eq!(api.init(), Err(not_supported()));
        assert_eq!(api.device_name(0), Err(not_supported()));
        assert_eq!(api.architecture(0), Err(not_supported()));
        assert_eq!(
            api.error_string(CuResult::ERROR_INVALID_VALUE),
            Err(not_supported())
        );
    }

    #[test]
    fn test_platform_candidates() {
        let libraries = |platform| {
            let api = CudaApi::load(&ApiConfig::new().platform(platform));
            assert!(api.is_supported());
            api.binding()
                .libraries()
                .into_iter()
                .map(str::to_owned)
                .collect::<Vec<_>>()
        };
        assert_eq!(libraries(Platform::Windows), ["nvcuda.dll"]);
        assert_eq!(libraries(Platform::Linux), ["libcuda.so.1", "libcuda.so"]);
        assert_eq!(libraries(Platform::MacOs), ["libcuda.dylib"]);
    }

    #[test]
    fn test_missing_library() {
        let config = ApiConfig::new()
            .platform(Platform::Linux)
            .library(Backend::Cuda, "libweft-missing-cuda.so");
        let api = CudaApi::load(&config);
        assert!(api.is_supported());

        let err = api.probe().unwrap_err();
        assert!(matches!(
            &err,
            ApiError::Library { backend: Backend::Cuda, libraries, .. }
                if libraries == &["libweft-missing-cuda.so"]
        ));
        assert_eq!(api.driver_version(), Err(err.clone()));
        assert_eq!(
            api.device_attribute(CuDeviceAttribute::WARP_SIZE, 0),
            Err(err)
        );
    }

    #[test]
    fn test_current_is_shared() {
        let first = CudaApi::current() as *const CudaApi as usize;
        let all: Vec<usize> = (0..64)
            .into_par_iter()
            .map(|_| CudaApi::current() as *const CudaApi as usize)
            .collect();
        assert!(all.into_iter().all(|x| x == first));
    }
}
