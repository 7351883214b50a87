use std::ffi::{c_char, c_void};

use bytemuck::Pod;

use super::{
    ClBitfield, ClBool, ClCommandQueue, ClContext, ClContextCallback, ClContextProperties,
    ClDeviceId, ClDeviceInfo, ClDeviceType, ClEvent, ClEventCallback, ClKernel, ClMem,
    ClPlatformId, ClPlatformInfo, ClProfilingInfo, ClProgram, ClProgramBuildInfo,
    ClProgramCallback, ClQueueProperties, ClStatus,
};
use crate::runtime::{ApiError, Backend, Platform, runtime_api, string_from_buffer};

runtime_api! {
    /// Entry points of the OpenCL driver.
    pub struct ClApi(ClTable) for Backend::OpenCl {
        Platform::Windows => ["OpenCL.dll"],
        Platform::Linux => ["libOpenCL.so.1", "libOpenCL.so"],
        Platform::MacOs => ["/System/Library/Frameworks/OpenCL.framework/OpenCL"],
    }

    fn cl_get_platform_ids = clGetPlatformIDs(
        num_entries: u32,
        platforms: *mut ClPlatformId,
        num_platforms: *mut u32,
    ) -> ClStatus;
    fn cl_get_platform_info = clGetPlatformInfo(
        platform: ClPlatformId,
        param_name: ClPlatformInfo,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    fn cl_get_device_ids = clGetDeviceIDs(
        platform: ClPlatformId,
        device_type: ClDeviceType,
        num_entries: u32,
        devices: *mut ClDeviceId,
        num_devices: *mut u32,
    ) -> ClStatus;
    /// Writes at most `param_value_size` bytes of the parameter into `param_value`, and the
    /// full size of the parameter into `param_value_size_ret`.
    fn cl_get_device_info = clGetDeviceInfo(
        device: ClDeviceId,
        param_name: ClDeviceInfo,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    fn cl_retain_device = clRetainDevice(device: ClDeviceId) -> ClStatus;
    fn cl_release_device = clReleaseDevice(device: ClDeviceId) -> ClStatus;

    fn cl_create_context = clCreateContext(
        properties: *const ClContextProperties,
        num_devices: u32,
        devices: *const ClDeviceId,
        notify: Option<ClContextCallback>,
        user_data: *mut c_void,
        errcode_ret: *mut ClStatus,
    ) -> ClContext;
    fn cl_retain_context = clRetainContext(context: ClContext) -> ClStatus;
    fn cl_release_context = clReleaseContext(context: ClContext) -> ClStatus;
    fn cl_get_context_info = clGetContextInfo(
        context: ClContext,
        param_name: u32,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;

    fn cl_create_command_queue = clCreateCommandQueue(
        context: ClContext,
        device: ClDeviceId,
        properties: ClQueueProperties,
        errcode_ret: *mut ClStatus,
    ) -> ClCommandQueue;
    fn cl_create_command_queue_with_properties = clCreateCommandQueueWithProperties(
        context: ClContext,
        device: ClDeviceId,
        properties: *const ClQueueProperties,
        errcode_ret: *mut ClStatus,
    ) -> ClCommandQueue;
    fn cl_release_command_queue = clReleaseCommandQueue(queue: ClCommandQueue) -> ClStatus;
    fn cl_flush = clFlush(queue: ClCommandQueue) -> ClStatus;
    /// Blocks until every command of `queue` has completed.
    fn cl_finish = clFinish(queue: ClCommandQueue) -> ClStatus;

    fn cl_create_program_with_source = clCreateProgramWithSource(
        context: ClContext,
        count: u32,
        strings: *const *const c_char,
        lengths: *const usize,
        errcode_ret: *mut ClStatus,
    ) -> ClProgram;
    fn cl_create_program_with_binary = clCreateProgramWithBinary(
        context: ClContext,
        num_devices: u32,
        devices: *const ClDeviceId,
        lengths: *const usize,
        binaries: *const *const u8,
        binary_status: *mut ClStatus,
        errcode_ret: *mut ClStatus,
    ) -> ClProgram;
    fn cl_create_program_with_il = clCreateProgramWithIL(
        context: ClContext,
        il: *const c_void,
        length: usize,
        errcode_ret: *mut ClStatus,
    ) -> ClProgram;
    /// Compiles and links `program`, synchronously if `notify` is `None`.
    fn cl_build_program = clBuildProgram(
        program: ClProgram,
        num_devices: u32,
        devices: *const ClDeviceId,
        options: *const c_char,
        notify: Option<ClProgramCallback>,
        user_data: *mut c_void,
    ) -> ClStatus;
    fn cl_get_program_info = clGetProgramInfo(
        program: ClProgram,
        param_name: u32,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    fn cl_get_program_build_info = clGetProgramBuildInfo(
        program: ClProgram,
        device: ClDeviceId,
        param_name: ClProgramBuildInfo,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    fn cl_release_program = clReleaseProgram(program: ClProgram) -> ClStatus;

    fn cl_create_kernel = clCreateKernel(
        program: ClProgram,
        name: *const c_char,
        errcode_ret: *mut ClStatus,
    ) -> ClKernel;
    fn cl_release_kernel = clReleaseKernel(kernel: ClKernel) -> ClStatus;
    fn cl_set_kernel_arg = clSetKernelArg(
        kernel: ClKernel,
        index: u32,
        size: usize,
        value: *const c_void,
    ) -> ClStatus;
    fn cl_get_kernel_info = clGetKernelInfo(
        kernel: ClKernel,
        param_name: u32,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    fn cl_get_kernel_work_group_info = clGetKernelWorkGroupInfo(
        kernel: ClKernel,
        device: ClDeviceId,
        param_name: u32,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    fn cl_get_kernel_sub_group_info = clGetKernelSubGroupInfo(
        kernel: ClKernel,
        device: ClDeviceId,
        param_name: u32,
        input_value_size: usize,
        input_value: *const c_void,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    /// Enqueues `kernel` over a `work_dim`-dimensional range of work items.
    fn cl_enqueue_nd_range_kernel = clEnqueueNDRangeKernel(
        queue: ClCommandQueue,
        kernel: ClKernel,
        work_dim: u32,
        global_work_offset: *const usize,
        global_work_size: *const usize,
        local_work_size: *const usize,
        num_events_in_wait_list: u32,
        event_wait_list: *const ClEvent,
        event: *mut ClEvent,
    ) -> ClStatus;

    fn cl_create_buffer = clCreateBuffer(
        context: ClContext,
        flags: ClBitfield,
        size: usize,
        host_ptr: *mut c_void,
        errcode_ret: *mut ClStatus,
    ) -> ClMem;
    fn cl_release_mem_object = clReleaseMemObject(mem: ClMem) -> ClStatus;
    /// Blocks until the data is read if `blocking_read` is [`CL_TRUE`](super::CL_TRUE).
    fn cl_enqueue_read_buffer = clEnqueueReadBuffer(
        queue: ClCommandQueue,
        buffer: ClMem,
        blocking_read: ClBool,
        offset: usize,
        size: usize,
        ptr: *mut c_void,
        num_events_in_wait_list: u32,
        event_wait_list: *const ClEvent,
        event: *mut ClEvent,
    ) -> ClStatus;
    fn cl_enqueue_write_buffer = clEnqueueWriteBuffer(
        queue: ClCommandQueue,
        buffer: ClMem,
        blocking_write: ClBool,
        offset: usize,
        size: usize,
        ptr: *const c_void,
        num_events_in_wait_list: u32,
        event_wait_list: *const ClEvent,
        event: *mut ClEvent,
    ) -> ClStatus;
    fn cl_enqueue_copy_buffer = clEnqueueCopyBuffer(
        queue: ClCommandQueue,
        src_buffer: ClMem,
        dst_buffer: ClMem,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
        num_events_in_wait_list: u32,
        event_wait_list: *const ClEvent,
        event: *mut ClEvent,
    ) -> ClStatus;
    fn cl_enqueue_fill_buffer = clEnqueueFillBuffer(
        queue: ClCommandQueue,
        buffer: ClMem,
        pattern: *const c_void,
        pattern_size: usize,
        offset: usize,
        size: usize,
        num_events_in_wait_list: u32,
        event_wait_list: *const ClEvent,
        event: *mut ClEvent,
    ) -> ClStatus;
    fn cl_enqueue_barrier_with_wait_list = clEnqueueBarrierWithWaitList(
        queue: ClCommandQueue,
        num_events_in_wait_list: u32,
        event_wait_list: *const ClEvent,
        event: *mut ClEvent,
    ) -> ClStatus;
    fn cl_enqueue_marker_with_wait_list = clEnqueueMarkerWithWaitList(
        queue: ClCommandQueue,
        num_events_in_wait_list: u32,
        event_wait_list: *const ClEvent,
        event: *mut ClEvent,
    ) -> ClStatus;

    /// Blocks until every event in `event_list` has completed.
    fn cl_wait_for_events = clWaitForEvents(num_events: u32, event_list: *const ClEvent) -> ClStatus;
    fn cl_get_event_info = clGetEventInfo(
        event: ClEvent,
        param_name: u32,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    /// Device timestamps of `event` in nanoseconds; the queue needs profiling enabled.
    fn cl_get_event_profiling_info = clGetEventProfilingInfo(
        event: ClEvent,
        param_name: ClProfilingInfo,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> ClStatus;
    fn cl_set_event_callback = clSetEventCallback(
        event: ClEvent,
        command_exec_callback_type: i32,
        notify: Option<ClEventCallback>,
        user_data: *mut c_void,
    ) -> ClStatus;
    fn cl_retain_event = clRetainEvent(event: ClEvent) -> ClStatus;
    fn cl_release_event = clReleaseEvent(event: ClEvent) -> ClStatus;

    fn cl_get_extension_function_address_for_platform = clGetExtensionFunctionAddressForPlatform(
        platform: ClPlatformId,
        name: *const c_char,
    ) -> *mut c_void;
}

impl ClApi {
    /// Every installed platform. An ICD loader without platforms yields an empty list.
    pub fn platform_ids(&self) -> Result<Vec<ClPlatformId>, ApiError> {
        let mut count: u32 = 0;
        let status = unsafe { self.cl_get_platform_ids(0, std::ptr::null_mut(), &mut count) }?;
        if status == ClStatus::PLATFORM_NOT_FOUND_KHR {
            return Ok(vec![]);
        }
        status.check("clGetPlatformIDs")?;

        let mut platforms = vec![std::ptr::null_mut(); count as usize];
        if !platforms.is_empty() {
            unsafe { self.cl_get_platform_ids(count, platforms.as_mut_ptr(), &mut count) }?
                .check("clGetPlatformIDs")?;
            platforms.truncate(count as usize);
        }
        Ok(platforms)
    }

    pub fn platform_info_string(
        &self,
        platform: ClPlatformId,
        info: ClPlatformInfo,
    ) -> Result<String, ApiError> {
        let mut size: usize = 0;
        unsafe { self.cl_get_platform_info(platform, info, 0, std::ptr::null_mut(), &mut size) }?
            .check("clGetPlatformInfo")?;

        let mut value = vec![0u8; size];
        unsafe {
            self.cl_get_platform_info(
                platform,
                info,
                value.len(),
                value.as_mut_ptr().cast(),
                std::ptr::null_mut(),
            )
        }?
        .check("clGetPlatformInfo")?;
        Ok(string_from_buffer(&value))
    }

    /// Devices of `platform` matching `device_type`. No matching device yields an empty list.
    pub fn device_ids(
        &self,
        platform: ClPlatformId,
        device_type: ClDeviceType,
    ) -> Result<Vec<ClDeviceId>, ApiError> {
        let mut count: u32 = 0;
        let status = unsafe {
            self.cl_get_device_ids(platform, device_type, 0, std::ptr::null_mut(), &mut count)
        }?;
        if status == ClStatus::DEVICE_NOT_FOUND {
            return Ok(vec![]);
        }
        status.check("clGetDeviceIDs")?;

        let mut devices = vec![std::ptr::null_mut(); count as usize];
        if !devices.is_empty() {
            unsafe {
                self.cl_get_device_ids(
                    platform,
                    device_type,
                    count,
                    devices.as_mut_ptr(),
                    &mut count,
                )
            }?
            .check("clGetDeviceIDs")?;
            devices.truncate(count as usize);
        }
        Ok(devices)
    }

    pub fn device_info_string(
        &self,
        device: ClDeviceId,
        info: ClDeviceInfo,
    ) -> Result<String, ApiError> {
        let mut size: usize = 0;
        unsafe { self.cl_get_device_info(device, info, 0, std::ptr::null_mut(), &mut size) }?
            .check("clGetDeviceInfo")?;

        let mut value = vec![0u8; size];
        unsafe {
            self.cl_get_device_info(
                device,
                info,
                value.len(),
                value.as_mut_ptr().cast(),
                std::ptr::null_mut(),
            )
        }?
        .check("clGetDeviceInfo")?;
        Ok(string_from_buffer(&value))
    }

    /// Reads a fixed-size device parameter, e.g. `u32` for
    /// [`MAX_COMPUTE_UNITS`](ClDeviceInfo::MAX_COMPUTE_UNITS).
    pub fn device_info_value<T: Pod>(
        &self,
        device: ClDeviceId,
        info: ClDeviceInfo,
    ) -> Result<T, ApiError> {
        let mut value = T::zeroed();
        unsafe {
            self.cl_get_device_info(
                device,
                info,
                size_of::<T>(),
                bytemuck::bytes_of_mut(&mut value).as_mut_ptr().cast(),
                std::ptr::null_mut(),
            )
        }?
        .check("clGetDeviceInfo")?;
        Ok(value)
    }

    /// Names of the extensions `device` advertises.
    pub fn device_extensions(&self, device: ClDeviceId) -> Result<Vec<String>, ApiError> {
        let extensions = self.device_info_string(device, ClDeviceInfo::EXTENSIONS)?;
        Ok(extensions.split_whitespace().map(str::to_owned).collect())
    }
}
