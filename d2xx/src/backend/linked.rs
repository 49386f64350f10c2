//! Backend calling into libftd2xx linked at build time.
//!
//! Set `D2XX_LIB_DIR` to the directory holding the vendor archive.

use super::{Driver, Session};
use crate::Version;
use crate::ffi::{Api, Dword, FtDevice, FtHandle, FtStatus};
use crate::native::{self, NativeHandle};
use crate::status::Status;
use libc::{c_char, c_int, c_void};

#[allow(non_snake_case)]
#[cfg_attr(windows, link(name = "ftd2xx"))]
#[cfg_attr(not(windows), link(name = "ftd2xx", kind = "static"))]
unsafe extern "system" {
    fn FT_Close(handle: FtHandle) -> FtStatus;
    fn FT_CreateDeviceInfoList(num_devs: *mut Dword) -> FtStatus;
    fn FT_EEPROM_Read(
        handle: FtHandle,
        eeprom: *mut c_void,
        size: Dword,
        manufacturer: *mut c_char,
        manufacturer_id: *mut c_char,
        description: *mut c_char,
        serial: *mut c_char,
    ) -> FtStatus;
    fn FT_EEPROM_Program(
        handle: FtHandle,
        eeprom: *mut c_void,
        size: Dword,
        manufacturer: *mut c_char,
        manufacturer_id: *mut c_char,
        description: *mut c_char,
        serial: *mut c_char,
    ) -> FtStatus;
    fn FT_EraseEE(handle: FtHandle) -> FtStatus;
    fn FT_WriteEE(handle: FtHandle, offset: Dword, value: u16) -> FtStatus;
    fn FT_EE_UASize(handle: FtHandle, size: *mut Dword) -> FtStatus;
    fn FT_EE_UARead(handle: FtHandle, data: *mut u8, len: Dword, read: *mut Dword) -> FtStatus;
    fn FT_EE_UAWrite(handle: FtHandle, data: *mut u8, len: Dword) -> FtStatus;
    fn FT_GetBitMode(handle: FtHandle, mode: *mut u8) -> FtStatus;
    fn FT_GetDeviceInfo(
        handle: FtHandle,
        device: *mut FtDevice,
        id: *mut Dword,
        serial: *mut c_char,
        description: *mut c_char,
        dummy: *mut c_void,
    ) -> FtStatus;
    fn FT_GetLibraryVersion(version: *mut Dword) -> FtStatus;
    fn FT_GetQueueStatus(handle: FtHandle, rx_bytes: *mut Dword) -> FtStatus;
    fn FT_Open(index: c_int, handle: *mut FtHandle) -> FtStatus;
    fn FT_Read(handle: FtHandle, buf: *mut c_void, len: Dword, read: *mut Dword) -> FtStatus;
    fn FT_ResetDevice(handle: FtHandle) -> FtStatus;
    fn FT_SetBaudRate(handle: FtHandle, baud: u32) -> FtStatus;
    fn FT_SetBitMode(handle: FtHandle, mask: u8, mode: u8) -> FtStatus;
    fn FT_SetChars(
        handle: FtHandle,
        event_char: u8,
        event_enabled: u8,
        error_char: u8,
        error_enabled: u8,
    ) -> FtStatus;
    fn FT_SetFlowControl(handle: FtHandle, flow: u16, xon: u8, xoff: u8) -> FtStatus;
    fn FT_SetLatencyTimer(handle: FtHandle, timer: u8) -> FtStatus;
    fn FT_SetTimeouts(handle: FtHandle, read_ms: u32, write_ms: u32) -> FtStatus;
    fn FT_SetUSBParameters(handle: FtHandle, in_size: u32, out_size: u32) -> FtStatus;
    fn FT_Write(handle: FtHandle, buf: *mut c_void, len: Dword, sent: *mut Dword) -> FtStatus;
}

static API: Api = Api {
    close: FT_Close,
    create_device_info_list: FT_CreateDeviceInfoList,
    eeprom_read: FT_EEPROM_Read,
    eeprom_program: FT_EEPROM_Program,
    erase_ee: FT_EraseEE,
    write_ee: FT_WriteEE,
    ee_ua_size: FT_EE_UASize,
    ee_ua_read: FT_EE_UARead,
    ee_ua_write: FT_EE_UAWrite,
    get_bit_mode: FT_GetBitMode,
    get_device_info: FT_GetDeviceInfo,
    get_library_version: FT_GetLibraryVersion,
    get_queue_status: FT_GetQueueStatus,
    open: FT_Open,
    read: FT_Read,
    reset_device: FT_ResetDevice,
    set_baud_rate: FT_SetBaudRate,
    set_bit_mode: FT_SetBitMode,
    set_chars: FT_SetChars,
    set_flow_control: FT_SetFlowControl,
    set_latency_timer: FT_SetLatencyTimer,
    set_timeouts: FT_SetTimeouts,
    set_usb_parameters: FT_SetUSBParameters,
    write: FT_Write,
};

/// Always available; a missing archive is a link error, not a runtime one.
pub struct LinkedDriver;

impl Driver for LinkedDriver {
    fn available(&self) -> bool {
        true
    }

    fn version(&self) -> Version {
        native::version(&API)
    }

    fn create_device_info_list(&self) -> Result<usize, Status> {
        native::create_device_info_list(&API)
    }

    fn open(&self, index: usize) -> Result<Session<'_>, Status> {
        let handle = NativeHandle::open(&API, index)?;
        Ok(Box::new(handle))
    }
}
