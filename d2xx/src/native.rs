//! [`Handle`] implementation over a native [`Api`] table.
//!
//! This is the only place that turns slices into pointer/length pairs and
//! native result codes into [`Status`].

use crate::Version;
use crate::eeprom::{
    Eeprom, STRING_CAPACITY, StringBuf, pack_string, unpack_string, with_device_type,
};
use crate::ffi::{Api, Dword, FLOW_RTS_CTS, FtDevice, FtHandle};
use crate::handle::{DeviceInfo, Handle};
use crate::status::Status;
use libc::{c_int, c_void};
use log::debug;
use std::ptr;

pub(crate) fn version(api: &Api) -> Version {
    let mut v: Dword = 0;
    // SAFETY: the pointer is valid for the duration of the call.
    unsafe { (api.get_library_version)(&mut v) };
    Version::from_packed(v)
}

pub(crate) fn create_device_info_list(api: &Api) -> Result<usize, Status> {
    let mut num: Dword = 0;
    // SAFETY: the pointer is valid for the duration of the call.
    Status::check(unsafe { (api.create_device_info_list)(&mut num) })?;
    Ok(num as usize)
}

/// An open device reached through a native driver.
pub struct NativeHandle<'a> {
    api: &'a Api,
    /// Address of the `FT_HANDLE`; 0 once closed.
    raw: usize,
}

impl<'a> NativeHandle<'a> {
    /// Opens the `index`th device discovered by the driver.
    pub(crate) fn open(api: &'a Api, index: usize) -> Result<Self, Status> {
        let index = c_int::try_from(index).map_err(|_| Status::DEVICE_NOT_FOUND)?;
        let mut h: FtHandle = ptr::null_mut();
        // SAFETY: the pointer is valid for the duration of the call.
        Status::check(unsafe { (api.open)(index, &mut h) })?;
        if h.is_null() {
            // Some drivers report success without a handle.
            return Err(Status::OTHER_ERROR);
        }
        Ok(Self {
            api,
            raw: h as usize,
        })
    }

    /// The session identifier, 0 once closed.
    pub fn raw(&self) -> usize {
        self.raw
    }

    fn h(&self) -> Result<FtHandle, Status> {
        match self.raw {
            0 => Err(Status::INVALID_HANDLE),
            raw => Ok(raw as FtHandle),
        }
    }

    fn read_eeprom_once(
        &self,
        h: FtHandle,
        raw: &mut [u8],
        strings: &mut Strings,
    ) -> Result<(), Status> {
        let len = to_dword(raw.len())?;
        // SAFETY: `raw` and the string buffers outlive the call and their
        // lengths match what the driver is told.
        Status::check(unsafe {
            (self.api.eeprom_read)(
                h,
                payload(raw),
                len,
                strings.manufacturer.as_mut_ptr(),
                strings.manufacturer_id.as_mut_ptr(),
                strings.desc.as_mut_ptr(),
                strings.serial.as_mut_ptr(),
            )
        })
    }
}

impl Drop for NativeHandle<'_> {
    fn drop(&mut self) {
        if self.raw != 0 {
            debug!("closing d2xx handle {:#x} on drop", self.raw);
            let _ = self.close();
        }
    }
}

struct Strings {
    manufacturer: StringBuf,
    manufacturer_id: StringBuf,
    desc: StringBuf,
    serial: StringBuf,
}

impl Strings {
    fn empty() -> Self {
        Self {
            manufacturer: [0; STRING_CAPACITY],
            manufacturer_id: [0; STRING_CAPACITY],
            desc: [0; STRING_CAPACITY],
            serial: [0; STRING_CAPACITY],
        }
    }

    fn pack(ee: &Eeprom) -> Self {
        Self {
            manufacturer: pack_string(&ee.manufacturer),
            manufacturer_id: pack_string(&ee.manufacturer_id),
            desc: pack_string(&ee.desc),
            serial: pack_string(&ee.serial),
        }
    }
}

fn payload(raw: &mut [u8]) -> *mut c_void {
    if raw.is_empty() {
        ptr::null_mut()
    } else {
        raw.as_mut_ptr().cast()
    }
}

fn to_dword(len: usize) -> Result<Dword, Status> {
    Dword::try_from(len).map_err(|_| Status::INVALID_PARAMETER)
}

impl Handle for NativeHandle<'_> {
    fn close(&mut self) -> Result<(), Status> {
        let h = self.h()?;
        // The handle is gone even if the driver reports a failure.
        self.raw = 0;
        // SAFETY: `h` came from FT_Open and is closed exactly once.
        Status::check(unsafe { (self.api.close)(h) })
    }

    fn reset_device(&mut self) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.reset_device)(h) })
    }

    fn get_device_info(&mut self) -> Result<DeviceInfo, Status> {
        let h = self.h()?;
        let mut dev: FtDevice = 0;
        let mut id: Dword = 0;
        // SAFETY: the out pointers are valid; the driver accepts null for the
        // serial, description and reserved arguments.
        Status::check(unsafe {
            (self.api.get_device_info)(
                h,
                &mut dev,
                &mut id,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        })?;
        Ok(DeviceInfo::from_packed(dev, id))
    }

    fn eeprom_read(&mut self, device_type: u32, ee: &mut Eeprom) -> Result<(), Status> {
        let h = self.h()?;
        let mut strings = Strings::empty();

        // The ft232r requires the header's device type to be set while the
        // ft232h rejects it with FT_INVALID_PARAMETER; try both.
        with_device_type(&mut ee.raw, device_type);
        let mut result = self.read_eeprom_once(h, &mut ee.raw, &mut strings);
        if result == Err(Status::INVALID_PARAMETER) {
            debug!("eeprom read rejected device type {device_type}, retrying with 0");
            with_device_type(&mut ee.raw, 0);
            result = self.read_eeprom_once(h, &mut ee.raw, &mut strings);
        }
        result?;

        ee.manufacturer = unpack_string(&strings.manufacturer);
        ee.manufacturer_id = unpack_string(&strings.manufacturer_id);
        ee.desc = unpack_string(&strings.desc);
        ee.serial = unpack_string(&strings.serial);
        Ok(())
    }

    fn eeprom_program(&mut self, ee: &Eeprom) -> Result<(), Status> {
        let h = self.h()?;
        let mut strings = Strings::pack(ee);
        let len = to_dword(ee.raw.len())?;
        // The driver takes a mutable pointer but doesn't write through it.
        let raw: *mut c_void = if ee.raw.is_empty() {
            ptr::null_mut()
        } else {
            ee.raw.as_ptr().cast_mut().cast()
        };
        // SAFETY: every buffer outlives the call; strings are NUL terminated
        // within STRING_CAPACITY bytes.
        Status::check(unsafe {
            (self.api.eeprom_program)(
                h,
                raw,
                len,
                strings.manufacturer.as_mut_ptr(),
                strings.manufacturer_id.as_mut_ptr(),
                strings.desc.as_mut_ptr(),
                strings.serial.as_mut_ptr(),
            )
        })
    }

    fn erase_ee(&mut self) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.erase_ee)(h) })
    }

    fn write_ee(&mut self, offset: u8, value: u16) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.write_ee)(h, Dword::from(offset), value) })
    }

    fn ee_ua_size(&mut self) -> Result<usize, Status> {
        let h = self.h()?;
        let mut size: Dword = 0;
        // SAFETY: the out pointer is valid for the call.
        Status::check(unsafe { (self.api.ee_ua_size)(h, &mut size) })?;
        Ok(size as usize)
    }

    fn ee_ua_read(&mut self, ua: &mut [u8]) -> Result<(), Status> {
        let h = self.h()?;
        let len = to_dword(ua.len())?;
        let mut size: Dword = 0;
        // SAFETY: `ua` is valid for `len` bytes.
        Status::check(unsafe { (self.api.ee_ua_read)(h, ua.as_mut_ptr(), len, &mut size) })?;
        if size as usize != ua.len() {
            return Err(Status::INVALID_PARAMETER);
        }
        Ok(())
    }

    fn ee_ua_write(&mut self, ua: &[u8]) -> Result<(), Status> {
        let h = self.h()?;
        let len = to_dword(ua.len())?;
        // SAFETY: the driver only reads `len` bytes from the buffer.
        Status::check(unsafe { (self.api.ee_ua_write)(h, ua.as_ptr().cast_mut(), len) })
    }

    fn set_chars(
        &mut self,
        event_char: u8,
        event_en: bool,
        error_char: u8,
        error_en: bool,
    ) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe {
            (self.api.set_chars)(h, event_char, u8::from(event_en), error_char, u8::from(error_en))
        })
    }

    fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.set_usb_parameters)(h, in_size, out_size) })
    }

    fn set_flow_control(&mut self) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle. XON/XOFF chars are unused for RTS/CTS.
        Status::check(unsafe { (self.api.set_flow_control)(h, FLOW_RTS_CTS, 0, 0) })
    }

    fn set_timeouts(&mut self, read_ms: u32, write_ms: u32) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.set_timeouts)(h, read_ms, write_ms) })
    }

    fn set_latency_timer(&mut self, delay_ms: u8) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.set_latency_timer)(h, delay_ms) })
    }

    fn set_baud_rate(&mut self, hz: u32) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.set_baud_rate)(h, hz) })
    }

    fn get_queue_status(&mut self) -> Result<u32, Status> {
        let h = self.h()?;
        let mut pending: Dword = 0;
        // SAFETY: the out pointer is valid for the call.
        Status::check(unsafe { (self.api.get_queue_status)(h, &mut pending) })?;
        Ok(pending)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        let h = self.h()?;
        let len = to_dword(buf.len())?;
        let mut read: Dword = 0;
        // SAFETY: `buf` is valid for `len` bytes.
        Status::check(unsafe { (self.api.read)(h, buf.as_mut_ptr().cast(), len, &mut read) })?;
        Ok(read as usize)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Status> {
        let h = self.h()?;
        let len = to_dword(buf.len())?;
        let mut sent: Dword = 0;
        // SAFETY: the driver only reads `len` bytes from `buf`.
        Status::check(unsafe {
            (self.api.write)(h, buf.as_ptr().cast_mut().cast(), len, &mut sent)
        })?;
        Ok(sent as usize)
    }

    fn get_bit_mode(&mut self) -> Result<u8, Status> {
        let h = self.h()?;
        let mut mode = 0u8;
        // SAFETY: the out pointer is valid for the call.
        Status::check(unsafe { (self.api.get_bit_mode)(h, &mut mode) })?;
        Ok(mode)
    }

    fn set_bit_mode(&mut self, mask: u8, mode: u8) -> Result<(), Status> {
        let h = self.h()?;
        // SAFETY: `h` is an open handle.
        Status::check(unsafe { (self.api.set_bit_mode)(h, mask, mode) })
    }
}
