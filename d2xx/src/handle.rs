//! The capability set shared by every backend, the simulator and the logger.

use crate::eeprom::Eeprom;
use crate::status::Status;

/// `FT_DEVICE_UNKNOWN`, reported by callers when the type can't be queried.
pub const DEVICE_TYPE_UNKNOWN: u32 = 3;

/// Identity of an open device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: u32,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceInfo {
    /// Splits the driver's packed `vid << 16 | pid` identifier.
    pub fn from_packed(device_type: u32, id: u32) -> Self {
        Self {
            device_type,
            vendor_id: (id >> 16) as u16,
            product_id: id as u16,
        }
    }
}

/// An open D2XX device session.
///
/// Every method reports failures as a [`Status`]; none of them panic. Once
/// [`Handle::close`] has been called, every method (including `close`) returns
/// [`Status::INVALID_HANDLE`].
pub trait Handle {
    fn close(&mut self) -> Result<(), Status>;
    /// Takes >1.2ms on real hardware.
    fn reset_device(&mut self) -> Result<(), Status>;
    fn get_device_info(&mut self) -> Result<DeviceInfo, Status>;

    /// Reads the EEPROM into `ee`, whose `raw` length selects how much is read.
    fn eeprom_read(&mut self, device_type: u32, ee: &mut Eeprom) -> Result<(), Status>;
    fn eeprom_program(&mut self, ee: &Eeprom) -> Result<(), Status>;
    fn erase_ee(&mut self) -> Result<(), Status>;
    fn write_ee(&mut self, offset: u8, value: u16) -> Result<(), Status>;

    fn ee_ua_size(&mut self) -> Result<usize, Status>;
    /// Fills `ua` completely or fails with [`Status::INVALID_PARAMETER`].
    fn ee_ua_read(&mut self, ua: &mut [u8]) -> Result<(), Status>;
    fn ee_ua_write(&mut self, ua: &[u8]) -> Result<(), Status>;

    fn set_chars(
        &mut self,
        event_char: u8,
        event_en: bool,
        error_char: u8,
        error_en: bool,
    ) -> Result<(), Status>;
    fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> Result<(), Status>;
    /// Enables RTS/CTS hardware flow control.
    fn set_flow_control(&mut self) -> Result<(), Status>;
    fn set_timeouts(&mut self, read_ms: u32, write_ms: u32) -> Result<(), Status>;
    fn set_latency_timer(&mut self, delay_ms: u8) -> Result<(), Status>;
    fn set_baud_rate(&mut self, hz: u32) -> Result<(), Status>;

    /// Number of bytes ready to read. Takes >60µs.
    fn get_queue_status(&mut self) -> Result<u32, Status>;
    /// Takes <5µs if `get_queue_status` was called just before, 300µs~800µs
    /// otherwise.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status>;
    /// Takes >0.1ms.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Status>;

    fn get_bit_mode(&mut self) -> Result<u8, Status>;
    /// Takes >0.1ms.
    fn set_bit_mode(&mut self, mask: u8, mode: u8) -> Result<(), Status>;
}

macro_rules! forward_handle {
    ($($ty:ty),*) => {$(
        impl<H: Handle + ?Sized> Handle for $ty {
            fn close(&mut self) -> Result<(), Status> {
                (**self).close()
            }
            fn reset_device(&mut self) -> Result<(), Status> {
                (**self).reset_device()
            }
            fn get_device_info(&mut self) -> Result<DeviceInfo, Status> {
                (**self).get_device_info()
            }
            fn eeprom_read(&mut self, device_type: u32, ee: &mut Eeprom) -> Result<(), Status> {
                (**self).eeprom_read(device_type, ee)
            }
            fn eeprom_program(&mut self, ee: &Eeprom) -> Result<(), Status> {
                (**self).eeprom_program(ee)
            }
            fn erase_ee(&mut self) -> Result<(), Status> {
                (**self).erase_ee()
            }
            fn write_ee(&mut self, offset: u8, value: u16) -> Result<(), Status> {
                (**self).write_ee(offset, value)
            }
            fn ee_ua_size(&mut self) -> Result<usize, Status> {
                (**self).ee_ua_size()
            }
            fn ee_ua_read(&mut self, ua: &mut [u8]) -> Result<(), Status> {
                (**self).ee_ua_read(ua)
            }
            fn ee_ua_write(&mut self, ua: &[u8]) -> Result<(), Status> {
                (**self).ee_ua_write(ua)
            }
            fn set_chars(
                &mut self,
                event_char: u8,
                event_en: bool,
                error_char: u8,
                error_en: bool,
            ) -> Result<(), Status> {
                (**self).set_chars(event_char, event_en, error_char, error_en)
            }
            fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> Result<(), Status> {
                (**self).set_usb_parameters(in_size, out_size)
            }
            fn set_flow_control(&mut self) -> Result<(), Status> {
                (**self).set_flow_control()
            }
            fn set_timeouts(&mut self, read_ms: u32, write_ms: u32) -> Result<(), Status> {
                (**self).set_timeouts(read_ms, write_ms)
            }
            fn set_latency_timer(&mut self, delay_ms: u8) -> Result<(), Status> {
                (**self).set_latency_timer(delay_ms)
            }
            fn set_baud_rate(&mut self, hz: u32) -> Result<(), Status> {
                (**self).set_baud_rate(hz)
            }
            fn get_queue_status(&mut self) -> Result<u32, Status> {
                (**self).get_queue_status()
            }
            fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
                (**self).read(buf)
            }
            fn write(&mut self, buf: &[u8]) -> Result<usize, Status> {
                (**self).write(buf)
            }
            fn get_bit_mode(&mut self) -> Result<u8, Status> {
                (**self).get_bit_mode()
            }
            fn set_bit_mode(&mut self, mask: u8, mode: u8) -> Result<(), Status> {
                (**self).set_bit_mode(mask, mode)
            }
        }
    )*};
}

forward_handle!(Box<H>, &mut H);
