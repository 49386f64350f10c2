//! In-memory device implementing [`Handle`] for tests that don't have
//! hardware at hand.
//!
//! Reads are served from a queue of chunks, each one standing for a USB
//! transfer as it arrives from the device. A read never spans two chunks, and
//! an empty chunk at the head of the queue is skipped by
//! [`Handle::get_queue_status`] the way the driver skips empty transfers.

use crate::eeprom::Eeprom;
use crate::handle::{DeviceInfo, Handle};
use crate::status::Status;
use std::collections::VecDeque;

/// A simulated device.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    info: DeviceInfo,
    data: VecDeque<Vec<u8>>,
    ua: Vec<u8>,
    eeprom: Eeprom,
    bit_mode: u8,
    closed: bool,
}

impl FakeDevice {
    pub fn new(device_type: u32, vendor_id: u16, product_id: u16) -> Self {
        Self {
            info: DeviceInfo {
                device_type,
                vendor_id,
                product_id,
            },
            data: VecDeque::new(),
            ua: Vec::new(),
            eeprom: Eeprom::default(),
            bit_mode: 0,
            closed: false,
        }
    }

    /// Queues `chunks` to be read, in order.
    pub fn with_data<I>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        self.data.extend(chunks);
        self
    }

    pub fn with_eeprom(mut self, eeprom: Eeprom) -> Self {
        self.eeprom = eeprom;
        self
    }

    pub fn with_user_area(mut self, ua: Vec<u8>) -> Self {
        self.ua = ua;
        self
    }

    /// Appends one transfer to the read queue.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        self.data.push_back(chunk);
    }

    /// Chunks not yet fully read, the partially read one first.
    pub fn pending(&self) -> &VecDeque<Vec<u8>> {
        &self.data
    }

    pub fn eeprom(&self) -> &Eeprom {
        &self.eeprom
    }

    pub fn user_area(&self) -> &[u8] {
        &self.ua
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), Status> {
        if self.closed {
            Err(Status::INVALID_HANDLE)
        } else {
            Ok(())
        }
    }
}

impl Handle for FakeDevice {
    fn close(&mut self) -> Result<(), Status> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }

    fn reset_device(&mut self) -> Result<(), Status> {
        self.ensure_open()
    }

    fn get_device_info(&mut self) -> Result<DeviceInfo, Status> {
        self.ensure_open()?;
        Ok(self.info)
    }

    fn eeprom_read(&mut self, _device_type: u32, ee: &mut Eeprom) -> Result<(), Status> {
        self.ensure_open()?;
        ee.clone_from(&self.eeprom);
        Ok(())
    }

    fn eeprom_program(&mut self, ee: &Eeprom) -> Result<(), Status> {
        self.ensure_open()?;
        self.eeprom.clone_from(ee);
        Ok(())
    }

    fn erase_ee(&mut self) -> Result<(), Status> {
        self.ensure_open()
    }

    fn write_ee(&mut self, _offset: u8, _value: u16) -> Result<(), Status> {
        self.ensure_open()
    }

    fn ee_ua_size(&mut self) -> Result<usize, Status> {
        self.ensure_open()?;
        Ok(self.ua.len())
    }

    fn ee_ua_read(&mut self, ua: &mut [u8]) -> Result<(), Status> {
        self.ensure_open()?;
        let n = ua.len().min(self.ua.len());
        ua[..n].copy_from_slice(&self.ua[..n]);
        if n != ua.len() {
            return Err(Status::INVALID_PARAMETER);
        }
        Ok(())
    }

    fn ee_ua_write(&mut self, ua: &[u8]) -> Result<(), Status> {
        self.ensure_open()?;
        self.ua = ua.to_vec();
        Ok(())
    }

    fn set_chars(&mut self, _: u8, _: bool, _: u8, _: bool) -> Result<(), Status> {
        self.ensure_open()
    }

    fn set_usb_parameters(&mut self, _in_size: u32, _out_size: u32) -> Result<(), Status> {
        self.ensure_open()
    }

    fn set_flow_control(&mut self) -> Result<(), Status> {
        self.ensure_open()
    }

    fn set_timeouts(&mut self, _read_ms: u32, _write_ms: u32) -> Result<(), Status> {
        self.ensure_open()
    }

    fn set_latency_timer(&mut self, _delay_ms: u8) -> Result<(), Status> {
        self.ensure_open()
    }

    fn set_baud_rate(&mut self, _hz: u32) -> Result<(), Status> {
        self.ensure_open()
    }

    fn get_queue_status(&mut self) -> Result<u32, Status> {
        self.ensure_open()?;
        if self.data.front().is_some_and(Vec::is_empty) {
            self.data.pop_front();
        }
        let pending = self.data.front().map_or(0, Vec::len);
        Ok(u32::try_from(pending).unwrap_or(u32::MAX))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        self.ensure_open()?;
        let Some(chunk) = self.data.front_mut() else {
            return Ok(0);
        };
        let n = buf.len().min(chunk.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            self.data.pop_front();
        }
        Ok(n)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize, Status> {
        self.ensure_open()?;
        Ok(0)
    }

    fn get_bit_mode(&mut self) -> Result<u8, Status> {
        self.ensure_open()?;
        Ok(self.bit_mode)
    }

    fn set_bit_mode(&mut self, _mask: u8, mode: u8) -> Result<(), Status> {
        self.ensure_open()?;
        self.bit_mode = mode;
        Ok(())
    }
}
