//! Tracing wrapper for any [`Handle`]. Every call is timed and reported as
//! one line to a [`Sink`], which helps diagnose issues with the driver.

use crate::eeprom::Eeprom;
use crate::handle::{DEVICE_TYPE_UNKNOWN, DeviceInfo, Handle};
use crate::status::Status;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Destination for trace lines.
pub trait Sink {
    /// `elapsed` is already rounded by [`round_duration`].
    fn log(&self, elapsed: Duration, line: fmt::Arguments<'_>);
}

impl<F> Sink for F
where
    F: Fn(Duration, fmt::Arguments<'_>),
{
    fn log(&self, elapsed: Duration, line: fmt::Arguments<'_>) {
        self(elapsed, line)
    }
}

/// Forwards lines to the `log` crate.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    pub level: log::Level,
}

impl Default for LogSink {
    fn default() -> Self {
        Self {
            level: log::Level::Debug,
        }
    }
}

impl Sink for LogSink {
    fn log(&self, elapsed: Duration, line: fmt::Arguments<'_>) {
        log::log!(self.level, "{:>7} {}", format!("{elapsed:?}"), line);
    }
}

/// Writes one line per call to a `Write` sink, e.g. a file.
pub struct WriteSink<W: Write> {
    sink: Mutex<W>,
}

impl<W: Write> WriteSink<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn log(&self, elapsed: Duration, line: fmt::Arguments<'_>) {
        if let Ok(mut sink) = self.sink.lock() {
            writeln!(sink, "{:>7} {}", format!("{elapsed:?}"), line).ok();
        }
    }
}

/// Rounds `d` to its 4 most significant decimal digits, in nanoseconds.
pub fn round_duration(d: Duration) -> Duration {
    let nanos = d.as_nanos();
    match nanos.checked_ilog10() {
        Some(digits) if digits > 3 => {
            let m = 10u128.pow(digits - 3);
            let rounded = (nanos + m / 2) / m * m;
            Duration::from_nanos(u64::try_from(rounded).unwrap_or(u64::MAX))
        }
        _ => d,
    }
}

/// Wraps a handle and reports each call to `sink`.
pub struct LoggingHandle<H, S> {
    inner: H,
    sink: S,
}

impl<H: Handle, S: Sink> LoggingHandle<H, S> {
    pub fn new(inner: H, sink: S) -> Self {
        Self { inner, sink }
    }

    pub fn get_ref(&self) -> &H {
        &self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }

    fn timed<T>(&mut self, call: impl FnOnce(&mut H) -> T) -> (T, Duration) {
        let start = Instant::now();
        let out = call(&mut self.inner);
        (out, round_duration(start.elapsed()))
    }
}

fn code<T>(result: &Result<T, Status>) -> i64 {
    match result {
        Ok(_) => 0,
        Err(status) => status.code(),
    }
}

/// Bytes as space separated hex pairs.
struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        f.write_str("]")
    }
}

impl<H: Handle, S: Sink> Handle for LoggingHandle<H, S> {
    fn close(&mut self) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.close());
        self.sink.log(d, format_args!("Close() = {}", code(&r)));
        r
    }

    fn reset_device(&mut self) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.reset_device());
        self.sink.log(d, format_args!("ResetDevice() = {}", code(&r)));
        r
    }

    fn get_device_info(&mut self) -> Result<DeviceInfo, Status> {
        let (r, d) = self.timed(|h| h.get_device_info());
        match &r {
            Ok(info) => self.sink.log(
                d,
                format_args!(
                    "GetDeviceInfo() = {}, {:04x}:{:04x}, 0",
                    info.device_type, info.vendor_id, info.product_id
                ),
            ),
            Err(status) => self.sink.log(
                d,
                format_args!(
                    "GetDeviceInfo() = {DEVICE_TYPE_UNKNOWN}, 0000:0000, {}",
                    status.code()
                ),
            ),
        }
        r
    }

    fn eeprom_read(&mut self, device_type: u32, ee: &mut Eeprom) -> Result<(), Status> {
        let len = ee.raw.len();
        let (r, d) = self.timed(|h| h.eeprom_read(device_type, ee));
        self.sink.log(
            d,
            format_args!("EEPROMRead({device_type}, {len} bytes) = {}", code(&r)),
        );
        r
    }

    fn eeprom_program(&mut self, ee: &Eeprom) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.eeprom_program(ee));
        self.sink.log(
            d,
            format_args!(
                "EEPROMProgram({}, {:?}, {:?}, {:?}, {:?}) = {}",
                Hex(&ee.raw),
                ee.manufacturer,
                ee.manufacturer_id,
                ee.desc,
                ee.serial,
                code(&r)
            ),
        );
        r
    }

    fn erase_ee(&mut self) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.erase_ee());
        self.sink.log(d, format_args!("EraseEE() = {}", code(&r)));
        r
    }

    fn write_ee(&mut self, offset: u8, value: u16) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.write_ee(offset, value));
        self.sink
            .log(d, format_args!("WriteEE({offset}, {value}) = {}", code(&r)));
        r
    }

    fn ee_ua_size(&mut self) -> Result<usize, Status> {
        let (r, d) = self.timed(|h| h.ee_ua_size());
        let size = r.as_ref().copied().unwrap_or(0);
        self.sink
            .log(d, format_args!("EEUASize() = {size}, {}", code(&r)));
        r
    }

    fn ee_ua_read(&mut self, ua: &mut [u8]) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.ee_ua_read(ua));
        self.sink.log(
            d,
            format_args!("EEUARead({} bytes) = {}", ua.len(), code(&r)),
        );
        r
    }

    fn ee_ua_write(&mut self, ua: &[u8]) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.ee_ua_write(ua));
        self.sink
            .log(d, format_args!("EEUAWrite({}) = {}", Hex(ua), code(&r)));
        r
    }

    fn set_chars(
        &mut self,
        event_char: u8,
        event_en: bool,
        error_char: u8,
        error_en: bool,
    ) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.set_chars(event_char, event_en, error_char, error_en));
        self.sink.log(
            d,
            format_args!(
                "SetChars({event_char}, {event_en}, {error_char}, {error_en}) = {}",
                code(&r)
            ),
        );
        r
    }

    fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.set_usb_parameters(in_size, out_size));
        self.sink.log(
            d,
            format_args!("SetUSBParameters({in_size}, {out_size}) = {}", code(&r)),
        );
        r
    }

    fn set_flow_control(&mut self) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.set_flow_control());
        self.sink
            .log(d, format_args!("SetFlowControl() = {}", code(&r)));
        r
    }

    fn set_timeouts(&mut self, read_ms: u32, write_ms: u32) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.set_timeouts(read_ms, write_ms));
        self.sink.log(
            d,
            format_args!("SetTimeouts({read_ms}, {write_ms}) = {}", code(&r)),
        );
        r
    }

    fn set_latency_timer(&mut self, delay_ms: u8) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.set_latency_timer(delay_ms));
        self.sink
            .log(d, format_args!("SetLatencyTimer({delay_ms}) = {}", code(&r)));
        r
    }

    fn set_baud_rate(&mut self, hz: u32) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.set_baud_rate(hz));
        self.sink
            .log(d, format_args!("SetBaudRate({hz}) = {}", code(&r)));
        r
    }

    fn get_queue_status(&mut self) -> Result<u32, Status> {
        let (r, d) = self.timed(|h| h.get_queue_status());
        let pending = r.as_ref().copied().unwrap_or(0);
        self.sink
            .log(d, format_args!("GetQueueStatus() = {pending}, {}", code(&r)));
        r
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        let (r, d) = self.timed(|h| h.read(buf));
        let n = r.as_ref().copied().unwrap_or(0).min(buf.len());
        self.sink.log(
            d,
            format_args!("Read({} bytes) = {}, {}", buf.len(), Hex(&buf[..n]), code(&r)),
        );
        r
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Status> {
        let (r, d) = self.timed(|h| h.write(buf));
        let n = r.as_ref().copied().unwrap_or(0);
        self.sink
            .log(d, format_args!("Write({}) = {n}, {}", Hex(buf), code(&r)));
        r
    }

    fn get_bit_mode(&mut self) -> Result<u8, Status> {
        let (r, d) = self.timed(|h| h.get_bit_mode());
        let mode = r.as_ref().copied().unwrap_or(0);
        self.sink
            .log(d, format_args!("GetBitMode() = {mode:02X}, {}", code(&r)));
        r
    }

    fn set_bit_mode(&mut self, mask: u8, mode: u8) -> Result<(), Status> {
        let (r, d) = self.timed(|h| h.set_bit_mode(mask, mode));
        self.sink.log(
            d,
            format_args!("SetBitMode(0x{mask:02X}, 0x{mode:02X}) = {}", code(&r)),
        );
        r
    }
}
