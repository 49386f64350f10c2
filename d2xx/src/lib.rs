//! A thin wrapper for the FTDI "D2XX" USB-serial driver.
//!
//! One [`Handle`] contract is implemented by every way of reaching the
//! driver, chosen once per process by cargo feature:
//!
//! - default: the shared library is loaded at runtime (`D2XX_LIBRARY`
//!   overrides its name); if it or any entry point is missing, everything
//!   reports [`Status::MISSING`].
//! - `linked`: the vendor archive is linked at build time.
//! - `no_d2xx`: no driver at all; everything reports [`Status::NO_NATIVE`].
//!
//! [`support::fake::FakeDevice`] simulates a device for tests and
//! [`support::logger::LoggingHandle`] traces calls on any handle.

pub mod backend;
pub mod eeprom;
pub mod ffi;
mod handle;
mod native;
mod status;
pub mod support;

pub use backend::{Driver, Session};
pub use eeprom::Eeprom;
pub use handle::{DEVICE_TYPE_UNKNOWN, DeviceInfo, Handle};
pub use native::NativeHandle;
pub use status::{Status, describe};

use std::fmt;

/// Driver library version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
}

impl Version {
    /// Decodes the driver's `0x00MMmmbb` version word.
    pub fn from_packed(v: u32) -> Self {
        Self {
            major: (v >> 16) as u8,
            minor: (v >> 8) as u8,
            build: v as u8,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Whether a usable driver was found.
pub fn available() -> bool {
    backend::driver().available()
}

/// Returns the library's version, `0.0.0` if the library is unavailable.
pub fn version() -> Version {
    backend::driver().version()
}

/// Discovers the currently connected devices and returns their count.
pub fn create_device_info_list() -> Result<usize, Status> {
    backend::driver().create_device_info_list()
}

/// Opens the `index`th device discovered by [`create_device_info_list`].
pub fn open(index: usize) -> Result<Session<'static>, Status> {
    backend::driver().open(index)
}
