//! Result codes reported by the D2XX driver, plus the two synthetic codes
//! this crate adds when no driver can be reached.

use std::borrow::Cow;
use std::fmt;

/// A driver status code.
///
/// `0` is success. `1..=19` mirror the vendor's `FT_STATUS` values. The
/// negative codes never come from the driver.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i64);

impl Status {
    pub const OK: Status = Status(0);
    pub const INVALID_HANDLE: Status = Status(1);
    pub const DEVICE_NOT_FOUND: Status = Status(2);
    pub const DEVICE_NOT_OPENED: Status = Status(3);
    pub const IO_ERROR: Status = Status(4);
    pub const INSUFFICIENT_RESOURCES: Status = Status(5);
    pub const INVALID_PARAMETER: Status = Status(6);
    pub const INVALID_BAUD_RATE: Status = Status(7);
    pub const DEVICE_NOT_OPENED_FOR_ERASE: Status = Status(8);
    pub const DEVICE_NOT_OPENED_FOR_WRITE: Status = Status(9);
    pub const FAILED_TO_WRITE_DEVICE: Status = Status(10);
    pub const EEPROM_READ_FAILED: Status = Status(11);
    pub const EEPROM_WRITE_FAILED: Status = Status(12);
    pub const EEPROM_ERASE_FAILED: Status = Status(13);
    pub const EEPROM_NOT_PRESENT: Status = Status(14);
    pub const EEPROM_NOT_PROGRAMMED: Status = Status(15);
    pub const INVALID_ARGS: Status = Status(16);
    pub const NOT_SUPPORTED: Status = Status(17);
    pub const OTHER_ERROR: Status = Status(18);
    pub const DEVICE_LIST_NOT_READY: Status = Status(19);

    /// The driver library couldn't be loaded, or lacks a required entry point.
    pub const MISSING: Status = Status(-1);
    /// The crate was built with the `no_d2xx` feature.
    pub const NO_NATIVE: Status = Status(-2);

    pub const fn from_code(code: i64) -> Self {
        Status(code)
    }

    pub const fn code(self) -> i64 {
        self.0
    }

    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Converts a raw `FT_STATUS` into a `Result`.
    pub fn check(raw: u32) -> Result<(), Status> {
        // Widened so no driver value can alias a negative synthetic code.
        match Status(i64::from(raw)) {
            Status::OK => Ok(()),
            status => Err(status),
        }
    }
}

/// Returns the canonical message for `code`.
///
/// Total over `i64`; codes outside the known set yield `"unknown status N"`.
pub fn describe(code: i64) -> Cow<'static, str> {
    let text = match code {
        -1 => "couldn't load the d2xx driver library",
        -2 => "d2xx support not compiled in",
        0 => "",
        1 => "invalid handle",
        2 => "device not found",
        3 => "device busy",
        4 => "I/O error",
        5 => "insufficient resources",
        6 => "invalid parameter",
        7 => "invalid baud rate",
        8 => "device not opened for erase",
        9 => "device not opened for write",
        10 => "failed to write device",
        11 => "eeprom read failed",
        12 => "eeprom write failed",
        13 => "eeprom erase failed",
        14 => "eeprom not present",
        15 => "eeprom not programmed",
        16 => "invalid argument",
        17 => "not supported",
        18 => "other error",
        19 => "device list not ready",
        other => return Cow::Owned(format!("unknown status {other}")),
    };
    Cow::Borrowed(text)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&describe(self.0))
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Status({}: {:?})", self.0, describe(self.0))
    }
}

impl std::error::Error for Status {}

impl From<Status> for i64 {
    fn from(status: Status) -> i64 {
        status.0
    }
}
