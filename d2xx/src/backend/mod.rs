//! Driver backends and the selection of the one active in this process.
//!
//! - `no_d2xx` feature: [`not_supported::StubDriver`].
//! - `linked` feature: [`linked::LinkedDriver`], the archive linked at build time.
//! - otherwise: [`dynamic::DynamicDriver`], the shared library loaded on first use.

pub mod dynamic;
#[cfg(all(feature = "linked", not(feature = "no_d2xx")))]
pub mod linked;
pub mod not_supported;

use crate::Version;
use crate::handle::Handle;
use crate::status::Status;
use std::sync::OnceLock;

/// An open session. Closing it (or dropping it) releases the device.
pub type Session<'a> = Box<dyn Handle + Send + 'a>;

/// One way of reaching the D2XX driver.
pub trait Driver: Send + Sync {
    /// Whether the driver can be used at all.
    fn available(&self) -> bool;
    /// Library version, `0.0.0` if unavailable.
    fn version(&self) -> Version;
    /// Discovers the currently connected devices and returns how many there are.
    fn create_device_info_list(&self) -> Result<usize, Status>;
    /// Opens the `index`th device discovered.
    fn open(&self, index: usize) -> Result<Session<'_>, Status>;
}

/// The driver for this process, initialized on first call.
pub fn driver() -> &'static dyn Driver {
    static DRIVER: OnceLock<Box<dyn Driver>> = OnceLock::new();
    DRIVER.get_or_init(select).as_ref()
}

#[cfg(feature = "no_d2xx")]
fn select() -> Box<dyn Driver> {
    Box::new(not_supported::StubDriver)
}

#[cfg(all(feature = "linked", not(feature = "no_d2xx")))]
fn select() -> Box<dyn Driver> {
    Box::new(linked::LinkedDriver)
}

#[cfg(not(any(feature = "linked", feature = "no_d2xx")))]
fn select() -> Box<dyn Driver> {
    Box::new(dynamic::DynamicDriver::load())
}
