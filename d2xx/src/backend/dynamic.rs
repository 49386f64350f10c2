//! Backend that loads the D2XX shared library at runtime and resolves each
//! entry point individually. If the library or any single entry point is
//! missing, the driver is unavailable and reports [`Status::MISSING`].

use super::{Driver, Session};
use crate::Version;
use crate::ffi::{Api, LoadError};
use crate::native::{self, NativeHandle};
use crate::status::Status;
use libc::c_void;
use libloading::Library;
use log::{debug, warn};
use std::env;
use std::ffi::{OsStr, OsString};

/// Environment variable overriding the library name or path.
pub const LIBRARY_ENV: &str = "D2XX_LIBRARY";

#[cfg(windows)]
pub const LIBRARY_NAME: &str = "ftd2xx.dll";
#[cfg(target_os = "macos")]
pub const LIBRARY_NAME: &str = "libftd2xx.dylib";
#[cfg(not(any(windows, target_os = "macos")))]
pub const LIBRARY_NAME: &str = "libftd2xx.so";

/// Entry points resolved from a shared library.
pub struct DynamicDriver {
    api: Option<Api>,
    // Keeps the code `api` points into mapped.
    _library: Option<Library>,
}

impl DynamicDriver {
    /// Loads [`LIBRARY_NAME`], or the library named by [`LIBRARY_ENV`].
    ///
    /// Never fails: a library that can't be used yields an unavailable driver.
    pub fn load() -> Self {
        let name = env::var_os(LIBRARY_ENV).unwrap_or_else(|| OsString::from(LIBRARY_NAME));
        match Self::load_from(&name) {
            Ok(driver) => {
                debug!("loaded d2xx library {}", name.to_string_lossy());
                driver
            }
            Err(err) => {
                warn!("{err}; d2xx is unavailable");
                Self::unavailable()
            }
        }
    }

    pub fn load_from(path: impl AsRef<OsStr>) -> Result<Self, LoadError> {
        // SAFETY: libftd2xx has no initialization routine with preconditions.
        let library = unsafe { Library::new(path.as_ref()) }?;
        let lookup = |name: &'static str| {
            // SAFETY: the address is only reinterpreted by `Api::resolve`.
            unsafe { library.get::<*const c_void>(name.as_bytes()) }
                .ok()
                .map(|symbol| *symbol)
        };
        // SAFETY: the exported D2XX symbols have the signatures `Api`
        // declares, and the library is kept alive next to the table.
        let api = unsafe { Api::resolve(lookup) }?;
        Ok(Self {
            api: Some(api),
            _library: Some(library),
        })
    }

    /// Builds the driver from an arbitrary symbol lookup.
    ///
    /// # Safety
    ///
    /// Same contract as [`Api::resolve`]; the functions must outlive the driver.
    pub unsafe fn from_lookup<F>(lookup: F) -> Self
    where
        F: FnMut(&'static str) -> Option<*const c_void>,
    {
        // SAFETY: forwarded to the caller.
        match unsafe { Api::resolve(lookup) } {
            Ok(api) => Self {
                api: Some(api),
                _library: None,
            },
            Err(err) => {
                warn!("{err}; d2xx is unavailable");
                Self::unavailable()
            }
        }
    }

    pub fn unavailable() -> Self {
        Self {
            api: None,
            _library: None,
        }
    }

    fn api(&self) -> Result<&Api, Status> {
        self.api.as_ref().ok_or(Status::MISSING)
    }
}

impl Driver for DynamicDriver {
    fn available(&self) -> bool {
        self.api.is_some()
    }

    fn version(&self) -> Version {
        self.api.as_ref().map(native::version).unwrap_or_default()
    }

    fn create_device_info_list(&self) -> Result<usize, Status> {
        native::create_device_info_list(self.api()?)
    }

    fn open(&self, index: usize) -> Result<Session<'_>, Status> {
        let handle = NativeHandle::open(self.api()?, index)?;
        Ok(Box::new(handle))
    }
}
