//! Fallback used when the crate is built without native support.

use super::{Driver, Session};
use crate::Version;
use crate::status::Status;

/// Reports [`Status::NO_NATIVE`] for everything.
pub struct StubDriver;

impl Driver for StubDriver {
    fn available(&self) -> bool {
        false
    }

    fn version(&self) -> Version {
        Version::default()
    }

    fn create_device_info_list(&self) -> Result<usize, Status> {
        Err(Status::NO_NATIVE)
    }

    fn open(&self, _index: usize) -> Result<Session<'_>, Status> {
        Err(Status::NO_NATIVE)
    }
}
