//! Discovery of block devices through sysfs
pub mod classify;
pub mod enumerate;
pub mod registry;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use nix::sys::stat::makedev;

pub use classify::Classifier;
pub use enumerate::Enumerator;
pub use registry::{BlockDevice, DeviceRegistry, RegistryError};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to read {path:?}")]
    ReadAttribute {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed device number {0:?}")]
    MalformedDeviceNumber(String),
}

type Result<T> = std::result::Result<T, DeviceError>;

/// Reads a sysfs attribute, without the trailing newline
pub(crate) fn read_attribute(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map(|content| content.trim().to_owned())
        .map_err(|source| DeviceError::ReadAttribute {
            path: path.to_path_buf(),
            source,
        })
}

/// The `MAJOR:MINOR` pair found in a device's `dev` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNumber {
    pub major: u64,
    pub minor: u64,
}

impl DeviceNumber {
    pub fn dev(&self) -> u64 {
        makedev(self.major, self.minor)
    }
}

impl FromStr for DeviceNumber {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || DeviceError::MalformedDeviceNumber(s.to_owned());
        let (major, minor) = s.trim().split_once(':').ok_or_else(malformed)?;

        Ok(DeviceNumber {
            major: major.parse().map_err(|_| malformed())?,
            minor: minor.parse().map_err(|_| malformed())?,
        })
    }
}
