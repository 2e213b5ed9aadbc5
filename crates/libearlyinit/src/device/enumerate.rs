use std::fs;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::stat::{umask, Mode, SFlag};

use super::{
    read_attribute, BlockDevice, Classifier, DeviceNumber, DeviceRegistry, RegistryError, Result,
};
use crate::config::BootConfig;
use crate::syscall::{Syscall, SyscallError};

/// Walks the kernel's block device class directory, creates a node in
/// /dev for every device it finds and records them in a fresh registry.
pub struct Enumerator<'a> {
    syscall: &'a dyn Syscall,
    config: &'a BootConfig,
}

impl<'a> Enumerator<'a> {
    pub fn new(syscall: &'a dyn Syscall, config: &'a BootConfig) -> Self {
        Self { syscall, config }
    }

    /// Runs one scan. Order follows the directory listing, which the kernel
    /// does not define.
    pub fn enumerate(&self) -> DeviceRegistry {
        let mut registry = DeviceRegistry::with_capacity(self.config.max_devices);
        let found = self.scan();

        // All nodes go in before anything is classified, so a partition
        // listed ahead of its disk still finds the parent node.
        let old_mode = umask(Mode::empty());
        for device in &found {
            self.create_node(&device.name, device.number);
        }
        umask(old_mode);

        let classifier = Classifier::new(&self.config.block_class_dir, &self.config.dev_dir);
        for FoundDevice { name, .. } in found {
            let removable = classifier.classify(&name);
            if let Err(err) = registry.register(BlockDevice::new(name, removable)) {
                tracing::warn!(%err, "skipping block device");
            }
        }

        registry
    }

    /// Lists the usable entries of the block class directory, at most
    /// `max_devices` of them.
    fn scan(&self) -> Vec<FoundDevice> {
        let mut found = Vec::new();
        let entries = match fs::read_dir(&self.config.block_class_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(?err, dir = ?self.config.block_class_dir, "failed to list block devices");
                return found;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(?err, "failed to read block device entry");
                    continue;
                }
            };
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    tracing::warn!(?name, "skipping block device with a non utf-8 name");
                    continue;
                }
            };
            if is_ignored(&name) {
                continue;
            }

            let number = match read_device_number(&entry.path()) {
                Ok(number) => number,
                Err(err) => {
                    tracing::warn!(device = %name, %err, "skipping block device");
                    continue;
                }
            };

            if found.len() >= self.config.max_devices {
                let err = RegistryError::Full {
                    capacity: self.config.max_devices,
                };
                tracing::warn!(%err, device = %name, "ignoring remaining block devices");
                break;
            }

            match fs::read_link(entry.path()) {
                Ok(topology) => tracing::debug!(device = %name, ?topology, "found block device"),
                Err(_) => tracing::debug!(device = %name, "found block device"),
            }
            found.push(FoundDevice { name, number });
        }

        found
    }

    /// Replaces whatever sits at /dev/<name> with a block node for `number`.
    /// The old node may be stale if numbering changed since the last round.
    /// Failures are logged only, mounting the device will then fail later.
    fn create_node(&self, name: &str, number: DeviceNumber) {
        let path = self.config.device_node(name);
        match self.syscall.unlink(&path) {
            Ok(()) | Err(SyscallError::UnlinkFailed {
                errno: Errno::ENOENT,
                ..
            }) => {}
            Err(err) => tracing::warn!(?err, ?path, "failed to remove old device node"),
        }

        if let Err(err) = self.syscall.mknod(
            &path,
            SFlag::S_IFBLK,
            Mode::S_IRUSR | Mode::S_IWUSR,
            number.dev(),
        ) {
            tracing::error!(
                ?err,
                ?path,
                major = number.major,
                minor = number.minor,
                "failed to mknod device"
            );
        }
    }
}

struct FoundDevice {
    name: String,
    number: DeviceNumber,
}

fn is_ignored(name: &str) -> bool {
    name == "." || name == ".." || name.contains("loop")
}

fn read_device_number(sysfs: &Path) -> Result<DeviceNumber> {
    read_attribute(&sysfs.join("dev"))?.parse()
}
