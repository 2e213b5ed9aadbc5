//! Mounting candidate devices and checking they hold a usable root
use std::path::{Path, PathBuf};

use nix::mount::{MntFlags, MsFlags};
use nix::unistd::AccessFlags;

use crate::config::BootConfig;
use crate::syscall::{Syscall, SyscallError};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{device} does not hold a usable root filesystem")]
    NotUsable { device: String },
}

/// A device mounted read-only on the staging dir with an init inside
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedRoot {
    pub device: String,
    pub source: PathBuf,
    pub fstype: String,
    pub target: PathBuf,
}

/// How a single (device, filesystem type) attempt ended
#[derive(Debug)]
enum ProbeOutcome {
    Accepted,
    MountFailed(SyscallError),
    MissingInit(SyscallError),
}

pub struct RootProber<'a> {
    syscall: &'a dyn Syscall,
    config: &'a BootConfig,
}

impl<'a> RootProber<'a> {
    pub fn new(syscall: &'a dyn Syscall, config: &'a BootConfig) -> Self {
        Self { syscall, config }
    }

    /// Tries every configured filesystem type in order and keeps the first
    /// mount that contains an executable init. Anything else is unmounted
    /// before moving on.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn probe(&self, device: &str) -> Result<MountedRoot, ProbeError> {
        let source = self.config.device_node(device);
        tracing::info!(?source, "trying device");

        for fstype in &self.config.filesystems {
            match self.attempt(&source, fstype) {
                ProbeOutcome::Accepted => {
                    tracing::info!(?source, %fstype, "found init on device");
                    return Ok(MountedRoot {
                        device: device.to_owned(),
                        source,
                        fstype: fstype.clone(),
                        target: self.config.staging_dir.clone(),
                    });
                }
                ProbeOutcome::MountFailed(err) => {
                    tracing::debug!(%fstype, %err, "mount failed");
                }
                ProbeOutcome::MissingInit(err) => {
                    tracing::info!(?source, %fstype, %err, "mounted, but no usable init");
                }
            }
        }

        Err(ProbeError::NotUsable {
            device: device.to_owned(),
        })
    }

    fn attempt(&self, source: &Path, fstype: &str) -> ProbeOutcome {
        let target = &self.config.staging_dir;
        if let Err(err) =
            self.syscall
                .mount(Some(source), target, Some(fstype), MsFlags::MS_RDONLY, None)
        {
            return ProbeOutcome::MountFailed(err);
        }

        let init = self.config.staged_init();
        match self
            .syscall
            .access(&init, AccessFlags::R_OK | AccessFlags::X_OK)
        {
            Ok(()) => ProbeOutcome::Accepted,
            Err(err) => {
                if let Err(umount_err) = self.syscall.umount2(target, MntFlags::empty()) {
                    tracing::error!(?target, err = %umount_err, "failed to unmount rejected candidate");
                }
                ProbeOutcome::MissingInit(err)
            }
        }
    }
}
