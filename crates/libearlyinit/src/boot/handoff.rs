use std::convert::Infallible;
use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::mount::MsFlags;

use super::BootError;
use crate::config::BootConfig;
use crate::probe::MountedRoot;
use crate::syscall::Syscall;

/// Moves the chosen root over / and replaces this process with its init.
pub struct Handoff<'a> {
    syscall: &'a dyn Syscall,
    config: &'a BootConfig,
}

impl<'a> Handoff<'a> {
    pub fn new(syscall: &'a dyn Syscall, config: &'a BootConfig) -> Self {
        Self { syscall, config }
    }

    /// The initramfs is the rootfs itself and can't be pivoted away, so the
    /// new root is moved on top of it instead and the process is chrooted
    /// into the result.
    pub fn switch_root(&self, root: &MountedRoot) {
        if let Err(err) = self.syscall.chdir(&root.target) {
            tracing::error!(?err, "failed to enter new root");
        }
        if let Err(err) = self.syscall.mount(
            Some(&root.target),
            &self.config.new_root,
            None,
            MsFlags::MS_MOVE,
            None,
        ) {
            tracing::error!(?err, "failed to move new root over /");
        }
        if let Err(err) = self.syscall.chroot(Path::new(".")) {
            tracing::error!(?err, "failed to chroot into new root");
        }
        if let Err(err) = self.syscall.chdir(Path::new("/")) {
            tracing::error!(?err, "failed to chdir to /");
        }
    }

    /// Execs the real init with our own argument vector. Only returns if
    /// that fails, and then there is nothing left to try.
    pub fn exec_init(&self, args: &[OsString]) -> Result<Infallible, BootError> {
        let mut argv: Vec<CString> = args
            .iter()
            .map(|arg| CString::new(arg.as_bytes()).unwrap_or_default())
            .collect();
        if argv.is_empty() {
            argv.push(CString::new(self.config.init_path.as_os_str().as_bytes()).unwrap_or_default());
        }

        tracing::info!(init = ?self.config.init_path, args = ?argv, "handing off");
        self.syscall
            .execv(&self.config.init_path, &argv)
            .map_err(|source| BootError::Exec {
                path: self.config.init_path.clone(),
                source,
            })
    }
}
