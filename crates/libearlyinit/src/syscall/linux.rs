//! Implements Syscall trait for Linux systems
use std::any::Any;
use std::convert::Infallible;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::symlink;
use std::path::Path;
use std::time::Duration;

use nix::mount::{mount, umount2, MntFlags, MsFlags};
use nix::sys::stat::{mknod, Mode, SFlag};
use nix::unistd::{access, chdir, chroot, execv, unlink, AccessFlags};

use super::{Result, Syscall, SyscallError};

/// Empty structure to implement Syscall trait for
#[derive(Clone)]
pub struct LinuxSyscall;

impl Syscall for LinuxSyscall {
    /// To enable dynamic typing,
    /// see https://doc.rust-lang.org/std/any/index.html for more information
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn mount(
        &self,
        source: Option<&Path>,
        target: &Path,
        fstype: Option<&str>,
        flags: MsFlags,
        data: Option<&str>,
    ) -> Result<()> {
        mount(source, target, fstype, flags, data).map_err(|errno| SyscallError::MountFailed {
            mount_source: source.map(|p| p.to_path_buf()),
            mount_target: target.to_path_buf(),
            fstype: fstype.map(|s| s.to_string()),
            flags,
            data: data.map(|s| s.to_string()),
            errno,
        })
    }

    fn umount2(&self, target: &Path, flags: MntFlags) -> Result<()> {
        umount2(target, flags).map_err(|errno| SyscallError::UmountFailed {
            target: target.to_path_buf(),
            flags,
            errno,
        })
    }

    fn mknod(&self, path: &Path, kind: SFlag, perm: Mode, dev: u64) -> Result<()> {
        mknod(path, kind, perm, dev).map_err(|errno| SyscallError::MknodFailed {
            path: path.to_path_buf(),
            kind,
            perm,
            dev,
            errno,
        })
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        symlink(original, link).map_err(|err| SyscallError::SymlinkFailed {
            old_path: original.to_path_buf(),
            new_path: link.to_path_buf(),
            err,
        })
    }

    /// Checks the calling process may access the file at `path`,
    /// see https://man7.org/linux/man-pages/man2/access.2.html
    fn access(&self, path: &Path, amode: AccessFlags) -> Result<()> {
        access(path, amode).map_err(|errno| SyscallError::AccessFailed {
            path: path.to_path_buf(),
            errno,
        })
    }

    fn unlink(&self, path: &Path) -> Result<()> {
        unlink(path).map_err(|errno| SyscallError::UnlinkFailed {
            path: path.to_path_buf(),
            errno,
        })
    }

    fn chdir(&self, path: &Path) -> Result<()> {
        chdir(path).map_err(|errno| SyscallError::ChdirFailed {
            path: path.to_path_buf(),
            errno,
        })
    }

    fn chroot(&self, path: &Path) -> Result<()> {
        chroot(path).map_err(|errno| SyscallError::ChrootFailed {
            path: path.to_path_buf(),
            errno,
        })
    }

    /// Replaces the current process image. Only ever returns on failure.
    fn execv(&self, path: &Path, args: &[CString]) -> Result<Infallible> {
        let cpath = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| SyscallError::InvalidFilename(path.to_path_buf()))?;
        execv(&cpath, args).map_err(|errno| SyscallError::ExecFailed {
            path: path.to_path_buf(),
            errno,
        })
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
