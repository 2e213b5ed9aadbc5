//! Contains a wrapper of syscalls for unit tests
//! This provides a uniform interface for the rest of earlyinit
//! to call the syscalls required to find and switch to the real root

pub mod linux;
#[allow(clippy::module_inception)]
pub mod syscall;

pub use syscall::Syscall;

#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    #[error("mount of {mount_source:?} on {mount_target:?} ({fstype:?}) failed: {errno}")]
    MountFailed {
        mount_source: Option<std::path::PathBuf>,
        mount_target: std::path::PathBuf,
        fstype: Option<String>,
        flags: nix::mount::MsFlags,
        data: Option<String>,
        errno: nix::errno::Errno,
    },
    #[error("umount of {target:?} failed: {errno}")]
    UmountFailed {
        target: std::path::PathBuf,
        flags: nix::mount::MntFlags,
        errno: nix::errno::Errno,
    },
    #[error("symlink {new_path:?} -> {old_path:?} failed: {err}")]
    SymlinkFailed {
        old_path: std::path::PathBuf,
        new_path: std::path::PathBuf,
        err: std::io::Error,
    },
    #[error("mknod {path:?} failed: {errno}")]
    MknodFailed {
        path: std::path::PathBuf,
        kind: nix::sys::stat::SFlag,
        perm: nix::sys::stat::Mode,
        dev: nix::sys::stat::dev_t,
        errno: nix::errno::Errno,
    },
    #[error("unlink {path:?} failed: {errno}")]
    UnlinkFailed {
        path: std::path::PathBuf,
        errno: nix::errno::Errno,
    },
    #[error("access to {path:?} denied: {errno}")]
    AccessFailed {
        path: std::path::PathBuf,
        errno: nix::errno::Errno,
    },
    #[error("failed to chdir to {path:?}: {errno}")]
    ChdirFailed {
        path: std::path::PathBuf,
        errno: nix::errno::Errno,
    },
    #[error("failed to chroot to {path:?}: {errno}")]
    ChrootFailed {
        path: std::path::PathBuf,
        errno: nix::errno::Errno,
    },
    #[error("failed to execute {path:?}: {errno}")]
    ExecFailed {
        path: std::path::PathBuf,
        errno: nix::errno::Errno,
    },
    #[error("invalid filename: {0:?}")]
    InvalidFilename(std::path::PathBuf),
    #[error(transparent)]
    Nix(#[from] nix::Error),
}

type Result<T> = std::result::Result<T, SyscallError>;
