//! Drives the whole early boot: prepare /dev, find the root, hand off
#[allow(clippy::module_inception)]
mod boot;
pub mod environment;
pub mod handoff;

pub use boot::Boot;
pub use environment::Environment;
pub use handoff::Handoff;

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("failed to execute {path:?}")]
    Exec {
        path: std::path::PathBuf,
        source: crate::syscall::SyscallError,
    },
}
