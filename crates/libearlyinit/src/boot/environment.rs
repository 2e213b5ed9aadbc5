use std::fs;
use std::path::Path;

use nix::mount::{MntFlags, MsFlags};
use nix::sys::stat::{makedev, Mode, SFlag};

use crate::config::BootConfig;
use crate::syscall::Syscall;

/// Character devices needed before anything else runs: (name, major, minor, mode)
const CHAR_DEVICES: [(&str, u64, u64, u32); 2] = [("console", 5, 1, 0o600), ("null", 1, 3, 0o666)];

/// Links into /proc for programs that expect /dev/std*: (target, link)
const FD_SYMLINKS: [(&str, &str); 4] = [
    ("/proc/self/fd", "fd"),
    ("fd/0", "stdin"),
    ("fd/1", "stdout"),
    ("fd/2", "stderr"),
];

/// The pseudo filesystems needed to discover devices. Everything here is
/// best effort: a failure is logged and boot goes on with what it has.
pub struct Environment<'a> {
    syscall: &'a dyn Syscall,
    config: &'a BootConfig,
}

impl<'a> Environment<'a> {
    pub fn new(syscall: &'a dyn Syscall, config: &'a BootConfig) -> Self {
        Self { syscall, config }
    }

    pub fn setup(&self) {
        for dir in [
            &self.config.sys_dir,
            &self.config.proc_dir,
            &self.config.dev_dir,
            &self.config.staging_dir,
        ] {
            if let Err(err) = fs::create_dir_all(dir) {
                tracing::warn!(?err, ?dir, "failed to create mount point");
            }
        }

        let pseudo = MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_NOEXEC;
        self.mount_pseudo("sysfs", &self.config.sys_dir, pseudo, None);
        self.mount_pseudo("proc", &self.config.proc_dir, pseudo, None);
        self.mount_pseudo("tmpfs", &self.config.dev_dir, MsFlags::MS_NOSUID, Some("mode=0755"));

        for (name, major, minor, mode) in CHAR_DEVICES {
            let path = self.config.device_node(name);
            if let Err(err) = self.syscall.mknod(
                &path,
                SFlag::S_IFCHR,
                Mode::from_bits_truncate(mode),
                makedev(major, minor),
            ) {
                tracing::warn!(?err, ?path, "failed to create device node");
            }
        }

        for (target, link) in FD_SYMLINKS {
            let link = self.config.dev_dir.join(link);
            if let Err(err) = self.syscall.symlink(Path::new(target), &link) {
                tracing::warn!(?err, ?link, "failed to create symlink");
            }
        }
    }

    /// Detaches what `setup` mounted, in reverse order. The real init
    /// brings its own.
    pub fn teardown(&self) {
        for target in [
            &self.config.dev_dir,
            &self.config.proc_dir,
            &self.config.sys_dir,
        ] {
            if let Err(err) = self.syscall.umount2(target, MntFlags::MNT_DETACH) {
                tracing::warn!(?err, ?target, "failed to unmount");
            }
        }
    }

    fn mount_pseudo(&self, fstype: &str, target: &Path, flags: MsFlags, data: Option<&str>) {
        if let Err(err) = self
            .syscall
            .mount(Some(Path::new(fstype)), target, Some(fstype), flags, data)
        {
            tracing::warn!(?err, ?target, "failed to mount {}", fstype);
        }
    }
}
