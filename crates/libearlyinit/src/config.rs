use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::device::registry::DEFAULT_MAX_DEVICES;

/// Filesystem types tried on every candidate, in order
pub const DEFAULT_FILESYSTEMS: [&str; 4] = ["btrfs", "ext3", "ext2", "vfat"];
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);
/// A failed round is reported once every this many rounds
pub const DEFAULT_REPORT_EVERY: u32 = 10;

/// Where things live and how hard to look for them. There is nothing to
/// read this from before the root is mounted, so the defaults are the
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootConfig {
    pub sys_dir: PathBuf,
    pub proc_dir: PathBuf,
    pub dev_dir: PathBuf,
    pub block_class_dir: PathBuf,
    /// Where candidates are mounted while probing
    pub staging_dir: PathBuf,
    /// Where the chosen root gets moved to
    pub new_root: PathBuf,
    /// Path of the real init, as seen from inside the new root
    pub init_path: PathBuf,
    pub filesystems: Vec<String>,
    pub max_devices: usize,
    pub retry_interval: Duration,
    pub report_every: u32,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            sys_dir: PathBuf::from("/sys"),
            proc_dir: PathBuf::from("/proc"),
            dev_dir: PathBuf::from("/dev"),
            block_class_dir: PathBuf::from("/sys/class/block"),
            staging_dir: PathBuf::from("/mnt"),
            new_root: PathBuf::from("/"),
            init_path: PathBuf::from("/sbin/init"),
            filesystems: DEFAULT_FILESYSTEMS.iter().map(|s| s.to_string()).collect(),
            max_devices: DEFAULT_MAX_DEVICES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            report_every: DEFAULT_REPORT_EVERY,
        }
    }
}

impl BootConfig {
    /// The default layout moved below `root`. `init_path` is left alone
    /// since it is resolved inside the new root.
    pub fn relocated(root: &Path) -> Self {
        let defaults = Self::default();
        let under = |path: &Path| root.join(path.strip_prefix("/").unwrap_or(path));

        Self {
            sys_dir: under(&defaults.sys_dir),
            proc_dir: under(&defaults.proc_dir),
            dev_dir: under(&defaults.dev_dir),
            block_class_dir: under(&defaults.block_class_dir),
            staging_dir: under(&defaults.staging_dir),
            new_root: under(&defaults.new_root),
            ..defaults
        }
    }

    /// Path of the real init while its filesystem sits on the staging dir
    pub fn staged_init(&self) -> PathBuf {
        let init = self
            .init_path
            .strip_prefix("/")
            .unwrap_or(&self.init_path);
        self.staging_dir.join(init)
    }

    pub fn device_node(&self, name: &str) -> PathBuf {
        self.dev_dir.join(name)
    }
}
