use std::convert::Infallible;
use std::ffi::OsString;

use super::{BootError, Environment, Handoff};
use crate::config::BootConfig;
use crate::device::{DeviceRegistry, Enumerator};
use crate::probe::{MountedRoot, RootProber};
use crate::select;
use crate::syscall::syscall::create_syscall;
use crate::syscall::Syscall;

pub struct Boot {
    syscall: Box<dyn Syscall>,
    config: BootConfig,
}

impl Boot {
    pub fn new(config: BootConfig) -> Self {
        Self::new_with_syscall(create_syscall(), config)
    }

    pub fn new_with_syscall(syscall: Box<dyn Syscall>, config: BootConfig) -> Self {
        Self { syscall, config }
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Runs the boot to completion. On success this never returns since
    /// the process has become the real init.
    pub fn run(&self, args: &[OsString]) -> Result<Infallible, BootError> {
        let environment = Environment::new(self.syscall.as_ref(), &self.config);
        environment.setup();

        let root = self.find_root();
        tracing::info!(
            device = %root.device,
            fstype = %root.fstype,
            "using root filesystem"
        );

        environment.teardown();
        let handoff = Handoff::new(self.syscall.as_ref(), &self.config);
        handoff.switch_root(&root);
        handoff.exec_init(args)
    }

    /// Rebuilds the device registry from scratch
    pub fn discover(&self) -> DeviceRegistry {
        Enumerator::new(self.syscall.as_ref(), &self.config).enumerate()
    }

    pub fn select(&self, registry: &DeviceRegistry) -> Option<MountedRoot> {
        let prober = RootProber::new(self.syscall.as_ref(), &self.config);
        select::select(&prober, registry)
    }

    /// Discovers and probes until a root turns up. Storage may take a while
    /// to show up (USB, slow SD cards), and there is nobody to report
    /// failure to, so this never gives up.
    pub fn find_root(&self) -> MountedRoot {
        let mut round: u64 = 0;
        loop {
            round += 1;
            let registry = self.discover();
            if let Some(root) = self.select(&registry) {
                return root;
            }

            if is_report_round(round, self.config.report_every) {
                tracing::warn!(
                    round,
                    devices = registry.len(),
                    "failed to find a root filesystem, retrying"
                );
            }
            self.syscall.sleep(self.config.retry_interval);
        }
    }
}

/// Rounds count from 1. The first failure is always reported, then one in
/// every `report_every`.
fn is_report_round(round: u64, report_every: u32) -> bool {
    let report_every = u64::from(report_every.max(1));
    round >= 1 && (round - 1) % report_every == 0
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;
    use std::path::PathBuf;
    use std::time::Duration;

    use anyhow::Result;
    use nix::mount::{MntFlags, MsFlags};

    use super::*;
    use crate::syscall::test::{FakeBlockDevice, TestHelperSyscall, UmountArgs};
    use crate::test_utils::{add_sysfs_device, set_removable, setup_config, WarningLog};

    fn helper(boot: &Boot) -> &TestHelperSyscall {
        boot.syscall
            .as_any()
            .downcast_ref::<TestHelperSyscall>()
            .unwrap()
    }

    /// sdb is fixed storage without an init, sdc a removable card with one
    fn two_disks(config: &BootConfig, syscall: &TestHelperSyscall) -> Result<()> {
        add_sysfs_device(config, "sdb", "8:16\n")?;
        set_removable(config, "sdb", false)?;
        add_sysfs_device(config, "sdc", "8:32\n")?;
        set_removable(config, "sdc", true)?;
        syscall.add_block_device(
            config.device_node("sdb"),
            FakeBlockDevice::new()
                .with_fstype("ext3")
                .with_executable("bin/sh"),
        );
        syscall.add_block_device(
            config.device_node("sdc"),
            FakeBlockDevice::new()
                .with_fstype("ext2")
                .with_executable("sbin/init"),
        );
        Ok(())
    }

    #[test]
    fn test_find_root_prefers_removable() -> Result<()> {
        let (_tmp, config) = setup_config()?;
        let syscall = TestHelperSyscall::default();
        two_disks(&config, &syscall)?;
        let boot = Boot::new_with_syscall(Box::new(syscall), config);

        let root = boot.find_root();

        assert_eq!(root.device, "sdc");
        assert_eq!(root.fstype, "ext2");
        assert!(helper(&boot).get_sleep_args().is_empty());
        Ok(())
    }

    #[test]
    fn test_run_hands_off() -> Result<()> {
        let (_tmp, config) = setup_config()?;
        let syscall = TestHelperSyscall::default();
        two_disks(&config, &syscall)?;
        let boot = Boot::new_with_syscall(Box::new(syscall), config.clone());
        let args = vec![OsString::from("/init"), OsString::from("quiet")];

        let err = boot.run(&args).unwrap_err();
        assert!(matches!(err, BootError::Exec { .. }));

        let syscall = helper(&boot);
        let exec = syscall.get_exec_args();
        assert_eq!(exec.len(), 1);
        assert_eq!(exec[0].path, PathBuf::from("/sbin/init"));
        assert_eq!(exec[0].args, vec![CString::new("/init")?, CString::new("quiet")?]);

        // pseudo filesystems are gone, the new root is not
        let detached: Vec<UmountArgs> = [&config.dev_dir, &config.proc_dir, &config.sys_dir]
            .iter()
            .map(|target| UmountArgs {
                target: target.to_path_buf(),
                flags: MntFlags::MNT_DETACH,
            })
            .collect();
        assert_eq!(syscall.get_umount_args(), detached);
        assert_eq!(syscall.get_mounted(), vec![config.staging_dir.clone()]);

        let last_mount = syscall.get_mount_args().pop().unwrap();
        assert_eq!(last_mount.source, Some(config.staging_dir.clone()));
        assert_eq!(last_mount.target, config.new_root);
        assert_eq!(last_mount.flags, MsFlags::MS_MOVE);
        assert_eq!(syscall.get_chroot_args(), vec![PathBuf::from(".")]);
        Ok(())
    }

    #[test]
    fn test_find_root_waits_for_devices() -> Result<()> {
        let (_tmp, config) = setup_config()?;
        let syscall = TestHelperSyscall::default();
        let late = config.clone();
        syscall.set_on_sleep(move |syscall| {
            add_sysfs_device(&late, "sda", "8:0\n").unwrap();
            syscall.add_block_device(
                late.device_node("sda"),
                FakeBlockDevice::new()
                    .with_fstype("btrfs")
                    .with_executable("sbin/init"),
            );
        });
        let boot = Boot::new_with_syscall(Box::new(syscall), config);

        let root = boot.find_root();

        assert_eq!(root.device, "sda");
        assert_eq!(
            helper(&boot).get_sleep_args(),
            vec![Duration::from_secs(3)]
        );
        Ok(())
    }

    #[test]
    fn test_find_root_retries_indefinitely() -> Result<()> {
        let (_tmp, config) = setup_config()?;
        let syscall = TestHelperSyscall::default();
        let late = config.clone();
        let mut rounds = 0;
        syscall.set_on_sleep(move |syscall| {
            rounds += 1;
            if rounds == 25 {
                add_sysfs_device(&late, "mmcblk0", "179:0\n").unwrap();
                syscall.add_block_device(
                    late.device_node("mmcblk0"),
                    FakeBlockDevice::new()
                        .with_fstype("vfat")
                        .with_executable("sbin/init"),
                );
            }
        });
        let boot = Boot::new_with_syscall(Box::new(syscall), config);
        let warnings = WarningLog::default();

        let root = warnings.capture(|| boot.find_root());

        assert_eq!(root.device, "mmcblk0");
        assert_eq!(root.fstype, "vfat");
        assert_eq!(helper(&boot).get_sleep_args().len(), 25);
        // rounds 1, 11 and 21 failed loudly, the rest quietly
        assert_eq!(warnings.count("failed to find a root filesystem, retrying"), 3);
        Ok(())
    }

    #[test]
    fn test_is_report_round() {
        let reported: Vec<u64> = (1..=31).filter(|&r| is_report_round(r, 10)).collect();
        assert_eq!(reported, vec![1, 11, 21, 31]);
        assert!(!is_report_round(2, 10));
        assert!(!is_report_round(10, 10));
    }

    #[test]
    fn test_is_report_round_every_round() {
        assert!((1..=5).all(|r| is_report_round(r, 1)));
        // a zero cadence is treated as one
        assert!((1..=5).all(|r| is_report_round(r, 0)));
    }

    #[test]
    fn test_rounds_are_repeatable() -> Result<()> {
        let (_tmp, config) = setup_config()?;
        let syscall = TestHelperSyscall::default();
        two_disks(&config, &syscall)?;
        let boot = Boot::new_with_syscall(Box::new(syscall), config);

        let first = boot.discover();
        let first_root = boot.select(&first);
        let second = boot.discover();
        let second_root = boot.select(&second);

        assert_eq!(first, second);
        assert_eq!(first_root, second_root);
        assert_eq!(first_root.map(|r| r.device), Some("sdc".to_string()));
        Ok(())
    }
}
