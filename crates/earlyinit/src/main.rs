//! # earlyinit
//! The first process started from an initramfs. It mounts what it needs to
//! see the hardware, finds the block device carrying the real root
//! filesystem (preferring removable media), moves it over / and execs its
//! /sbin/init with the arguments the kernel gave us.
mod observability;

use std::ffi::OsString;

use libearlyinit::boot::Boot;
use libearlyinit::config::BootConfig;
use nix::unistd::getpid;

fn main() {
    if let Err(e) = observability::init() {
        eprintln!("log init failed: {:?}", e);
    }

    let args: Vec<OsString> = std::env::args_os().collect();
    if getpid().as_raw() != 1 {
        tracing::warn!(pid = getpid().as_raw(), "not running as PID 1");
    }

    let boot = Boot::new(BootConfig::default());
    tracing::debug!(config = ?boot.config(), ?args, "starting early boot");

    match boot.run(&args) {
        Ok(never) => match never {},
        Err(err) => {
            tracing::error!(?err, "{}", err);
            std::process::exit(1);
        }
    }
}
