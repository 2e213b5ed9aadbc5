use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer};
use tracing_subscriber::prelude::*;

use crate::config::BootConfig;

pub fn set_fixture(dir: &Path, file: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {:?}", dir))?;
    let path = dir.join(file);
    fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("failed to open {:?}", path))?
        .write_all(content.as_bytes())
        .with_context(|| format!("failed to write to {:?}", path))?;

    Ok(path)
}

/// A boot configuration whose every path lives inside a fresh temporary
/// directory, with the block class directory already in place.
pub fn setup_config() -> Result<(TempDir, BootConfig)> {
    let tmp = tempfile::tempdir()?;
    let config = BootConfig::relocated(tmp.path());
    fs::create_dir_all(&config.block_class_dir)?;
    fs::create_dir_all(&config.dev_dir)?;
    fs::create_dir_all(&config.staging_dir)?;
    Ok((tmp, config))
}

/// Adds `name` to the fake block class directory with the given
/// `dev` attribute.
pub fn add_sysfs_device(config: &BootConfig, name: &str, dev: &str) -> Result<PathBuf> {
    set_fixture(&config.block_class_dir.join(name), "dev", dev)
}

pub fn set_removable(config: &BootConfig, name: &str, removable: bool) -> Result<PathBuf> {
    let flag = if removable { "1\n" } else { "0\n" };
    set_fixture(&config.block_class_dir.join(name), "removable", flag)
}

/// Collects the messages of warnings logged on the current thread.
#[derive(Clone, Default)]
pub struct WarningLog(Arc<Mutex<Vec<String>>>);

impl WarningLog {
    /// Runs `f` with this log capturing its warnings
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn count(&self, message: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == message)
            .count()
    }
}

impl<S: Subscriber> Layer<S> for WarningLog {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.0.lock().unwrap().push(visitor.0);
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}
