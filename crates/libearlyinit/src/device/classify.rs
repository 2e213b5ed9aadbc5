use std::path::Path;

use super::read_attribute;

/// `device/type` of an MMC card that counts as removable. Onboard eMMC
/// reports `MMC` instead.
const REMOVABLE_MMC_TYPE: &str = "SD";

/// Decides whether a block device sits on removable media. The kernel only
/// exposes the relevant attributes on the whole-disk device, so partitions
/// are first mapped back to their parent.
pub struct Classifier<'a> {
    block_class_dir: &'a Path,
    dev_dir: &'a Path,
}

impl<'a> Classifier<'a> {
    pub fn new(block_class_dir: &'a Path, dev_dir: &'a Path) -> Self {
        Self {
            block_class_dir,
            dev_dir,
        }
    }

    /// Name of the whole-disk device `name` belongs to: `sda1` -> `sda`,
    /// `mmcblk0p2` -> `mmcblk0`. A device whose parent has no node is its
    /// own parent.
    pub fn parent_name(&self, name: &str) -> String {
        let stripped = name.trim_end_matches(|c: char| c.is_ascii_digit());
        if stripped.is_empty() {
            return name.to_owned();
        }
        if self.has_node(stripped) {
            return stripped.to_owned();
        }

        // mmcblk0p1, nvme0n1p1
        if let Some(base) = stripped.strip_suffix('p') {
            if !base.is_empty() && self.has_node(base) {
                return base.to_owned();
            }
        }

        name.to_owned()
    }

    pub fn classify(&self, name: &str) -> bool {
        let parent = self.parent_name(name);
        let sysfs = self.block_class_dir.join(&parent);

        if let Ok(kind) = read_attribute(&sysfs.join("device/type")) {
            tracing::debug!(device = name, %parent, %kind, "classified by device type");
            return kind == REMOVABLE_MMC_TYPE;
        }

        match read_attribute(&sysfs.join("removable")) {
            Ok(flag) => {
                tracing::debug!(device = name, %parent, %flag, "classified by removable flag");
                flag == "1"
            }
            Err(err) => {
                tracing::debug!(device = name, %parent, %err, "no removability information");
                false
            }
        }
    }

    fn has_node(&self, name: &str) -> bool {
        self.dev_dir.join(name).symlink_metadata().is_ok()
    }
}
