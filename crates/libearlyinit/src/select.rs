//! Which devices get probed, and in what order
use crate::device::DeviceRegistry;
use crate::probe::{MountedRoot, RootProber};

/// Probes the devices of one removability tier, most recently registered
/// first, and returns the first usable root.
pub fn select_root(
    prober: &RootProber,
    registry: &DeviceRegistry,
    removable: bool,
) -> Option<MountedRoot> {
    registry
        .candidates(removable)
        .find_map(|device| match prober.probe(device.name()) {
            Ok(root) => Some(root),
            Err(err) => {
                tracing::debug!(%err, "candidate rejected");
                None
            }
        })
}

/// Removable media (SD cards, USB sticks) win over fixed storage.
pub fn select(prober: &RootProber, registry: &DeviceRegistry) -> Option<MountedRoot> {
    select_root(prober, registry, true).or_else(|| select_root(prober, registry, false))
}
