use std::fmt;

/// Default upper bound on the number of block devices tracked per round
pub const DEFAULT_MAX_DEVICES: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("device registry is full ({capacity} devices)")]
    Full { capacity: usize },
    #[error("device {0} is already registered")]
    Duplicate(String),
}

/// A block device seen during one discovery round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    name: String,
    removable: bool,
}

impl BlockDevice {
    pub fn new<S: Into<String>>(name: S, removable: bool) -> Self {
        Self {
            name: name.into(),
            removable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn removable(&self) -> bool {
        self.removable
    }
}

impl fmt::Display for BlockDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.removable { "removable" } else { "fixed" };
        write!(f, "{} ({})", self.name, kind)
    }
}

/// Devices in the order the kernel listed them. A new registry is built
/// for every round since device numbering changes as hardware settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistry {
    devices: Vec<BlockDevice>,
    capacity: usize,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_DEVICES)
    }
}

impl DeviceRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            devices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn register(&mut self, device: BlockDevice) -> Result<(), RegistryError> {
        if self.is_full() {
            return Err(RegistryError::Full {
                capacity: self.capacity,
            });
        }
        if self.contains(device.name()) {
            return Err(RegistryError::Duplicate(device.name));
        }

        self.devices.push(device);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.iter().any(|d| d.name() == name)
    }

    pub fn is_full(&self) -> bool {
        self.devices.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Devices in registration order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BlockDevice> {
        self.devices.iter()
    }

    /// Devices of one removability tier, most recently registered first
    pub fn candidates(&self, removable: bool) -> impl Iterator<Item = &BlockDevice> {
        self.devices
            .iter()
            .rev()
            .filter(move |d| d.removable() == removable)
    }
}
