//! Local decorator model over the device inventory the remote endpoint
//! reports for a VM, plus the change specs submitted back to it.
//!
//! vSphere is picky about unit numbers and controllers: every SCSI
//! controller has 16 unit slots with unit 7 reserved, unit numbers must be
//! unique per controller, and controller keys sit at 1000 + bus number.

use vsphere_types::{ControllerType, DiskFormat};

/// Maximum number of SCSI controllers a VM can carry.
pub const SCSI_CONTROLLER_LIMIT: usize = 4;

/// Controller device keys start here; key = offset + bus number.
pub const SCSI_CONTROLLER_KEY_OFFSET: i32 = 1000;

/// Unit slots per SCSI controller.
pub const SCSI_CONTROLLER_UNITS: i32 = 16;

/// Unit number reserved for the controller itself.
pub const SCSI_RESERVED_UNIT: i32 = 7;

/// Bus sharing mode of a SCSI controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScsiSharing {
    NoSharing,
    VirtualSharing,
    PhysicalSharing,
}

/// Backing file information of a virtual disk device.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiskBacking {
    /// Datastore path of the backing file, `[datastore] dir/disk.vmdk`.
    pub file_name: String,

    /// Canonical UUID assigned by the remote system. Stable for the
    /// disk's lifetime.
    pub uuid: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScsiControllerInfo {
    pub controller_type: ControllerType,
    pub bus_number: i32,
    pub hot_add_remove: bool,
    pub sharing: ScsiSharing,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeviceKind {
    Disk(DiskBacking),
    ScsiController(ScsiControllerInfo),
    Other { type_name: String },
}

/// One device attached to a VM.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VirtualDevice {
    pub key: i32,
    /// Key of the controller hosting this device; 0 when not hosted.
    pub controller_key: i32,
    pub unit_number: Option<i32>,
    pub kind: DeviceKind,
}

impl VirtualDevice {
    pub fn scsi_controller_info(&self) -> Option<&ScsiControllerInfo> {
        match &self.kind {
            DeviceKind::ScsiController(info) => Some(info),
            _ => None,
        }
    }

    pub fn disk_backing(&self) -> Option<&DiskBacking> {
        match &self.kind {
            DeviceKind::Disk(backing) => Some(backing),
            _ => None,
        }
    }
}

/// The live device list of a VM at the time of query.
///
/// Never cached between operations; every attach and detach re-fetches it
/// because it can change between calls.
#[derive(Clone, Debug, Default)]
pub struct VmDeviceSet {
    devices: Vec<VirtualDevice>,
}

impl VmDeviceSet {
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        Self { devices }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualDevice> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn scsi_controllers(&self) -> impl Iterator<Item = &VirtualDevice> {
        self.devices
            .iter()
            .filter(|device| matches!(device.kind, DeviceKind::ScsiController(_)))
    }

    pub fn disks(&self) -> impl Iterator<Item = &VirtualDevice> {
        self.devices
            .iter()
            .filter(|device| matches!(device.kind, DeviceKind::Disk(_)))
    }

    pub fn find_by_key(&self, key: i32) -> Option<&VirtualDevice> {
        self.devices.iter().find(|device| device.key == key)
    }

    /// Finds the disk device whose backing UUID matches the canonical form.
    pub fn find_disk_by_uuid(&self, uuid: &str) -> Option<&VirtualDevice> {
        self.disks()
            .find(|device| device.disk_backing().map(|b| b.uuid.as_str()) == Some(uuid))
    }

    /// Device name in the form the remote inventory uses, e.g.
    /// `disk-1000-0` for disks and `pvscsi-1000` for controllers.
    pub fn device_name(&self, device: &VirtualDevice) -> String {
        match &device.kind {
            DeviceKind::Disk(_) => format!(
                "disk-{}-{}",
                device.controller_key,
                device.unit_number.unwrap_or(0)
            ),
            DeviceKind::ScsiController(info) => {
                format!("{}-{}", info.controller_type, device.key)
            }
            DeviceKind::Other { type_name } => format!("{}-{}", type_name, device.key),
        }
    }

    /// Lowest free unit number on the given controller, skipping the
    /// reserved unit. `None` when all slots are taken.
    pub fn free_unit_number(&self, controller_key: i32) -> Option<i32> {
        let taken: Vec<i32> = self
            .devices
            .iter()
            .filter(|device| device.controller_key == controller_key)
            .filter_map(|device| device.unit_number)
            .collect();
        (0..SCSI_CONTROLLER_UNITS)
            .filter(|unit| *unit != SCSI_RESERVED_UNIT)
            .find(|unit| !taken.contains(unit))
    }

    /// Lowest bus number not occupied by an existing SCSI controller.
    pub fn free_bus_number(&self) -> Option<i32> {
        let taken: Vec<i32> = self
            .scsi_controllers()
            .filter_map(|device| device.scsi_controller_info().map(|info| info.bus_number))
            .collect();
        (0..SCSI_CONTROLLER_LIMIT as i32).find(|bus| !taken.contains(bus))
    }
}

/// Operation applied to one device in a reconfiguration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceOperation {
    Add,
    Remove,
}

/// Storage profile applied to a disk at creation or attach time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProfileSpec {
    /// SPBM profile referenced by ID.
    ProfileId(String),
    /// SPBM profile referenced by name, resolved remotely.
    ProfileName(String),
    /// Raw VSAN storage capability data embedded in the change spec.
    VsanProfileData(String),
}

/// One device change inside a reconfiguration request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VirtualDeviceConfigSpec {
    pub operation: DeviceOperation,
    pub device: VirtualDevice,
    pub profile: Vec<ProfileSpec>,
}

/// A reconfiguration request submitted to the remote endpoint.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VirtualMachineConfigSpec {
    pub device_change: Vec<VirtualDeviceConfigSpec>,
}

impl VirtualMachineConfigSpec {
    /// Spec containing a single device change without profile.
    pub fn single(operation: DeviceOperation, device: VirtualDevice) -> Self {
        Self {
            device_change: vec![VirtualDeviceConfigSpec {
                operation,
                device,
                profile: Vec::new(),
            }],
        }
    }
}

/// Parameters for creating a standalone virtual disk in a datastore.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiskSpec {
    pub disk_path: String,
    pub capacity_kb: i64,
    pub disk_format: DiskFormat,
}
