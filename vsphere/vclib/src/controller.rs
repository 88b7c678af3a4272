//! Selects or mints the SCSI controller that will host a new disk.

use crate::device::{
    DeviceKind, ScsiControllerInfo, ScsiSharing, VirtualDevice, VmDeviceSet,
    SCSI_CONTROLLER_KEY_OFFSET, SCSI_CONTROLLER_LIMIT,
};
use crate::error::{self, Result};
use snafu::{ensure, OptionExt};
use vsphere_types::ControllerType;

/// Parses a wire controller-type string, rejecting unsupported values
/// before any remote call is attempted.
pub fn parse_controller_type(raw: &str) -> Result<ControllerType> {
    raw.parse()
        .ok()
        .context(error::UnsupportedConfigurationSnafu {
            message: format!(
                "'{}' is not a valid SCSI controller type, valid options are {:?}",
                raw,
                ControllerType::valid_options()
            ),
        })
}

/// Finds an existing controller of the requested type with a spare unit
/// slot.
pub fn find_available_controller(
    devices: &VmDeviceSet,
    requested_type: ControllerType,
) -> Option<&VirtualDevice> {
    devices.scsi_controllers().find(|device| {
        device
            .scsi_controller_info()
            .map_or(false, |info| info.controller_type == requested_type)
            && devices.free_unit_number(device.key).is_some()
    })
}

/// Builds a new controller device of the requested type on the lowest free
/// bus slot, with hot-add/remove enabled and bus sharing off.
///
/// The device is returned unregistered; registering it with the VM is a
/// separate remote call performed by the orchestrator. Fails with
/// `ResourceExhausted` when the VM already carries the maximum number of
/// SCSI controllers.
pub fn new_controller(
    devices: &VmDeviceSet,
    requested_type: ControllerType,
) -> Result<VirtualDevice> {
    let existing = devices.scsi_controllers().count();
    ensure!(
        existing < SCSI_CONTROLLER_LIMIT,
        error::ResourceExhaustedSnafu {
            message: format!(
                "SCSI controller limit of {} reached, cannot create another controller",
                SCSI_CONTROLLER_LIMIT
            ),
        }
    );
    let bus_number = devices
        .free_bus_number()
        .context(error::ResourceExhaustedSnafu {
            message: "no free SCSI bus slot on the VM",
        })?;
    Ok(VirtualDevice {
        key: SCSI_CONTROLLER_KEY_OFFSET + bus_number,
        controller_key: 0,
        unit_number: None,
        kind: DeviceKind::ScsiController(ScsiControllerInfo {
            controller_type: requested_type,
            bus_number,
            hot_add_remove: true,
            sharing: ScsiSharing::NoSharing,
        }),
    })
}
