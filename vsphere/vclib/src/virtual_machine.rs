//! Attach/detach orchestration for virtual disks on a worker-node VM.
//!
//! Each operation fetches a fresh device list, performs local decisions
//! (idempotency check, controller selection, spec construction) and blocks
//! only on the remote reconfiguration task. Concurrent requests against the
//! same VM are not serialized here; callers holding a per-VM lock are
//! responsible for that.

use crate::controller;
use crate::datastore::ensure_vmdk_extension;
use crate::device::{
    DeviceKind, DeviceOperation, DiskBacking, ProfileSpec, VirtualDevice,
    VirtualDeviceConfigSpec, VirtualMachineConfigSpec, VmDeviceSet,
};
use crate::error::{self, Result};
use crate::session::{VimClient, VmRef};
use crate::uuid::format_disk_uuid;
use log::{debug, error, warn};
use snafu::{OptionExt, ResultExt};
use vsphere_types::ControllerType;

/// A request to attach one virtual disk to the VM.
///
/// `storage_policy_id`, when non-empty, is forwarded as a profile spec so
/// the remote system applies the SPBM policy to the disk at attach time.
#[derive(Clone, Debug)]
pub struct AttachRequest {
    pub disk_path: String,
    pub storage_policy_id: Option<String>,
    pub controller_type: ControllerType,
}

/// Identity of a disk device after a successful attach.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachedDisk {
    pub device_name: String,
    pub uuid: String,
}

/// Decorator over the remote VM object, borrowing the session client used
/// for all remote calls. The caller scopes session acquisition and release
/// around this value's lifetime.
pub struct VirtualMachine<'a, C> {
    client: &'a C,
    vm: VmRef,
}

impl<'a, C: VimClient> VirtualMachine<'a, C> {
    pub fn new(client: &'a C, vm: VmRef) -> Self {
        Self { client, vm }
    }

    pub fn vm(&self) -> &VmRef {
        &self.vm
    }

    /// Attaches the disk at `request.disk_path` to the VM.
    ///
    /// Idempotent: when a disk with the same backing UUID is already
    /// attached, the existing device identity is returned and no
    /// reconfiguration is submitted. A controller created for this request
    /// is rolled back (best effort) if any later step fails; the original
    /// error is always what reaches the caller.
    pub async fn attach_disk(&self, request: &AttachRequest) -> Result<AttachedDisk> {
        let disk_path = ensure_vmdk_extension(&request.disk_path);
        let disk_uuid = self.disk_uuid_by_path(&disk_path).await?;
        let devices = self.fetch_devices().await?;

        if let Some(existing) = devices.find_disk_by_uuid(&disk_uuid) {
            debug!(
                "disk '{}' already attached to VM '{}', attach is a no-op",
                disk_path, self.vm
            );
            return Ok(AttachedDisk {
                device_name: devices.device_name(existing),
                uuid: disk_uuid,
            });
        }

        let (controller_key, created_controller) =
            match controller::find_available_controller(&devices, request.controller_type) {
                Some(existing) => (existing.key, None),
                None => {
                    let new_controller =
                        controller::new_controller(&devices, request.controller_type)?;
                    self.register_controller(&new_controller).await?;
                    (new_controller.key, Some(new_controller))
                }
            };

        let unit_number =
            devices
                .free_unit_number(controller_key)
                .context(error::ResourceExhaustedSnafu {
                    message: format!(
                        "no free unit slot on controller {} of VM '{}'",
                        controller_key, self.vm
                    ),
                });
        let unit_number = match unit_number {
            Ok(unit) => unit,
            Err(e) => {
                self.rollback_controller(created_controller.as_ref()).await;
                return Err(e);
            }
        };

        let disk_device = VirtualDevice {
            // Provisional key; the remote side assigns the real one.
            key: -1,
            controller_key,
            unit_number: Some(unit_number),
            kind: DeviceKind::Disk(DiskBacking {
                file_name: disk_path.clone(),
                uuid: disk_uuid.clone(),
            }),
        };
        let mut device_change = VirtualDeviceConfigSpec {
            operation: DeviceOperation::Add,
            device: disk_device,
            profile: Vec::new(),
        };
        if let Some(policy_id) = request.storage_policy_id.as_deref() {
            if !policy_id.is_empty() {
                device_change
                    .profile
                    .push(ProfileSpec::ProfileId(policy_id.to_string()));
            }
        }
        let spec = VirtualMachineConfigSpec {
            device_change: vec![device_change],
        };

        if let Err(e) = self.submit_and_wait(spec, "disk attach").await {
            error!(
                "failed to attach disk '{}' to VM '{}': {}",
                disk_path, self.vm, e
            );
            self.rollback_controller(created_controller.as_ref()).await;
            return Err(e);
        }

        match self.vm_disk_info(&disk_uuid).await {
            Ok(attached) => Ok(attached),
            Err(e) => {
                error!(
                    "attached disk '{}' missing from device list of VM '{}': {}",
                    disk_path, self.vm, e
                );
                self.rollback_controller(created_controller.as_ref()).await;
                if let Err(detach_err) = self.detach_disk(&disk_path).await {
                    warn!(
                        "cleanup detach of '{}' from VM '{}' failed: {}",
                        disk_path, self.vm, detach_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Detaches the disk at `disk_path` from the VM.
    ///
    /// The device is resolved by its live backing UUID rather than by path;
    /// path normalization has both namespace and uuid forms, and only the
    /// authoritative identifier detaches the right device.
    pub async fn detach_disk(&self, disk_path: &str) -> Result<()> {
        let disk_uuid = self.disk_uuid_by_path(disk_path).await?;
        let devices = self.fetch_devices().await?;
        let device = devices
            .find_disk_by_uuid(&disk_uuid)
            .cloned()
            .context(error::NotFoundSnafu {
                what: format!("disk device for '{}'", disk_path),
            })?;
        let spec = VirtualMachineConfigSpec::single(DeviceOperation::Remove, device);
        self.submit_and_wait(spec, "disk detach").await
    }

    /// Whether a disk with the given path is currently attached.
    pub async fn is_disk_attached(&self, disk_path: &str) -> Result<bool> {
        let disk_uuid = self.disk_uuid_by_path(disk_path).await?;
        let devices = self.fetch_devices().await?;
        Ok(devices.find_disk_by_uuid(&disk_uuid).is_some())
    }

    /// Resolves the canonical UUID of the disk at a datastore path.
    pub async fn disk_uuid_by_path(&self, disk_path: &str) -> Result<String> {
        let path = ensure_vmdk_extension(disk_path);
        let raw = self
            .client
            .query_disk_uuid(&path)
            .await
            .context(error::RemoteOperationFailedSnafu {
                operation: format!("disk UUID query for '{}'", path),
            })?;
        format_disk_uuid(&raw)
    }

    /// Key of the controller hosting the disk at `disk_path`.
    pub async fn disk_controller_key(&self, disk_path: &str) -> Result<i32> {
        let device = self.disk_device_by_path(disk_path).await?;
        Ok(device.controller_key)
    }

    /// Inventory name of the disk device at `disk_path`.
    pub async fn disk_device_name(&self, disk_path: &str) -> Result<String> {
        let disk_uuid = self.disk_uuid_by_path(disk_path).await?;
        let devices = self.fetch_devices().await?;
        let device = devices
            .find_disk_by_uuid(&disk_uuid)
            .context(error::NotFoundSnafu {
                what: format!("disk device for '{}'", disk_path),
            })?;
        Ok(devices.device_name(device))
    }

    /// Removes a controller from the VM.
    pub async fn delete_controller(&self, controller_device: &VirtualDevice) -> Result<()> {
        let spec =
            VirtualMachineConfigSpec::single(DeviceOperation::Remove, controller_device.clone());
        self.submit_and_wait(spec, "controller delete").await
    }

    async fn disk_device_by_path(&self, disk_path: &str) -> Result<VirtualDevice> {
        let disk_uuid = self.disk_uuid_by_path(disk_path).await?;
        let devices = self.fetch_devices().await?;
        devices
            .find_disk_by_uuid(&disk_uuid)
            .cloned()
            .context(error::NotFoundSnafu {
                what: format!("disk device for '{}'", disk_path),
            })
    }

    async fn fetch_devices(&self) -> Result<VmDeviceSet> {
        self.client
            .fetch_devices(&self.vm)
            .await
            .context(error::RemoteOperationFailedSnafu {
                operation: format!("device list fetch for VM '{}'", self.vm),
            })
    }

    /// Registers a freshly minted controller with the VM.
    async fn register_controller(&self, controller_device: &VirtualDevice) -> Result<()> {
        let spec =
            VirtualMachineConfigSpec::single(DeviceOperation::Add, controller_device.clone());
        self.submit_and_wait(spec, "controller registration").await
    }

    /// Best-effort removal of a controller created earlier in the same
    /// request. Failures are logged and never replace the original error.
    async fn rollback_controller(&self, created: Option<&VirtualDevice>) {
        if let Some(controller_device) = created {
            if let Err(e) = self.delete_controller(controller_device).await {
                warn!(
                    "cleanup of controller {} on VM '{}' failed: {}",
                    controller_device.key, self.vm, e
                );
            }
        }
    }

    async fn submit_and_wait(&self, spec: VirtualMachineConfigSpec, operation: &str) -> Result<()> {
        let task = self
            .client
            .reconfigure(&self.vm, spec)
            .await
            .context(error::RemoteOperationFailedSnafu { operation })?;
        self.client
            .wait_for_task(&task)
            .await
            .context(error::RemoteOperationFailedSnafu { operation })
    }

    /// Locates the newly added disk by backing UUID after a successful
    /// reconfiguration and returns its identity.
    async fn vm_disk_info(&self, disk_uuid: &str) -> Result<AttachedDisk> {
        let devices = self.fetch_devices().await?;
        let device = devices
            .find_disk_by_uuid(disk_uuid)
            .context(error::NotFoundSnafu {
                what: format!("attached disk device with UUID '{}'", disk_uuid),
            })?;
        Ok(AttachedDisk {
            device_name: devices.device_name(device),
            uuid: disk_uuid.to_string(),
        })
    }
}
