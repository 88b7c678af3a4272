/*!

Mock implementation of the [`VimClient`] seam so attach/detach orchestration
can be tested without a vCenter endpoint. The mock keeps an in-memory device
list, applies submitted reconfigurations to it, and records every call and
every submitted spec for assertions.

!*/

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use vclib::device::{
    DeviceKind, DeviceOperation, DiskBacking, DiskSpec, ProfileSpec, ScsiControllerInfo,
    ScsiSharing, VirtualDevice, VirtualMachineConfigSpec, VmDeviceSet,
};
use vclib::session::{RemoteError, RemoteResult, TaskRef, VimClient, VmRef};
use vsphere_types::{ControllerType, VmOptions};

#[derive(Default)]
struct MockState {
    devices: Vec<VirtualDevice>,
    disk_uuids: HashMap<String, String>,
    submitted: Vec<VirtualMachineConfigSpec>,
    calls: Vec<String>,
    fail_disk_add: bool,
    next_key: i32,
}

pub struct MockVimClient {
    state: Mutex<MockState>,
}

impl MockVimClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_key: 2000,
                ..Default::default()
            }),
        }
    }

    pub fn with_devices(devices: Vec<VirtualDevice>) -> Self {
        let client = Self::new();
        client.state.lock().unwrap().devices = devices;
        client
    }

    /// Registers the backing UUID the remote side would report for a path.
    pub fn set_disk_uuid(&self, disk_path: &str, raw_uuid: &str) {
        self.state
            .lock()
            .unwrap()
            .disk_uuids
            .insert(disk_path.to_string(), raw_uuid.to_string());
    }

    /// Makes any reconfiguration containing a disk Add fail.
    pub fn fail_disk_add(&self) {
        self.state.lock().unwrap().fail_disk_add = true;
    }

    pub fn submitted(&self) -> Vec<VirtualMachineConfigSpec> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn devices(&self) -> Vec<VirtualDevice> {
        self.state.lock().unwrap().devices.clone()
    }
}

pub fn scsi_controller(key: i32, bus: i32, controller_type: ControllerType) -> VirtualDevice {
    VirtualDevice {
        key,
        controller_key: 0,
        unit_number: None,
        kind: DeviceKind::ScsiController(ScsiControllerInfo {
            controller_type,
            bus_number: bus,
            hot_add_remove: true,
            sharing: ScsiSharing::NoSharing,
        }),
    }
}

pub fn disk_device(key: i32, controller_key: i32, unit: i32, path: &str, uuid: &str) -> VirtualDevice {
    VirtualDevice {
        key,
        controller_key,
        unit_number: Some(unit),
        kind: DeviceKind::Disk(DiskBacking {
            file_name: path.to_string(),
            uuid: uuid.to_string(),
        }),
    }
}

fn spec_adds_disk(spec: &VirtualMachineConfigSpec) -> bool {
    spec.device_change.iter().any(|change| {
        change.operation == DeviceOperation::Add
            && matches!(change.device.kind, DeviceKind::Disk(_))
    })
}

#[async_trait]
impl VimClient for MockVimClient {
    async fn fetch_devices(&self, _vm: &VmRef) -> RemoteResult<VmDeviceSet> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_devices".to_string());
        Ok(VmDeviceSet::new(state.devices.clone()))
    }

    async fn query_disk_uuid(&self, disk_path: &str) -> RemoteResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("query_disk_uuid:{}", disk_path));
        state
            .disk_uuids
            .get(disk_path)
            .cloned()
            .ok_or_else(|| RemoteError::new(format!("no disk at '{}'", disk_path)))
    }

    async fn reconfigure(
        &self,
        _vm: &VmRef,
        spec: VirtualMachineConfigSpec,
    ) -> RemoteResult<TaskRef> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("reconfigure".to_string());
        state.submitted.push(spec.clone());
        if state.fail_disk_add && spec_adds_disk(&spec) {
            return Err(RemoteError::new("simulated reconfiguration failure"));
        }
        for change in &spec.device_change {
            match change.operation {
                DeviceOperation::Add => {
                    let mut device = change.device.clone();
                    if device.key < 0 {
                        device.key = state.next_key;
                        state.next_key += 1;
                    }
                    state.devices.push(device);
                }
                DeviceOperation::Remove => {
                    let key = change.device.key;
                    state.devices.retain(|device| device.key != key);
                }
            }
        }
        let task = TaskRef(format!("task-{}", state.submitted.len()));
        Ok(task)
    }

    async fn wait_for_task(&self, task: &TaskRef) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("wait_for_task:{}", task.0));
        Ok(())
    }

    async fn create_disk(&self, spec: &DiskSpec) -> RemoteResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_disk:{}", spec.disk_path));
        Ok(spec.disk_path.clone())
    }

    async fn create_disk_with_policy(
        &self,
        spec: &DiskSpec,
        profile: &ProfileSpec,
        _vm_options: &VmOptions,
    ) -> RemoteResult<String> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("create_disk_with_policy:{}:{:?}", spec.disk_path, profile));
        Ok(spec.disk_path.clone())
    }

    async fn delete_disk(&self, disk_path: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete_disk:{}", disk_path));
        Ok(())
    }
}
