use crate::device::{DiskSpec, ProfileSpec, VirtualMachineConfigSpec, VmDeviceSet};
use async_trait::async_trait;
use snafu::Snafu;
use std::fmt::{Display, Formatter};
use vsphere_types::VmOptions;

/// Opaque failure reported by the remote vCenter collaborator.
#[derive(Debug, Snafu)]
#[snafu(display("{}", message))]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Reference to a virtual machine known to the remote endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VmRef(pub String);

impl Display for VmRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for an asynchronous remote operation that must be waited on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskRef(pub String);

/// The remote session seam.
///
/// Implementations front the vCenter SOAP API: device enumeration, device
/// reconfiguration, task waits and virtual-disk-manager calls. The library
/// performs no retries and enforces no timeouts here; both are the caller's
/// concern, and cancellation propagates by dropping the in-flight future.
/// Session acquisition and logout are likewise scoped by the caller around
/// the lifetime of the values holding the client.
#[async_trait]
pub trait VimClient: Send + Sync {
    /// Fetches the live device list of a VM. The result is authoritative
    /// only at the time of the call and is never cached by this library.
    async fn fetch_devices(&self, vm: &VmRef) -> RemoteResult<VmDeviceSet>;

    /// Queries the backing UUID of the virtual disk at a datastore path.
    async fn query_disk_uuid(&self, disk_path: &str) -> RemoteResult<String>;

    /// Submits a device reconfiguration and returns the resulting task.
    async fn reconfigure(
        &self,
        vm: &VmRef,
        spec: VirtualMachineConfigSpec,
    ) -> RemoteResult<TaskRef>;

    /// Blocks until the task completes or reports an error.
    async fn wait_for_task(&self, task: &TaskRef) -> RemoteResult<()>;

    /// Creates a standalone virtual disk and returns its canonical
    /// datastore path.
    async fn create_disk(&self, spec: &DiskSpec) -> RemoteResult<String>;

    /// Creates a virtual disk with a storage profile applied at creation
    /// time, placed via the given VM options.
    async fn create_disk_with_policy(
        &self,
        spec: &DiskSpec,
        profile: &ProfileSpec,
        vm_options: &VmOptions,
    ) -> RemoteResult<String>;

    /// Deletes the virtual disk at a datastore path.
    async fn delete_disk(&self, disk_path: &str) -> RemoteResult<()>;
}
