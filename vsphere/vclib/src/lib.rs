/*!

`vclib` attaches and detaches persistent virtual disks on vCenter-managed
worker VMs and provisions the disks backing them. The remote side (device
enumeration, reconfiguration, task waits, virtual-disk-manager calls) is
reached through the [`session::VimClient`] trait; everything in this crate is
local decision logic over freshly fetched device lists: idempotency checks,
SCSI controller selection under the per-VM cap, change-spec construction and
rollback of controllers created for a failed attach.

!*/

pub mod controller;
pub mod datastore;
pub mod device;
pub mod diskmanagers;
pub mod error;
pub mod session;
pub mod uuid;
pub mod virtual_machine;

pub use error::{Error, Result};
pub use session::{RemoteError, RemoteResult, TaskRef, VimClient, VmRef};
pub use virtual_machine::{AttachRequest, AttachedDisk, VirtualMachine};
