use crate::datastore::Datastore;
use crate::device::DiskSpec;
use crate::diskmanagers::{VirtualDisk, VirtualDiskProvider};
use crate::error::{self, Result};
use crate::session::VimClient;
use async_trait::async_trait;
use log::debug;
use snafu::ResultExt;

/// Plain strategy: direct virtual-disk-manager calls, no policy semantics.
pub struct VirtualDiskManager<'a> {
    disk: &'a VirtualDisk,
}

impl<'a> VirtualDiskManager<'a> {
    pub fn new(disk: &'a VirtualDisk) -> Self {
        Self { disk }
    }
}

#[async_trait]
impl VirtualDiskProvider for VirtualDiskManager<'_> {
    async fn create(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<String> {
        let spec = DiskSpec {
            disk_path: self.disk.disk_path.clone(),
            capacity_kb: self.disk.volume_options.capacity_kb,
            disk_format: self.disk.volume_options.disk_format,
        };
        debug!(
            "creating disk '{}' in datastore '{}'",
            spec.disk_path, datastore.name
        );
        client
            .create_disk(&spec)
            .await
            .context(error::RemoteOperationFailedSnafu {
                operation: format!("disk create for '{}'", self.disk.disk_path),
            })
    }

    async fn delete(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<()> {
        debug!(
            "deleting disk '{}' from datastore '{}'",
            self.disk.disk_path, datastore.name
        );
        client
            .delete_disk(&self.disk.disk_path)
            .await
            .context(error::RemoteOperationFailedSnafu {
                operation: format!("disk delete for '{}'", self.disk.disk_path),
            })
    }
}
