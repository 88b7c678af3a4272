use crate::datastore::Datastore;
use crate::device::{DiskSpec, ProfileSpec};
use crate::diskmanagers::{VirtualDisk, VirtualDiskProvider};
use crate::error::{self, Result};
use crate::session::VimClient;
use async_trait::async_trait;
use log::debug;
use snafu::{OptionExt, ResultExt};

/// Policy-aware strategy: the disk is created through a VM-backed workflow
/// so the remote system can apply the storage profile at creation time.
pub struct VmDiskManager<'a> {
    disk: &'a VirtualDisk,
}

impl<'a> VmDiskManager<'a> {
    pub fn new(disk: &'a VirtualDisk) -> Self {
        Self { disk }
    }

    fn profile_spec(&self) -> Option<ProfileSpec> {
        let options = &self.disk.volume_options;
        if let Some(id) = options.storage_policy_id.as_deref().filter(|v| !v.is_empty()) {
            Some(ProfileSpec::ProfileId(id.to_string()))
        } else if let Some(name) = options
            .storage_policy_name
            .as_deref()
            .filter(|v| !v.is_empty())
        {
            Some(ProfileSpec::ProfileName(name.to_string()))
        } else {
            options
                .vsan_storage_profile_data
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|data| ProfileSpec::VsanProfileData(data.to_string()))
        }
    }
}

#[async_trait]
impl VirtualDiskProvider for VmDiskManager<'_> {
    async fn create(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<String> {
        let profile = self
            .profile_spec()
            .context(error::UnsupportedConfigurationSnafu {
                message: "policy-aware disk creation requires a storage policy \
                          name, ID or VSAN profile data",
            })?;
        let spec = DiskSpec {
            disk_path: self.disk.disk_path.clone(),
            capacity_kb: self.disk.volume_options.capacity_kb,
            disk_format: self.disk.volume_options.disk_format,
        };
        debug!(
            "creating policy-backed disk '{}' in datastore '{}' with {:?}",
            spec.disk_path, datastore.name, profile
        );
        client
            .create_disk_with_policy(&spec, &profile, &self.disk.vm_options)
            .await
            .context(error::RemoteOperationFailedSnafu {
                operation: format!("policy-backed disk create for '{}'", self.disk.disk_path),
            })
    }

    async fn delete(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<()> {
        // Deletion has no policy semantics; delegate to the plain manager.
        crate::diskmanagers::VirtualDiskManager::new(self.disk)
            .delete(client, datastore)
            .await
    }
}
