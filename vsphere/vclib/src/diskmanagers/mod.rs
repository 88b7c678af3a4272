//! Disk provisioning strategies: a plain virtual-disk-manager path and a
//! policy-aware path used when storage-policy fields are set.

mod virtual_disk_manager;
mod vm_disk_manager;

pub use virtual_disk_manager::VirtualDiskManager;
pub use vm_disk_manager::VmDiskManager;

use crate::datastore::Datastore;
use crate::error::{self, Result};
use crate::session::VimClient;
use async_trait::async_trait;
use snafu::ensure;
use vsphere_types::{VmOptions, VolumeOptions};

/// The capability pair both provisioning strategies expose. Callers stay
/// polymorphic over this and never branch on the concrete strategy.
#[async_trait]
pub trait VirtualDiskProvider: Send + Sync {
    /// Creates the disk in the datastore and returns its canonical path.
    async fn create(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<String>;

    /// Deletes the disk from the datastore.
    async fn delete(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<()>;
}

/// Which manager services the create side of a [`VirtualDisk`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum DiskStrategy {
    Plain,
    PolicyAware,
}

/// A virtual disk to provision or remove, with its strategy fixed at
/// construction time.
#[derive(Clone, Debug)]
pub struct VirtualDisk {
    pub disk_path: String,
    pub volume_options: VolumeOptions,
    pub vm_options: VmOptions,
    create_strategy: DiskStrategy,
}

impl VirtualDisk {
    /// Validates the volume options once and selects the create strategy.
    ///
    /// Policy name and policy ID are mutually exclusive; creation with any
    /// policy field set routes through the policy-aware manager, everything
    /// else through the plain one.
    pub fn new(
        disk_path: String,
        volume_options: VolumeOptions,
        vm_options: VmOptions,
    ) -> Result<Self> {
        ensure!(
            !volume_options.conflicting_policy_fields(),
            error::UnsupportedConfigurationSnafu {
                message: "storage policy ID and storage policy name are both set, \
                          only one may be used",
            }
        );
        ensure!(
            volume_options.capacity_kb > 0,
            error::UnsupportedConfigurationSnafu {
                message: format!(
                    "invalid disk capacity {} KB, capacity must be positive",
                    volume_options.capacity_kb
                ),
            }
        );
        let create_strategy = if volume_options.requires_storage_policy() {
            DiskStrategy::PolicyAware
        } else {
            DiskStrategy::Plain
        };
        Ok(Self {
            disk_path,
            volume_options,
            vm_options,
            create_strategy,
        })
    }

    pub async fn create(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<String> {
        match self.create_strategy {
            DiskStrategy::Plain => VirtualDiskManager::new(self).create(client, datastore).await,
            DiskStrategy::PolicyAware => VmDiskManager::new(self).create(client, datastore).await,
        }
    }

    /// Deletion carries no policy semantics and always takes the plain
    /// manager.
    pub async fn delete(&self, client: &dyn VimClient, datastore: &Datastore) -> Result<()> {
        VirtualDiskManager::new(self).delete(client, datastore).await
    }
}

#[cfg(test)]
mod test {
    use super::{DiskStrategy, VirtualDisk};
    use crate::error::Error;
    use vsphere_types::{VmOptions, VolumeOptions};

    fn options() -> VolumeOptions {
        VolumeOptions {
            capacity_kb: 1024,
            name: "pv-1".to_string(),
            datastore: "datastore1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn plain_strategy_without_policy_fields() {
        let disk = VirtualDisk::new(
            "[datastore1] kubevols/pv-1.vmdk".to_string(),
            options(),
            VmOptions::default(),
        )
        .unwrap();
        assert_eq!(disk.create_strategy, DiskStrategy::Plain);
    }

    #[test]
    fn policy_aware_strategy_with_policy_id() {
        let disk = VirtualDisk::new(
            "[datastore1] kubevols/pv-1.vmdk".to_string(),
            VolumeOptions {
                storage_policy_id: Some("policy-22".to_string()),
                ..options()
            },
            VmOptions::default(),
        )
        .unwrap();
        assert_eq!(disk.create_strategy, DiskStrategy::PolicyAware);
    }

    #[test]
    fn policy_aware_strategy_with_vsan_data() {
        let disk = VirtualDisk::new(
            "[vsanDatastore] kubevols/pv-1.vmdk".to_string(),
            VolumeOptions {
                vsan_storage_profile_data: Some(
                    "(\"hostFailuresToTolerate\" i1)".to_string(),
                ),
                ..options()
            },
            VmOptions::default(),
        )
        .unwrap();
        assert_eq!(disk.create_strategy, DiskStrategy::PolicyAware);
    }

    #[test]
    fn conflicting_policy_fields_rejected() {
        let err = VirtualDisk::new(
            "[datastore1] kubevols/pv-1.vmdk".to_string(),
            VolumeOptions {
                storage_policy_name: Some("gold".to_string()),
                storage_policy_id: Some("policy-22".to_string()),
                ..options()
            },
            VmOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration { .. }));
    }

    #[test]
    fn non_positive_capacity_rejected() {
        let err = VirtualDisk::new(
            "[datastore1] kubevols/pv-1.vmdk".to_string(),
            VolumeOptions {
                capacity_kb: 0,
                ..options()
            },
            VmOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration { .. }));
    }
}
