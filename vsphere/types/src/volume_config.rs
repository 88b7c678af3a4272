use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use std::env;

/// File extension carried by virtual disk descriptor files.
pub const VMDK_EXTENSION: &str = ".vmdk";

/// SCSI controller bus types that may host an attached virtual disk.
///
/// The wire strings (`buslogic`, `lsilogic`, `lsilogic-sas`, `pvscsi`) are the
/// values vCenter reports for the corresponding controller device classes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerType {
    Buslogic,
    Lsilogic,
    LsilogicSas,
    Pvscsi,
}

impl Default for ControllerType {
    fn default() -> Self {
        // Paravirtual controllers avoid SCSI rescans in the guest.
        Self::Pvscsi
    }
}

derive_display_from_serialize!(ControllerType);
derive_fromstr_from_deserialize!(ControllerType);

impl ControllerType {
    /// The accepted wire strings, for error messages.
    pub fn valid_options() -> &'static [&'static str] {
        &["buslogic", "lsilogic", "lsilogic-sas", "pvscsi"]
    }
}

/// Provisioning format for a newly created virtual disk.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    Thin,
    ZeroedThick,
    EagerZeroedThick,
}

impl Default for DiskFormat {
    fn default() -> Self {
        Self::Thin
    }
}

derive_display_from_serialize!(DiskFormat);
derive_fromstr_from_deserialize!(DiskFormat);

/// User-supplied options for provisioning a persistent volume disk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeOptions {
    /// Requested disk capacity in kibibytes.
    pub capacity_kb: i64,

    /// Volume name, used to derive the disk file name.
    pub name: String,

    #[serde(default)]
    pub disk_format: DiskFormat,

    /// Name of the datastore the disk lives in.
    pub datastore: String,

    /// SPBM storage policy referenced by name. Mutually exclusive with
    /// `storage_policy_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_policy_name: Option<String>,

    /// SPBM storage policy referenced by ID. Mutually exclusive with
    /// `storage_policy_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_policy_id: Option<String>,

    /// Raw VSAN storage capability profile data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsan_storage_profile_data: Option<String>,

    #[serde(default)]
    pub scsi_controller_type: ControllerType,
}

fn is_set(field: &Option<String>) -> bool {
    field.as_deref().map_or(false, |value| !value.is_empty())
}

impl VolumeOptions {
    /// True when disk creation must go through the policy-aware manager.
    pub fn requires_storage_policy(&self) -> bool {
        is_set(&self.storage_policy_name)
            || is_set(&self.storage_policy_id)
            || is_set(&self.vsan_storage_profile_data)
    }

    /// True when both a policy name and a policy ID were supplied. Callers
    /// must reject this before reaching the remote endpoint.
    pub fn conflicting_policy_fields(&self) -> bool {
        is_set(&self.storage_policy_name) && is_set(&self.storage_policy_id)
    }
}

/// Placement for the throwaway VM used by policy-aware disk creation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmOptions {
    pub resource_pool: String,
    pub folder: String,
}

/// vCenter endpoint configuration, read from `VSPHERE_*` environment
/// variables by the embedding process.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VSphereConfig {
    pub vcenter_ip: String,
    pub user: String,
    pub password: String,
    pub datacenter: String,
    pub datastore: String,
    pub working_dir: String,
    pub vm_name: String,
    pub insecure_flag: bool,
}

impl VSphereConfig {
    pub fn from_env() -> Self {
        Self {
            vcenter_ip: env::var("VSPHERE_VCENTER").unwrap_or_default(),
            user: env::var("VSPHERE_USER").unwrap_or_default(),
            password: env::var("VSPHERE_PASSWORD").unwrap_or_default(),
            datacenter: env::var("VSPHERE_DATACENTER").unwrap_or_default(),
            datastore: env::var("VSPHERE_DATASTORE").unwrap_or_default(),
            working_dir: env::var("VSPHERE_WORKING_DIR").unwrap_or_default(),
            vm_name: env::var("VSPHERE_VM_NAME").unwrap_or_default(),
            insecure_flag: env::var("VSPHERE_INSECURE")
                .map(|value| value.to_lowercase() == "true")
                .unwrap_or(false),
        }
    }
}
