/*!

`vsphere-types` holds the serde-typed configuration shared by components that
provision and attach vSphere virtual disks: volume provisioning options,
controller and disk-format identifiers, and the vCenter endpoint configuration
read from the environment.

!*/

pub mod volume_config;

pub use volume_config::{
    ControllerType, DiskFormat, VSphereConfig, VmOptions, VolumeOptions, VMDK_EXTENSION,
};
