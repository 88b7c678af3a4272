//! Thin decorator over the remote datastore object: name, owning
//! datacenter, and datastore-path handling.

use crate::error::{self, Result};
use snafu::OptionExt;
use vsphere_types::VMDK_EXTENSION;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Datastore {
    pub name: String,
    pub datacenter: Option<String>,
}

impl Datastore {
    pub fn new<S: Into<String>>(name: S, datacenter: Option<String>) -> Self {
        Self {
            name: name.into(),
            datacenter,
        }
    }

    /// Builds a datastore path, `[name] relative/path.vmdk`.
    pub fn disk_path(&self, relative: &str) -> String {
        format!("[{}] {}", self.name, relative)
    }
}

/// Splits a datastore path into datastore name and relative file path.
pub fn parse_datastore_path(path: &str) -> Result<(String, String)> {
    let trimmed = path.trim();
    let rest = trimmed
        .strip_prefix('[')
        .context(error::UnsupportedConfigurationSnafu {
            message: format!("'{}' is not a datastore path", path),
        })?;
    let (name, relative) =
        rest.split_once("] ")
            .context(error::UnsupportedConfigurationSnafu {
                message: format!("'{}' is not a datastore path", path),
            })?;
    Ok((name.to_string(), relative.to_string()))
}

/// Appends the vmdk extension when the path lacks it. Disk lookups on the
/// remote side only resolve descriptor files.
pub fn ensure_vmdk_extension(path: &str) -> String {
    if !path.is_empty() && !path.ends_with(VMDK_EXTENSION) {
        format!("{}{}", path, VMDK_EXTENSION)
    } else {
        path.to_string()
    }
}
