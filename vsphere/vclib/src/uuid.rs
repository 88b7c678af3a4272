//! Normalization of the identifiers vSphere reports for machines and disk
//! backings into the canonical dashed hex form (8-4-4-4-12).

use crate::error::{self, Result};
use snafu::{ensure, OptionExt, ResultExt};
use std::fs;
use std::path::Path;
use ::uuid::Uuid;

/// Vendor prefix on the BIOS UUID the platform reports for a VMware guest.
pub const VMWARE_UUID_PREFIX: &str = "VMware-";

/// Where the platform exposes the machine's BIOS UUID.
pub const PRODUCT_SERIAL_PATH: &str = "/sys/class/dmi/id/product_serial";

/// Normalizes a platform-reported machine identifier.
///
/// The raw value must carry the `VMware-` prefix; the remainder must hold
/// exactly 32 hex digits once spaces and hyphens are stripped.
pub fn normalize_vm_uuid(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let payload =
        trimmed
            .strip_prefix(VMWARE_UUID_PREFIX)
            .context(error::MalformedIdentifierSnafu {
                raw: trimmed,
                reason: format!("missing '{}' prefix", VMWARE_UUID_PREFIX),
            })?;
    canonicalize(trimmed, payload)
}

/// Reformats a disk backing identifier already in loosely-hyphenated form.
pub fn format_disk_uuid(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    canonicalize(trimmed, trimmed)
}

/// Reads the machine identifier from the platform serial file and
/// normalizes it.
pub fn read_local_vm_uuid<P: AsRef<Path>>(path: P) -> Result<String> {
    let raw = fs::read_to_string(path.as_ref()).context(error::FileReadSnafu {
        path: path.as_ref().display().to_string(),
    })?;
    normalize_vm_uuid(&raw)
}

fn canonicalize(original: &str, payload: &str) -> Result<String> {
    let hex: String = payload
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    ensure!(
        hex.len() == 32,
        error::MalformedIdentifierSnafu {
            raw: original,
            reason: format!("expected 32 hex digits, found {}", hex.len()),
        }
    );
    let parsed = Uuid::try_parse(&hex)
        .ok()
        .context(error::MalformedIdentifierSnafu {
            raw: original,
            reason: "non-hex digits in identifier",
        })?;
    Ok(parsed.hyphenated().to_string())
}

#[cfg(test)]
mod test {
    use super::{format_disk_uuid, normalize_vm_uuid, read_local_vm_uuid};
    use crate::error::Error;
    use std::io::Write;

    #[test]
    fn normalize_vm_uuid_canonical_form() {
        let uuid =
            normalize_vm_uuid("VMware-56 4d 39 5e d8 07 e1 8a-cb 25 b7 9f 65 eb 2b 9f\n").unwrap();
        assert_eq!(uuid, "564d395e-d807-e18a-cb25-b79f65eb2b9f");
        assert_eq!(uuid.len(), 36);
    }

    #[test]
    fn normalize_vm_uuid_requires_prefix() {
        let err = normalize_vm_uuid("56 4d 39 5e d8 07 e1 8a-cb 25 b7 9f 65 eb 2b 9f")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
    }

    #[test]
    fn normalize_vm_uuid_rejects_short_payload() {
        let err = normalize_vm_uuid("VMware-56 4d 39 5e").unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
    }

    #[test]
    fn normalize_vm_uuid_rejects_non_hex() {
        let err =
            normalize_vm_uuid("VMware-zz 4d 39 5e d8 07 e1 8a-cb 25 b7 9f 65 eb 2b 9f")
                .unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
    }

    #[test]
    fn format_disk_uuid_reflows_hyphens() {
        let uuid = format_disk_uuid("6000C298-a4ac-4d92-a855-d4f8c8e0de11").unwrap();
        assert_eq!(uuid, "6000c298-a4ac-4d92-a855-d4f8c8e0de11");
    }

    #[test]
    fn format_disk_uuid_idempotent_over_own_output() {
        let first =
            format_disk_uuid("60 00 C2 98 a4 ac 4d 92-a8 55 d4 f8 c8 e0 de 11").unwrap();
        let second = format_disk_uuid(&first).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn read_local_vm_uuid_from_platform_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "VMware-56 4d 39 5e d8 07 e1 8a-cb 25 b7 9f 65 eb 2b 9f"
        )
        .unwrap();
        let uuid = read_local_vm_uuid(file.path()).unwrap();
        assert_eq!(uuid, "564d395e-d807-e18a-cb25-b79f65eb2b9f");
    }

    #[test]
    fn read_local_vm_uuid_missing_file() {
        let err = read_local_vm_uuid("/nonexistent/product_serial").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn format_disk_uuid_rejects_wrong_length() {
        assert!(matches!(
            format_disk_uuid("6000C298-a4ac").unwrap_err(),
            Error::MalformedIdentifier { .. }
        ));
    }
}
