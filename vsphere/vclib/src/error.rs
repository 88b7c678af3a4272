use crate::session::RemoteError;
use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by disk attach, detach and provisioning operations.
///
/// Local validation errors are returned before any remote call is made.
/// Remote failures are wrapped in [`Error::RemoteOperationFailed`] and
/// propagated unchanged after best-effort cleanup.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Malformed identifier '{}': {}", raw, reason))]
    MalformedIdentifier { raw: String, reason: String },

    #[snafu(display("Unsupported configuration: {}", message))]
    UnsupportedConfiguration { message: String },

    #[snafu(display("{}", message))]
    ResourceExhausted { message: String },

    #[snafu(display("{} not found", what))]
    NotFound { what: String },

    #[snafu(display("{} failed: {}", operation, source))]
    RemoteOperationFailed {
        operation: String,
        source: RemoteError,
    },

    #[snafu(display("Failed to read '{}': {}", path, source))]
    FileRead {
        path: String,
        source: std::io::Error,
    },
}
