use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the ledger gateway session.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("gateway returned {}: {}", .0.code(), .0.message())]
    Status(#[from] tonic::Status),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid connection profile: {0}")]
    Profile(String),

    #[error("transaction {tx_id} failed to commit with validation code {code}")]
    Commit { tx_id: String, code: i32 },
}

impl From<prost::DecodeError> for GatewayError {
    fn from(err: prost::DecodeError) -> Self {
        GatewayError::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BootstrapIo,
    BootstrapFormat,
    SessionConnect,
    LedgerSubmit,
    LedgerEvaluate,
    InputParse,
    Console,
}

impl ErrorKind {
    /// Fatal kinds abort startup; the rest are reported and the menu continues.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::BootstrapIo
                | ErrorKind::BootstrapFormat
                | ErrorKind::SessionConnect
                | ErrorKind::Console
        )
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{}: {source}", .path.display())]
    BootstrapIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    BootstrapFormat(String),

    #[error(transparent)]
    SessionConnect(GatewayError),

    #[error("failed to submit transaction: {0}")]
    LedgerSubmit(#[source] GatewayError),

    #[error("failed to evaluate transaction: {0}")]
    LedgerEvaluate(#[source] GatewayError),

    #[error("invalid input: {0}")]
    InputParse(String),

    #[error("console error: {0}")]
    Console(#[from] io::Error),
}

impl ClientError {
    pub fn bootstrap_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ClientError::BootstrapIo {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::BootstrapIo { .. } => ErrorKind::BootstrapIo,
            ClientError::BootstrapFormat(_) => ErrorKind::BootstrapFormat,
            ClientError::SessionConnect(_) => ErrorKind::SessionConnect,
            ClientError::LedgerSubmit(_) => ErrorKind::LedgerSubmit,
            ClientError::LedgerEvaluate(_) => ErrorKind::LedgerEvaluate,
            ClientError::InputParse(_) => ErrorKind::InputParse,
            ClientError::Console(_) => ErrorKind::Console,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_are_recoverable() {
        let submit = ClientError::LedgerSubmit(GatewayError::Status(tonic::Status::unavailable(
            "peer down",
        )));
        assert_eq!(submit.kind(), ErrorKind::LedgerSubmit);
        assert!(!submit.kind().is_fatal());
        assert!(!ErrorKind::InputParse.is_fatal());
        assert!(!ErrorKind::LedgerEvaluate.is_fatal());
    }

    #[test]
    fn startup_errors_are_fatal() {
        let err = ClientError::bootstrap_io(
            "cert.pem",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.kind(), ErrorKind::BootstrapIo);
        assert!(err.kind().is_fatal());
        assert!(ErrorKind::SessionConnect.is_fatal());
        assert!(ErrorKind::BootstrapFormat.is_fatal());
    }

    #[test]
    fn connect_failure_reads_once_under_startup_context() {
        let err = ClientError::SessionConnect(GatewayError::Profile("no peers".into()));
        assert_eq!(err.to_string(), "invalid connection profile: no peers");

        let report = anyhow::Error::new(err).context("Failed to connect to gateway");
        assert_eq!(
            format!("{report:#}"),
            "Failed to connect to gateway: invalid connection profile: no peers"
        );
    }

    #[test]
    fn wraps_cause_in_message() {
        let err = ClientError::LedgerEvaluate(GatewayError::Malformed("empty payload".into()));
        assert_eq!(
            err.to_string(),
            "failed to evaluate transaction: malformed response: empty payload"
        );
    }
}
