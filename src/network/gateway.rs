use crate::error::GatewayError;
use async_trait::async_trait;

/// Transaction calls against a deployed chaincode.
#[async_trait]
pub trait Contract: Send + Sync {
    /// Endorses, orders and commits a ledger-mutating transaction.
    async fn submit_transaction(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<Vec<u8>, GatewayError>;

    /// Runs a read-only query against current ledger state.
    async fn evaluate_transaction(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<Vec<u8>, GatewayError>;
}
