use super::gateway::Contract;
use super::profile::{ConnectionProfile, PeerEndpoint};
use super::proposal::{ProposalBuilder, serialize_identity, transaction_result};
use super::proto::{
    CommitStatusRequest, CommitStatusResponse, EndorseRequest, EndorseResponse, EvaluateRequest,
    EvaluateResponse, SignedCommitStatusRequest, SubmitRequest, SubmitResponse,
    TX_VALIDATION_CODE_VALID,
};
use crate::crypto::IdentitySigner;
use crate::error::{ClientError, GatewayError};
use crate::identity::FileSystemWallet;
use async_trait::async_trait;
use prost::Message;
use std::path::Path;
use std::sync::Arc;
use tokio::time::Duration;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

const EVALUATE: &str = "/gateway.Gateway/Evaluate";
const ENDORSE: &str = "/gateway.Gateway/Endorse";
const SUBMIT: &str = "/gateway.Gateway/Submit";
const COMMIT_STATUS: &str = "/gateway.Gateway/CommitStatus";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct GatewayClient {
    grpc: Grpc<Channel>,
}

impl GatewayClient {
    async fn unary<Req, Resp>(&self, request: Req, method: &'static str) -> Result<Resp, GatewayError>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.grpc.clone();
        grpc.ready().await?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(method),
                codec,
            )
            .await?;
        Ok(response.into_inner())
    }
}

struct Session {
    client: GatewayClient,
    signer: IdentitySigner,
    creator: Vec<u8>,
}

/// Connection to a Fabric Gateway peer on behalf of one wallet identity.
pub struct Gateway {
    session: Arc<Session>,
    endpoint: PeerEndpoint,
}

impl Gateway {
    pub async fn connect(
        wallet: &FileSystemWallet,
        label: &str,
        profile_path: &Path,
        discovery_as_localhost: bool,
    ) -> Result<Self, ClientError> {
        let identity = wallet.get(label)?;
        let signer = IdentitySigner::from_pkcs8_pem(identity.private_key())
            .map_err(ClientError::SessionConnect)?;

        let profile =
            ConnectionProfile::from_file(profile_path).map_err(ClientError::SessionConnect)?;
        if let Some(name) = &profile.name {
            log::info!("using connection profile {}", name);
        }
        if let Some(mspid) = profile.client_msp_id() {
            if mspid != identity.msp_id {
                log::warn!(
                    "identity {} belongs to {}, profile client organization is {}",
                    label,
                    identity.msp_id,
                    mspid
                );
            }
        }

        let endpoint = profile
            .endpoint(discovery_as_localhost)
            .map_err(ClientError::SessionConnect)?;
        let channel = dial(&endpoint).await.map_err(ClientError::SessionConnect)?;
        log::info!("connected to gateway peer {} at {}", endpoint.name, endpoint.uri);

        Ok(Self {
            session: Arc::new(Session {
                client: GatewayClient {
                    grpc: Grpc::new(channel),
                },
                signer,
                creator: serialize_identity(&identity.msp_id, identity.certificate()),
            }),
            endpoint,
        })
    }

    pub fn network(&self, channel: &str) -> Result<Network, ClientError> {
        if channel.is_empty() {
            return Err(ClientError::SessionConnect(GatewayError::Profile(
                "channel name is empty".to_string(),
            )));
        }
        Ok(Network {
            session: self.session.clone(),
            channel: channel.to_string(),
        })
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        log::info!("closing gateway connection to {}", self.endpoint.name);
    }
}

async fn dial(endpoint: &PeerEndpoint) -> Result<Channel, GatewayError> {
    let mut builder = Endpoint::from_shared(endpoint.uri.clone())?.connect_timeout(CONNECT_TIMEOUT);
    if let Some(timeout) = endpoint.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(pem) = &endpoint.tls_ca_pem {
        let tls = ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(pem))
            .domain_name(endpoint.server_name.clone());
        builder = builder.tls_config(tls)?;
    }
    Ok(builder.connect().await?)
}

/// A channel of the ledger network.
pub struct Network {
    session: Arc<Session>,
    channel: String,
}

impl Network {
    pub fn contract(&self, chaincode: &str) -> FabricContract {
        FabricContract {
            session: self.session.clone(),
            channel: self.channel.clone(),
            chaincode: chaincode.to_string(),
        }
    }
}

pub struct FabricContract {
    session: Arc<Session>,
    channel: String,
    chaincode: String,
}

impl FabricContract {
    fn proposal_builder(&self) -> ProposalBuilder<'_> {
        ProposalBuilder {
            creator: &self.session.creator,
            channel: &self.channel,
            chaincode: &self.chaincode,
        }
    }

    async fn commit_status(&self, tx_id: &str) -> Result<CommitStatusResponse, GatewayError> {
        let request = CommitStatusRequest {
            transaction_id: tx_id.to_string(),
            channel_id: self.channel.clone(),
            identity: self.session.creator.clone(),
        }
        .encode_to_vec();
        let signature = self.session.signer.sign(&request);

        self.session
            .client
            .unary(SignedCommitStatusRequest { request, signature }, COMMIT_STATUS)
            .await
    }
}

#[async_trait]
impl Contract for FabricContract {
    async fn submit_transaction(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<Vec<u8>, GatewayError> {
        let proposal = self
            .proposal_builder()
            .build_signed(&self.session.signer, name, args);
        let tx_id = proposal.transaction_id.clone();
        log::debug!("endorsing {} as {}", name, tx_id);

        let endorsed: EndorseResponse = self
            .session
            .client
            .unary(
                EndorseRequest {
                    transaction_id: tx_id.clone(),
                    channel_id: self.channel.clone(),
                    proposed_transaction: Some(proposal.signed),
                    endorsing_organizations: Vec::new(),
                },
                ENDORSE,
            )
            .await?;
        let mut envelope = endorsed.prepared_transaction.ok_or_else(|| {
            GatewayError::Malformed("endorse response has no prepared transaction".to_string())
        })?;
        let result = transaction_result(&envelope)?;
        envelope.signature = self.session.signer.sign(&envelope.payload);

        let _: SubmitResponse = self
            .session
            .client
            .unary(
                SubmitRequest {
                    transaction_id: tx_id.clone(),
                    channel_id: self.channel.clone(),
                    prepared_transaction: Some(envelope),
                },
                SUBMIT,
            )
            .await?;

        let status = self.commit_status(&tx_id).await?;
        check_commit(&status, &tx_id)?;
        log::debug!("{} committed in block {}", tx_id, status.block_number);

        Ok(result)
    }

    async fn evaluate_transaction(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<Vec<u8>, GatewayError> {
        let proposal = self
            .proposal_builder()
            .build_signed(&self.session.signer, name, args);
        log::debug!("evaluating {} as {}", name, proposal.transaction_id);

        let response: EvaluateResponse = self
            .session
            .client
            .unary(
                EvaluateRequest {
                    transaction_id: proposal.transaction_id,
                    channel_id: self.channel.clone(),
                    proposed_transaction: Some(proposal.signed),
                    target_organizations: Vec::new(),
                },
                EVALUATE,
            )
            .await?;

        evaluate_result(response)
    }
}

/// Anything but a `VALID` validation code means the transaction was not applied.
fn check_commit(status: &CommitStatusResponse, tx_id: &str) -> Result<(), GatewayError> {
    if status.result != TX_VALIDATION_CODE_VALID {
        return Err(GatewayError::Commit {
            tx_id: tx_id.to_string(),
            code: status.result,
        });
    }
    Ok(())
}

fn evaluate_result(response: EvaluateResponse) -> Result<Vec<u8>, GatewayError> {
    response
        .result
        .map(|result| result.payload)
        .ok_or_else(|| GatewayError::Malformed("evaluate response has no result".to_string()))
}
