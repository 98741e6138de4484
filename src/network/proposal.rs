use super::proto::{
    ChaincodeAction, ChaincodeActionPayload, ChaincodeHeaderExtension, ChaincodeId,
    ChaincodeInput, ChaincodeInvocationSpec, ChaincodeProposalPayload, ChaincodeSpec,
    ChannelHeader, Envelope, HEADER_TYPE_ENDORSER_TRANSACTION, Header, Payload, Proposal,
    ProposalResponsePayload, SerializedIdentity, SignatureHeader, SignedProposal, Transaction,
};
use crate::crypto::IdentitySigner;
use crate::error::GatewayError;
use chrono::Utc;
use prost::Message;
use rand::RngCore;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 24;

/// Signed proposal together with the transaction ID derived for it.
pub struct PreparedProposal {
    pub transaction_id: String,
    pub signed: SignedProposal,
}

pub fn serialize_identity(msp_id: &str, certificate_pem: &str) -> Vec<u8> {
    SerializedIdentity {
        mspid: msp_id.to_string(),
        id_bytes: certificate_pem.as_bytes().to_vec(),
    }
    .encode_to_vec()
}

/// `hex(sha256(nonce || creator))`
pub fn transaction_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

pub fn new_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

pub struct ProposalBuilder<'a> {
    pub creator: &'a [u8],
    pub channel: &'a str,
    pub chaincode: &'a str,
}

impl ProposalBuilder<'_> {
    pub fn build(&self, nonce: Vec<u8>, function: &str, args: &[String]) -> (String, Proposal) {
        let tx_id = transaction_id(&nonce, self.creator);
        let chaincode_id = ChaincodeId {
            name: self.chaincode.to_string(),
            ..Default::default()
        };

        let now = Utc::now();
        let channel_header = ChannelHeader {
            r#type: HEADER_TYPE_ENDORSER_TRANSACTION,
            timestamp: Some(prost_types::Timestamp {
                seconds: now.timestamp(),
                nanos: now.timestamp_subsec_nanos() as i32,
            }),
            channel_id: self.channel.to_string(),
            tx_id: tx_id.clone(),
            extension: ChaincodeHeaderExtension {
                chaincode_id: Some(chaincode_id.clone()),
            }
            .encode_to_vec(),
            ..Default::default()
        };
        let signature_header = SignatureHeader {
            creator: self.creator.to_vec(),
            nonce,
        };
        let header = Header {
            channel_header: channel_header.encode_to_vec(),
            signature_header: signature_header.encode_to_vec(),
        };

        let mut input_args = Vec::with_capacity(args.len() + 1);
        input_args.push(function.as_bytes().to_vec());
        input_args.extend(args.iter().map(|arg| arg.as_bytes().to_vec()));

        let invocation = ChaincodeInvocationSpec {
            chaincode_spec: Some(ChaincodeSpec {
                chaincode_id: Some(chaincode_id),
                input: Some(ChaincodeInput {
                    args: input_args,
                    ..Default::default()
                }),
                ..Default::default()
            }),
        };
        let payload = ChaincodeProposalPayload {
            input: invocation.encode_to_vec(),
            ..Default::default()
        };

        let proposal = Proposal {
            header: header.encode_to_vec(),
            payload: payload.encode_to_vec(),
            extension: Vec::new(),
        };
        (tx_id, proposal)
    }

    pub fn build_signed(
        &self,
        signer: &IdentitySigner,
        function: &str,
        args: &[String],
    ) -> PreparedProposal {
        let (transaction_id, proposal) = self.build(new_nonce(), function, args);
        let proposal_bytes = proposal.encode_to_vec();
        let signature = signer.sign(&proposal_bytes);
        PreparedProposal {
            transaction_id,
            signed: SignedProposal {
                proposal_bytes,
                signature,
            },
        }
    }
}

/// Chaincode response payload carried inside an endorsed transaction envelope.
pub fn transaction_result(envelope: &Envelope) -> Result<Vec<u8>, GatewayError> {
    let payload = Payload::decode(envelope.payload.as_slice())?;
    let transaction = Transaction::decode(payload.data.as_slice())?;
    let action = transaction
        .actions
        .first()
        .ok_or_else(|| GatewayError::Malformed("transaction has no actions".to_string()))?;

    let action_payload = ChaincodeActionPayload::decode(action.payload.as_slice())?;
    let endorsed = action_payload
        .action
        .ok_or_else(|| GatewayError::Malformed("missing endorsed action".to_string()))?;
    let response_payload =
        ProposalResponsePayload::decode(endorsed.proposal_response_payload.as_slice())?;
    let chaincode_action = ChaincodeAction::decode(response_payload.extension.as_slice())?;

    Ok(chaincode_action
        .response
        .map(|response| response.payload)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::proto::{ChaincodeEndorsedAction, Response, TransactionAction};

    fn builder<'a>(creator: &'a [u8]) -> ProposalBuilder<'a> {
        ProposalBuilder {
            creator,
            channel: "mychannel",
            chaincode: "basic",
        }
    }

    #[test]
    fn transaction_id_hashes_nonce_then_creator() {
        let nonce = b"nonce";
        let creator = b"creator";
        let expected = hex::encode(Sha256::digest(b"noncecreator"));
        assert_eq!(transaction_id(nonce, creator), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn proposal_carries_function_and_args_in_order() {
        let creator = serialize_identity("Org1MSP", "CERT");
        let nonce = vec![7u8; NONCE_LEN];
        let args = vec!["CAR1".to_string(), "PERSON2".to_string(), "true".to_string()];

        let (tx_id, proposal) = builder(&creator).build(nonce.clone(), "TransferCarAsset", &args);
        assert_eq!(tx_id, transaction_id(&nonce, &creator));

        let header = Header::decode(proposal.header.as_slice()).unwrap();
        let channel_header = ChannelHeader::decode(header.channel_header.as_slice()).unwrap();
        assert_eq!(channel_header.r#type, HEADER_TYPE_ENDORSER_TRANSACTION);
        assert_eq!(channel_header.channel_id, "mychannel");
        assert_eq!(channel_header.tx_id, tx_id);
        let extension = ChaincodeHeaderExtension::decode(channel_header.extension.as_slice()).unwrap();
        assert_eq!(extension.chaincode_id.unwrap().name, "basic");

        let signature_header = SignatureHeader::decode(header.signature_header.as_slice()).unwrap();
        assert_eq!(signature_header.creator, creator);
        assert_eq!(signature_header.nonce, nonce);
        let identity = SerializedIdentity::decode(signature_header.creator.as_slice()).unwrap();
        assert_eq!(identity.mspid, "Org1MSP");

        let payload = ChaincodeProposalPayload::decode(proposal.payload.as_slice()).unwrap();
        let invocation = ChaincodeInvocationSpec::decode(payload.input.as_slice()).unwrap();
        let input = invocation.chaincode_spec.unwrap().input.unwrap();
        let decoded: Vec<String> = input
            .args
            .into_iter()
            .map(|arg| String::from_utf8(arg).unwrap())
            .collect();
        assert_eq!(decoded, ["TransferCarAsset", "CAR1", "PERSON2", "true"]);
    }

    #[test]
    fn fresh_nonce_per_proposal() {
        assert_ne!(new_nonce(), new_nonce());
        assert_eq!(new_nonce().len(), NONCE_LEN);
    }

    fn envelope_with_response(payload: &[u8]) -> Envelope {
        let chaincode_action = ChaincodeAction {
            response: Some(Response {
                status: 200,
                message: String::new(),
                payload: payload.to_vec(),
            }),
            ..Default::default()
        };
        let response_payload = ProposalResponsePayload {
            proposal_hash: vec![1, 2, 3],
            extension: chaincode_action.encode_to_vec(),
        };
        let action_payload = ChaincodeActionPayload {
            chaincode_proposal_payload: Vec::new(),
            action: Some(ChaincodeEndorsedAction {
                proposal_response_payload: response_payload.encode_to_vec(),
            }),
        };
        let transaction = Transaction {
            actions: vec![TransactionAction {
                header: Vec::new(),
                payload: action_payload.encode_to_vec(),
            }],
        };
        Envelope {
            payload: Payload {
                header: None,
                data: transaction.encode_to_vec(),
            }
            .encode_to_vec(),
            signature: Vec::new(),
        }
    }

    #[test]
    fn extracts_result_from_prepared_transaction() {
        let envelope = envelope_with_response(br#"{"ID":"CAR1"}"#);
        assert_eq!(transaction_result(&envelope).unwrap(), br#"{"ID":"CAR1"}"#);
    }

    #[test]
    fn transaction_without_actions_is_malformed() {
        let envelope = Envelope {
            payload: Payload {
                header: None,
                data: Transaction { actions: vec![] }.encode_to_vec(),
            }
            .encode_to_vec(),
            signature: Vec::new(),
        };
        assert!(matches!(
            transaction_result(&envelope),
            Err(GatewayError::Malformed(_))
        ));
    }
}
