use serde::{Deserialize, Serialize};

pub const X509_IDENTITY_TYPE: &str = "X.509";

/// Credential stored in the wallet under a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X509Identity {
    pub version: u32,
    pub msp_id: String,
    #[serde(rename = "type")]
    pub identity_type: String,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub certificate: String,
    pub private_key: String,
}

impl X509Identity {
    pub fn new(msp_id: String, certificate: String, private_key: String) -> Self {
        Self {
            version: 1,
            msp_id,
            identity_type: X509_IDENTITY_TYPE.to_string(),
            credentials: Credentials {
                certificate,
                private_key,
            },
        }
    }

    pub fn certificate(&self) -> &str {
        &self.credentials.certificate
    }

    pub fn private_key(&self) -> &str {
        &self.credentials.private_key
    }
}
