use crate::error::GatewayError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Network connection profile as written by the test network scripts.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub client: Option<ClientSection>,
    #[serde(default)]
    pub organizations: HashMap<String, OrganizationSection>,
    #[serde(default)]
    pub peers: HashMap<String, PeerSection>,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSection {
    pub organization: Option<String>,
    #[serde(default)]
    pub connection: Option<ConnectionSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSection {
    #[serde(default)]
    pub timeout: Option<TimeoutSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSection {
    #[serde(default)]
    pub peer: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationSection {
    pub mspid: Option<String>,
    #[serde(default)]
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSection {
    pub url: String,
    #[serde(rename = "tlsCACerts", default)]
    pub tls_ca_certs: Option<TlsCaCerts>,
    #[serde(default)]
    pub grpc_options: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsCaCerts {
    pub pem: Option<String>,
    pub path: Option<PathBuf>,
}

/// Where and how to dial the gateway peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerEndpoint {
    pub name: String,
    pub uri: String,
    pub tls_ca_pem: Option<Vec<u8>>,
    pub server_name: String,
    pub timeout: Option<Duration>,
}

impl ConnectionProfile {
    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        let data = fs::read(path).map_err(|e| {
            GatewayError::Profile(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut profile = Self::from_slice(&data)?;
        profile.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(profile)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(data).map_err(|e| GatewayError::Profile(e.to_string()))
    }

    fn client_organization(&self) -> Option<&OrganizationSection> {
        let org = self.client.as_ref()?.organization.as_ref()?;
        self.organizations.get(org)
    }

    pub fn client_msp_id(&self) -> Option<&str> {
        self.client_organization()?.mspid.as_deref()
    }

    /// First peer of the client's organization, or the first declared peer.
    fn gateway_peer(&self) -> Result<(&str, &PeerSection), GatewayError> {
        let org_peer = self
            .client_organization()
            .and_then(|org| org.peers.first())
            .and_then(|name| self.peers.get_key_value(name));

        let fallback = || {
            let mut names: Vec<&String> = self.peers.keys().collect();
            names.sort();
            names
                .first()
                .and_then(|name| self.peers.get_key_value(name.as_str()))
        };

        org_peer
            .or_else(fallback)
            .map(|(name, peer)| (name.as_str(), peer))
            .ok_or_else(|| GatewayError::Profile("no peers defined".to_string()))
    }

    fn endorser_timeout(&self) -> Option<Duration> {
        let value = self
            .client
            .as_ref()?
            .connection
            .as_ref()?
            .timeout
            .as_ref()?
            .peer
            .get("endorser")?;
        let secs = match value {
            serde_json::Value::String(s) => s.parse::<u64>().ok()?,
            serde_json::Value::Number(n) => n.as_u64()?,
            _ => return None,
        };
        Some(Duration::from_secs(secs))
    }

    fn tls_ca_pem(&self, peer: &PeerSection) -> Result<Option<Vec<u8>>, GatewayError> {
        let Some(certs) = &peer.tls_ca_certs else {
            return Ok(None);
        };
        if let Some(pem) = &certs.pem {
            return Ok(Some(pem.as_bytes().to_vec()));
        }
        match &certs.path {
            Some(path) => {
                let path = self.base_dir.join(path);
                fs::read(&path).map(Some).map_err(|e| {
                    GatewayError::Profile(format!("cannot read TLS CA {}: {e}", path.display()))
                })
            }
            None => Ok(None),
        }
    }

    pub fn endpoint(&self, discovery_as_localhost: bool) -> Result<PeerEndpoint, GatewayError> {
        let (name, peer) = self.gateway_peer()?;

        let (tls, authority) = if let Some(rest) = peer.url.strip_prefix("grpcs://") {
            (true, rest)
        } else if let Some(rest) = peer.url.strip_prefix("grpc://") {
            (false, rest)
        } else {
            return Err(GatewayError::Profile(format!(
                "unsupported peer url {}",
                peer.url
            )));
        };

        let (host, port) = authority.rsplit_once(':').ok_or_else(|| {
            GatewayError::Profile(format!("peer url {} has no port", peer.url))
        })?;

        let server_name = ["ssl-target-name-override", "hostnameOverride"]
            .iter()
            .find_map(|key| peer.grpc_options.get(*key).and_then(|v| v.as_str()))
            .unwrap_or(host)
            .to_string();

        let dial_host = if discovery_as_localhost { "localhost" } else { host };
        let scheme = if tls { "https" } else { "http" };
        let tls_ca_pem = if tls {
            let pem = self.tls_ca_pem(peer)?.ok_or_else(|| {
                GatewayError::Profile(format!("peer {name} uses grpcs but declares no tlsCACerts"))
            })?;
            Some(pem)
        } else {
            None
        };

        Ok(PeerEndpoint {
            name: name.to_string(),
            uri: format!("{scheme}://{dial_host}:{port}"),
            tls_ca_pem,
            server_name,
            timeout: self.endorser_timeout(),
        })
    }
}
