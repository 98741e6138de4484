use std::env;
use std::path::PathBuf;

pub const DISCOVERY_AS_LOCALHOST: &str = "DISCOVERY_AS_LOCALHOST";

/// Organization, channel and filesystem layout the client runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub org: String,
    pub channel: String,
    pub chaincode: String,
    pub network_root: PathBuf,
    pub wallet_dir: PathBuf,
    pub discovery_as_localhost: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            org: "org1".to_string(),
            channel: "mychannel".to_string(),
            chaincode: "basic".to_string(),
            network_root: PathBuf::from("..").join("test-network"),
            wallet_dir: PathBuf::from("wallet"),
            discovery_as_localhost: true,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            org: lookup("LEDGER_ORG").unwrap_or(defaults.org),
            channel: lookup("LEDGER_CHANNEL").unwrap_or(defaults.channel),
            chaincode: lookup("LEDGER_CHAINCODE").unwrap_or(defaults.chaincode),
            network_root: lookup("LEDGER_NETWORK_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.network_root),
            wallet_dir: lookup("LEDGER_WALLET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.wallet_dir),
            discovery_as_localhost: lookup(DISCOVERY_AS_LOCALHOST)
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        }
    }

    /// `org1` -> `Org1MSP`
    pub fn msp_id(&self) -> String {
        let mut chars = self.org.chars();
        match chars.next() {
            Some(first) => format!("{}{}MSP", first.to_uppercase(), chars.as_str()),
            None => "MSP".to_string(),
        }
    }

    pub fn org_domain(&self) -> String {
        format!("{}.example.com", self.org)
    }

    pub fn user_label(&self) -> String {
        format!("User1@{}", self.org_domain())
    }

    fn org_dir(&self) -> PathBuf {
        self.network_root
            .join("organizations")
            .join("peerOrganizations")
            .join(self.org_domain())
    }

    pub fn credential_dir(&self) -> PathBuf {
        self.org_dir()
            .join("users")
            .join(self.user_label())
            .join("msp")
    }

    pub fn connection_profile_path(&self) -> PathBuf {
        self.org_dir().join(format!("connection-{}.json", self.org))
    }
}
