use super::wallet::FileSystemWallet;
use super::x509::X509Identity;
use crate::config::ClientConfig;
use crate::error::ClientError;
use std::fs;
use std::path::Path;

/// Raw certificate and private key read from an MSP directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCredentials {
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
}

/// Reads `signcerts/cert.pem` and the single file under `keystore/`.
pub fn read_credentials(msp_dir: &Path) -> Result<RawCredentials, ClientError> {
    let cert_path = msp_dir.join("signcerts").join("cert.pem");
    let certificate = fs::read(&cert_path).map_err(|e| ClientError::bootstrap_io(&cert_path, e))?;

    let key_dir = msp_dir.join("keystore");
    let entries = fs::read_dir(&key_dir).map_err(|e| ClientError::bootstrap_io(&key_dir, e))?;
    let mut key_files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ClientError::bootstrap_io(&key_dir, e))?;
        key_files.push(entry.path());
    }

    if key_files.len() != 1 {
        return Err(ClientError::BootstrapFormat(format!(
            "expected exactly one key file in {}, found {}",
            key_dir.display(),
            key_files.len()
        )));
    }

    let key_path = &key_files[0];
    let private_key = fs::read(key_path).map_err(|e| ClientError::bootstrap_io(key_path, e))?;

    Ok(RawCredentials {
        certificate,
        private_key,
    })
}

fn pem_text(bytes: Vec<u8>, what: &str) -> Result<String, ClientError> {
    String::from_utf8(bytes)
        .map_err(|_| ClientError::BootstrapFormat(format!("{what} is not valid PEM text")))
}

/// Inserts the organization's user credential into the wallet unless the
/// label is already present. Returns whether the wallet was populated.
pub fn ensure_identity(
    wallet: &FileSystemWallet,
    config: &ClientConfig,
) -> Result<bool, ClientError> {
    let label = config.user_label();
    if wallet.exists(&label) {
        log::debug!("identity {} already in wallet", label);
        return Ok(false);
    }

    let msp_dir = config.credential_dir();
    log::info!("populating wallet from {}", msp_dir.display());

    let raw = read_credentials(&msp_dir)?;
    let identity = X509Identity::new(
        config.msp_id(),
        pem_text(raw.certificate, "certificate")?,
        pem_text(raw.private_key, "private key")?,
    );
    wallet.put(&label, &identity)?;
    Ok(true)
}
