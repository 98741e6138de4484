use super::x509::X509Identity;
use crate::error::ClientError;
use std::fs;
use std::path::{Path, PathBuf};

const IDENTITY_EXTENSION: &str = "id";

/// Identity store keeping one JSON file per label.
#[derive(Debug, Clone)]
pub struct FileSystemWallet {
    dir: PathBuf,
}

impl FileSystemWallet {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ClientError::bootstrap_io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn identity_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.{IDENTITY_EXTENSION}"))
    }

    pub fn exists(&self, label: &str) -> bool {
        self.identity_path(label).is_file()
    }

    pub fn put(&self, label: &str, identity: &X509Identity) -> Result<(), ClientError> {
        let path = self.identity_path(label);
        let data = serde_json::to_vec(identity)
            .map_err(|e| ClientError::BootstrapFormat(format!("failed to encode identity: {e}")))?;

        // readers never observe a partially written identity
        let tmp = path.with_extension("id.tmp");
        fs::write(&tmp, data).map_err(|e| ClientError::bootstrap_io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| ClientError::bootstrap_io(&path, e))?;

        log::info!("stored identity {} in {}", label, self.dir.display());
        Ok(())
    }

    pub fn get(&self, label: &str) -> Result<X509Identity, ClientError> {
        let path = self.identity_path(label);
        let data = fs::read(&path).map_err(|e| ClientError::bootstrap_io(&path, e))?;
        serde_json::from_slice(&data).map_err(|e| {
            ClientError::BootstrapFormat(format!("invalid identity {}: {e}", path.display()))
        })
    }

    pub fn list(&self) -> Result<Vec<String>, ClientError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| ClientError::bootstrap_io(&self.dir, e))?;

        let mut labels = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ClientError::bootstrap_io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(IDENTITY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                labels.push(stem.to_string());
            }
        }
        labels.sort();
        Ok(labels)
    }
}
