use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage provider selected once per deployment by `STORAGE_PROVIDER`.
///
/// `BlobA` is the S3-compatible object store, `BlobB` the Azure Blob store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StorageProvider {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "blobA")]
    BlobA,
    #[serde(rename = "blobB")]
    BlobB,
}

impl FromStr for StorageProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageProvider::Local),
            "bloba" | "s3" => Ok(StorageProvider::BlobA),
            "blobb" | "azure" => Ok(StorageProvider::BlobB),
            _ => Err(anyhow::anyhow!("Invalid storage provider: {}", s)),
        }
    }
}

impl Display for StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageProvider::Local => write!(f, "local"),
            StorageProvider::BlobA => write!(f, "blobA"),
            StorageProvider::BlobB => write!(f, "blobB"),
        }
    }
}
