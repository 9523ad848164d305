//! Flat-file store for the trading journal.
//!
//! Each collection lives in its own pretty-printed JSON file. Loading a file
//! that does not exist yields the empty default; anything unparsable is a
//! [`StoreError::Corrupt`]. Saves write a sibling temp file and rename it over
//! the target, so readers never observe a half-written file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, error, warn};

use crate::domain::entities::balance::Balance;
use crate::domain::entities::holding::Holding;
use crate::domain::entities::trade::{FuturesRecord, SpotTrade};

pub const SPOT_FILE: &str = "trading_data.json";
pub const FUTURES_FILE: &str = "futures_data.json";
pub const HOLDINGS_FILE: &str = "holdings_data.json";
pub const BALANCE_FILE: &str = "balance_data.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Journal files rooted at one data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    async fn load_or_default<T>(&self, file: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} not found, starting empty", path.display());
                return Ok(T::default());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|source| {
            error!("Failed to parse {}: {}", path.display(), source);
            StoreError::Corrupt { path, source }
        })
    }

    /// Serialize `value` into a temp file next to `file` without touching
    /// the file itself.
    async fn stage<T>(&self, file: &str, value: &T) -> Result<StagedWrite, StoreError>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path(file);
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;

        Ok(StagedWrite {
            tmp,
            path,
            len: bytes.len(),
        })
    }

    async fn save<T>(&self, file: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        self.stage(file, value).await?.commit().await
    }

    pub async fn load_spot(&self) -> Result<Vec<SpotTrade>, StoreError> {
        self.load_or_default(SPOT_FILE).await
    }

    pub async fn save_spot(&self, trades: &[SpotTrade]) -> Result<(), StoreError> {
        self.save(SPOT_FILE, trades).await
    }

    pub async fn load_futures(&self) -> Result<Vec<FuturesRecord>, StoreError> {
        self.load_or_default(FUTURES_FILE).await
    }

    pub async fn save_futures(&self, records: &[FuturesRecord]) -> Result<(), StoreError> {
        self.save(FUTURES_FILE, records).await
    }

    pub async fn load_holdings(&self) -> Result<Vec<Holding>, StoreError> {
        self.load_or_default(HOLDINGS_FILE).await
    }

    pub async fn save_holdings(&self, holdings: &[Holding]) -> Result<(), StoreError> {
        self.save(HOLDINGS_FILE, holdings).await
    }

    /// Missing file reads as a zero balance.
    pub async fn load_balance(&self) -> Result<Balance, StoreError> {
        self.load_or_default(BALANCE_FILE).await
    }

    pub async fn save_balance(&self, balance: &Balance) -> Result<(), StoreError> {
        self.save(BALANCE_FILE, balance).await
    }

    /// Save the spot journal and the holdings together, as closing a holding
    /// needs. Both files are staged before either is replaced, so a failure
    /// while serializing or writing leaves both untouched. A failed rename of
    /// the second file can still leave the spot journal ahead of the holdings.
    pub async fn save_spot_and_holdings(
        &self,
        trades: &[SpotTrade],
        holdings: &[Holding],
    ) -> Result<(), StoreError> {
        let spot = self.stage(SPOT_FILE, trades).await?;
        let holdings = match self.stage(HOLDINGS_FILE, holdings).await {
            Ok(staged) => staged,
            Err(e) => {
                spot.discard().await;
                return Err(e);
            }
        };
        spot.commit().await?;
        holdings.commit().await
    }
}

/// A fully written temp file waiting to replace its target.
struct StagedWrite {
    tmp: PathBuf,
    path: PathBuf,
    len: usize,
}

impl StagedWrite {
    async fn commit(self) -> Result<(), StoreError> {
        tokio::fs::rename(&self.tmp, &self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!("Wrote {} bytes to {}", self.len, self.path.display());
        Ok(())
    }

    async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.tmp).await {
            warn!("Failed to remove {}: {}", self.tmp.display(), e);
        }
    }
}
