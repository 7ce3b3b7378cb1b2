use crate::error::{CliError, Result};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://files.rcsb.org/download";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadProgress {
    Started { total_size: Option<u64> },
    Downloading { downloaded: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    AlreadyPresent,
}

/// Fetches PDB-format structure files into a local directory.
#[derive(Debug)]
pub struct StructureDownloader {
    client: reqwest::Client,
    base_url: String,
    out_dir: PathBuf,
}

impl StructureDownloader {
    /// Creates the downloader, creating `out_dir` if it does not exist.
    pub async fn new(base_url: &str, out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir).await?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("ligscreen/", env!("CARGO_PKG_VERSION")))
            .build()?;
        debug!("Downloader initialized for {:?} from {}", out_dir, base_url);
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn url_for(&self, id: &str) -> String {
        format!("{}/{}.pdb", self.base_url, id)
    }

    pub fn target_path(&self, id: &str) -> PathBuf {
        self.out_dir.join(format!("{}.pdb", id))
    }

    /// Downloads one structure, streaming it to `<out_dir>/<ID>.pdb`.
    ///
    /// The body is written to a `.part` file first and renamed once complete,
    /// so an interrupted transfer never leaves a truncated structure behind.
    pub async fn download(
        &self,
        id: &str,
        force: bool,
        mut progress_callback: impl FnMut(DownloadProgress),
    ) -> Result<DownloadOutcome> {
        let target = self.target_path(id);
        if !force && fs::try_exists(&target).await? {
            debug!("{:?} already exists, skipping.", target);
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        let url = self.url_for(id);
        info!("Sending request to {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;

        let total_size = response.content_length();
        progress_callback(DownloadProgress::Started { total_size });

        let partial = self.out_dir.join(format!("{}.pdb.part", id));
        let mut file = fs::File::create(&partial).await?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = fs::remove_file(&partial).await;
                    return Err(CliError::Network(e));
                }
            };
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress_callback(DownloadProgress::Downloading { downloaded });
        }
        file.flush().await?;
        drop(file);

        if downloaded == 0 {
            let _ = fs::remove_file(&partial).await;
            return Err(CliError::Download(format!("empty response for '{}'", id)));
        }

        fs::rename(&partial, &target).await?;
        info!("Saved {} ({} bytes) to {:?}", id, downloaded, &target);
        Ok(DownloadOutcome::Downloaded { bytes: downloaded })
    }
}
