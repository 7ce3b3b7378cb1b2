use crate::cli::FetchArgs;
use crate::download::{DEFAULT_BASE_URL, DownloadOutcome, DownloadProgress, StructureDownloader};
use crate::error::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use ligscreen::core::io::manifest::read_manifest;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct FetchTally {
    downloaded: usize,
    present: usize,
    failed: Vec<String>,
}

pub async fn run(args: FetchArgs) -> Result<()> {
    let ids = read_manifest(&args.manifest)?;
    let base_url = args.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    let downloader = StructureDownloader::new(base_url, &args.out_dir).await?;

    println!(
        "Fetching {} structure(s) into {}",
        ids.len(),
        downloader.out_dir().display()
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {msg:<6} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(2));

    let mut tally = FetchTally::default();
    for id in &ids {
        pb.reset();
        pb.set_length(0);
        pb.set_message(id.clone());

        let progress_callback = |progress: DownloadProgress| match progress {
            DownloadProgress::Started { total_size } => {
                if let Some(size) = total_size {
                    pb.set_length(size);
                }
            }
            DownloadProgress::Downloading { downloaded } => {
                pb.set_position(downloaded);
            }
        };

        match downloader.download(id, args.force, progress_callback).await {
            Ok(DownloadOutcome::Downloaded { bytes }) => {
                debug!(structure = %id, bytes, "Structure downloaded.");
                tally.downloaded += 1;
            }
            Ok(DownloadOutcome::AlreadyPresent) => tally.present += 1,
            Err(e) => {
                warn!(structure = %id, "Download failed: {}", e);
                pb.println(format!("  ✗ {}: {}", id, e));
                tally.failed.push(id.clone());
            }
        }
    }
    pb.finish_and_clear();

    info!(
        downloaded = tally.downloaded,
        present = tally.present,
        failed = tally.failed.len(),
        "Fetch finished."
    );
    println!(
        "Downloaded {}, already present {}, failed {}",
        tally.downloaded,
        tally.present,
        tally.failed.len()
    );
    if !tally.failed.is_empty() {
        println!("Failed structures: {}", tally.failed.join(", "));
    }
    Ok(())
}
