use anyhow::{bail, Context, Result};
use futures::stream::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// What to do when a dump is not on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPolicy {
    /// Prompt before each download
    Ask,
    Always,
    Never,
}

/// A dump file and the directory URL it can be fetched from
#[derive(Debug, Clone)]
pub struct RemoteDump {
    pub root_url: String,
    pub path: PathBuf,
}

impl RemoteDump {
    pub fn url(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        format!("{}{}", self.root_url, name)
    }
}

/// Make sure every dump exists locally before any scanning starts.
///
/// A missing file is downloaded when `policy` (or `confirm`, under
/// [`DownloadPolicy::Ask`]) allows it; otherwise the run is aborted.
pub fn ensure_dumps<F>(dumps: &[RemoteDump], policy: DownloadPolicy, mut confirm: F) -> Result<()>
where
    F: FnMut(&Path) -> Result<bool>,
{
    for dump in dumps {
        if dump.path.exists() {
            info!(path = %dump.path.display(), "Dump present");
            continue;
        }

        let url = dump.url();
        let fetch = match policy {
            DownloadPolicy::Always => true,
            DownloadPolicy::Never => false,
            DownloadPolicy::Ask => confirm(&dump.path)?,
        };
        if !fetch {
            bail!(
                "Dump file {} not found. Please download {}",
                dump.path.display(),
                url
            );
        }
        download(&url, &dump.path)?;
    }
    Ok(())
}

/// Interactive `y/n` prompt on stdin
pub fn ask_user(path: &Path) -> Result<bool> {
    print!("File '{}' not found. Download? (y/n) ", path.display());
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Fetch `url` to `path`, writing to a `.part` file first
pub fn download(url: &str, path: &Path) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("interwiki-fetch")
        .enable_io()
        .enable_time()
        .build()?;
    rt.block_on(download_async(url, path))
}

async fn download_async(url: &str, path: &Path) -> Result<()> {
    info!(url, path = %path.display(), "Downloading dump");

    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to request {}", url))?
        .error_for_status()
        .with_context(|| format!("Server refused {}", url))?;

    let pb = make_download_bar(response.content_length(), url);
    save_stream(response.bytes_stream(), path, &pb)
        .await
        .with_context(|| format!("Failed while downloading {}", url))?;

    info!(path = %path.display(), "Download complete");
    Ok(())
}

/// Write `stream` to `<path>.part`, then rename it to `path`.
///
/// The partial file is removed if the stream or a write fails.
async fn save_stream<S, B, E>(stream: S, path: &Path, pb: &ProgressBar) -> Result<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let part_path = path.with_extension("part");
    match write_part(stream, &part_path, pb).await {
        Ok(()) => {
            tokio::fs::rename(&part_path, path)
                .await
                .with_context(|| format!("Failed to move download into place: {:?}", path))?;
            pb.finish_and_clear();
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            warn!(error = %e, "Download interrupted");
            if let Err(rm) = tokio::fs::remove_file(&part_path).await {
                warn!(error = %rm, path = %part_path.display(), "Failed to remove partial download");
            }
            Err(e)
        }
    }
}

async fn write_part<S, B, E>(stream: S, part_path: &Path, pb: &ProgressBar) -> Result<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut file = tokio::fs::File::create(part_path)
        .await
        .with_context(|| format!("Failed to create {:?}", part_path))?;
    let mut stream = std::pin::pin!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await?;
        pb.inc(bytes.len() as u64);
    }
    file.flush().await?;
    Ok(())
}

fn make_download_bar(total: Option<u64>, url: &str) -> ProgressBar {
    let pb = match total {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "    {spinner:.cyan} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}",
                    )
                    .unwrap()
                    .progress_chars("=> "),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };
    pb.set_message(url.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
