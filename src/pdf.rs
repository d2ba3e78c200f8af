use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use slug::slugify;
use thiserror::Error;
use tracing::{debug, warn};

/// How a generated invoice is shown once the service returns its link.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PdfDisplay {
    /// Hand the link to the system viewer.
    #[default]
    Open,
    /// Save into the download directory and reveal the file.
    Download,
    /// Only print the link.
    Print,
}

impl PdfDisplay {
    pub const ALL: [PdfDisplay; 3] = [PdfDisplay::Open, PdfDisplay::Download, PdfDisplay::Print];
}

impl std::fmt::Display for PdfDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PdfDisplay::Open => "open",
            PdfDisplay::Download => "download",
            PdfDisplay::Print => "print",
        })
    }
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to download invoice PDF: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Failed to save invoice PDF to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File name for a downloaded invoice: the link's last path segment,
/// slugified, falling back to `invoice.pdf`.
pub fn file_name_for(url: &Url) -> String {
    let stem = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|last| last.strip_suffix(".pdf").unwrap_or(last))
        .map(slugify)
        .unwrap_or_default();
    if stem.is_empty() {
        "invoice.pdf".to_string()
    } else {
        format!("{stem}.pdf")
    }
}

pub fn download(client: &Client, url: &Url, dir: &Path) -> Result<PathBuf, PdfError> {
    debug!(%url, dir = %dir.display(), "downloading invoice");
    let bytes = client.get(url.clone()).send()?.error_for_status()?.bytes()?;
    fs::create_dir_all(dir).map_err(|source| PdfError::Save { path: dir.to_path_buf(), source })?;
    let path = dir.join(file_name_for(url));
    fs::write(&path, &bytes).map_err(|source| PdfError::Save { path: path.clone(), source })?;
    Ok(path)
}

/// Shows the invoice according to `display`. Returns the saved file when downloading.
pub fn present(
    display: PdfDisplay,
    url: &Url,
    client: &Client,
    download_dir: &Path,
) -> Result<Option<PathBuf>, PdfError> {
    match display {
        PdfDisplay::Print => {
            println!("📄 Invoice PDF: {}", url);
            Ok(None)
        }
        PdfDisplay::Open => {
            println!("🚀 Opening: {}", url);
            open(url.as_str());
            Ok(None)
        }
        PdfDisplay::Download => {
            let path = download(client, url, download_dir)?;
            println!("✅ PDF saved: {:?}", path);
            open_and_reveal(&path);
            Ok(Some(path))
        }
    }
}

fn spawn(program: &str, args: &[&str]) {
    if let Err(e) = Command::new(program).args(args).spawn() {
        warn!(program, error = %e, "could not launch viewer");
    }
}

/// Opens a link or file with the platform's default handler.
pub fn open(target: &str) {
    #[cfg(target_os = "macos")]
    spawn("open", &[target]);

    #[cfg(target_os = "windows")]
    spawn("explorer", &[target]);

    #[cfg(target_os = "linux")]
    spawn("xdg-open", &[target]);
}

// Reveal the file in Finder/Explorer, then open it.
fn open_and_reveal(path: &Path) {
    let file = path.to_string_lossy();

    #[cfg(target_os = "macos")]
    spawn("open", &["-R", &*file]);

    #[cfg(target_os = "windows")]
    spawn("explorer", &[format!("/select,{}", file).as_str()]);

    #[cfg(target_os = "linux")]
    if let Some(parent) = path.parent() {
        spawn("xdg-open", &[&*parent.to_string_lossy()]);
    }

    open(&file);
}
