//! Streaming model download: HTTP fetch, gunzip and write to the cache in
//! one pass. The progress bar tracks compressed bytes, since that is what
//! the server reports.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("analogy-rs/", env!("CARGO_PKG_VERSION"));

/// Download a gzip archive from `url` and write the decompressed contents
/// to `dest`. The file appears at `dest` only after a complete download;
/// partial transfers are left behind as `<dest>.part`.
pub fn fetch_gz(url: &str, dest: &Path) -> Result<()> {
    log::info!("downloading {url}");

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(None)
        .build()?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("fetching {url}"))?;

    let bar = match response.content_length() {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bar:40} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )?
                .progress_chars("=> "),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        }
    };

    let mut decoder = GzDecoder::new(bar.wrap_read(response));
    let partial = dest.with_extension("part");
    let mut out = BufWriter::new(
        File::create(&partial).with_context(|| format!("creating {}", partial.display()))?,
    );
    io::copy(&mut decoder, &mut out).context("decompressing download")?;
    out.flush()?;
    drop(out);
    fs::rename(&partial, dest)
        .with_context(|| format!("moving download into place at {}", dest.display()))?;

    bar.finish_and_clear();
    log::info!("saved {}", dest.display());
    Ok(())
}
