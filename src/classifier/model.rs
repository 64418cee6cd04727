use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Resolve a model argument to a local file.
///
/// - An existing path is returned as is.
/// - An `http(s)://` URL is downloaded once into the user cache directory.
pub fn resolve_model_path(input: &str) -> Result<PathBuf> {
    let as_path = Path::new(input);
    if as_path.exists() {
        log::info!("Using model from path: {}", as_path.display());
        return Ok(as_path.to_path_buf());
    }

    if !is_url(input) {
        anyhow::bail!("Model '{}' is neither an existing file nor an http(s) URL", input);
    }

    let cached_path = model_cache_dir()?.join(cache_entry(input)?);

    if cached_path.exists() {
        log::info!("Using cached model: {}", cached_path.display());
        return Ok(cached_path);
    }

    if let Some(dir) = cached_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create model cache dir: {}", dir.display()))?;
    }

    log::info!("Downloading model from {}...", input);
    download(input, &cached_path)?;
    log::info!("Model saved to {}", cached_path.display());

    Ok(cached_path)
}

/// Fetch the `metadata.json` that sits beside a remote model, if there is one.
///
/// It is cached in the model's own cache directory, so each URL keeps its vocabulary.
pub fn resolve_metadata_for_url(model_url: &str, model_path: &Path) -> Result<Option<PathBuf>> {
    let sidecar = model_path.with_file_name("metadata.json");
    if sidecar.exists() {
        return Ok(Some(sidecar));
    }
    let Some((base, _)) = model_url.rsplit_once('/') else {
        return Ok(None);
    };
    match download(&format!("{base}/metadata.json"), &sidecar) {
        Ok(()) => Ok(Some(sidecar)),
        Err(err) => {
            log::warn!("No metadata.json next to {}: {:#}", model_url, err);
            Ok(None)
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Cache location of a URL model relative to the cache root: `<host_and_dir>/<file>`.
fn cache_entry(url: &str) -> Result<PathBuf> {
    let location = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .split_once("://")
        .map_or(url, |(_, rest)| rest);

    let (dir, name) = location
        .rsplit_once('/')
        .filter(|(dir, name)| {
            !dir.is_empty() && !name.is_empty() && *name != "." && *name != ".."
        })
        .with_context(|| format!("Cannot derive a file name from URL: {}", url))?;

    let dir: String = dir
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    Ok(Path::new(&dir).join(name))
}

fn model_cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .context("Cannot determine cache directory")?;
    let dir = base.join("speechcmd").join("models");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model cache dir: {}", dir.display()))?;
    Ok(dir)
}

fn download(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to download {}", url))?;

    let mut bytes = Vec::new();
    response
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read response body from {}", url))?;

    // Write beside the destination first so a partial download never looks cached.
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move model into {}", dest.display()))?;

    Ok(())
}
