//! `hawser get <id>` – download one object to a file or stdout.

use anyhow::{Context, Result};
use hawser_core::url_model::object_id;
use hawser_core::{HawserConfig, Resolver};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output target for a download.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Output {
    Stdout,
    File(PathBuf),
}

/// Resolves `--output`: "-" is stdout; no value means `./<oid>`.
pub(crate) fn output_for(id: &str, output: Option<&Path>) -> Result<Output> {
    match output {
        Some(p) if p == Path::new("-") => Ok(Output::Stdout),
        Some(p) => Ok(Output::File(p.to_path_buf())),
        None => {
            let oid = object_id(id).with_context(|| format!("invalid object identifier {:?}", id))?;
            Ok(Output::File(PathBuf::from(oid)))
        }
    }
}

pub fn run_get(cfg: &HawserConfig, id: &str, output: Option<&Path>) -> Result<()> {
    let target = output_for(id, output)?;
    let resolver = Resolver::new(cfg.clone());
    let mut download = resolver
        .fetch(id)
        .with_context(|| format!("fetch {}", id))?;
    let size = download.size();

    let written = match &target {
        Output::Stdout => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            let n = io::copy(&mut download, &mut lock).context("write to stdout")?;
            lock.flush()?;
            n
        }
        Output::File(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let n = io::copy(&mut download, &mut writer)
                .with_context(|| format!("write {}", path.display()))?;
            writer.flush()?;
            n
        }
    };

    if written != size {
        tracing::warn!(id, size, written, "object length differs from declared size");
    }
    if let Output::File(path) = &target {
        eprintln!("{}: {} bytes -> {}", id, written, path.display());
    }
    Ok(())
}
