//! Catalog and conftest directory loading.

use crate::config::schema::{CatalogFile, ContextConfig};
use crate::context::BuildContext;
use crate::error::{ConftestError, Result};
use crate::probe::ProbeDefinition;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest per-probe timeout a catalog may ask for (one day).
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// A loaded probe catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Context declared by the catalog, if any.
    pub context: Option<BuildContext>,
    /// Probe definitions, sorted by name.
    pub probes: Vec<ProbeDefinition>,
}

/// Load a YAML catalog.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist, `ConfigParse` if the
/// YAML is invalid and `ConfigValidation` if a probe or the context is
/// unusable.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConftestError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConftestError::Io(e)
        }
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_catalog(&content, path, base)
}

/// Parse catalog YAML. Relative context paths are resolved against `base`.
pub fn parse_catalog(content: &str, source_path: &Path, base: &Path) -> Result<Catalog> {
    let file: CatalogFile =
        serde_yaml::from_str(content).map_err(|e| ConftestError::ConfigParse {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;

    let context = file
        .context
        .map(|c| build_context(c, source_path, base))
        .transpose()?;

    let mut probes = Vec::with_capacity(file.probes.len());
    for (name, probe) in file.probes {
        let def = ProbeDefinition::builder(name, probe.source)
            .headers(probe.headers)
            .link_required(probe.link);
        let def = match probe.symbol {
            Some(symbol) => def.symbol(symbol),
            None => def,
        };
        probes.push(def.build().map_err(|e| invalid(source_path, e))?);
    }

    tracing::debug!(
        "loaded {} probes from {}",
        probes.len(),
        source_path.display()
    );
    Ok(Catalog { context, probes })
}

fn build_context(config: ContextConfig, source_path: &Path, base: &Path) -> Result<BuildContext> {
    if config.toolchain.as_os_str().is_empty() {
        return Err(invalid(source_path, "context.toolchain is empty"));
    }

    let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };

    let mut ctx = BuildContext::new(resolve(config.toolchain))
        .with_include_dirs(config.include_dirs.into_iter().map(resolve))
        .with_flags(config.flags);

    for (key, value) in config.env {
        ctx = ctx.with_env(key, value);
    }

    if let Some(secs) = config.timeout_secs {
        if secs == 0 {
            return Err(invalid(source_path, "context.timeout_secs must be positive"));
        }
        if secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                source_path,
                format!("context.timeout_secs must be at most {}", MAX_TIMEOUT_SECS),
            ));
        }
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    if let Some(root) = config.scratch_root {
        ctx = ctx.with_scratch_root(resolve(root));
    }

    Ok(ctx)
}

fn invalid(source_path: &Path, err: impl std::fmt::Display) -> ConftestError {
    ConftestError::ConfigValidation {
        message: format!("{}: {}", source_path.display(), err),
    }
}

/// Load probes laid out as `<root>/<name>/<name>.c`.
///
/// The leading `#include <...>` lines of each file become the required
/// headers and the rest becomes the body. Subdirectories without a matching
/// `.c` file are skipped.
pub fn load_conftest_dir(root: &Path) -> Result<Vec<ProbeDefinition>> {
    if !root.is_dir() {
        return Err(ConftestError::ConfigNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut probes = Vec::new();
    for entry in fs::read_dir(root)? {
        let dir = entry?.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        let file = dir.join(format!("{}.c", name));
        if !file.is_file() {
            tracing::debug!("skipping {}: no {}.c", dir.display(), name);
            continue;
        }

        let content = fs::read_to_string(&file)?;
        let (headers, body) = split_includes(&content);
        let def = ProbeDefinition::builder(name, body)
            .headers(headers)
            .build()
            .map_err(|e| invalid(&file, e))?;
        probes.push(def);
    }

    probes.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(probes)
}

/// Split leading angle-bracket includes off a C source file.
fn split_includes(content: &str) -> (Vec<String>, String) {
    let mut headers = Vec::new();
    let mut rest = content;

    while !rest.is_empty() {
        let (line, tail) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            rest = tail;
            continue;
        }
        let header = trimmed
            .strip_prefix("#include")
            .map(str::trim_start)
            .and_then(|h| h.strip_prefix('<'))
            .and_then(|h| h.strip_suffix('>'));
        match header {
            Some(header) => {
                headers.push(header.trim().to_string());
                rest = tail;
            }
            None => break,
        }
    }

    (headers, rest.to_string())
}
