use anyhow::{Context, Result, bail};
use argsheet_schema::{ArgSheet, DEFAULT_SHEET_NAME};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub path: PathBuf,
    pub sheet: ArgSheet,
}

/// Load the sheet at `sheet_path`, or `argsheet.json` in the current directory.
pub fn load_sheet(sheet_path: Option<&Path>) -> Result<LoadedSheet> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    // Joining an absolute path replaces `cwd`.
    let path = cwd.join(sheet_path.unwrap_or(Path::new(DEFAULT_SHEET_NAME)));
    if !path.is_file() {
        bail!("argument sheet not found: {}", path.display());
    }

    let sheet = ArgSheet::load(&path)?;
    tracing::debug!(path = %path.display(), "loaded argument sheet");
    Ok(LoadedSheet { path, sheet })
}

/// Write the example sheet into `dir`, using the directory's name as program name.
pub fn write_example_sheet(dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let dest = dir.join(DEFAULT_SHEET_NAME);

    let mut sheet = ArgSheet::example();
    if let Some(name) = dir_program_name(dir) {
        sheet.program_name = Some(name);
    }
    let json = serde_json::to_string_pretty(&sheet).context("failed to serialize argument sheet")?;

    let mut options = fs::OpenOptions::new();
    if overwrite {
        options.write(true).create(true).truncate(true);
    } else {
        options.write(true).create_new(true);
    }
    let mut file = match options.open(&dest) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            bail!("{} already exists (use --force to replace it)", dest.display())
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to create {}", dest.display()));
        }
    };
    writeln!(file, "{json}").with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(dest)
}

/// Name of `dir` after resolving `.`, `..` and symlinks.
fn dir_program_name(dir: &Path) -> Option<String> {
    let dir = dir.canonicalize().ok()?;
    let name = dir.file_name()?.to_str()?;
    Some(name.to_string())
}
