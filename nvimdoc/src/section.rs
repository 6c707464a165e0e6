//! Marker-delimited sections in existing text files.
//!
//! A section is the run of lines strictly between the first line matching a
//! start marker and the next line matching an end marker. Markers are
//! line regexes such as `^<!-- API -->$`.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SectionError {
    #[error("invalid marker `{marker}`: {source}")]
    InvalidMarker {
        marker: String,
        #[source]
        source: regex::Error,
    },

    #[error("no line matches start marker `{0}`")]
    MissingStart(String),

    #[error("no line after the start marker matches end marker `{0}`")]
    MissingEnd(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Section {
        path: PathBuf,
        #[source]
        source: Box<SectionError>,
    },
}

/// Replaces the body of a marker-delimited section in a file.
pub trait SectionReplacer {
    /// Current content of `path`, including replacements made so far.
    fn read(&self, path: &Path) -> Result<String, SectionError> {
        read(path)
    }

    /// Returns whether the file content changed.
    fn replace(
        &mut self,
        path: &Path,
        start_marker: &str,
        end_marker: &str,
        new_lines: &[String],
    ) -> Result<bool, SectionError>;
}

/// Writes spliced content back to disk when it differs.
#[derive(Debug, Default)]
pub struct FsSectionReplacer;

impl SectionReplacer for FsSectionReplacer {
    fn replace(
        &mut self,
        path: &Path,
        start_marker: &str,
        end_marker: &str,
        new_lines: &[String],
    ) -> Result<bool, SectionError> {
        let old = self.read(path)?;
        let new = splice_section(&old, start_marker, end_marker, new_lines).map_err(|e| in_file(path, e))?;
        if old == new {
            debug!("{}: section {} unchanged", path.display(), start_marker);
            return Ok(false);
        }
        fs::write(path, new).map_err(|source| SectionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("updated {} in {}", start_marker, path.display());
        Ok(true)
    }
}

/// Keeps replacements in memory; disk is never touched.
#[derive(Debug, Default)]
pub struct DryRunReplacer {
    pending: BTreeMap<PathBuf, String>,
}

impl DryRunReplacer {
    /// Files whose pending content differs from what is on disk.
    pub fn stale(&self) -> Vec<&Path> {
        self.pending
            .iter()
            .filter(|(path, content)| read(path).ok().as_ref() != Some(*content))
            .map(|(path, _)| path.as_path())
            .collect()
    }
}

impl SectionReplacer for DryRunReplacer {
    fn read(&self, path: &Path) -> Result<String, SectionError> {
        match self.pending.get(path) {
            Some(content) => Ok(content.clone()),
            None => read(path),
        }
    }

    fn replace(
        &mut self,
        path: &Path,
        start_marker: &str,
        end_marker: &str,
        new_lines: &[String],
    ) -> Result<bool, SectionError> {
        let old = self.read(path)?;
        let new = splice_section(&old, start_marker, end_marker, new_lines).map_err(|e| in_file(path, e))?;
        if old == new {
            return Ok(false);
        }
        self.pending.insert(path.to_path_buf(), new);
        Ok(true)
    }
}

/// Replace the lines between the markers in `text`, keeping both markers.
pub fn splice_section(
    text: &str,
    start_marker: &str,
    end_marker: &str,
    new_lines: &[String],
) -> Result<String, SectionError> {
    let lines: Vec<&str> = text.lines().collect();
    let (start, end) = find_section(&lines, start_marker, end_marker)?;

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + new_lines.len());
    out.extend(&lines[..=start]);
    out.extend(new_lines.iter().map(String::as_str));
    out.extend(&lines[end..]);

    let mut joined = out.join("\n");
    if text.ends_with('\n') {
        joined.push('\n');
    }
    Ok(joined)
}

/// Lines strictly between the markers in a file.
pub fn read_section(path: &Path, start_marker: &str, end_marker: &str) -> Result<Vec<String>, SectionError> {
    let text = read(path)?;
    let lines: Vec<&str> = text.lines().collect();
    let (start, end) = find_section(&lines, start_marker, end_marker).map_err(|e| in_file(path, e))?;
    Ok(lines[start + 1..end].iter().map(|l| l.to_string()).collect())
}

/// Whether any line of `text` matches `marker`.
pub fn has_marker(text: &str, marker: &str) -> Result<bool, SectionError> {
    let re = compile(marker)?;
    Ok(text.lines().any(|l| re.is_match(l)))
}

fn find_section(lines: &[&str], start_marker: &str, end_marker: &str) -> Result<(usize, usize), SectionError> {
    let start_re = compile(start_marker)?;
    let end_re = compile(end_marker)?;
    let start = lines
        .iter()
        .position(|l| start_re.is_match(l))
        .ok_or_else(|| SectionError::MissingStart(start_marker.to_string()))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| end_re.is_match(l))
        .map(|offset| start + 1 + offset)
        .ok_or_else(|| SectionError::MissingEnd(end_marker.to_string()))?;
    Ok((start, end))
}

fn compile(marker: &str) -> Result<Regex, SectionError> {
    Regex::new(marker).map_err(|source| SectionError::InvalidMarker {
        marker: marker.to_string(),
        source,
    })
}

fn read(path: &Path) -> Result<String, SectionError> {
    fs::read_to_string(path).map_err(|source| SectionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn in_file(path: &Path, err: SectionError) -> SectionError {
    SectionError::Section {
        path: path.to_path_buf(),
        source: Box::new(err),
    }
}
