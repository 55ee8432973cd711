use std::path::{Path, PathBuf};

use crate::ast::Node;
use crate::interpreter::result::RuntimeErrorKind;
use crate::line_source::FileSource;
use crate::parser::parse;

pub const STDLIB_SIGIL: char = '#';
pub const EXTENSION: &str = "uwu";

/// `#name` lives in the standard library, anything else next to the loading file.
pub fn resolve(path: &str, stdlib_dir: &Path, base_dir: &Path) -> PathBuf {
    match path.strip_prefix(STDLIB_SIGIL) {
        Some(name) => stdlib_dir.join(format!("{}.{}", name, EXTENSION)),
        None => base_dir.join(format!("{}.{}", path, EXTENSION)),
    }
}

pub fn parse_file(file: &Path) -> Result<Node, RuntimeErrorKind> {
    let failure = |reason: String| RuntimeErrorKind::Load { path: file.display().to_string(), reason };
    let source = FileSource::open(file).map_err(|e| failure(e.to_string()))?;
    let root = parse(source).map_err(|e| failure(e.to_string()))?;
    tracing::debug!(file = %file.display(), statements = root.children.len(), "parsed module");
    Ok(root)
}
