use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use quarry_compiler::host::CompilationUnit;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("'{}' is empty", .path.display())]
    Empty { path: PathBuf },

    #[error("'{}': {source}", .path.display())]
    Invalid {
        path: PathBuf,
        source: quarry_compiler::Error,
    },
}

/// Load a front-end dump from a file, or from stdin when the path is `-`.
pub fn load_unit(path: &Path) -> Result<CompilationUnit, LoadError> {
    let json = if path.as_os_str() == "-" {
        read_stdin()?
    } else {
        fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?
    };
    parse_unit(&json, path)
}

pub fn parse_unit(json: &str, path: &Path) -> Result<CompilationUnit, LoadError> {
    if json.trim().is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    CompilationUnit::from_json(json).map_err(|source| LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

fn read_stdin() -> Result<String, LoadError> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(LoadError::Stdin)?;
    Ok(buf)
}
