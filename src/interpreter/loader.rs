//! Loading and caching programs referenced by path
//!
//! Programs are keyed by canonical path. The first load of a path wins and is
//! never invalidated, so a cache can be shared by every run in a process as
//! long as the files do not change underneath it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use super::parse_program;
use super::types::Program;
use crate::errors::{LookupError, Result};

#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: RwLock<HashMap<PathBuf, Arc<Program>>>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `relative`, resolved against the referencing program's directory
    pub fn load(&self, base_dir: &Path, relative: &str) -> Result<Arc<Program>> {
        self.load_path(&base_dir.join(relative))
    }

    /// Load a program file, parsing it only the first time its path is seen
    pub fn load_path(&self, path: &Path) -> Result<Arc<Program>> {
        let canonical = path
            .canonicalize()
            .map_err(|source| LookupError::ProgramNotFound {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(program) = self
            .programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&canonical)
        {
            debug!(path = %canonical.display(), "program cache hit");
            return Ok(Arc::clone(program));
        }

        let source = fs::read_to_string(&canonical).map_err(|source| {
            LookupError::ProgramNotFound {
                path: canonical.clone(),
                source,
            }
        })?;
        let base_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let program = Arc::new(parse_program(&source, base_dir)?);
        info!(
            path = %canonical.display(),
            functions = program.functions.len(),
            "loaded program"
        );

        let mut programs = self
            .programs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(programs.entry(canonical).or_insert(program)))
    }

    pub fn len(&self) -> usize {
        self.programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
