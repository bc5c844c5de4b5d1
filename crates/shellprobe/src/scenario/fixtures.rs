//! Files a scenario seeds before it runs and removes afterwards.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ExpectError, Result};

/// Seeded files and expected artifacts under a working directory.
#[derive(Debug, Clone)]
pub struct Fixtures {
    root: PathBuf,
    seeds: Vec<(String, String)>,
    artifacts: Vec<String>,
}

impl Fixtures {
    /// No fixtures under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seeds: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Add a file written before the run.
    #[must_use]
    pub fn seed(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.seeds.push((name.into(), content.into()));
        self
    }

    /// Add a file the program is expected to create.
    #[must_use]
    pub fn artifact(mut self, name: impl Into<String>) -> Self {
        self.artifacts.push(name.into());
        self
    }

    /// The working directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a name against the working directory.
    #[must_use]
    pub fn path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Every declared path.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.seeds
            .iter()
            .map(|(name, _)| name)
            .chain(&self.artifacts)
            .map(|name| self.path(name))
    }

    /// Remove stale copies of every declared file and write the seeds.
    pub fn prepare(&self) -> Result<()> {
        self.cleanup()?;
        for (name, content) in &self.seeds {
            let path = self.path(name);
            std::fs::write(&path, content).map_err(|e| ExpectError::fixture(&path, e))?;
            tracing::debug!(path = %path.display(), "seeded fixture");
        }
        Ok(())
    }

    /// Remove every declared file; missing files are fine.
    pub fn cleanup(&self) -> Result<()> {
        for path in self.paths() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed fixture"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(ExpectError::fixture(path, e)),
            }
        }
        Ok(())
    }

    /// Read a file under the working directory.
    pub fn read(&self, name: impl AsRef<Path>) -> Result<String> {
        let path = self.path(name);
        std::fs::read_to_string(&path).map_err(|e| ExpectError::fixture(path, e))
    }

    /// Guard that runs [`cleanup`](Self::cleanup) when dropped.
    #[must_use]
    pub const fn guard(&self) -> FixtureGuard<'_> {
        FixtureGuard { fixtures: self }
    }
}

/// Removes fixtures on drop, including on early return and panic.
#[derive(Debug)]
pub struct FixtureGuard<'a> {
    fixtures: &'a Fixtures,
}

impl Drop for FixtureGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.fixtures.cleanup() {
            tracing::warn!(error = %e, "fixture cleanup failed");
        }
    }
}
