//! Fixture-backed stand-in for live network data.
//!
//! A `FixtureBundle` is a directory of resources; a `StubProvider` resolves
//! one resource in it by name and extension and reads its bytes.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::ErrorKind;

/// A directory that fixture resources are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureBundle {
    root: PathBuf,
}

impl FixtureBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the resource `name.extension`, if it exists as a file.
    ///
    /// Names that would resolve outside the bundle root are never located.
    pub fn locate(&self, name: &str, extension: &str) -> Option<PathBuf> {
        let name = name.trim_start_matches('/');
        if name.is_empty() {
            return None;
        }
        if Path::new(name)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            warn!("fixture name {name:?} escapes the bundle root");
            return None;
        }
        let file = if extension.is_empty() {
            name.to_string()
        } else {
            format!("{name}.{extension}")
        };
        let path = self.root.join(file);
        path.is_file().then_some(path)
    }
}

/// Loads a single fixture from a bundle.
#[derive(Debug, Clone)]
pub struct StubProvider {
    name: String,
    extension: String,
    bundle: FixtureBundle,
}

impl StubProvider {
    pub fn new(name: impl Into<String>, extension: impl Into<String>, bundle: FixtureBundle) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            bundle,
        }
    }

    /// A provider for `name.json`.
    pub fn json(name: impl Into<String>, bundle: FixtureBundle) -> Self {
        Self::new(name, "json", bundle)
    }

    /// Read the fixture. `MalformedUrl` if it cannot be found, `NoData` if
    /// it exists but cannot be read.
    pub fn load(&self) -> Result<Vec<u8>, ErrorKind> {
        let path = self
            .bundle
            .locate(&self.name, &self.extension)
            .ok_or(ErrorKind::MalformedUrl)?;
        std::fs::read(&path).map_err(|e| {
            warn!("failed to read fixture {}: {e}", path.display());
            ErrorKind::NoData
        })
    }
}

/// Read the fixture `name.extension` from `bundle`.
pub fn load_fixture(name: &str, extension: &str, bundle: &FixtureBundle) -> Result<Vec<u8>, ErrorKind> {
    StubProvider::new(name, extension, bundle.clone()).load()
}
