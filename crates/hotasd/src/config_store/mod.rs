//! In-memory configuration tree backed by a TOML file.
//!
//! The store holds one typed value per schema key. Loads are
//! all-or-nothing: a candidate tree is built from the defaults and the file,
//! and only replaces the live tree once every entry has validated. Saves go
//! through a temporary file and an atomic rename.

mod errors;
mod file;
mod schema;
mod value;

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

pub use self::errors::ConfigError;
pub use self::schema::{DefaultValue, ParamSpec, SCHEMA, Scope, ValueKind, lookup};
pub use self::value::{ParamValue, RawValue};

use self::value::coerce;

const CONFIG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::config");

/// Typed configuration tree plus the path of its backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    values: BTreeMap<&'static str, ParamValue>,
    path: Utf8PathBuf,
    dirty: bool,
}

impl ConfigStore {
    /// Builds a store holding the schema defaults, backed by `path`.
    pub fn with_defaults(path: impl Into<Utf8PathBuf>) -> Self {
        let values = SCHEMA
            .iter()
            .map(|spec| (spec.key, ParamValue::from(spec.default)))
            .collect();
        Self {
            values,
            path: path.into(),
            dirty: false,
        }
    }

    /// Opens the store at daemon start.
    ///
    /// A missing file yields the defaults; any other failure is returned.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, ConfigError> {
        let mut store = Self::with_defaults(path);
        let current = store.path.clone();
        match store.load(&current) {
            Ok(_) => Ok(store),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!(
                    target: CONFIG_TARGET,
                    path = %current,
                    "configuration file absent; using defaults"
                );
                Ok(store)
            }
            Err(error) => Err(error),
        }
    }

    /// Path the store loads from and saves to by default.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Whether persisted values changed since the last load or save.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reads a parameter.
    pub fn get(&self, key: &str) -> Result<&ParamValue, ConfigError> {
        let spec = lookup(key).ok_or_else(|| ConfigError::UnknownKey {
            key: key.to_owned(),
        })?;
        self.values
            .get(spec.key)
            .ok_or_else(|| ConfigError::UnknownKey {
                key: key.to_owned(),
            })
    }

    /// Writes a persisted parameter on behalf of a client.
    ///
    /// Runtime-only keys are rejected with [`ConfigError::ReadOnly`]. The
    /// tree is marked dirty; nothing is written to disk.
    pub fn set(&mut self, key: &str, raw: RawValue<'_>) -> Result<ParamValue, ConfigError> {
        let spec = writable(key, Scope::Persisted)?;
        let value = coerce(spec, raw)?;
        self.values.insert(spec.key, value.clone());
        self.dirty = true;
        debug!(target: CONFIG_TARGET, key = spec.key, value = %value, "parameter set");
        Ok(value)
    }

    /// Writes a runtime-only parameter on behalf of the daemon.
    ///
    /// Persisted keys are rejected with [`ConfigError::ReadOnly`]; runtime
    /// writes never mark the tree dirty.
    pub fn set_runtime(&mut self, key: &str, value: ParamValue) -> Result<(), ConfigError> {
        let spec = writable(key, Scope::Runtime)?;
        let value = coerce(spec, RawValue::from(&value))?;
        self.values.insert(spec.key, value);
        Ok(())
    }

    /// Replaces the persisted tree with the contents of `path`.
    ///
    /// Keys absent from the file take their defaults. On success `path`
    /// becomes the store's path and the dirty flag clears; on failure the
    /// store is untouched. Returns the number of entries read from the file.
    pub fn load(&mut self, path: &Utf8Path) -> Result<usize, ConfigError> {
        let text = file::read(path)?;
        let entries = file::parse(path, &text)?;
        let mut candidate: BTreeMap<&'static str, ParamValue> = SCHEMA
            .iter()
            .map(|spec| match spec.scope {
                Scope::Persisted => (spec.key, ParamValue::from(spec.default)),
                Scope::Runtime => {
                    let current = self.values.get(spec.key).cloned();
                    (spec.key, current.unwrap_or_else(|| ParamValue::from(spec.default)))
                }
            })
            .collect();

        for (key, raw) in &entries {
            let spec = lookup(key).ok_or_else(|| ConfigError::Schema {
                path: path.to_path_buf(),
                key: key.clone(),
            })?;
            if spec.scope == Scope::Runtime {
                return Err(ConfigError::ReadOnly {
                    key: spec.key.to_owned(),
                    scope: spec.scope,
                });
            }
            candidate.insert(spec.key, coerce(spec, RawValue::from(raw))?);
        }

        self.values = candidate;
        self.path = path.to_path_buf();
        self.dirty = false;
        info!(
            target: CONFIG_TARGET,
            path = %path,
            entries = entries.len(),
            "configuration loaded"
        );
        Ok(entries.len())
    }

    /// Re-reads the store's current path.
    pub fn reload(&mut self) -> Result<usize, ConfigError> {
        let path = self.path.clone();
        self.load(&path)
    }

    /// Writes the persisted parameters to `path`, or to the store's path.
    ///
    /// Saving elsewhere leaves the store's path and dirty flag alone.
    /// Returns the path written.
    pub fn save(&mut self, path: Option<&Utf8Path>) -> Result<Utf8PathBuf, ConfigError> {
        let target = path.unwrap_or(&self.path).to_path_buf();
        let rendered = file::render(self.persisted())?;
        file::atomic_write(target.as_std_path(), rendered.as_bytes()).map_err(|source| {
            ConfigError::Io {
                path: target.clone(),
                source,
            }
        })?;
        if target == self.path {
            self.dirty = false;
        }
        info!(target: CONFIG_TARGET, path = %target, "configuration saved");
        Ok(target)
    }

    /// Applies a `section.key=value` override given at startup.
    pub fn apply_override(&mut self, input: &str) -> Result<(), ConfigError> {
        let Some((key, value)) = input.split_once('=') else {
            return Err(ConfigError::Override {
                input: input.to_owned(),
            });
        };
        if key.trim().is_empty() {
            return Err(ConfigError::Override {
                input: input.to_owned(),
            });
        }
        self.set(key, RawValue::Text(value.trim()))?;
        Ok(())
    }

    /// Iterates over every parameter in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    /// Iterates over the parameters written to disk.
    pub fn persisted(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.entries()
            .filter(|(key, _)| lookup(key).is_some_and(|spec| spec.scope == Scope::Persisted))
    }
}

fn writable(key: &str, pathway: Scope) -> Result<&'static ParamSpec, ConfigError> {
    let spec = lookup(key).ok_or_else(|| ConfigError::UnknownKey {
        key: key.to_owned(),
    })?;
    if spec.scope != pathway {
        return Err(ConfigError::ReadOnly {
            key: spec.key.to_owned(),
            scope: spec.scope,
        });
    }
    Ok(spec)
}
