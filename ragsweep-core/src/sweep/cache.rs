//! Holds the artifacts of the configuration key currently being swept.

use crate::error::ConfigBuildError;
use crate::rag::{ConfigKey, IndexedCorpus};
use tracing::debug;

#[derive(Debug)]
enum Slot {
    Built(IndexedCorpus),
    Failed,
}

/// At most one configuration's chunks and index, replaced whenever the key
/// changes. A key whose build failed is remembered as failed so later
/// `top_k` values for it are skipped without rebuilding.
#[derive(Debug, Default)]
pub struct ConfigurationCache {
    current: Option<(ConfigKey, Slot)>,
}

impl ConfigurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `key` the live configuration, building it if it is not already.
    ///
    /// Returns the build error only on the call that performed the failed
    /// build; the previous key's artifacts are dropped before building.
    pub fn ensure<F>(&mut self, key: ConfigKey, build: F) -> Result<(), ConfigBuildError>
    where
        F: FnOnce() -> Result<IndexedCorpus, ConfigBuildError>,
    {
        if self.current_key() == Some(key) {
            return Ok(());
        }

        self.current = None;
        debug!(%key, "Building configuration");
        match build() {
            Ok(built) => {
                self.current = Some((key, Slot::Built(built)));
                Ok(())
            }
            Err(e) => {
                self.current = Some((key, Slot::Failed));
                Err(e)
            }
        }
    }

    /// Artifacts for `key`, if it is live and built successfully.
    pub fn get(&self, key: ConfigKey) -> Option<&IndexedCorpus> {
        match &self.current {
            Some((k, Slot::Built(corpus))) if *k == key => Some(corpus),
            _ => None,
        }
    }

    pub fn current_key(&self) -> Option<ConfigKey> {
        self.current.as_ref().map(|(k, _)| *k)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
