use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::{ConfigError, RenderConfig};

/// Shared holder for the active [`RenderConfig`].
///
/// Writers install a complete, validated value; readers take an `Arc`
/// snapshot once per frame, so a frame never observes a half-applied edit.
/// The revision counter lets a paused renderer notice that a redraw is due.
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<RenderConfig>>,
    revision: AtomicU64,
}

impl ConfigStore {
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
            revision: AtomicU64::new(0),
        })
    }

    pub fn snapshot(&self) -> Arc<RenderConfig> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    /// Replaces the active config and returns the new revision. Invalid
    /// values leave the previous config in place.
    pub fn replace(&self, config: RenderConfig) -> Result<u64, ConfigError> {
        config.validate()?;
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(config);
        Ok(self.revision.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::find_preset;

    #[test]
    fn replace_bumps_revision_and_swaps_value() {
        let store = ConfigStore::new(RenderConfig::default()).unwrap();
        let before = store.snapshot();
        assert_eq!(store.revision(), 0);

        let dense = find_preset("dense glass").unwrap().config;
        assert_eq!(store.replace(dense).unwrap(), 1);
        assert_eq!(*store.snapshot(), dense);
        // Earlier snapshots are unaffected.
        assert_eq!(*before, RenderConfig::default());
    }

    #[test]
    fn invalid_replacement_keeps_previous_value() {
        let store = ConfigStore::new(RenderConfig::default()).unwrap();
        let mut broken = *store.snapshot();
        broken.shadow_strength = 0.9;
        let err = store.replace(broken).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(store.revision(), 0);
        assert_eq!(store.snapshot().shadow_strength, 0.1);
    }

    #[test]
    fn concurrent_writers_never_expose_partial_values() {
        let store = Arc::new(ConfigStore::new(RenderConfig::default()).unwrap());
        let presets: Vec<RenderConfig> = crate::PRESETS.iter().map(|p| p.config).collect();

        let writers: Vec<_> = presets
            .iter()
            .copied()
            .map(|config| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.replace(config).unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..300 {
            let seen = *store.snapshot();
            assert!(presets.contains(&seen));
        }

        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(store.revision(), 300);
    }
}
