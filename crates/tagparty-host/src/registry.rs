use std::collections::HashMap;

use tagparty_core::mode_registry::ModeId;
use tagparty_core::mode_trait::GameMode;

use crate::error::HostError;

/// Factory function type for creating mode instances.
pub type ModeFactory = fn() -> Box<dyn GameMode>;

/// Registry mapping mode ids to factory functions.
pub struct ModeRegistry {
    factories: HashMap<ModeId, ModeFactory>,
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_defaults();
        registry
    }

    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    fn register_defaults(&mut self) {
        #[cfg(feature = "infection")]
        self.register(ModeId::TeamInfection, || {
            Box::new(tagparty_infection::TeamInfection::new())
        });
        #[cfg(feature = "teamtag")]
        self.register(ModeId::TeamTag, || Box::new(tagparty_teamtag::TeamTag::new()));
        #[cfg(feature = "hotpotato")]
        self.register(ModeId::HotPotato, || {
            Box::new(tagparty_hotpotato::HotPotato::new())
        });
    }

    pub fn register(&mut self, mode: ModeId, factory: ModeFactory) {
        self.factories.insert(mode, factory);
    }

    pub fn create(&self, mode: ModeId) -> Result<Box<dyn GameMode>, HostError> {
        self.factories
            .get(&mode)
            .map(|f| f())
            .ok_or(HostError::ModeNotRegistered(mode))
    }

    /// Registered modes in id order.
    pub fn available_modes(&self) -> Vec<ModeId> {
        let mut modes: Vec<ModeId> = self.factories.keys().copied().collect();
        modes.sort_by_key(|m| *m as u8);
        modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(feature = "infection", feature = "teamtag", feature = "hotpotato"))]
    fn default_registry_has_every_mode() {
        let registry = ModeRegistry::new();
        assert_eq!(registry.available_modes(), ModeId::ALL.to_vec());
        for id in ModeId::ALL {
            let mode = registry.create(id).unwrap();
            assert_eq!(mode.metadata().id, id);
        }
    }

    #[test]
    fn empty_registry_reports_missing_mode() {
        let registry = ModeRegistry::empty();
        assert_eq!(
            registry.create(ModeId::TeamTag).err(),
            Some(HostError::ModeNotRegistered(ModeId::TeamTag))
        );
    }
}
