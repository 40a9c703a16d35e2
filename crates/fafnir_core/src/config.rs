//! # Core Tuning Configuration
//!
//! Runtime knobs for the entity core, loaded once at startup from an
//! external TOML file. Every field has a default, so an empty document is a
//! valid config.

use serde::Deserialize;

use crate::error::ConfigError;

/// Tuning knobs for [`crate::EntityManager`] and the component framework.
///
/// # Example
///
/// ```rust,ignore
/// let config = CoreConfig::from_toml_str(r#"
///     free_index_margin = 64
///     gc_alive_streak = 8
/// "#)?;
/// let world = World::with_config(&config);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Number of recycled entity indices that must accumulate before any of
    /// them is reused. Larger margins push the stale-handle aliasing window
    /// further out (`256 * margin` create/destroy cycles).
    pub free_index_margin: u32,
    /// Number of consecutive live instances the lazy GC probe must see
    /// before concluding a manager holds no dead data.
    pub gc_alive_streak: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            free_index_margin: 1024,
            gc_alive_streak: 4,
        }
    }
}

impl CoreConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid TOML or
    /// contains unknown fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
