//! Policy registry: catalogue of the promotion policies this build knows.
//!
//! Each promotion run is a named [`RewardPolicy`]. The worker never picks one
//! on its own; configuration names the active policy and the registry turns
//! that name into a shared instance at startup.
//!
//! ```ignore
//! let reg = PolicyRegistry::with_builtin();
//! let policy = reg.instantiate("snowflake_2021")?;
//! ```
//!
//! Insertion order is preserved in `list()` output.

use std::sync::Arc;

use crate::{
    Birthday2020, Birthday2021, Republic2019, RewardPolicy, Snowflake2020, Snowflake2021,
};

/// Thread-safe factory producing a shareable policy instance.
pub type PolicyFactory = Box<dyn Fn() -> Arc<dyn RewardPolicy> + Send + Sync>;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Static metadata for a registered policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyMeta {
    /// Registry key. Matches `promotion.policy` in the configuration.
    pub name: String,
    pub description: String,
}

impl PolicyMeta {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyRegistryError {
    DuplicateName { name: String },
    UnknownPolicy { name: String },
    EmptyName,
}

impl std::fmt::Display for PolicyRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName { name } => {
                write!(f, "policy '{name}' is already registered")
            }
            Self::UnknownPolicy { name } => {
                write!(f, "no policy named '{name}' is registered")
            }
            Self::EmptyName => write!(f, "policy name must not be empty"),
        }
    }
}

impl std::error::Error for PolicyRegistryError {}

// ---------------------------------------------------------------------------
// PolicyRegistry
// ---------------------------------------------------------------------------

struct RegistryEntry {
    meta: PolicyMeta,
    factory: PolicyFactory,
}

pub struct PolicyRegistry {
    entries: Vec<RegistryEntry>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry preloaded with every promotion shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        let builtin: [(PolicyMeta, PolicyFactory); 5] = [
            (
                PolicyMeta::new("republic_2019", "0.8.6 Republic tokens and coal"),
                factory_of(Republic2019),
            ),
            (
                PolicyMeta::new("birthday_2020", "Fourth anniversary camouflages and containers"),
                factory_of(Birthday2020),
            ),
            (
                PolicyMeta::new("snowflake_2020", "Snowflake flags 2020: coal, steel, Santa crates"),
                factory_of(Snowflake2020),
            ),
            (
                PolicyMeta::new("birthday_2021", "Fifth anniversary festive tokens"),
                factory_of(Birthday2021),
            ),
            (
                PolicyMeta::new("snowflake_2021", "Snowflake flags 2021: coal, steel, certificates"),
                factory_of(Snowflake2021),
            ),
        ];
        for (meta, factory) in builtin {
            // Builtin names are distinct and non-empty.
            let _ = reg.register_boxed(meta, factory);
        }
        reg
    }

    /// # Errors
    /// - [`PolicyRegistryError::EmptyName`] if `meta.name` is blank.
    /// - [`PolicyRegistryError::DuplicateName`] if the name is taken.
    pub fn register<F>(&mut self, meta: PolicyMeta, factory: F) -> Result<(), PolicyRegistryError>
    where
        F: Fn() -> Arc<dyn RewardPolicy> + Send + Sync + 'static,
    {
        self.register_boxed(meta, Box::new(factory))
    }

    fn register_boxed(
        &mut self,
        meta: PolicyMeta,
        factory: PolicyFactory,
    ) -> Result<(), PolicyRegistryError> {
        if meta.name.trim().is_empty() {
            return Err(PolicyRegistryError::EmptyName);
        }
        if self.contains(&meta.name) {
            return Err(PolicyRegistryError::DuplicateName {
                name: meta.name.clone(),
            });
        }
        self.entries.push(RegistryEntry { meta, factory });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.meta.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list(&self) -> Vec<&PolicyMeta> {
        self.entries.iter().map(|e| &e.meta).collect()
    }

    /// # Errors
    /// [`PolicyRegistryError::UnknownPolicy`] if the name is not registered.
    pub fn instantiate(&self, name: &str) -> Result<Arc<dyn RewardPolicy>, PolicyRegistryError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.meta.name == name)
            .ok_or_else(|| PolicyRegistryError::UnknownPolicy {
                name: name.to_string(),
            })?;
        Ok((entry.factory)())
    }
}

fn factory_of<P>(policy: P) -> PolicyFactory
where
    P: RewardPolicy + Clone + 'static,
{
    Box::new(move || Arc::new(policy.clone()) as Arc<dyn RewardPolicy>)
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_match_policy_names() {
        let reg = PolicyRegistry::with_builtin();
        assert_eq!(reg.len(), 5);
        for meta in reg.list() {
            let policy = reg.instantiate(&meta.name).unwrap();
            assert_eq!(policy.name(), meta.name);
        }
    }

    #[test]
    fn builtin_list_preserves_insertion_order() {
        let reg = PolicyRegistry::with_builtin();
        let names: Vec<&str> = reg.list().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "republic_2019",
                "birthday_2020",
                "snowflake_2020",
                "birthday_2021",
                "snowflake_2021"
            ]
        );
    }

    #[test]
    fn unknown_policy_errors() {
        let reg = PolicyRegistry::with_builtin();
        let err = reg.instantiate("summer_2022").err();
        assert_eq!(
            err,
            Some(PolicyRegistryError::UnknownPolicy {
                name: "summer_2022".to_string()
            })
        );
    }

    #[test]
    fn duplicate_and_empty_names_are_rejected() {
        let mut reg = PolicyRegistry::with_builtin();
        let dup = reg.register(PolicyMeta::new("snowflake_2021", "again"), || {
            Arc::new(Snowflake2021)
        });
        assert_eq!(
            dup,
            Err(PolicyRegistryError::DuplicateName {
                name: "snowflake_2021".to_string()
            })
        );

        let empty = reg.register(PolicyMeta::new("  ", "blank"), || Arc::new(Snowflake2021));
        assert_eq!(empty, Err(PolicyRegistryError::EmptyName));
        assert_eq!(reg.len(), 5);
    }
}
