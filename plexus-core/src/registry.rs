use std::collections::HashMap;
use std::sync::RwLock;

use plexus_error::PlexusError;

use crate::genome::VersionPair;

struct Entry<T> {
    value: T,
    version: VersionPair,
}

/// A name-keyed registry of operators or activations, each registered once
/// with a `(schemaVersion, codecVersion)` pair.
///
/// Per the design notes, this is a read-mostly map guarded by a lock rather
/// than a process-global: a host constructs one per monitor and registers
/// everything explicitly before the run starts. Registration is write-once —
/// a duplicate name fails rather than silently overwriting.
pub struct Registry<T> {
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, version: VersionPair, value: T) -> Result<(), PlexusError> {
        let name = name.into();
        let mut entries = self.entries.write().unwrap();
        if entries.contains_key(&name) {
            return Err(PlexusError::RegistryDuplicate { name: name.into() });
        }
        entries.insert(name, Entry { value, version });
        Ok(())
    }

    /// Resolves `name`, requiring the stored version to exactly match
    /// `expected`. Distinguishes a missing name from a version mismatch.
    pub fn resolve(&self, name: &str, expected: VersionPair) -> Result<T, PlexusError>
    where
        T: Clone,
    {
        let entries = self.entries.read().unwrap();
        let entry = entries
            .get(name)
            .ok_or_else(|| PlexusError::RegistryNotFound { name: name.to_string().into() })?;

        if entry.version != expected {
            return Err(PlexusError::RegistryVersionMismatch {
                name: name.to_string().into(),
                message: format!(
                    "expected schema {}/codec {}, found schema {}/codec {}",
                    expected.schema_version, expected.codec_version, entry.version.schema_version, entry.version.codec_version
                )
                .into(),
            });
        }

        Ok(entry.value.clone())
    }

    /// Resolves `name` and additionally requires `compatible` to accept the
    /// stored version, surfacing a distinct error kind when it refuses.
    pub fn resolve_compatible(
        &self,
        name: &str,
        compatible: impl FnOnce(VersionPair) -> bool,
    ) -> Result<T, PlexusError>
    where
        T: Clone,
    {
        let entries = self.entries.read().unwrap();
        let entry = entries
            .get(name)
            .ok_or_else(|| PlexusError::RegistryNotFound { name: name.to_string().into() })?;

        if !compatible(entry.version) {
            return Err(PlexusError::RegistryIncompatible {
                name: name.to_string().into(),
                message: "version failed compatibility predicate".into(),
            });
        }

        Ok(entry.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(schema: u32, codec: u32) -> VersionPair {
        VersionPair {
            schema_version: schema,
            codec_version: codec,
        }
    }

    #[test]
    fn duplicate_registration_fails() {
        let reg: Registry<i32> = Registry::new();
        reg.register("a", v(1, 1), 1).unwrap();
        let err = reg.register("a", v(1, 1), 2).unwrap_err();
        assert_eq!(err.code(), plexus_error::ErrorCode::RegistryDuplicate);
    }

    #[test]
    fn missing_name_is_distinct_from_version_mismatch() {
        let reg: Registry<i32> = Registry::new();
        reg.register("a", v(1, 1), 1).unwrap();

        assert_eq!(
            reg.resolve("missing", v(1, 1)).unwrap_err().code(),
            plexus_error::ErrorCode::RegistryNotFound
        );
        assert_eq!(
            reg.resolve("a", v(2, 1)).unwrap_err().code(),
            plexus_error::ErrorCode::RegistryVersionMismatch
        );
    }

    #[test]
    fn compatible_predicate_gates_resolution() {
        let reg: Registry<i32> = Registry::new();
        reg.register("a", v(1, 1), 42).unwrap();

        assert_eq!(reg.resolve_compatible("a", |ver| ver.schema_version == 1).unwrap(), 42);
        assert_eq!(
            reg.resolve_compatible("a", |ver| ver.schema_version == 2)
                .unwrap_err()
                .code(),
            plexus_error::ErrorCode::RegistryIncompatible
        );
    }
}
