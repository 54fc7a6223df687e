// Host-side package table: provided versions plus optional opaque capability handles.
use std::collections::BTreeMap;

use crate::core::error::{Error, ErrorKind};
use crate::core::version::{Version, VersionSpec};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageRecord<H> {
    pub name: String,
    pub version: Version,
    pub handle: Option<H>,
}

/// Result of a successful `require`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provided<H> {
    pub version: String,
    pub handle: Option<H>,
}

/// One active record per package name; the last `provide` wins.
#[derive(Debug)]
pub struct VersionRegistry<H> {
    packages: BTreeMap<String, PackageRecord<H>>,
}

impl<H: Clone> VersionRegistry<H> {
    pub fn new() -> Self {
        Self {
            packages: BTreeMap::new(),
        }
    }

    pub fn provide(&mut self, name: &str, version: &str, handle: Option<H>) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("package name is empty"));
        }
        let parsed = Version::parse(version).map_err(|err| err.with_package(name))?;
        let record = PackageRecord {
            name: name.to_string(),
            version: parsed,
            handle,
        };
        match self.packages.insert(name.to_string(), record) {
            Some(previous) if previous.version.as_str() != version => {
                tracing::warn!(
                    package = name,
                    previous = previous.version.as_str(),
                    current = version,
                    "package re-provided with a different version"
                );
            }
            _ => tracing::debug!(package = name, version, "package provided"),
        }
        Ok(())
    }

    pub fn require(&self, name: &str, spec: &str, exact: bool) -> Result<Provided<H>, Error> {
        let record = self.packages.get(name).ok_or_else(|| {
            Error::new(ErrorKind::PackageNotFound)
                .with_message(format!("can't find package {name}"))
                .with_package(name)
        })?;
        let spec = VersionSpec::parse(spec).map_err(|err| err.with_package(name))?;
        if !spec.accepts(&record.version, exact) {
            return Err(Error::new(ErrorKind::VersionIncompatible)
                .with_message(format!(
                    "version conflict for package \"{name}\": have {}, need {}{}",
                    record.version,
                    if exact && !spec.is_bare_pair() { "-exact " } else { "" },
                    spec
                ))
                .with_package(name));
        }
        tracing::debug!(
            package = name,
            spec = spec.as_str(),
            exact,
            version = record.version.as_str(),
            "package requirement satisfied"
        );
        Ok(Provided {
            version: record.version.as_str().to_string(),
            handle: record.handle.clone(),
        })
    }

    /// Provided version without any requirement check.
    pub fn present(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(|record| record.version.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&PackageRecord<H>> {
        self.packages.get(name)
    }

    pub fn forget(&mut self, name: &str) -> bool {
        let removed = self.packages.remove(name).is_some();
        if removed {
            tracing::debug!(package = name, "package forgotten");
        }
        removed
    }

    /// Sorted package names.
    pub fn names(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl<H: Clone> Default for VersionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::VersionRegistry;
    use crate::core::error::ErrorKind;

    fn registry(version: &str, handle: Option<u32>) -> VersionRegistry<u32> {
        let mut registry = VersionRegistry::new();
        registry.provide("Host", version, handle).expect("provide");
        registry
    }

    #[test]
    fn range_require_returns_version_and_handle() {
        let registry = registry("8.6.0", Some(7));
        let provided = registry.require("Host", "8.5-9.1", false).expect("require");
        assert_eq!(provided.version, "8.6.0");
        assert_eq!(provided.handle, Some(7));
    }

    #[test]
    fn bare_pair_requires_exact_prefix() {
        let registry = registry("8.6.0", Some(7));
        let err = registry.require("Host", "8.5", true).expect_err("prefix mismatch");
        assert_eq!(err.kind(), ErrorKind::VersionIncompatible);
        assert_eq!(err.package(), Some("Host"));
        assert_eq!(
            err.message(),
            Some("version conflict for package \"Host\": have 8.6.0, need 8.5")
        );
        let err = registry.require("Host", "8.5", false).expect_err("flag is ignored");
        assert_eq!(err.kind(), ErrorKind::VersionIncompatible);
        assert!(registry.require("Host", "8.6", false).is_ok());
    }

    #[test]
    fn missing_package_is_not_found() {
        let registry = registry("8.6.0", None);
        let err = registry.require("Other", "1.0-2.0", false).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::PackageNotFound);
        assert_eq!(err.message(), Some("can't find package Other"));
    }

    #[test]
    fn provide_overwrites_previous_record() {
        let mut registry = registry("8.6.0", Some(1));
        registry.provide("Host", "9.0", Some(2)).expect("re-provide");
        assert_eq!(registry.len(), 1);
        let provided = registry.require("Host", "8.5-9.1", false).expect("require");
        assert_eq!(provided.version, "9.0");
        assert_eq!(provided.handle, Some(2));

        registry.provide("Host", "9.0", Some(3)).expect("same version");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Host").and_then(|r| r.handle), Some(3));
    }

    #[test]
    fn handle_absence_is_not_a_version_failure() {
        let registry = registry("8.6.0", None);
        let provided = registry.require("Host", "8.5-9.1", false).expect("require");
        assert_eq!(provided.handle, None);
    }

    #[test]
    fn invalid_inputs_are_usage_errors() {
        let mut registry: VersionRegistry<u32> = VersionRegistry::new();
        assert_eq!(
            registry.provide("", "1.0", None).expect_err("empty name").kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            registry.provide("Host", "one", None).expect_err("bad version").kind(),
            ErrorKind::Usage
        );
        registry.provide("Host", "1.0", None).expect("provide");
        assert_eq!(
            registry.require("Host", "1.x", false).expect_err("bad spec").kind(),
            ErrorKind::Usage
        );
    }

    #[test]
    fn names_present_and_forget() {
        let mut registry = registry("8.6.0", None);
        registry.provide("Alpha", "1.2", None).expect("provide");
        assert_eq!(registry.names(), vec!["Alpha", "Host"]);
        assert_eq!(registry.present("Alpha"), Some("1.2"));
        assert!(registry.forget("Alpha"));
        assert!(!registry.forget("Alpha"));
        assert_eq!(registry.present("Alpha"), None);
        assert_eq!(registry.names(), vec!["Host"]);
    }
}
