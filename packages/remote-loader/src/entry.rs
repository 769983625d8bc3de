//! Entry artifacts and the modules they expose.
//!
//! An entry artifact is the small manifest a remote publishes at its entry
//! URL. Through it the host asks for exposed modules by specifier
//! (`./bootstrap`); each exposed module is a factory producing a
//! [`RemoteModule`], a table of named exports.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use portal_lifecycle::{BoxError, MountFn};
use serde::Deserialize;

use crate::error::LoadError;

/// Produces a module's exports. Invoked once per successful resolution.
pub type ModuleFactory = Arc<dyn Fn() -> Result<RemoteModule, BoxError> + Send + Sync>;

/// The evaluated exports of one exposed module.
#[derive(Clone, Default)]
pub struct RemoteModule {
    exports: BTreeMap<String, MountFn>,
}

impl RemoteModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(mut self, name: impl Into<String>, mount: MountFn) -> Self {
        self.exports.insert(name.into(), mount);
        self
    }

    pub fn get(&self, name: &str) -> Option<MountFn> {
        self.exports.get(name).cloned()
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }
}

impl fmt::Debug for RemoteModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteModule")
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The `get(moduleSpecifier)` capability of a remote entry.
pub trait RemoteContainer: Send + Sync {
    fn get(&self, module: &str) -> Result<ModuleFactory, LoadError>;
}

/// A loaded entry artifact.
///
/// An entry without a container is structurally invalid: it was fetched,
/// but nothing can be requested through it.
#[derive(Clone)]
pub struct RemoteEntry {
    url: String,
    container: Option<Arc<dyn RemoteContainer>>,
}

impl RemoteEntry {
    pub fn new(url: impl Into<String>, container: Arc<dyn RemoteContainer>) -> Self {
        Self {
            url: url.into(),
            container: Some(container),
        }
    }

    /// An entry that exposes nothing.
    pub fn without_container(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            container: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn container(&self) -> Option<&Arc<dyn RemoteContainer>> {
        self.container.as_ref()
    }
}

impl fmt::Debug for RemoteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteEntry")
            .field("url", &self.url)
            .field("container", &self.container.is_some())
            .finish()
    }
}

/// Module factories compiled into the host, keyed by module id.
///
/// Entry manifests name module ids; the linker binds them late, when a
/// remote is first resolved.
#[derive(Clone, Default)]
pub struct ModuleLinker {
    modules: Arc<RwLock<HashMap<String, ModuleFactory>>>,
}

impl ModuleLinker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        module_id: impl Into<String>,
        factory: impl Fn() -> Result<RemoteModule, BoxError> + Send + Sync + 'static,
    ) {
        self.modules
            .write()
            .insert(module_id.into(), Arc::new(factory));
    }

    pub fn resolve(&self, module_id: &str) -> Option<ModuleFactory> {
        self.modules.read().get(module_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

impl fmt::Debug for ModuleLinker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.modules.read();
        f.debug_struct("ModuleLinker")
            .field("modules", &modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The JSON manifest served at a remote's entry URL.
///
/// ```json
/// {"name": "blog_remote", "exposes": {"./bootstrap": "blog/bootstrap"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntryManifest {
    #[serde(default)]
    pub name: Option<String>,
    /// Specifier to module id. Absent on artifacts that are not entries.
    #[serde(default)]
    pub exposes: Option<BTreeMap<String, String>>,
}

impl EntryManifest {
    /// Parse a manifest body.
    pub fn parse(url: &str, body: &str) -> Result<Self, LoadError> {
        serde_json::from_str(body).map_err(|e| LoadError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Bind the manifest to `linker`, yielding a loaded entry.
    pub fn link(self, url: &str, linker: &ModuleLinker) -> RemoteEntry {
        match self.exposes {
            Some(exposes) => RemoteEntry::new(
                url,
                Arc::new(LinkedContainer {
                    url: url.to_string(),
                    exposes,
                    linker: linker.clone(),
                }),
            ),
            None => RemoteEntry::without_container(url),
        }
    }
}

struct LinkedContainer {
    url: String,
    exposes: BTreeMap<String, String>,
    linker: ModuleLinker,
}

impl RemoteContainer for LinkedContainer {
    fn get(&self, module: &str) -> Result<ModuleFactory, LoadError> {
        let module_id = self
            .exposes
            .get(module)
            .ok_or_else(|| LoadError::ModuleNotExposed {
                url: self.url.clone(),
                module: module.to_string(),
            })?;
        self.linker
            .resolve(module_id)
            .ok_or_else(|| LoadError::ModuleNotLinked {
                module: module.to_string(),
                module_id: module_id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_lifecycle::{Element, MountError, MountOptions};

    fn failing_mount() -> MountFn {
        Arc::new(|_: &Element, _: MountOptions| {
            Err(MountError::MissingElement {
                remote: "test".to_string(),
            })
        })
    }

    #[test]
    fn manifest_with_exposes_links_modules() {
        let linker = ModuleLinker::new();
        linker.register("blog/bootstrap", || {
            Ok(RemoteModule::new().export("mountBlogApp", failing_mount()))
        });

        let manifest = EntryManifest::parse(
            "http://host/remoteEntry.js",
            r#"{"name": "blog_remote", "exposes": {"./bootstrap": "blog/bootstrap"}}"#,
        )
        .unwrap();
        let entry = manifest.link("http://host/remoteEntry.js", &linker);

        let factory = entry.container().unwrap().get("./bootstrap").unwrap();
        let module = factory().unwrap();
        assert!(module.get("mountBlogApp").is_some());
        assert_eq!(module.export_names().collect::<Vec<_>>(), vec!["mountBlogApp"]);
    }

    #[test]
    fn manifest_without_exposes_has_no_container() {
        let manifest = EntryManifest::parse("u", r#"{"name": "static-asset"}"#).unwrap();
        let entry = manifest.link("u", &ModuleLinker::new());
        assert!(entry.container().is_none());
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = EntryManifest::parse("u", "export default {}").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn unexposed_and_unlinked_modules() {
        let manifest =
            EntryManifest::parse("u", r#"{"exposes": {"./bootstrap": "missing/id"}}"#).unwrap();
        let entry = manifest.link("u", &ModuleLinker::new());
        let container = entry.container().unwrap();

        assert!(matches!(
            container.get("./other"),
            Err(LoadError::ModuleNotExposed { .. })
        ));
        assert!(matches!(
            container.get("./bootstrap"),
            Err(LoadError::ModuleNotLinked { .. })
        ));
    }
}
