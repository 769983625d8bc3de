//! The remote loader and its two caches.
//!
//! Entry artifacts are cached by URL, so descriptors sharing a URL share one
//! fetch. Resolved mount functions are cached by key, so a repeated mount
//! skips both the fetch and the module factory. Failures are never cached.
//!
//! The loader does not deduplicate concurrent loads of a key that is not yet
//! cached. Two overlapping `load_remote` calls for the same remote may both
//! fetch; callers that care guard at their own level.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use portal_lifecycle::MountFn;
use tracing::{debug, error, info};

use crate::descriptor::RemoteDescriptor;
use crate::entry::RemoteEntry;
use crate::error::LoadError;
use crate::importer::EntryImporter;

/// Outcome of [`RemoteLoader::load_remote`]. Always carries the descriptor
/// that was requested.
#[derive(Clone)]
pub struct LoadResult {
    pub descriptor: RemoteDescriptor,
    pub outcome: Result<MountFn, LoadError>,
}

impl LoadResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn mount_fn(&self) -> Option<&MountFn> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> Result<MountFn, LoadError> {
        self.outcome
    }
}

impl fmt::Debug for LoadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadResult")
            .field("key", &self.descriptor.key)
            .field("success", &self.is_success())
            .field("error", &self.error())
            .finish()
    }
}

/// Resolves descriptors to mount functions.
pub struct RemoteLoader {
    importer: Arc<dyn EntryImporter>,
    entries: Mutex<HashMap<String, Arc<RemoteEntry>>>,
    mount_fns: Mutex<HashMap<String, MountFn>>,
}

impl RemoteLoader {
    pub fn new(importer: Arc<dyn EntryImporter>) -> Self {
        Self {
            importer,
            entries: Mutex::new(HashMap::new()),
            mount_fns: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `descriptor` to its mount function.
    ///
    /// Never fails outright: errors come back inside the [`LoadResult`].
    pub async fn load_remote(&self, descriptor: &RemoteDescriptor) -> LoadResult {
        let outcome = self.resolve(descriptor).await;
        if let Err(error) = &outcome {
            error!(key = %descriptor.key, %error, "failed to load remote");
        }
        LoadResult {
            descriptor: descriptor.clone(),
            outcome,
        }
    }

    async fn resolve(&self, descriptor: &RemoteDescriptor) -> Result<MountFn, LoadError> {
        let cached = self.mount_fns.lock().get(&descriptor.key).cloned();
        if let Some(mount) = cached {
            debug!(key = %descriptor.key, "mount function cache hit");
            return Ok(mount);
        }

        let entry = self.entry(&descriptor.url).await?;
        let container = entry.container().ok_or_else(|| LoadError::InvalidEntry {
            url: descriptor.url.clone(),
        })?;

        let factory = container.get(&descriptor.module_specifier)?;
        let module = factory().map_err(|e| LoadError::Factory {
            module: descriptor.module_specifier.clone(),
            message: e.to_string(),
        })?;
        let mount = module
            .get(&descriptor.mount_function_name)
            .ok_or_else(|| LoadError::MountFunctionMissing {
                module: descriptor.module_specifier.clone(),
                function: descriptor.mount_function_name.clone(),
            })?;

        self.mount_fns
            .lock()
            .insert(descriptor.key.clone(), mount.clone());
        info!(key = %descriptor.key, "remote loaded");
        Ok(mount)
    }

    async fn entry(&self, url: &str) -> Result<Arc<RemoteEntry>, LoadError> {
        let cached = self.entries.lock().get(url).cloned();
        if let Some(entry) = cached {
            return Ok(entry);
        }

        let entry = self.importer.import(url).await?;
        // An entry without a container is kept out of the cache so a fixed
        // redeploy is picked up by the next attempt.
        if entry.container().is_some() {
            self.entries
                .lock()
                .insert(url.to_string(), entry.clone());
        }
        Ok(entry)
    }

    /// Invalidate cached state.
    ///
    /// With a key, only that remote's mount function is dropped; its entry
    /// artifact stays cached for other remotes sharing the URL. Without a
    /// key, both caches are emptied.
    pub fn clear_cache(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.mount_fns.lock().remove(key);
            }
            None => {
                self.mount_fns.lock().clear();
                self.entries.lock().clear();
            }
        }
    }

    /// Whether a mount function for `key` is cached.
    pub fn is_cached(&self, key: &str) -> bool {
        self.mount_fns.lock().contains_key(key)
    }

    /// Whether the entry artifact at `url` is cached.
    pub fn has_artifact(&self, url: &str) -> bool {
        self.entries.lock().contains_key(url)
    }
}

impl fmt::Debug for RemoteLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteLoader")
            .field("entries", &self.entries.lock().len())
            .field("mount_fns", &self.mount_fns.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use portal_lifecycle::{Element, MountError, MountOptions};

    use super::*;
    use crate::entry::{EntryManifest, ModuleLinker, RemoteModule};

    /// Serves manifests from memory and counts fetches per URL.
    #[derive(Default)]
    struct MockImporter {
        manifests: Mutex<HashMap<String, String>>,
        fetches: Mutex<HashMap<String, usize>>,
        linker: ModuleLinker,
    }

    impl MockImporter {
        fn serve(&self, url: &str, manifest: &str) {
            self.manifests
                .lock()
                .insert(url.to_string(), manifest.to_string());
        }

        fn fetches(&self, url: &str) -> usize {
            self.fetches.lock().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl EntryImporter for MockImporter {
        async fn import(&self, url: &str) -> Result<Arc<RemoteEntry>, LoadError> {
            *self.fetches.lock().entry(url.to_string()).or_default() += 1;
            let body = self.manifests.lock().get(url).cloned();
            match body {
                Some(body) => {
                    let manifest = EntryManifest::parse(url, &body)?;
                    Ok(Arc::new(manifest.link(url, &self.linker)))
                }
                None => Err(LoadError::Fetch {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    const URL: &str = "http://host/remoteEntry.js";
    const MANIFEST: &str = r#"{"exposes": {"./bootstrap": "shared/bootstrap"}}"#;

    fn mount_fn() -> MountFn {
        Arc::new(|_: &Element, _: MountOptions| {
            Err(MountError::MissingElement {
                remote: "test".to_string(),
            })
        })
    }

    fn descriptor(key: &str, function: &str) -> RemoteDescriptor {
        RemoteDescriptor::new(key, key, URL, "./bootstrap", function, format!("/{key}"))
    }

    /// Importer serving one entry whose bootstrap exports two mount
    /// functions, plus a counter of factory invocations.
    fn setup() -> (Arc<MockImporter>, RemoteLoader, Arc<AtomicUsize>) {
        let importer = Arc::new(MockImporter::default());
        importer.serve(URL, MANIFEST);
        let factory_calls = Arc::new(AtomicUsize::new(0));
        let calls = factory_calls.clone();
        importer.linker.register("shared/bootstrap", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteModule::new()
                .export("mountBlogApp", mount_fn())
                .export("mountShoppingApp", mount_fn()))
        });
        let loader = RemoteLoader::new(importer.clone());
        (importer, loader, factory_calls)
    }

    #[tokio::test]
    async fn second_load_is_a_cache_hit() {
        let (importer, loader, factory_calls) = setup();
        let blog = descriptor("blog_remote", "mountBlogApp");

        let first = loader.load_remote(&blog).await;
        let second = loader.load_remote(&blog).await;

        assert!(first.is_success());
        assert!(second.is_success());
        assert!(Arc::ptr_eq(first.mount_fn().unwrap(), second.mount_fn().unwrap()));
        assert_eq!(importer.fetches(URL), 1);
        assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_key_re_resolves_but_reuses_artifact() {
        let (importer, loader, factory_calls) = setup();
        let blog = descriptor("blog_remote", "mountBlogApp");

        loader.load_remote(&blog).await;
        loader.clear_cache(Some("blog_remote"));
        assert!(!loader.is_cached("blog_remote"));
        assert!(loader.has_artifact(URL));

        assert!(loader.load_remote(&blog).await.is_success());
        assert_eq!(importer.fetches(URL), 1);
        assert_eq!(factory_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_all_refetches() {
        let (importer, loader, _) = setup();
        let blog = descriptor("blog_remote", "mountBlogApp");

        loader.load_remote(&blog).await;
        loader.clear_cache(None);
        assert!(!loader.has_artifact(URL));

        loader.load_remote(&blog).await;
        assert_eq!(importer.fetches(URL), 2);
    }

    #[tokio::test]
    async fn remotes_sharing_a_url_share_one_fetch() {
        let (importer, loader, _) = setup();

        let blog = loader.load_remote(&descriptor("blog_remote", "mountBlogApp")).await;
        let shop = loader
            .load_remote(&descriptor("shopping_remote", "mountShoppingApp"))
            .await;

        assert!(blog.is_success() && shop.is_success());
        assert_eq!(importer.fetches(URL), 1);
        assert!(loader.is_cached("blog_remote"));
        assert!(loader.is_cached("shopping_remote"));
        assert!(!Arc::ptr_eq(blog.mount_fn().unwrap(), shop.mount_fn().unwrap()));
    }

    #[tokio::test]
    async fn failed_fetch_does_not_poison_the_cache() {
        let importer = Arc::new(MockImporter::default());
        importer.linker.register("shared/bootstrap", || {
            Ok(RemoteModule::new().export("mountBlogApp", mount_fn()))
        });
        let loader = RemoteLoader::new(importer.clone());
        let blog = descriptor("blog_remote", "mountBlogApp");

        let failed = loader.load_remote(&blog).await;
        assert!(!failed.is_success());
        assert!(failed.mount_fn().is_none());
        assert!(matches!(failed.error(), Some(LoadError::Fetch { .. })));
        assert_eq!(failed.descriptor, blog);

        importer.serve(URL, MANIFEST);
        assert!(loader.load_remote(&blog).await.is_success());
        assert_eq!(importer.fetches(URL), 2);
    }

    #[tokio::test]
    async fn entry_without_container_is_invalid_and_not_cached() {
        let importer = Arc::new(MockImporter::default());
        importer.serve(URL, r#"{"name": "blog_remote"}"#);
        let loader = RemoteLoader::new(importer.clone());
        let blog = descriptor("blog_remote", "mountBlogApp");

        let result = loader.load_remote(&blog).await;
        assert_eq!(
            result.error(),
            Some(&LoadError::InvalidEntry { url: URL.to_string() })
        );
        assert!(!loader.has_artifact(URL));

        loader.load_remote(&blog).await;
        assert_eq!(importer.fetches(URL), 2);
    }

    #[tokio::test]
    async fn missing_mount_function_is_structural() {
        let (_, loader, _) = setup();
        let result = loader
            .load_remote(&descriptor("admin_remote", "mountAdminApp"))
            .await;

        assert!(matches!(
            result.into_result(),
            Err(LoadError::MountFunctionMissing { .. })
        ));
        assert!(!loader.is_cached("admin_remote"));
    }

    #[tokio::test]
    async fn factory_failure_is_reported() {
        let importer = Arc::new(MockImporter::default());
        importer.serve(URL, MANIFEST);
        importer
            .linker
            .register("shared/bootstrap", || Err("bundle evaluation failed".into()));
        let loader = RemoteLoader::new(importer);

        let result = loader.load_remote(&descriptor("blog_remote", "mountBlogApp")).await;
        match result.error() {
            Some(LoadError::Factory { message, .. }) => {
                assert_eq!(message, "bundle evaluation failed")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
