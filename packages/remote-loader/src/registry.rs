//! Per-environment remote descriptor tables.
//!
//! The shipped defaults come from [`builtin_descriptors`]. Deployments can
//! override them with a TOML file:
//!
//! ```toml
//! [[docker.remotes]]
//! name = "Blog"
//! key = "blog_remote"
//! url = "http://blog-frontend:30001/assets/remoteEntry.js"
//! moduleSpecifier = "./bootstrap"
//! mountFunctionName = "mountBlogApp"
//! basePath = "/blog"
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::descriptor::RemoteDescriptor;
use crate::error::ConfigError;

/// Environment variable selecting the deployment environment.
pub const ENVIRONMENT_VAR: &str = "PORTAL_ENV";

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Developer machine, every remote on its own localhost port.
    #[default]
    Local,
    /// docker compose network.
    Docker,
    /// Cluster behind the portal ingress.
    Kubernetes,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Docker => "docker",
            Environment::Kubernetes => "kubernetes",
        }
    }

    /// Read [`ENVIRONMENT_VAR`], defaulting to `Local` when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Environment::default()),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" => Ok(Environment::Local),
            "docker" => Ok(Environment::Docker),
            "k8s" | "kubernetes" => Ok(Environment::Kubernetes),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct BuiltinRemote {
    name: &'static str,
    key: &'static str,
    service: &'static str,
    port: u16,
    mount_function_name: &'static str,
    base_path: &'static str,
}

const BUILTIN_REMOTES: &[BuiltinRemote] = &[
    BuiltinRemote {
        name: "Blog",
        key: "blog_remote",
        service: "blog-frontend",
        port: 30001,
        mount_function_name: "mountBlogApp",
        base_path: "/blog",
    },
    BuiltinRemote {
        name: "Shopping",
        key: "shopping_remote",
        service: "shopping-frontend",
        port: 30002,
        mount_function_name: "mountShoppingApp",
        base_path: "/shopping",
    },
    BuiltinRemote {
        name: "Prism",
        key: "prism_remote",
        service: "prism-frontend",
        port: 30003,
        mount_function_name: "mountPrismApp",
        base_path: "/prism",
    },
    BuiltinRemote {
        name: "Seller",
        key: "seller_remote",
        service: "shopping-seller-frontend",
        port: 30004,
        mount_function_name: "mountSellerApp",
        base_path: "/seller",
    },
    BuiltinRemote {
        name: "Admin",
        key: "admin_remote",
        service: "admin-frontend",
        port: 30005,
        mount_function_name: "mountAdminApp",
        base_path: "/admin",
    },
];

/// The shipped descriptor table for `environment`.
pub fn builtin_descriptors(environment: Environment) -> Vec<RemoteDescriptor> {
    BUILTIN_REMOTES
        .iter()
        .map(|remote| {
            let url = match environment {
                Environment::Local => {
                    format!("http://localhost:{}/assets/remoteEntry.js", remote.port)
                }
                Environment::Docker => format!(
                    "http://{}:{}/assets/remoteEntry.js",
                    remote.service, remote.port
                ),
                Environment::Kubernetes => format!(
                    "https://portal.local/remotes/{}/assets/remoteEntry.js",
                    remote.service
                ),
            };
            RemoteDescriptor::new(
                remote.name,
                remote.key,
                url,
                "./bootstrap",
                remote.mount_function_name,
                remote.base_path,
            )
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvironmentTable {
    remotes: Vec<RemoteDescriptor>,
}

/// Registry file contents, one table per environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    #[serde(alias = "dev")]
    local: Option<EnvironmentTable>,
    docker: Option<EnvironmentTable>,
    #[serde(alias = "k8s")]
    kubernetes: Option<EnvironmentTable>,
}

impl RegistryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Registry for `environment`, falling back to the builtin table when
    /// the file has no section for it.
    pub fn registry(&self, environment: Environment) -> Result<RemoteRegistry, ConfigError> {
        let table = match environment {
            Environment::Local => &self.local,
            Environment::Docker => &self.docker,
            Environment::Kubernetes => &self.kubernetes,
        };
        match table {
            Some(table) => RemoteRegistry::new(environment, table.remotes.clone()),
            None => Ok(RemoteRegistry::builtin(environment)),
        }
    }
}

/// Validated descriptor table for one environment.
#[derive(Debug, Clone)]
pub struct RemoteRegistry {
    environment: Environment,
    descriptors: Vec<RemoteDescriptor>,
}

impl RemoteRegistry {
    /// Validate `descriptors` and reject duplicate keys.
    pub fn new(
        environment: Environment,
        descriptors: Vec<RemoteDescriptor>,
    ) -> Result<Self, ConfigError> {
        let mut keys = HashSet::new();
        for descriptor in &descriptors {
            descriptor.validate()?;
            if !keys.insert(descriptor.key.as_str()) {
                return Err(ConfigError::DuplicateKey {
                    environment: environment.to_string(),
                    key: descriptor.key.clone(),
                });
            }
        }
        Ok(Self {
            environment,
            descriptors,
        })
    }

    pub fn builtin(environment: Environment) -> Self {
        Self {
            environment,
            descriptors: builtin_descriptors(environment),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn get(&self, key: &str) -> Option<&RemoteDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    /// The remote owning `path`. The longest matching base path wins.
    pub fn resolve(&self, path: &str) -> Option<&RemoteDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.owns_path(path))
            .max_by_key(|d| d.base_path.trim_end_matches('/').len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_environment_names() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("Docker".parse::<Environment>().unwrap(), Environment::Docker);
        assert_eq!("k8s".parse::<Environment>().unwrap(), Environment::Kubernetes);
        assert!(matches!(
            "staging".parse::<Environment>(),
            Err(ConfigError::UnknownEnvironment(_))
        ));
    }

    #[test]
    fn builtin_tables_differ_only_in_urls() {
        let local = builtin_descriptors(Environment::Local);
        let docker = builtin_descriptors(Environment::Docker);
        assert_eq!(local.len(), docker.len());
        for (l, d) in local.iter().zip(&docker) {
            assert_eq!(l.key, d.key);
            assert_eq!(l.base_path, d.base_path);
            assert_ne!(l.url, d.url);
        }
        assert_eq!(local[0].url, "http://localhost:30001/assets/remoteEntry.js");
    }

    #[test]
    fn builtin_registry_is_valid() {
        for env in [Environment::Local, Environment::Docker, Environment::Kubernetes] {
            let builtin = builtin_descriptors(env);
            assert!(RemoteRegistry::new(env, builtin).is_ok());
        }
    }

    #[test]
    fn resolve_prefers_longest_base_path() {
        let registry = RemoteRegistry::new(
            Environment::Local,
            vec![
                RemoteDescriptor::new(
                    "Shop",
                    "shop",
                    "http://a/e.js",
                    "./bootstrap",
                    "mount",
                    "/shopping",
                ),
                RemoteDescriptor::new(
                    "Seller",
                    "seller",
                    "http://b/e.js",
                    "./bootstrap",
                    "mount",
                    "/shopping/seller",
                ),
            ],
        )
        .unwrap();

        assert_eq!(registry.resolve("/shopping/cart").unwrap().key, "shop");
        assert_eq!(registry.resolve("/shopping/seller/items").unwrap().key, "seller");
        assert!(registry.resolve("/blog").is_none());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let d = RemoteDescriptor::new(
            "Blog",
            "blog",
            "http://a/e.js",
            "./bootstrap",
            "mount",
            "/blog",
        );
        let err = RemoteRegistry::new(Environment::Local, vec![d.clone(), d]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey { .. }));
    }

    #[test]
    fn registry_file_overrides_one_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[docker.remotes]]
name = "Blog"
key = "blog_remote"
url = "http://blog:8080/remoteEntry.js"
moduleSpecifier = "./bootstrap"
mountFunctionName = "mountBlogApp"
basePath = "/blog"
"#
        )
        .unwrap();

        let config = RegistryConfig::from_file(file.path()).unwrap();
        let docker = config.registry(Environment::Docker).unwrap();
        assert_eq!(docker.len(), 1);
        assert_eq!(docker.get("blog_remote").unwrap().url, "http://blog:8080/remoteEntry.js");

        let local = config.registry(Environment::Local).unwrap();
        assert_eq!(local.len(), builtin_descriptors(Environment::Local).len());
    }

    #[test]
    fn k8s_alias_in_file() {
        let config = RegistryConfig::from_toml_str(
            r#"
[k8s]
remotes = []
"#,
        )
        .unwrap();
        assert!(config.registry(Environment::Kubernetes).unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = RegistryConfig::from_toml_str("[[docker.remotes]]\nname = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
