//! Per-invocation engine state.
//!
//! One [`Engine`] exists per intercepted tool run. Expensive resources are
//! created on first use and kept on the engine for the rest of the run.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use prism_cache::{derive_action_id, BuildCache};
use prism_common::{ActionId, ContentHash, Fingerprint};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::host::{split_test_variant, FingerprintQuery, Host};
use crate::transform::{EngineConfig, TransformContext, Transformer};

/// The package being built, from the host's `TOOLEXEC_IMPORTPATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Import path, test suffix removed.
    pub package: String,
    /// Whether this is the package's test variant.
    pub for_test: bool,
}

impl Invocation {
    /// Parses an import path of the form `p` or `p [p.test]`.
    pub fn from_import_path(value: &str) -> Result<Self, EngineError> {
        let (package, for_test) = split_test_variant(value).ok_or_else(|| {
            EngineError::Invocation(format!(
                "import path {value:?} contains a space but is not a test variant"
            ))
        })?;
        Ok(Self {
            package: package.to_string(),
            for_test,
        })
    }
}

/// The dimension build engine for one intercepted tool invocation.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) host: Host,
    pub(crate) invocation: Invocation,
    executable: Option<PathBuf>,
    temp_dir: OnceCell<PathBuf>,
    cache: OnceCell<BuildCache>,
    fingerprints: OnceCell<BTreeMap<String, Fingerprint>>,
    executable_id: OnceCell<Vec<u8>>,
}

impl Engine {
    /// Validates `config` and creates an engine.
    pub fn new(config: EngineConfig, host: Host, invocation: Invocation) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            host,
            invocation,
            executable: None,
            temp_dir: OnceCell::new(),
            cache: OnceCell::new(),
            fingerprints: OnceCell::new(),
            executable_id: OnceCell::new(),
        })
    }

    /// Uses `path` as the engine executable when folding it into tool ids.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The intercepted package.
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub(crate) fn context<'a>(&'a self, dimension: &'a str) -> TransformContext<'a> {
        TransformContext {
            dimension,
            version: &self.config.version,
        }
    }

    pub(crate) fn transformer(&self, dimension: &str) -> Option<&dyn Transformer> {
        self.config.transformers.get(dimension).map(|t| t.as_ref())
    }

    /// Whether `dimension` applies to `package`.
    pub fn applies(&self, dimension: &str, package: &str) -> Result<bool, EngineError> {
        let Some(transformer) = self.transformer(dimension) else {
            return Ok(false);
        };
        transformer
            .applies_to(&self.context(dimension), package)
            .map_err(|source| EngineError::Transform {
                package: package.to_string(),
                dimension: dimension.to_string(),
                source,
            })
    }

    /// Dimensions applying to `package`, in name order.
    pub fn applicable_dimensions(&self, package: &str) -> Result<Vec<String>, EngineError> {
        let mut out = Vec::new();
        for dimension in self.config.dimensions() {
            if self.applies(dimension, package)? {
                out.push(dimension.to_string());
            }
        }
        Ok(out)
    }

    /// The private temporary directory, created on first use.
    pub fn temp_dir(&self) -> Result<&Path, EngineError> {
        if let Some(dir) = self.temp_dir.get() {
            return Ok(dir);
        }
        let dir = tempfile::Builder::new()
            .prefix("prism-build-")
            .tempdir()
            .map_err(|e| EngineError::io(std::env::temp_dir(), e))?
            .keep();
        debug!(dir = %dir.display(), "created temp dir");
        Ok(self.temp_dir.get_or_init(|| dir))
    }

    /// The build cache, opened on first use.
    pub fn cache(&self) -> Result<&BuildCache, EngineError> {
        if let Some(cache) = self.cache.get() {
            return Ok(cache);
        }
        let root = self.config.settings.resolved_cache_dir()?;
        let cache = BuildCache::open(&root, &self.config.version)?;
        Ok(self.cache.get_or_init(|| cache))
    }

    /// Host fingerprints, queried once per invocation.
    pub(crate) fn fingerprints(
        &self,
        query: &FingerprintQuery,
    ) -> Result<&BTreeMap<String, Fingerprint>, EngineError> {
        if let Some(map) = self.fingerprints.get() {
            return Ok(map);
        }
        let map = self.host.fingerprints.fingerprints(query)?;
        debug!(packages = map.len(), "loaded package fingerprints");
        Ok(self.fingerprints.get_or_init(|| map))
    }

    /// The fingerprint query for the current compile.
    pub(crate) fn compile_query(&self) -> FingerprintQuery {
        FingerprintQuery::Deps {
            package: self.invocation.package.clone(),
            for_test: self.invocation.for_test,
        }
    }

    /// The dimension action id of an already fingerprinted package.
    pub(crate) fn dimension_action_id(
        &self,
        query: &FingerprintQuery,
        package: &str,
        dimension: &str,
    ) -> Result<ActionId, EngineError> {
        let fingerprint = self.fingerprints(query)?.get(package).ok_or_else(|| {
            EngineError::MissingFingerprint {
                package: package.to_string(),
            }
        })?;
        Ok(derive_action_id(fingerprint, dimension, &self.config.version))
    }

    /// Path of the cached dimension artifact of `package`.
    pub(crate) fn dimension_artifact(
        &self,
        query: &FingerprintQuery,
        package: &str,
        dimension: &str,
    ) -> Result<PathBuf, EngineError> {
        let id = self.dimension_action_id(query, package, dimension)?;
        let entry = self
            .cache()?
            .get_artifact(&id)
            .ok_or_else(|| EngineError::MissingArtifact {
                package: package.to_string(),
                dimension: dimension.to_string(),
                what: "artifact",
            })?;
        Ok(entry.path)
    }

    /// Content id of the engine executable, computed once.
    pub(crate) fn executable_id(&self) -> Result<&[u8], EngineError> {
        if let Some(id) = self.executable_id.get() {
            return Ok(id);
        }
        let path = match &self.executable {
            Some(path) => path.clone(),
            None => std::env::current_exe().map_err(|e| EngineError::io("<current exe>", e))?,
        };
        let bytes = fs::read(&path).map_err(|e| EngineError::io(&path, e))?;
        let id = ContentHash::from_bytes(&bytes).as_bytes().to_vec();
        Ok(self.executable_id.get_or_init(|| id))
    }

    /// Releases per-invocation resources: trims the cache if it was opened
    /// and removes the temporary directory unless it is retained.
    pub fn finish(self) {
        if let Some(cache) = self.cache.get() {
            match cache.trim() {
                Ok(stats) if !stats.skipped => debug!(
                    entries = stats.entries_removed,
                    data = stats.data_removed,
                    "trimmed build cache"
                ),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "failed trimming build cache"),
            }
        }
        if let Some(dir) = self.temp_dir.get() {
            if self.config.settings.retain_temp_dir {
                debug!(dir = %dir.display(), "retaining temp dir");
            } else if let Err(err) = fs::remove_dir_all(dir) {
                warn!(dir = %dir.display(), error = %err, "unable to remove temp dir");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::{FingerprintSource, PackageLookup, ToolRunner};
    use crate::transform::{TransformError, TransformResult};
    use crate::unit::{CompilationUnit, SyntaxLoader};

    struct Prefix(&'static str);

    impl Transformer for Prefix {
        fn applies_to(&self, _: &TransformContext<'_>, package: &str) -> Result<bool, TransformError> {
            if package == "explode" {
                return Err("cannot decide".into());
            }
            Ok(package.starts_with(self.0))
        }

        fn transform(
            &self,
            _: &TransformContext<'_>,
            _: &CompilationUnit,
        ) -> Result<TransformResult, TransformError> {
            Ok(TransformResult::default())
        }
    }

    struct Nothing;

    impl ToolRunner for Nothing {
        fn run(&self, _: &[String]) -> Result<i32, HostError> {
            Ok(0)
        }
        fn output(&self, _: &[String]) -> Result<String, HostError> {
            Ok(String::new())
        }
    }

    impl FingerprintSource for Nothing {
        fn fingerprints(
            &self,
            _: &FingerprintQuery,
        ) -> Result<BTreeMap<String, Fingerprint>, HostError> {
            Ok(BTreeMap::from([("a/x".to_string(), Fingerprint::new("fx"))]))
        }
    }

    impl PackageLookup for Nothing {
        fn export_file(&self, package: &str) -> Result<PathBuf, HostError> {
            Err(HostError::NoExport {
                package: package.to_string(),
            })
        }
    }

    fn host() -> Host {
        Host {
            runner: Box::new(Nothing),
            fingerprints: Box::new(Nothing),
            packages: Box::new(Nothing),
            loader: Box::new(SyntaxLoader),
        }
    }

    fn engine(cache: &Path) -> Engine {
        let mut config = EngineConfig::new("v1")
            .with_transformer("one", Prefix("a/"))
            .with_transformer("two", Prefix("b/"));
        config.settings.cache_dir = Some(cache.to_path_buf());
        Engine::new(config, host(), Invocation::default()).unwrap()
    }

    #[test]
    fn invocation_parsing() {
        let plain = Invocation::from_import_path("example.com/p").unwrap();
        assert_eq!(plain.package, "example.com/p");
        assert!(!plain.for_test);
        let test = Invocation::from_import_path("example.com/p [example.com/p.test]").unwrap();
        assert_eq!(test.package, "example.com/p");
        assert!(test.for_test);
        assert!(Invocation::from_import_path("a b").is_err());
    }

    #[test]
    fn invalid_config_rejected() {
        let err = Engine::new(EngineConfig::new("v1"), host(), Invocation::default()).err().unwrap();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn applicability() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        assert_eq!(e.applicable_dimensions("a/x").unwrap(), vec!["one"]);
        assert_eq!(e.applicable_dimensions("b/y").unwrap(), vec!["two"]);
        assert!(e.applicable_dimensions("c").unwrap().is_empty());
        assert!(!e.applies("nope", "a/x").unwrap());
        let err = e.applicable_dimensions("explode").unwrap_err();
        assert!(err.to_string().contains("cannot decide"));
    }

    #[test]
    fn temp_dir_is_lazy_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let temp = e.temp_dir().unwrap().to_path_buf();
        assert_eq!(e.temp_dir().unwrap(), temp.as_path());
        assert!(temp.is_dir());
        assert!(temp.file_name().unwrap().to_str().unwrap().starts_with("prism-build-"));
        e.finish();
        assert!(!temp.exists());
    }

    #[test]
    fn temp_dir_retained() {
        let dir = tempfile::tempdir().unwrap();
        let mut e = engine(dir.path());
        e.config.settings.retain_temp_dir = true;
        let temp = e.temp_dir().unwrap().to_path_buf();
        e.finish();
        assert!(temp.is_dir());
        fs::remove_dir_all(temp).unwrap();
    }

    #[test]
    fn action_ids_and_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let query = e.compile_query();
        let id = e.dimension_action_id(&query, "a/x", "one").unwrap();
        assert_eq!(id, derive_action_id(&Fingerprint::new("fx"), "one", "v1"));
        assert!(matches!(
            e.dimension_action_id(&query, "zzz", "one"),
            Err(EngineError::MissingFingerprint { .. })
        ));
        assert!(matches!(
            e.dimension_artifact(&query, "a/x", "one"),
            Err(EngineError::MissingArtifact { .. })
        ));
        e.cache().unwrap().put_artifact(&id, b"obj").unwrap();
        let path = e.dimension_artifact(&query, "a/x", "one").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"obj");
    }

    #[test]
    fn executable_id_hashes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("prism-tool");
        fs::write(&exe, b"binary").unwrap();
        let e = engine(dir.path()).with_executable(&exe);
        assert_eq!(
            e.executable_id().unwrap(),
            ContentHash::from_bytes(b"binary").as_bytes()
        );
    }
}
