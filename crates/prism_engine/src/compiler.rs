//! Building the dimension variants of one compilation unit.
//!
//! Per applicable dimension a unit goes
//! `NotApplicable | Cached | NeedsBuild → Loaded → Transformed → Patched →
//! Compiled → Stored`. The unit is loaded at most once and shared by every
//! dimension that needs a build.

use std::fs;
use std::path::{Path, PathBuf};

use prism_cache::{derive_action_id, dimension_build_id, CacheEntry, DimensionMetadata};
use prism_common::{ActionId, Deferral, Fingerprint, Outcome};
use prism_patch::{apply_patches, Patch, PatchedFile};
use tracing::{debug, info};

use crate::context::Engine;
use crate::error::EngineError;
use crate::flags::{CompileArgs, CompileFlag};
use crate::host::FingerprintQuery;
use crate::manifest::{DimensionRefs, ImportManifest};
use crate::marker::{check_in_var, spec_marker, MarkerTarget};
use crate::transform::TransformResult;
use crate::unit::CompilationUnit;

/// Where one dimension of a unit ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionStatus {
    /// The dimension does not apply to the unit.
    NotApplicable,
    /// A previous build is cached under the same action id.
    Cached(ActionId),
    /// The unit could not be loaded; the host compiler will report why.
    Deferred(Deferral),
    /// Built and stored in the cache.
    Stored(CacheEntry),
}

/// The status of every configured dimension for one unit, in name order.
pub type CompileReport = Vec<(String, DimensionStatus)>;

impl Engine {
    /// Builds and caches every applicable dimension variant of the unit
    /// described by `args`.
    pub fn compile_dimensions(&self, args: &CompileArgs) -> Result<CompileReport, EngineError> {
        let package = args.get(CompileFlag::Package);
        let applicable = self.applicable_dimensions(package)?;
        let mut report: CompileReport = self
            .config
            .dimensions()
            .filter(|d| !applicable.iter().any(|a| a == d))
            .map(|d| (d.to_string(), DimensionStatus::NotApplicable))
            .collect();
        if applicable.is_empty() {
            return Ok(report);
        }

        let query = self.compile_query();
        let fingerprint = self.unit_fingerprint(&query, package, args.get(CompileFlag::BuildId))?;

        let mut loaded: Option<Outcome<CompilationUnit>> = None;
        for dimension in applicable {
            let id = derive_action_id(&fingerprint, &dimension, &self.config.version);
            if !self.config.settings.force_transform && self.is_cached(&id)? {
                debug!(package = %package, dimension = %dimension, action = %id, "dimension artifact cached, skipping");
                report.push((dimension, DimensionStatus::Cached(id)));
                continue;
            }
            if loaded.is_none() {
                let sources: Vec<PathBuf> = args.sources().map(PathBuf::from).collect();
                loaded = Some(self.host.loader.load(package, &sources)?);
            }
            let unit = match &loaded {
                Some(Outcome::Ready(unit)) => unit,
                Some(Outcome::Deferred(deferral)) => {
                    debug!(package = %package, dimension = %dimension, reason = %deferral, "deferring to host compiler");
                    report.push((dimension, DimensionStatus::Deferred(deferral.clone())));
                    continue;
                }
                None => continue,
            };
            let entry = self.build_dimension(args, &query, unit, &dimension, &id)?;
            info!(package = %package, dimension = %dimension, action = %id, "stored dimension artifact");
            report.push((dimension, DimensionStatus::Stored(entry)));
        }
        report.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(report)
    }

    /// The unit fingerprint from `-buildid`, checked against the listing.
    fn unit_fingerprint(
        &self,
        query: &FingerprintQuery,
        package: &str,
        build_id: &str,
    ) -> Result<Fingerprint, EngineError> {
        let fingerprint =
            Fingerprint::from_build_id(build_id).ok_or_else(|| EngineError::InvalidBuildId {
                build_id: build_id.to_string(),
            })?;
        if let Some(listed) = self.fingerprints(query)?.get(package) {
            if *listed != fingerprint {
                return Err(EngineError::FingerprintMismatch {
                    package: package.to_string(),
                    expected: fingerprint.to_string(),
                    actual: listed.to_string(),
                });
            }
        }
        Ok(fingerprint)
    }

    /// A dimension counts as built only when both payloads are present, so
    /// the link phase can rely on the metadata.
    fn is_cached(&self, id: &ActionId) -> Result<bool, EngineError> {
        let cache = self.cache()?;
        Ok(cache.get_artifact(id).is_some() && cache.get_metadata(id).is_some())
    }

    fn build_dimension(
        &self,
        args: &CompileArgs,
        query: &FingerprintQuery,
        unit: &CompilationUnit,
        dimension: &str,
        id: &ActionId,
    ) -> Result<CacheEntry, EngineError> {
        let package = unit.import_path.as_str();
        let ctx = self.context(dimension);
        let transformer = self.transformer(dimension).ok_or_else(|| {
            EngineError::Invocation(format!("dimension {dimension} is not configured"))
        })?;
        let result = transformer
            .transform(&ctx, unit)
            .map_err(|source| EngineError::Transform {
                package: package.to_string(),
                dimension: dimension.to_string(),
                source,
            })?;

        let (import_patches, import_refs) = self.import_patches(unit, dimension)?;
        let in_var_patches = in_var_patches(unit, dimension, |d| self.config.has_dimension(d))?;
        let mut patches = result.patches.clone();
        patches.extend(import_patches);
        patches.extend(in_var_patches);
        let patched = apply_patches(&unit.db, &patches).map_err(|source| EngineError::Patch {
            package: package.to_string(),
            dimension: dimension.to_string(),
            source,
        })?;

        let work = self.temp_dir()?.join(dimension);
        fs::create_dir_all(&work).map_err(|e| EngineError::io(&work, e))?;
        let mut dim_args = args.clone();
        for file in patched.values() {
            let written = write_patched(&work, file, &result, dimension)?;
            dim_args.replace_source(&file.path.to_string_lossy(), written.to_string_lossy());
        }

        let output = work.join("_pkg_.a");
        let manifest = self.dimension_manifest(args, query, &import_refs, &result)?;
        dim_args.set(CompileFlag::Output, output.to_string_lossy());
        dim_args.set(CompileFlag::Package, ctx.dimension_package_path(package));
        dim_args.set(CompileFlag::BuildId, dimension_build_id(id));
        dim_args.set(CompileFlag::ImportCfg, manifest.to_string_lossy());
        dim_args.set(
            CompileFlag::TrimPath,
            extend_trimpath(args.get(CompileFlag::TrimPath), self.temp_dir()?),
        );

        debug!(package = %package, dimension = %dimension, args = ?dim_args.args(), "compiling dimension");
        let code = self.host.runner.run(dim_args.args())?;
        if code != 0 {
            return Err(EngineError::ToolFailed {
                tool: "compile".to_string(),
                package: ctx.dimension_package_path(package),
                code,
            });
        }

        let bytes = fs::read(&output).map_err(|e| EngineError::io(&output, e))?;
        let cache = self.cache()?;
        let metadata = DimensionMetadata {
            extra_dependency_packages: result.extra_dependency_packages.iter().cloned().collect(),
        };
        cache.put_metadata(id, &metadata)?;
        Ok(cache.put_artifact(id, &bytes)?)
    }

    /// Rewrites every import that has a variant in `dimension` to that
    /// variant, keeping the written alias.
    fn import_patches(
        &self,
        unit: &CompilationUnit,
        dimension: &str,
    ) -> Result<(Vec<Patch>, DimensionRefs), EngineError> {
        let mut patches = Vec::new();
        let mut refs = DimensionRefs::new();
        for syntax in &unit.files {
            for import in &syntax.imports {
                if !self.applies(dimension, &import.path)? {
                    continue;
                }
                let path = self.context(dimension).dimension_package_path(&import.path);
                patches.push(Patch::replace(import.path_range, format!("{path:?}")));
                refs.add(dimension, &import.path);
            }
        }
        Ok((patches, refs))
    }

    /// The import manifest for a dimension compile: applicable imports
    /// swapped for their cached variants, extra dependencies included.
    fn dimension_manifest(
        &self,
        args: &CompileArgs,
        query: &FingerprintQuery,
        refs: &DimensionRefs,
        result: &TransformResult,
    ) -> Result<PathBuf, EngineError> {
        let mut manifest = ImportManifest::load(Path::new(args.get(CompileFlag::ImportCfg)))?;
        manifest.replace_dimension_refs(refs, true, |package, dimension| {
            self.dimension_artifact(query, package, dimension)
        })?;
        for package in &result.extra_dependency_packages {
            manifest.include_package(package, self.host.packages.as_ref())?;
        }
        manifest.write_temp(self.temp_dir()?)
    }
}

/// Patches setting every InVar of `dimension` to `true`.
fn in_var_patches(
    unit: &CompilationUnit,
    dimension: &str,
    is_dimension: impl Fn(&str) -> bool,
) -> Result<Vec<Patch>, EngineError> {
    let mut patches = Vec::new();
    for (file, syntax) in unit.syntax() {
        for spec in &syntax.vars {
            let Some(marker) = spec_marker(spec, &file.path, &is_dimension)? else {
                continue;
            };
            if marker.target != MarkerTarget::InVar || marker.dimension != dimension {
                continue;
            }
            check_in_var(spec, &file.path)?;
            if let Some(ty) = &spec.ty {
                patches.push(Patch::insert(ty.end(), " = true"));
            }
        }
    }
    Ok(patches)
}

fn write_patched(
    work: &Path,
    file: &PatchedFile,
    result: &TransformResult,
    dimension: &str,
) -> Result<PathBuf, EngineError> {
    // Host sources may share a base name across directories.
    let base = file
        .path
        .file_name()
        .map_or_else(|| "file.go".into(), |name| name.to_string_lossy());
    let target = work.join(format!("{}_{base}", file.id.as_raw()));
    let mut content = Vec::with_capacity(file.content.len() + 64);
    if result.add_line_directives {
        content.extend_from_slice(format!("//line {}:1\n", file.path.display()).as_bytes());
    }
    content.extend_from_slice(&file.content);
    if result.log_patched_files {
        debug!(
            file = %file.path.display(),
            dimension = %dimension,
            content = %String::from_utf8_lossy(&content),
            "patched file"
        );
    }
    fs::write(&target, &content).map_err(|e| EngineError::io(&target, e))?;
    Ok(target)
}

/// Appends a rewrite stripping `temp` from recorded paths.
fn extend_trimpath(current: &str, temp: &Path) -> String {
    let rewrite = format!("{}=>", temp.display());
    if current.is_empty() {
        rewrite
    } else {
        format!("{current};{rewrite}")
    }
}
