//! The phase driver: recognizes the intercepted host tool, runs the engine
//! steps for it and forwards the possibly rewritten command line.

use std::path::Path;

use prism_common::{ActionId, Outcome};
use tracing::debug;

use crate::compiler::DimensionStatus;
use crate::context::{Engine, Invocation};
use crate::error::{EngineError, HostError};
use crate::flags::{find_flag, CompileArgs, CompileFlag};
use crate::host::{tool_name, FingerprintQuery, Host};
use crate::manifest::{DimensionRefs, ImportManifest};
use crate::transform::EngineConfig;

/// Host environment variable naming the package being built.
pub const IMPORT_PATH_ENV: &str = "TOOLEXEC_IMPORTPATH";

const VERBOSE_FLAG: &str = "--verbose";
const VERSION_FULL: &str = "-V=full";

/// Removes a leading `--verbose`, reporting whether it was present.
pub fn strip_verbose(mut args: Vec<String>) -> (bool, Vec<String>) {
    if args.first().is_some_and(|a| a == VERBOSE_FLAG) {
        args.remove(0);
        (true, args)
    } else {
        (false, args)
    }
}

impl Engine {
    /// Handles one intercepted tool command line and returns the exit code
    /// to report to the host build.
    ///
    /// `args[0]` is the tool path. `--verbose` must already be stripped.
    pub fn run(&self, args: Vec<String>) -> Result<i32, EngineError> {
        let tool = args
            .first()
            .map(|a| tool_name(a).to_string())
            .ok_or_else(|| EngineError::Invocation("no tool name found".to_string()))?;

        if args.len() == 2 && args[1] == VERSION_FULL {
            println!("{}", self.version_full(&tool, &args)?);
            return Ok(0);
        }
        if self.invocation.package.is_empty() {
            return Err(EngineError::Invocation(format!("{IMPORT_PATH_ENV} is not set")));
        }

        debug!(package = %self.invocation.package, tool = %tool, ?args, "intercepting tool");
        let args = match tool.as_str() {
            "compile" => {
                let args = self.on_compile(args)?;
                debug!(?args, "updated compile args");
                args
            }
            "link" => {
                self.on_link(&args)?;
                args
            }
            _ => {
                debug!(tool = %tool, "no interception needed");
                args
            }
        };
        Ok(self.host.runner.run(&args)?)
    }

    /// The unit compile phase: builds dimension variants, then adds the
    /// bridge file if the unit declares bridges.
    pub fn on_compile(&self, args: Vec<String>) -> Result<Vec<String>, EngineError> {
        let mut parsed = CompileArgs::parse(&args)?;
        for (dimension, status) in self.compile_dimensions(&parsed)? {
            debug!(dimension = %dimension, ?status, "dimension compile finished");
            if let DimensionStatus::Deferred(deferral) = status {
                debug!(reason = %deferral, "unit deferred, forwarding unchanged");
                return Ok(args);
            }
        }

        let bridge = match self.build_bridge_file(&parsed)? {
            Outcome::Ready(Some(bridge)) => bridge,
            Outcome::Ready(None) => return Ok(args),
            Outcome::Deferred(deferral) => {
                debug!(reason = %deferral, "skipping bridge, deferring to host compiler");
                return Ok(args);
            }
        };
        parsed.push_source(bridge.path.to_string_lossy());

        let manifest_path = Path::new(parsed.get(CompileFlag::ImportCfg)).to_path_buf();
        let mut manifest = ImportManifest::load(&manifest_path)?;
        let query = self.compile_query();
        manifest.replace_dimension_refs(&bridge.refs, false, |package, dimension| {
            self.dimension_artifact(&query, package, dimension)
        })?;
        manifest.write(&manifest_path)?;
        Ok(parsed.into_args())
    }

    /// The link phase: adds the dimension variant of every applicable
    /// package to the link manifest, with the extra dependencies their
    /// transformers declared.
    pub fn on_link(&self, args: &[String]) -> Result<(), EngineError> {
        let manifest_path = find_flag(args, CompileFlag::ImportCfg.name())
            .map(Path::new)
            .ok_or(EngineError::MissingFlag {
                flag: CompileFlag::ImportCfg.name(),
            })?
            .to_path_buf();
        let mut manifest = ImportManifest::load(&manifest_path)?;
        let packages: Vec<String> = manifest.packages().map(|(p, _)| p.to_string()).collect();
        let query = FingerprintQuery::Packages(packages.clone());

        let mut refs = DimensionRefs::new();
        for package in packages.iter().filter(|p| !p.ends_with(".test")) {
            for dimension in self.applicable_dimensions(package)? {
                let id = self.dimension_action_id(&query, package, &dimension)?;
                let metadata = self.cache()?.get_metadata(&id).ok_or_else(|| {
                    EngineError::MissingArtifact {
                        package: package.clone(),
                        dimension: dimension.clone(),
                        what: "metadata",
                    }
                })?;
                refs.add(&dimension, package);
                for dep in &metadata.extra_dependency_packages {
                    manifest.include_package(dep, self.host.packages.as_ref())?;
                }
            }
        }

        if refs.is_empty() {
            return Ok(());
        }
        manifest.replace_dimension_refs(&refs, false, |package, dimension| {
            self.dimension_artifact(&query, package, dimension)
        })?;
        manifest.write(&manifest_path)
    }

    /// Answers the host's `-V=full` tool version query with the engine
    /// version folded into the tool id, so host caching keys change with it.
    pub fn version_full(&self, tool: &str, args: &[String]) -> Result<String, EngineError> {
        let output = self.host.runner.output(args)?;
        let line = output.trim();
        let tool_id = parse_tool_id(tool, line).ok_or_else(|| {
            HostError::UnexpectedOutput {
                command: format!("{} {VERSION_FULL}", args[0]),
                line: line.to_string(),
            }
        })?;
        let id = ActionId::digest(&[
            tool_id,
            b"/dimension/",
            self.executable_id()?,
            b"/",
            self.config.version.as_bytes(),
        ]);
        Ok(format!(
            "{line} +prism buildID=_/_/_/{}",
            hex::encode(&id.as_bytes()[..15])
        ))
    }
}

/// The tool id of a `<tool> version ...` line: the content id of a
/// development build, or the whole line for a release.
pub fn parse_tool_id<'a>(tool: &str, line: &'a str) -> Option<&'a [u8]> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 || fields[0] != tool || fields[1] != "version" {
        return None;
    }
    if fields[2] != "devel" {
        return Some(line.as_bytes());
    }
    let build_id = fields.last()?.strip_prefix("buildID=")?;
    let content_id = build_id.rsplit('/').next().unwrap_or(build_id);
    Some(content_id.as_bytes())
}

/// Process entry for an embedding `main`: reads the command line and
/// environment, runs the engine and returns the exit code.
///
/// Fatal errors are printed to stderr prefixed with `prism:` and exit 1;
/// a forwarded tool's own exit code is returned as is.
pub fn run_main(config: EngineConfig) -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let import_path = std::env::var(IMPORT_PATH_ENV).unwrap_or_default();
    run_with(config, Host::system(), args, &import_path, |name| {
        std::env::var(name).ok()
    })
}

/// [`run_main`] with explicit collaborators and environment.
pub fn run_with(
    mut config: EngineConfig,
    host: Host,
    args: Vec<String>,
    import_path: &str,
    env: impl Fn(&str) -> Option<String>,
) -> i32 {
    let (verbose, args) = strip_verbose(args);
    if let Err(err) = config.settings.apply_env(env) {
        eprintln!("prism: {err}");
        return 1;
    }
    config.settings.verbose |= verbose;
    crate::logging::init(config.settings.verbose);

    let engine = match Invocation::from_import_path(import_path)
        .and_then(|invocation| Engine::new(config, host, invocation))
    {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("prism: {err}");
            return 1;
        }
    };
    let result = engine.run(args);
    engine.finish();
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("prism: {err}");
            1
        }
    }
}
