//! Host toolchain collaborators: tool processes, package fingerprints and
//! export lookup.
//!
//! Each concern is a trait so the engine can be driven by in-process fakes;
//! the process-backed implementations shell out to the host tool and to
//! `go list`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use prism_common::Fingerprint;
use tracing::debug;

use crate::error::HostError;
use crate::unit::{SyntaxLoader, UnitLoader};

/// Runs the real host tools.
pub trait ToolRunner {
    /// Runs `args[0]` with the remaining arguments, inheriting stdio, and
    /// returns its exit code.
    fn run(&self, args: &[String]) -> Result<i32, HostError>;

    /// Runs `args[0]` and returns its standard output; failure is an error.
    fn output(&self, args: &[String]) -> Result<String, HostError>;
}

/// Which packages to fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintQuery {
    /// A package and all of its transitive dependencies.
    Deps {
        /// Import path of the package.
        package: String,
        /// Include the package's test variant.
        for_test: bool,
    },
    /// Exactly these packages; unknown ones are skipped.
    Packages(Vec<String>),
}

/// Reports the host build's own per-package content fingerprints.
pub trait FingerprintSource {
    /// Fingerprints keyed by import path.
    fn fingerprints(
        &self,
        query: &FingerprintQuery,
    ) -> Result<BTreeMap<String, Fingerprint>, HostError>;
}

/// Resolves already-built packages to their compiled export files.
pub trait PackageLookup {
    /// The export file of `package`.
    fn export_file(&self, package: &str) -> Result<PathBuf, HostError>;
}

/// The engine's collaborators, bundled.
pub struct Host {
    /// Host tool runner.
    pub runner: Box<dyn ToolRunner>,
    /// Package fingerprint source.
    pub fingerprints: Box<dyn FingerprintSource>,
    /// Export file lookup.
    pub packages: Box<dyn PackageLookup>,
    /// Compilation unit loader.
    pub loader: Box<dyn UnitLoader>,
}

impl Host {
    /// Collaborators backed by real processes and the `go` command.
    pub fn system() -> Self {
        Self {
            runner: Box::new(ProcessRunner),
            fingerprints: Box::new(GoList::default()),
            packages: Box::new(GoList::default()),
            loader: Box::new(SyntaxLoader),
        }
    }
}

/// Runs tools as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, args: &[String]) -> Result<i32, HostError> {
        let (program, rest) = split_program(args)?;
        let status = Command::new(program)
            .args(rest)
            .status()
            .map_err(|source| HostError::Spawn {
                program: program.clone(),
                source,
            })?;
        // A signal-terminated tool has no code; report it as a plain failure.
        Ok(status.code().unwrap_or(1))
    }

    fn output(&self, args: &[String]) -> Result<String, HostError> {
        let (program, rest) = split_program(args)?;
        let out = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| HostError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !out.status.success() {
            return Err(HostError::Failed {
                command: args.join(" "),
                status: out.status.to_string(),
                output: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

fn split_program(args: &[String]) -> Result<(&String, &[String]), HostError> {
    args.split_first().ok_or_else(|| HostError::Spawn {
        program: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
    })
}

/// `go list` backed fingerprint and export lookup.
#[derive(Debug, Clone)]
pub struct GoList {
    go: PathBuf,
}

impl Default for GoList {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoList {
    /// Uses the given `go` executable.
    pub fn new(go: impl Into<PathBuf>) -> Self {
        Self { go: go.into() }
    }

    fn list(&self, args: &[&str]) -> Result<String, HostError> {
        let command = format!("{} list {}", self.go.display(), args.join(" "));
        debug!(%command, "querying packages");
        let out = Command::new(&self.go)
            .arg("list")
            .args(args)
            .output()
            .map_err(|source| HostError::Spawn {
                program: self.go.display().to_string(),
                source,
            })?;
        if !out.status.success() {
            let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
            output.push_str(&String::from_utf8_lossy(&out.stderr));
            return Err(HostError::Failed {
                command,
                status: out.status.to_string(),
                output: output.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

const LIST_FORMAT: &str = "{{.ImportPath}}|{{.BuildID}}";

/// Arguments after `go list` for a fingerprint query.
pub fn list_args(query: &FingerprintQuery) -> Vec<String> {
    let mut args: Vec<String> = ["-f", LIST_FORMAT, "-export"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    match query {
        FingerprintQuery::Deps { package, for_test } => {
            let (package, for_test) = match package.strip_suffix(".test") {
                Some(base) => (base, true),
                None => (package.as_str(), *for_test),
            };
            if for_test {
                args.push("-test".to_string());
            }
            args.push("-deps".to_string());
            args.push(package.to_string());
        }
        FingerprintQuery::Packages(packages) => {
            args.push("-e".to_string());
            args.extend(packages.iter().cloned());
        }
    }
    args
}

impl FingerprintSource for GoList {
    fn fingerprints(
        &self,
        query: &FingerprintQuery,
    ) -> Result<BTreeMap<String, Fingerprint>, HostError> {
        let args = list_args(query);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let text = self.list(&refs)?;
        parse_fingerprint_listing(&text).map_err(|line| HostError::UnexpectedOutput {
            command: "go list".to_string(),
            line,
        })
    }
}

impl PackageLookup for GoList {
    fn export_file(&self, package: &str) -> Result<PathBuf, HostError> {
        let text = self.list(&["-f", "{{.Export}}", "-export", package])?;
        let path = text.trim();
        if path.is_empty() {
            return Err(HostError::NoExport {
                package: package.to_string(),
            });
        }
        Ok(PathBuf::from(path))
    }
}

/// Parses `path|buildid` lines into fingerprints.
///
/// Lines without a build id are skipped. Test variants (`p [p.test]`) are
/// keyed by their plain path. Returns the offending line on error.
pub fn parse_fingerprint_listing(
    text: &str,
) -> Result<BTreeMap<String, Fingerprint>, String> {
    let mut out = BTreeMap::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((path, build_id)) = line.rsplit_once('|') else {
            return Err(line.to_string());
        };
        let Some(fingerprint) = Fingerprint::from_build_id(build_id) else {
            continue;
        };
        let Some((path, _)) = split_test_variant(path) else {
            return Err(line.to_string());
        };
        out.insert(path.to_string(), fingerprint);
    }
    Ok(out)
}

/// Splits `"p [p.test]"` into `("p", true)`; a plain path gives `(path, false)`.
///
/// Import paths never contain spaces, so any other spaced form is rejected.
pub fn split_test_variant(path: &str) -> Option<(&str, bool)> {
    match path.split_once(' ') {
        None => Some((path, false)),
        Some((base, rest)) if !base.is_empty() && rest.ends_with(".test]") => Some((base, true)),
        Some(_) => None,
    }
}

/// The tool name of a tool path: its file name without a `.exe` suffix.
pub fn tool_name(path: &str) -> &str {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    name.strip_suffix(".exe").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deps_query_args() {
        let args = list_args(&FingerprintQuery::Deps {
            package: "example.com/p".to_string(),
            for_test: false,
        });
        assert_eq!(
            args,
            vec!["-f", LIST_FORMAT, "-export", "-deps", "example.com/p"]
        );
    }

    #[test]
    fn test_variant_query_args() {
        let args = list_args(&FingerprintQuery::Deps {
            package: "example.com/p".to_string(),
            for_test: true,
        });
        assert_eq!(args[3..], ["-test", "-deps", "example.com/p"]);

        let args = list_args(&FingerprintQuery::Deps {
            package: "example.com/p.test".to_string(),
            for_test: false,
        });
        assert_eq!(args[3..], ["-test", "-deps", "example.com/p"]);
    }

    #[test]
    fn packages_query_tolerates_missing() {
        let args = list_args(&FingerprintQuery::Packages(vec![
            "fmt".to_string(),
            "runtime".to_string(),
        ]));
        assert_eq!(args[3..], ["-e", "fmt", "runtime"]);
    }

    #[test]
    fn parses_listing() {
        let text = "fmt|abc/def\nexample.com/p [example.com/p.test]|xyz/uvw\nunsafe|\n\n";
        let map = parse_fingerprint_listing(text).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["fmt"].as_bytes(), b"abc");
        assert_eq!(map["example.com/p"].as_bytes(), b"xyz");
    }

    #[test]
    fn listing_without_pipe_is_rejected() {
        assert_eq!(
            parse_fingerprint_listing("garbage line").unwrap_err(),
            "garbage line"
        );
    }

    #[test]
    fn listing_with_bad_space_is_rejected() {
        assert!(parse_fingerprint_listing("a b|x/y").is_err());
    }

    #[test]
    fn test_variants() {
        assert_eq!(split_test_variant("a/b"), Some(("a/b", false)));
        assert_eq!(split_test_variant("a/b [a/b.test]"), Some(("a/b", true)));
        assert_eq!(split_test_variant("a/b c"), None);
    }

    #[test]
    fn tool_names() {
        assert_eq!(tool_name("/usr/lib/go/pkg/tool/linux_amd64/compile"), "compile");
        assert_eq!(tool_name("link.exe"), "link");
        assert_eq!(tool_name("asm"), "asm");
    }

    #[test]
    fn process_runner_reports_exit_code() {
        let code = ProcessRunner
            .run(&["sh".to_string(), "-c".to_string(), "exit 3".to_string()])
            .unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn process_runner_captures_output() {
        let out = ProcessRunner
            .output(&["sh".to_string(), "-c".to_string(), "echo hi".to_string()])
            .unwrap();
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn process_runner_missing_program() {
        let err = ProcessRunner
            .run(&["/nonexistent/prism-tool".to_string()])
            .unwrap_err();
        assert!(matches!(err, HostError::Spawn { .. }));
    }
}
