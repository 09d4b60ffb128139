//! Synthesis of the bridge file that binds marked function variables to
//! their dimension counterparts at init time.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use prism_common::Outcome;
use prism_source::{SourceDb, SourceFile};
use prism_syntax::{scan_file, VarSpec};
use tracing::debug;

use crate::context::Engine;
use crate::error::EngineError;
use crate::flags::{CompileArgs, CompileFlag};
use crate::manifest::DimensionRefs;
use crate::marker::{check_in_var, mentioned_dimension, spec_marker, MarkerTarget};
use crate::transform::dimension_package_path;

/// A written bridge file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeFile {
    /// Where the file was written.
    pub path: PathBuf,
    /// The dimension variants of this package it imports.
    pub refs: DimensionRefs,
}

/// One validated bridge declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeReference {
    /// Dimension named by the marker.
    pub dimension: String,
    /// Import path of the declaring package.
    pub package: String,
    /// The function bound in the dimension variant.
    pub function: String,
    /// The variable assigned at init.
    pub variable: String,
}

/// Collects bridge references file by file and renders the bridge source.
#[derive(Debug)]
pub struct BridgeBuilder {
    package: String,
    package_name: Option<String>,
    imports: Vec<(String, String)>,
    statements: Vec<String>,
    references: Vec<BridgeReference>,
    refs: DimensionRefs,
}

impl BridgeBuilder {
    /// Starts a bridge for the package `package`.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            package_name: None,
            imports: Vec::new(),
            statements: Vec::new(),
            references: Vec::new(),
            refs: DimensionRefs::new(),
        }
    }

    /// Scans one source file for bridge declarations.
    ///
    /// `dimensions` lists the configured dimensions; `applies` reports
    /// whether one applies to this package. A file the host compiler would
    /// reject defers the whole bridge.
    pub fn add_file(
        &mut self,
        file: &SourceFile,
        dimensions: &[&str],
        applies: impl Fn(&str) -> Result<bool, EngineError>,
    ) -> Result<Outcome<()>, EngineError> {
        let Some(mentioned) = mentioned_dimension(&file.content, dimensions.iter().copied()) else {
            return Ok(Outcome::Ready(()));
        };
        let path = file.path.as_path();
        let syntax = match scan_file(file) {
            Ok(syntax) => syntax,
            Err(err) => {
                debug!(file = %path.display(), error = %err, "ignoring file that fails to scan");
                return Ok(Outcome::deferred(err.to_string()));
            }
        };

        let name = &syntax.package.name;
        if name.ends_with("_test") {
            return Err(bridge_error(
                path,
                format!("dimension markers are not allowed in test packages, found {mentioned} marker"),
            ));
        }
        match &self.package_name {
            None => self.package_name = Some(name.clone()),
            Some(expected) if expected != name => {
                debug!(file = %path.display(), package = %name, expected = %expected, "package clauses disagree");
                return Ok(Outcome::deferred(format!(
                    "{} declares package {name}, expected {expected}",
                    path.display()
                )));
            }
            Some(_) => {}
        }

        let mut found = false;
        for spec in &syntax.vars {
            let Some(marker) = spec_marker(spec, path, |d| dimensions.iter().any(|x| *x == d))? else {
                continue;
            };
            found = true;
            let function = match marker.target {
                MarkerTarget::InVar => {
                    check_in_var(spec, path)?;
                    continue;
                }
                MarkerTarget::Function(function) => function,
            };
            if !applies(marker.dimension)? {
                return Err(bridge_error(
                    path,
                    format!(
                        "dimension {} referenced in package {}, but it does not apply",
                        marker.dimension, self.package
                    ),
                ));
            }
            let variable = check_bridge_var(spec, path)?;
            let func = syntax
                .func(function)
                .ok_or_else(|| bridge_error(path, format!("unable to find func {function}")))?;
            if func.has_type_params {
                return Err(bridge_error(
                    path,
                    format!("generic func {function} cannot be bridged"),
                ));
            }
            let var_type = spec.ty.as_ref().map_or("", |t| t.text.as_str());
            if var_type != func.signature {
                return Err(bridge_error(
                    path,
                    format!(
                        "expected var {variable} to have type {var_type}, instead had {}",
                        func.signature
                    ),
                ));
            }
            debug!(var = %variable, func = %function, dimension = %marker.dimension, "binding bridge var");
            self.bind(marker.dimension, function, variable);
        }

        if !found {
            return Err(bridge_error(
                path,
                format!("no usable dimension markers found, though {mentioned} is referenced"),
            ));
        }
        Ok(Outcome::Ready(()))
    }

    fn bind(&mut self, dimension: &str, function: &str, variable: &str) {
        let import_path = dimension_package_path(&self.package, dimension);
        let alias = match self.imports.iter().find(|(p, _)| *p == import_path) {
            Some((_, alias)) => alias.clone(),
            None => {
                let alias = format!("dim{}", self.imports.len() + 1);
                self.imports.push((import_path, alias.clone()));
                alias
            }
        };
        self.statements
            .push(format!("{variable} = {alias}.{function}"));
        self.refs.add(dimension, &self.package);
        self.references.push(BridgeReference {
            dimension: dimension.to_string(),
            package: self.package.clone(),
            function: function.to_string(),
            variable: variable.to_string(),
        });
    }

    /// The validated references so far.
    pub fn references(&self) -> &[BridgeReference] {
        &self.references
    }

    /// The dimension variants referenced so far.
    pub fn refs(&self) -> &DimensionRefs {
        &self.refs
    }

    /// The bridge source, or `None` when nothing was bound.
    pub fn render(&self) -> Option<String> {
        if self.statements.is_empty() {
            return None;
        }
        let name = self.package_name.as_deref()?;
        let mut code = format!("package {name}\n\n");
        for (path, alias) in &self.imports {
            code.push_str(&format!("import {alias} {path:?}\n"));
        }
        code.push_str("\nfunc init() {\n");
        for statement in &self.statements {
            code.push('\t');
            code.push_str(statement);
            code.push('\n');
        }
        code.push_str("}\n");
        Some(code)
    }
}

fn check_bridge_var<'a>(spec: &'a VarSpec, path: &Path) -> Result<&'a str, EngineError> {
    let [ident] = spec.names.as_slice() else {
        return Err(bridge_error(path, "bridge vars must declare a single name"));
    };
    let name = ident.name.as_str();
    match &spec.ty {
        Some(ty) if ty.is_func => {}
        _ => return Err(bridge_error(path, format!("var {name} is not typed with a func"))),
    }
    if spec.has_value {
        return Err(bridge_error(path, format!("var {name} cannot have a value")));
    }
    Ok(name)
}

fn bridge_error(path: &Path, message: impl Into<String>) -> EngineError {
    EngineError::Bridge {
        file: path.to_path_buf(),
        message: message.into(),
    }
}

impl Engine {
    /// Scans the unit's files for bridges and writes the bridge file.
    ///
    /// `Ready(None)` means the unit declares no bridges.
    pub fn build_bridge_file(
        &self,
        args: &CompileArgs,
    ) -> Result<Outcome<Option<BridgeFile>>, EngineError> {
        let package = args.get(CompileFlag::Package);
        let dimensions: Vec<&str> = self.config.dimensions().collect();
        let mut builder = BridgeBuilder::new(package);
        for source in args.sources() {
            let text = fs::read_to_string(source).map_err(|e| EngineError::io(source, e))?;
            let mut db = SourceDb::new();
            let id = db.add_source(source, text);
            let outcome = builder.add_file(db.file(id), &dimensions, |dimension| {
                self.applies(dimension, package)
            })?;
            if let Outcome::Deferred(deferral) = outcome {
                return Ok(Outcome::Deferred(deferral));
            }
        }
        let Some(code) = builder.render() else {
            return Ok(Outcome::Ready(None));
        };

        let dir = self.temp_dir()?;
        let mut file = tempfile::Builder::new()
            .prefix("prism-bridge-")
            .suffix(".go")
            .tempfile_in(dir)
            .map_err(|e| EngineError::io(dir, e))?;
        file.write_all(code.as_bytes())
            .map_err(|e| EngineError::io(file.path(), e))?;
        let (_, path) = file.keep().map_err(|e| EngineError::io(dir, e.error))?;
        debug!(path = %path.display(), %code, "writing bridge file");
        Ok(Outcome::Ready(Some(BridgeFile {
            path,
            refs: builder.refs,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: &[&str] = &["dim", "other"];

    fn file(text: &str) -> SourceDb {
        let mut db = SourceDb::new();
        db.add_source("a.go", text.to_string());
        db
    }

    fn scan(
        builder: &mut BridgeBuilder,
        text: &str,
    ) -> Result<Outcome<()>, EngineError> {
        let db = file(text);
        builder.add_file(&db.files()[0], DIMS, |d| Ok(d == "dim"))
    }

    #[test]
    fn single_bridge() {
        let mut b = BridgeBuilder::new("example.com/p");
        let src = "package p\n\nvar G func() string //dim:F\n\nfunc F() string { return \"x\" }\n";
        assert_eq!(scan(&mut b, src).unwrap(), Outcome::Ready(()));
        assert_eq!(
            b.render().unwrap(),
            "package p\n\nimport dim1 \"example.com/p__dim\"\n\nfunc init() {\n\tG = dim1.F\n}\n"
        );
        assert_eq!(
            b.references(),
            &[BridgeReference {
                dimension: "dim".to_string(),
                package: "example.com/p".to_string(),
                function: "F".to_string(),
                variable: "G".to_string(),
            }]
        );
        assert_eq!(b.refs().iter().collect::<Vec<_>>(), vec![("dim", "example.com/p")]);
    }

    #[test]
    fn one_import_per_dimension() {
        let mut b = BridgeBuilder::new("p");
        let src = "package p\nvar (\n\tA func() //dim:F\n\tB func(x int) int //dim:H\n)\nfunc F() {}\nfunc H(x int) int { return x }\n";
        scan(&mut b, src).unwrap();
        let code = b.render().unwrap();
        assert_eq!(code.matches("import ").count(), 1);
        assert!(code.contains("\tA = dim1.F\n\tB = dim1.H\n"));
    }

    #[test]
    fn no_markers_no_file() {
        let mut b = BridgeBuilder::new("p");
        scan(&mut b, "package p\nvar X int //nolint:all\n").unwrap();
        assert!(b.render().is_none());
    }

    #[test]
    fn in_var_only_is_not_an_error() {
        let mut b = BridgeBuilder::new("p");
        scan(&mut b, "package p\nvar On bool //dim:<in>\n").unwrap();
        assert!(b.render().is_none());
    }

    #[test]
    fn parameter_name_mismatch_rejected() {
        let mut b = BridgeBuilder::new("p");
        let src = "package p\nvar G func(a int) //dim:F\nfunc F(b int) {}\n";
        let err = scan(&mut b, src).unwrap_err();
        assert!(matches!(err, EngineError::Bridge { .. }));
        assert!(
            err.to_string().contains("expected var G to have type func(a int), instead had func(b int)"),
            "got {err}"
        );
    }

    #[test]
    fn validation_failures() {
        let cases = [
            ("package p_test\nvar G func() //dim:F\nfunc F() {}\n", "test packages"),
            ("package p\nvar G func() //other:F\nfunc F() {}\n", "does not apply"),
            ("package p\nvar G, H func() //dim:F\nfunc F() {}\n", "single name"),
            ("package p\nvar G int //dim:F\nfunc F() {}\n", "not typed with a func"),
            ("package p\nvar G func() = nil //dim:F\nfunc F() {}\n", "cannot have a value"),
            ("package p\nvar G func() //dim:F\n", "unable to find func F"),
            ("package p\nvar G func() //dim:F\nfunc (r R) F() {}\n", "unable to find func F"),
            ("package p\nvar G func(v int) int //dim:F\nfunc F[T any](v T) T { return v }\n", "generic"),
            ("package p\nvar G func() /* note */ //dim:F\nfunc F() {}\n", "no usable dimension markers"),
        ];
        for (src, want) in cases {
            let mut b = BridgeBuilder::new("p");
            let err = scan(&mut b, src).unwrap_err();
            assert!(err.to_string().contains(want), "{src}: got {err}");
        }
    }

    #[test]
    fn unscannable_file_defers() {
        let mut b = BridgeBuilder::new("p");
        let outcome = scan(&mut b, "package p\nvar G func( //dim:F\n").unwrap();
        assert!(outcome.is_deferred());
    }

    #[test]
    fn files_without_markers_are_not_scanned() {
        let mut b = BridgeBuilder::new("p");
        // Broken, but carries no marker, so it is left to the compiler.
        let outcome = scan(&mut b, "package p\nfunc (\n").unwrap();
        assert_eq!(outcome, Outcome::Ready(()));
    }

    #[test]
    fn other_package_file_defers_bridge() {
        let mut b = BridgeBuilder::new("p");
        scan(&mut b, "package p\nvar G func() //dim:F\nfunc F() {}\n").unwrap();
        let outcome = scan(&mut b, "package q\nvar H func() //dim:F\nfunc F() {}\n").unwrap();
        match outcome {
            Outcome::Deferred(d) => assert!(d.reason.contains("declares package q, expected p"), "{d}"),
            other => panic!("expected deferral, got {other:?}"),
        }
    }
}
