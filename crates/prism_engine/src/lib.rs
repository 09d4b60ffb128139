//! The dimension build engine.
//!
//! The engine sits between a host build system and its compiler and linker
//! as a tool-exec wrapper. For every compilation unit it compiles one extra
//! variant per applicable *dimension*, with the dimension's [`Transformer`]
//! patches applied, and caches the result under an action id derived from
//! the host's own unit fingerprint. Marker comments on top-level variables
//! then let ordinary code reach into a dimension variant (bridges) or learn
//! whether it is one (InVars), and the link step adds every dimension
//! variant to the final binary.
//!
//! [`run_main`] is the whole program for an embedding binary: it reads the
//! intercepted command line and environment, runs the matching phase and
//! forwards the rewritten command to the real tool.

#![warn(missing_docs)]

pub mod bridge;
pub mod compiler;
pub mod context;
pub mod driver;
pub mod error;
pub mod flags;
pub mod host;
pub mod logging;
pub mod manifest;
pub mod marker;
pub mod transform;
pub mod unit;

pub use bridge::{BridgeBuilder, BridgeFile, BridgeReference};
pub use compiler::{CompileReport, DimensionStatus};
pub use context::{Engine, Invocation};
pub use driver::{run_main, run_with, IMPORT_PATH_ENV};
pub use error::{EngineError, HostError};
pub use flags::{CompileArgs, CompileFlag};
pub use host::{
    FingerprintQuery, FingerprintSource, GoList, Host, PackageLookup, ProcessRunner, ToolRunner,
};
pub use manifest::{DimensionRefs, ImportManifest};
pub use transform::{
    dimension_package_path, EngineConfig, TransformContext, TransformError, TransformResult,
    Transformer,
};
pub use unit::{CompilationUnit, SyntaxLoader, UnitLoader};
