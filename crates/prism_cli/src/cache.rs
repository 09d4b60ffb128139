//! `prism action-id` and `prism cache` implementations.

use std::time::SystemTime;

use prism_cache::{
    artifact_key, derive_action_id, dimension_build_id, metadata_key, BuildCache, TrimStats,
};
use prism_common::{ActionId, Fingerprint};
use tracing::debug;

use crate::{GlobalArgs, KeyArgs};

/// Derives the action id named by `args`.
pub fn derive(args: &KeyArgs) -> ActionId {
    let fingerprint = Fingerprint::from_build_id(&args.fingerprint)
        .unwrap_or_else(|| Fingerprint::new(args.fingerprint.as_str()));
    derive_action_id(&fingerprint, &args.dimension, &args.version)
}

/// The lines printed by `prism action-id`.
pub fn key_report(id: &ActionId) -> Vec<String> {
    vec![
        format!("action id:    {id}"),
        format!("artifact key: {}", artifact_key(id)),
        format!("metadata key: {}", metadata_key(id)),
        format!("build id:     {}", dimension_build_id(id)),
    ]
}

/// Runs `prism action-id`.
pub fn action_id(args: &KeyArgs) -> Result<i32, Box<dyn std::error::Error>> {
    for line in key_report(&derive(args)) {
        println!("{line}");
    }
    Ok(0)
}

fn open(global: &GlobalArgs, version: &str) -> Result<BuildCache, Box<dyn std::error::Error>> {
    let root = global.settings.resolved_cache_dir()?;
    debug!(root = %root.display(), "opening build cache");
    Ok(BuildCache::open(&root, version)?)
}

/// The lines printed by `prism cache lookup`; the flag is whether both
/// payloads were found.
pub fn lookup_report(
    cache: &BuildCache,
    args: &KeyArgs,
) -> Result<(bool, Vec<String>), Box<dyn std::error::Error>> {
    let id = derive(args);
    let mut lines = vec![format!("action id: {id}")];
    let artifact = match cache.lookup(&artifact_key(&id)) {
        Ok(entry) => {
            lines.push(format!(
                "artifact:  {} ({} bytes)",
                entry.path.display(),
                entry.size
            ));
            true
        }
        Err(err) => {
            lines.push(format!("artifact:  missing ({err})"));
            false
        }
    };
    let metadata = match cache.get_metadata(&id) {
        Some(meta) => {
            lines.push(format!("metadata:  {}", serde_json::to_string(&meta)?));
            true
        }
        None => {
            lines.push("metadata:  missing".to_string());
            false
        }
    };
    Ok((artifact && metadata, lines))
}

/// Runs `prism cache lookup`. Exits 1 when the build is not fully cached.
pub fn lookup(args: &KeyArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cache = open(global, &args.version)?;
    let (found, lines) = lookup_report(&cache, args)?;
    for line in lines {
        println!("{line}");
    }
    Ok(if found { 0 } else { 1 })
}

/// Runs `prism cache trim`.
pub fn trim(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    // Trimming ignores the engine version of entries.
    let cache = open(global, "")?;
    let TrimStats {
        entries_removed,
        data_removed,
        ..
    } = cache.trim_at(SystemTime::now(), true)?;
    println!("removed {entries_removed} entries and {data_removed} data files");
    Ok(0)
}
