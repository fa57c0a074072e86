// src/snapshot.rs
//
// Cached pipeline inputs and outputs. The upstream tracker dumps its raw
// track store as a JSON snapshot so repeated analysis runs skip detection
// entirely; camera-motion offsets arrive the same way. The snapshot schema
// is exactly the track store data model.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::pipeline::TeamControl;
use crate::track_store::TrackStore;
use crate::types::PixelOffset;

pub fn load_tracks<P: AsRef<Path>>(path: P) -> Result<TrackStore> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading track snapshot {}", path.display()))?;
    let store: TrackStore = serde_json::from_str(&contents)
        .with_context(|| format!("decoding track snapshot {}", path.display()))?;
    info!(
        "loaded track snapshot: {} frames from {}",
        store.frame_count(),
        path.display()
    );
    Ok(store)
}

pub fn save_tracks<P: AsRef<Path>>(store: &TrackStore, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string(store)?;
    fs::write(path, contents)
        .with_context(|| format!("writing track snapshot {}", path.display()))?;
    Ok(())
}

pub fn load_camera_motion<P: AsRef<Path>>(path: P) -> Result<Vec<PixelOffset>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading camera motion {}", path.display()))?;
    let offsets: Vec<PixelOffset> = serde_json::from_str(&contents)
        .with_context(|| format!("decoding camera motion {}", path.display()))?;
    Ok(offsets)
}

pub fn save_possession<P: AsRef<Path>>(series: &[TeamControl], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string(series)?;
    fs::write(path, contents)
        .with_context(|| format!("writing possession series {}", path.display()))?;
    Ok(())
}
