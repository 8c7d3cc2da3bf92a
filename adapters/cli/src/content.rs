//! Loads rooms and animation sets from a content directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use prophecy_world::{
    animation::{parse_animation_config, AnimationConfig, SheetSize},
    AnimationLibrary, DirectoryRooms,
};
use tracing::{debug, warn};

const ROOMS: &str = "rooms";
const ANIMATIONS: &str = "animations";

/// Rooms and animation sets found under one content root.
pub(crate) struct Content {
    /// Room descriptions, read lazily as rooms are generated.
    pub(crate) rooms: DirectoryRooms,
    /// Every animation set described under `animations/`.
    pub(crate) animations: AnimationLibrary,
}

impl Content {
    /// Opens `root`, loading every `animations/<Sheet>.txt` eagerly.
    pub(crate) fn load(root: &Path) -> Result<Self> {
        let rooms_dir = root.join(ROOMS);
        if !rooms_dir.is_dir() {
            anyhow::bail!("content directory {} has no rooms/ folder", root.display());
        }

        let mut animations = AnimationLibrary::new();
        let animations_dir = root.join(ANIMATIONS);
        if animations_dir.is_dir() {
            for path in animation_files(&animations_dir)? {
                let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    warn!(path = %path.display(), "skipping animation file with unreadable name");
                    continue;
                };
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let sheet = inferred_sheet(&parse_animation_config(&text));
                let set = animations.load(name, Some(&text), &sheet);
                debug!(sheet = name, clips = set.len(), "animation set loaded");
            }
        } else {
            warn!(root = %root.display(), "no animations/ folder; entities will need sheet-less templates");
        }

        Ok(Self {
            rooms: DirectoryRooms::new(rooms_dir),
            animations,
        })
    }
}

fn animation_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt")))
        .collect();
    files.sort();
    Ok(files)
}

/// Sheet dimensions implied by a config: as many columns as the longest row
/// has frames and one pixel row of cells per described row.
fn inferred_sheet(config: &AnimationConfig) -> SheetSize {
    let (cell_width, cell_height) = config.cell;
    let columns = config
        .rows
        .values()
        .map(|row| row.frames)
        .max()
        .unwrap_or(1)
        .max(1);
    let rows = config
        .rows
        .keys()
        .max()
        .map_or(1, |row| row + 1);
    SheetSize {
        width: cell_width * columns,
        height: cell_height * rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_size_follows_widest_and_deepest_rows() {
        let config = parse_animation_config("48,64\n0,Stand,2,10,0\n3,Death,6,10\n");
        assert_eq!(
            inferred_sheet(&config),
            SheetSize {
                width: 288,
                height: 256
            }
        );
    }

    #[test]
    fn content_root_loads_sheets_by_file_name() {
        let root = tempfile::tempdir().expect("temp dir");
        fs::create_dir(root.path().join(ROOMS)).expect("rooms dir");
        fs::create_dir(root.path().join(ANIMATIONS)).expect("animations dir");
        fs::write(
            root.path().join(ANIMATIONS).join("OldMan.txt"),
            "32,32\n0,Stand,2,10,0\n1,Move,2,10,0\n",
        )
        .expect("write config");
        fs::write(root.path().join(ANIMATIONS).join("notes.md"), "ignored").expect("write notes");

        let content = Content::load(root.path()).expect("content loads");
        assert_eq!(content.animations.len(), 1);
        let set = content.animations.get("oldman").expect("case-insensitive lookup");
        assert!(set.clip("Move").is_some());
    }

    #[test]
    fn missing_rooms_folder_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir");
        assert!(Content::load(root.path()).is_err());
    }
}
