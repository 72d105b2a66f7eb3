//! Loading agents from disk
//!
//! An agent lives under `{base_path}/agents/{name}/`: the sprite sheet is
//! `map.png` and an optional `animations.json` overrides the built-in table.

use crate::{Agent, AgentOptions, Error, Result, Surface};
use image::RgbaImage;
use mascot_core::{sprites, AnimationTable};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// File name of the sprite sheet inside an agent directory
pub const SPRITE_SHEET_FILE: &str = "map.png";

/// File name of the animation table inside an agent directory
pub const ANIMATION_TABLE_FILE: &str = "animations.json";

/// Directory holding one agent's files
pub fn agent_dir(base_path: &Path, agent_name: &str) -> PathBuf {
    base_path.join("agents").join(agent_name)
}

/// Decoded sprite sheet
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    path: PathBuf,
    image: RgbaImage,
}

impl SpriteSheet {
    /// Loads and decodes a sprite sheet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let image = image::open(&path)
            .map_err(|source| Error::AssetLoad {
                path: path.clone(),
                source,
            })?
            .to_rgba8();

        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Sprite sheet loaded"
        );
        Ok(Self { path, image })
    }

    /// Wraps an already decoded image
    pub fn from_image(path: impl Into<PathBuf>, image: RgbaImage) -> Self {
        Self {
            path: path.into(),
            image,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Checks that every frame region of `table` lies on this sheet
    pub fn check_regions(&self, table: &AnimationTable) -> Result<()> {
        for animation in table.iter() {
            for (index, frame) in animation.frames.iter().enumerate() {
                let region = frame.region;
                let right = region.x as u64 + region.width as u64;
                let bottom = region.y as u64 + region.height as u64;
                if right > self.width() as u64 || bottom > self.height() as u64 {
                    return Err(Error::RegionOutOfBounds {
                        animation: animation.name.clone(),
                        index,
                        width: self.width(),
                        height: self.height(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Loads the animation table for `agent_name`.
///
/// Uses `animations.json` when present, otherwise the built-in table of the
/// bundled agent.
pub fn load_animation_table(base_path: &Path, agent_name: &str) -> Result<AnimationTable> {
    let path = agent_dir(base_path, agent_name).join(ANIMATION_TABLE_FILE);

    if path.is_file() {
        let reader = BufReader::new(File::open(&path)?);
        let table = AnimationTable::read_json(reader)?;
        tracing::info!(path = %path.display(), animations = table.len(), "Animation table loaded");
        return Ok(table);
    }

    if agent_name == sprites::CLIPPY {
        return Ok(sprites::clippy_animations()?);
    }

    Err(Error::MissingAnimationTable {
        agent: agent_name.to_string(),
        path,
    })
}

/// Sprite sheet and animation table of one agent
#[derive(Debug, Clone)]
pub struct LoadedAgent {
    pub sheet: SpriteSheet,
    pub table: AnimationTable,
}

/// Loads an agent's sprite sheet and animation table without building it
pub fn load_agent(options: &AgentOptions) -> Result<LoadedAgent> {
    let dir = agent_dir(&options.base_path, &options.agent_name);
    let sheet = SpriteSheet::open(dir.join(SPRITE_SHEET_FILE))?;
    let table = load_animation_table(&options.base_path, &options.agent_name)?;
    sheet.check_regions(&table)?;

    Ok(LoadedAgent { sheet, table })
}

/// Loads an agent onto `surface` and shows it
pub fn init<S: Surface>(options: &AgentOptions, surface: S) -> Result<Agent<S>> {
    init_with(options, |_| surface)
}

/// Loads an agent, builds its surface from the decoded sheet, and shows it
pub fn init_with<S, F>(options: &AgentOptions, make_surface: F) -> Result<Agent<S>>
where
    S: Surface,
    F: FnOnce(&SpriteSheet) -> S,
{
    let loaded = load_agent(options)?;
    let surface = make_surface(&loaded.sheet);

    let mut agent = Agent::new(loaded.table, options.config.clone(), surface);
    agent.show();
    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlaybackOutcome, RecordingSurface};
    use image::Rgba;
    use std::fs;
    use tempfile::TempDir;

    fn write_sheet(base: &Path, agent: &str, width: u32, height: u32) {
        let dir = agent_dir(base, agent);
        fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]))
            .save(dir.join(SPRITE_SHEET_FILE))
            .unwrap();
    }

    #[test]
    fn test_init_shows_agent() {
        let base = TempDir::new().unwrap();
        write_sheet(base.path(), "Clippy", 248, 93);

        let agent = init(&AgentOptions::new(base.path()), RecordingSurface::new()).unwrap();

        assert!(agent.is_visible());
        assert_eq!(agent.active_animation().unwrap().0.name, "Idle");
        assert!(agent.table().resolve("Wave").is_some());
    }

    #[test]
    fn test_missing_sheet_fails_init() {
        let base = TempDir::new().unwrap();

        let result = init(&AgentOptions::new(base.path()), RecordingSurface::new());
        match result {
            Err(Error::AssetLoad { path, .. }) => {
                assert!(path.ends_with("agents/Clippy/map.png"));
            }
            other => panic!("expected asset load failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_corrupt_sheet_fails_init() {
        let base = TempDir::new().unwrap();
        let dir = agent_dir(base.path(), "Clippy");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SPRITE_SHEET_FILE), b"not a png").unwrap();

        let result = load_agent(&AgentOptions::new(base.path()));
        assert!(matches!(result, Err(Error::AssetLoad { .. })));
    }

    #[test]
    fn test_sheet_too_small_for_table() {
        let base = TempDir::new().unwrap();
        write_sheet(base.path(), "Clippy", 124, 93);

        let result = load_agent(&AgentOptions::new(base.path()));
        assert!(matches!(
            result,
            Err(Error::RegionOutOfBounds { ref animation, .. }) if animation == "Wave"
        ));
    }

    #[test]
    fn test_custom_agent_uses_json_table() {
        let base = TempDir::new().unwrap();
        write_sheet(base.path(), "Rover", 64, 32);
        fs::write(
            agent_dir(base.path(), "Rover").join(ANIMATION_TABLE_FILE),
            r#"{
                "frame_size": { "width": 32, "height": 32 },
                "animations": [
                    { "name": "Idle", "policy": "preempt",
                      "frames": [ { "duration_ms": 250, "region": { "x": 0, "y": 0, "width": 32, "height": 32 } } ] },
                    { "name": "Bark", "policy": "queue",
                      "frames": [ { "duration_ms": 100, "region": { "x": 32, "y": 0, "width": 32, "height": 32 } } ] }
                ]
            }"#,
        )
        .unwrap();

        let options = AgentOptions::new(base.path()).with_agent("Rover");
        let mut agent = init(&options, RecordingSurface::new()).unwrap();

        let bark = agent.play("Bark");
        agent.advance_by(350);
        assert_eq!(bark.outcome(), Some(PlaybackOutcome::Completed));
    }

    #[test]
    fn test_custom_agent_without_table() {
        let base = TempDir::new().unwrap();
        write_sheet(base.path(), "Rover", 64, 32);

        let options = AgentOptions::new(base.path()).with_agent("Rover");
        let result = load_agent(&options);
        assert!(matches!(result, Err(Error::MissingAnimationTable { .. })));
    }

    #[test]
    fn test_init_with_builds_surface_from_sheet() {
        let base = TempDir::new().unwrap();
        write_sheet(base.path(), "Clippy", 248, 93);

        let agent = init_with(&AgentOptions::new(base.path()), |sheet| {
            assert_eq!(sheet.width(), 248);
            crate::RasterSurface::new(sheet, (320, 240))
        })
        .unwrap();

        assert!(agent.is_visible());
    }
}
