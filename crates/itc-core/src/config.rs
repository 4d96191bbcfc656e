use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default output width, in characters.
pub const DEFAULT_WIDTH: u32 = 40;
/// Default interval between two animation ticks.
pub const DEFAULT_SPEED_MS: u64 = 100;
/// Default terminal cell aspect (cells are about twice as tall as wide).
pub const DEFAULT_CELL_ASPECT: f32 = 2.0;

/// How many full cycles the animation plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopCount {
    /// Until stopped from outside.
    Infinite,
    /// Exactly this many full passes over the frame sequence (never 0).
    Times(u32),
}

/// Configuration d'un run : défauts fusionnés avec le fichier TOML et la CLI.
///
/// Immutable once the pipeline starts.
///
/// # Example
/// ```
/// use itc_core::config::RunConfig;
/// let config = RunConfig::default();
/// assert_eq!(config.width, 40);
/// assert_eq!(config.height, None);
/// assert!(!config.is_cycling());
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    // === Sortie ===
    /// Output width in characters (= normalized pixel width).
    pub width: u32,
    /// Output height. `None` keeps the source aspect ratio.
    pub height: Option<u32>,
    /// Height/width ratio of one terminal cell, used for auto height.
    pub cell_aspect: f32,
    /// Charset ordered lightest → densest.
    pub charset: String,
    /// Clear the rendered output on stop instead of leaving the last frame.
    pub clear_on_stop: bool,

    // === Lecture ===
    /// Frame to start from (clamped to the frame count at playback).
    pub start_index: usize,
    /// Animate through the frames instead of showing one.
    pub cycle: bool,
    /// Loop limit. Any value implies `cycle`.
    pub loop_count: Option<LoopCount>,
    /// Interval between ticks, in milliseconds.
    pub speed_ms: u64,
    /// `true` when the user set `speed_ms` (file or CLI).
    pub speed_explicit: bool,
    /// Shuffle the text frames once before playback.
    pub shuffle: bool,

    // === Staging ===
    /// Scratch directory for this run.
    pub staging_root: PathBuf,
    /// Purge the staging root after the run.
    pub cleanup: bool,
    /// Timeout for one remote fetch, in seconds.
    pub fetch_timeout_secs: u64,

    // === Log ===
    /// 0 = errors, 1 = + warnings/success, 2 = + info.
    pub verbosity: u8,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: None,
            cell_aspect: DEFAULT_CELL_ASPECT,
            charset: crate::charset::CHARSET_COMPACT.to_string(),
            clear_on_stop: false,
            start_index: 0,
            cycle: false,
            loop_count: None,
            speed_ms: DEFAULT_SPEED_MS,
            speed_explicit: false,
            shuffle: false,
            staging_root: std::env::temp_dir().join("image-to-console"),
            cleanup: false,
            fetch_timeout_secs: 30,
            verbosity: 0,
        }
    }
}

impl RunConfig {
    /// `true` if playback animates (explicit cycle, or any loop setting).
    #[must_use]
    pub fn is_cycling(&self) -> bool {
        self.cycle || self.loop_count.is_some()
    }

    /// Configured tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }

    /// Set the speed and mark it as user-provided.
    pub fn set_speed(&mut self, speed_ms: u64) {
        self.speed_ms = speed_ms;
        self.speed_explicit = true;
    }

    /// Clamp numeric fields to their valid ranges.
    /// Called after every merge layer.
    pub fn clamp_all(&mut self) {
        self.width = self.width.max(1);
        self.height = self.height.map(|h| h.max(1));
        self.speed_ms = self.speed_ms.max(1);
        self.verbosity = self.verbosity.min(2);
        self.cell_aspect = self.cell_aspect.clamp(0.5, 4.0);
        if self.charset.chars().count() < 2 {
            self.charset = crate::charset::CHARSET_COMPACT.to_string();
        }
        if self.loop_count.is_some() {
            self.cycle = true;
        }
    }

    /// Apply a parsed TOML file on top of `self`.
    fn merge_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(o) = file.output {
            if let Some(v) = o.width {
                self.width = v;
            }
            if let Some(v) = o.height {
                self.height = Some(v);
            }
            if let Some(v) = o.cell_aspect {
                self.cell_aspect = v;
            }
            if let Some(v) = o.charset {
                self.charset = crate::charset::resolve(&v).to_string();
            }
            if let Some(v) = o.clear_on_stop {
                self.clear_on_stop = v;
            }
        }

        if let Some(p) = file.playback {
            if let Some(v) = p.start_index {
                self.start_index = v;
            }
            if let Some(v) = p.cycle {
                self.cycle = v;
            }
            if let Some(v) = p.speed_ms {
                self.set_speed(v);
            }
            if let Some(v) = p.shuffle {
                self.shuffle = v;
            }
            match (p.infinite, p.loop_count) {
                (Some(true), _) => self.loop_count = Some(LoopCount::Infinite),
                (_, Some(0)) => anyhow::bail!("playback.loop_count must be at least 1"),
                (_, Some(n)) => self.loop_count = Some(LoopCount::Times(n)),
                _ => {}
            }
        }

        if let Some(s) = file.staging {
            if let Some(v) = s.root {
                self.staging_root = v;
            }
            if let Some(v) = s.cleanup {
                self.cleanup = v;
            }
            if let Some(v) = s.fetch_timeout_secs {
                self.fetch_timeout_secs = v;
            }
        }

        if let Some(v) = file.verbosity {
            self.verbosity = v;
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire, toutes les sections optionnelles.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    verbosity: Option<u8>,
    output: Option<OutputSection>,
    playback: Option<PlaybackSection>,
    staging: Option<StagingSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSection {
    width: Option<u32>,
    height: Option<u32>,
    cell_aspect: Option<f32>,
    charset: Option<String>,
    clear_on_stop: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PlaybackSection {
    start_index: Option<usize>,
    cycle: Option<bool>,
    loop_count: Option<u32>,
    infinite: Option<bool>,
    speed_ms: Option<u64>,
    shuffle: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StagingSection {
    root: Option<PathBuf>,
    cleanup: Option<bool>,
    fetch_timeout_secs: Option<u64>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use itc_core::config::parse_config;
/// let config = parse_config("[playback]\nspeed_ms = 50\n").unwrap();
/// assert_eq!(config.speed_ms, 50);
/// assert!(config.speed_explicit);
/// ```
pub fn parse_config(content: &str) -> Result<RunConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = RunConfig::default();
    config.merge_file(file)?;
    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Configuration invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_contract() {
        let c = RunConfig::default();
        assert_eq!(c.width, 40);
        assert_eq!(c.height, None);
        assert_eq!(c.start_index, 0);
        assert!(!c.cycle);
        assert_eq!(c.speed_ms, 100);
        assert!(!c.speed_explicit);
        assert_eq!(c.verbosity, 0);
        assert!(!c.cleanup);
        assert!(!c.shuffle);
    }

    #[test]
    fn loop_enables_cycle() {
        let c = parse_config("[playback]\nloop_count = 3\n").unwrap();
        assert_eq!(c.loop_count, Some(LoopCount::Times(3)));
        assert!(c.cycle);

        let c = parse_config("[playback]\ninfinite = true\nloop_count = 3\n").unwrap();
        assert_eq!(c.loop_count, Some(LoopCount::Infinite));
    }

    #[test]
    fn shipped_default_file_equals_defaults() {
        let c = parse_config(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(c, RunConfig::default());
    }

    #[test]
    fn charset_preset_name_is_resolved() {
        let c = parse_config("[output]\ncharset = \"blocks\"\n").unwrap();
        assert_eq!(c.charset, crate::charset::CHARSET_BLOCKS);
    }

    #[test]
    fn zero_loop_is_rejected() {
        assert!(parse_config("[playback]\nloop_count = 0\n").is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(parse_config("[output]\nwidht = 3\n").is_err());
    }

    #[test]
    fn clamp_fixes_out_of_range_values() {
        let c = parse_config(
            "verbosity = 9\n[output]\nwidth = 0\nheight = 0\ncharset = \"#\"\ncell_aspect = 10.0\n",
        )
        .unwrap();
        assert_eq!(c.width, 1);
        assert_eq!(c.height, Some(1));
        assert_eq!(c.verbosity, 2);
        assert!((c.cell_aspect - 4.0).abs() < f32::EPSILON);
        assert_eq!(c.charset, crate::charset::CHARSET_COMPACT);
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("itc.toml");
        std::fs::write(&path, "[staging]\ncleanup = true\nroot = \"/tmp/x\"\n").unwrap();
        let c = load_config(&path).unwrap();
        assert!(c.cleanup);
        assert_eq!(c.staging_root, PathBuf::from("/tmp/x"));
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
