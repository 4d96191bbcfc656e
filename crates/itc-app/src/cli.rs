use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use itc_core::config::{LoopCount, RunConfig};

/// image-to-console : affiche des images (et GIF animés) en art texte dans le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Chemins locaux, URLs http(s) ou motifs glob, dans l'ordre d'affichage.
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// Largeur de sortie en caractères.
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Hauteur de sortie en lignes. Absent : conserve le ratio de la source.
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Index de la première frame affichée.
    #[arg(short, long)]
    pub index: Option<usize>,

    /// Animer en boucle à travers les frames.
    #[arg(short, long, default_value_t = false)]
    pub cycle: bool,

    /// Nombre de boucles complètes. Sans valeur : infini. Active --cycle.
    #[arg(short = 'l', long = "loop", num_args = 0..=1)]
    pub r#loop: Option<Option<u32>>,

    /// Intervalle entre deux frames, en millisecondes.
    #[arg(short, long)]
    pub speed: Option<u64>,

    /// Mélanger l'ordre des frames une fois avant la lecture.
    #[arg(short = 'S', long, default_value_t = false)]
    pub shuffle: bool,

    /// Verbosité : 0 = erreurs, 1 = + avertissements, 2 = + infos.
    #[arg(short = 'L', long = "log", value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbosity: Option<u8>,

    /// Purger le dossier de staging après le run. Valeur optionnelle (true/false).
    #[arg(short = 'C', long, num_args = 0..=1, default_missing_value = "true")]
    pub cleanup: Option<String>,

    /// Afficher le pipeline construit sans l'exécuter.
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,

    /// Fichier de configuration TOML.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Dossier de staging (remplace la config).
    #[arg(long)]
    pub staging: Option<PathBuf>,

    /// Effacer la sortie à l'arrêt au lieu de laisser la dernière frame.
    #[arg(long, default_value_t = false)]
    pub clear: bool,

    /// Charset (clair → dense) ou preset : compact, standard, blocks.
    #[arg(long)]
    pub charset: Option<String>,

    /// Niveau de log env_logger : error, warn, info, debug, trace.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply the flags on top of `config` (defaults or TOML file).
    ///
    /// # Errors
    /// Returns an error for `--loop 0`.
    pub fn apply(&self, config: &mut RunConfig) -> Result<()> {
        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = self.height {
            config.height = Some(v);
        }
        if let Some(v) = self.index {
            config.start_index = v;
        }
        if self.cycle {
            config.cycle = true;
        }
        match self.r#loop {
            Some(None) => config.loop_count = Some(LoopCount::Infinite),
            Some(Some(0)) => anyhow::bail!("--loop doit valoir au moins 1"),
            Some(Some(n)) => config.loop_count = Some(LoopCount::Times(n)),
            None => {}
        }
        if let Some(v) = self.speed {
            config.set_speed(v);
        }
        if self.shuffle {
            config.shuffle = true;
        }
        if let Some(v) = self.verbosity {
            config.verbosity = v;
        }
        if let Some(ref v) = self.cleanup {
            config.cleanup = parse_flag(v);
        }
        if let Some(ref v) = self.staging {
            config.staging_root.clone_from(v);
        }
        if self.clear {
            config.clear_on_stop = true;
        }
        if let Some(ref v) = self.charset {
            config.charset = itc_core::charset::resolve(v).to_string();
        }
        config.clamp_all();
        Ok(())
    }

    /// `env_logger` level: `--log-level` wins, else derived from verbosity.
    /// Never quieter than `Error`.
    #[must_use]
    pub fn log_filter(&self, verbosity: u8) -> log::LevelFilter {
        let derived = if verbosity == 0 {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Info
        };
        self.log_level
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or(derived)
            // Errors are always emitted.
            .max(log::LevelFilter::Error)
    }
}

/// Only a case-insensitive `true` enables the flag.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("image-to-console").chain(args.iter().copied())).unwrap()
    }

    fn merged(args: &[&str]) -> RunConfig {
        let mut config = RunConfig::default();
        parse(args).apply(&mut config).unwrap();
        config
    }

    #[test]
    fn defaults_untouched_without_flags() {
        let config = merged(&["a.png"]);
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn inputs_are_required() {
        assert!(Cli::try_parse_from(["image-to-console"]).is_err());
    }

    #[test]
    fn bare_loop_is_infinite_and_cycles() {
        let config = merged(&["a.gif", "-l"]);
        assert_eq!(config.loop_count, Some(LoopCount::Infinite));
        assert!(config.cycle);
    }

    #[test]
    fn loop_with_count() {
        let config = merged(&["a.gif", "--loop", "3"]);
        assert_eq!(config.loop_count, Some(LoopCount::Times(3)));
        assert!(config.is_cycling());
    }

    #[test]
    fn loop_zero_is_rejected() {
        let mut config = RunConfig::default();
        assert!(parse(&["a.gif", "--loop", "0"]).apply(&mut config).is_err());
    }

    #[test]
    fn cleanup_value_parsing() {
        assert!(merged(&["a.png", "-C"]).cleanup);
        assert!(merged(&["a.png", "--cleanup=TRUE"]).cleanup);
        assert!(!merged(&["a.png", "--cleanup=yes"]).cleanup);
        assert!(!merged(&["a.png", "--cleanup=false"]).cleanup);
    }

    #[test]
    fn speed_flag_is_explicit() {
        let config = merged(&["a.gif", "-s", "250"]);
        assert_eq!(config.speed_ms, 250);
        assert!(config.speed_explicit);
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut config = itc_core::config::parse_config("[output]\nwidth = 80\nheight = 10\n").unwrap();
        parse(&["a.png", "-w", "20"]).apply(&mut config).unwrap();
        assert_eq!((config.width, config.height), (20, Some(10)));
    }

    #[test]
    fn verbosity_above_two_is_refused() {
        assert!(Cli::try_parse_from(["image-to-console", "-L", "3", "a.png"]).is_err());
    }

    #[test]
    fn log_filter_follows_verbosity_unless_overridden() {
        assert_eq!(parse(&["a.png"]).log_filter(0), log::LevelFilter::Error);
        assert_eq!(parse(&["a.png"]).log_filter(1), log::LevelFilter::Info);
        assert_eq!(
            parse(&["a.png", "--log-level", "trace"]).log_filter(0),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn log_level_off_still_lets_errors_through() {
        assert_eq!(
            parse(&["a.png", "--log-level", "off"]).log_filter(0),
            log::LevelFilter::Error
        );
    }
}
