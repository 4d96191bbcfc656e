use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use itc_core::config::RunConfig;
use itc_core::logger::RunLogger;
use itc_render::TerminalSink;

pub mod cli;
pub mod lifecycle;
pub mod pipeline;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Config : défauts → fichier TOML → flags
    let mut config = match cli.config.as_deref() {
        Some(path) => itc_core::config::load_config(path)?,
        None => RunConfig::default(),
    };
    cli.apply(&mut config)?;

    // 3. Logging
    env_logger::Builder::new()
        .filter_level(cli.log_filter(config.verbosity))
        .format_timestamp(None)
        .init();
    let log = RunLogger::new(config.verbosity);

    // 4. Construire le pipeline
    let pipeline = pipeline::Pipeline::build(cli.inputs.clone(), config, log)?;
    if cli.debug {
        println!("{pipeline:#?}");
        return Ok(ExitCode::SUCCESS);
    }

    // 5. Exécuter ; Ctrl-C arrête l'animation proprement
    let stop = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let mut sink = TerminalSink::stdout();
    match pipeline.run(&mut sink, stop).await {
        Ok(report) => {
            log.info(format!(
                "{} frame(s) every {} ms (delay from asset {:?}), {} tick(s), {:?}, cleanup {:?}",
                report.frames,
                report.interval.as_millis(),
                report.delay_source,
                report.playback.ticks,
                report.playback.stopped_by,
                report.cleanup
            ));
            Ok(ExitCode::SUCCESS)
        }
        // Already reported; returning the error would print it a second time.
        Err(e) => {
            log.error(format!("{} failed: {e}", e.stage()));
            Ok(ExitCode::FAILURE)
        }
    }
}
