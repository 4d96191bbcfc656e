use std::path::{Path, PathBuf};
use std::time::Duration;

use itc_core::barrier::fan_out;
use itc_core::error::{PipelineError, Stage};
use itc_core::input::{InputKind, InputSpec, StagedAsset};
use itc_core::logger::RunLogger;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Rapatrie chaque input dans la zone de staging.
///
/// Remote tokens are streamed from HTTP, local ones are streamed file to
/// file. Every transfer starts before any is awaited.
#[derive(Debug, Clone)]
pub struct Acquirer {
    client: reqwest::Client,
    staged_dir: PathBuf,
    log: RunLogger,
}

impl Acquirer {
    /// Build an acquirer writing into `staged_dir`.
    ///
    /// # Errors
    /// [`PipelineError::Config`] if the HTTP client cannot be built.
    pub fn new(
        staged_dir: impl Into<PathBuf>,
        fetch_timeout: Duration,
        log: RunLogger,
    ) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            staged_dir: staged_dir.into(),
            log,
        })
    }

    /// Staging path for one input: `<index:04>-<file name>`.
    #[must_use]
    pub fn staged_path(&self, spec: &InputSpec) -> PathBuf {
        self.staged_dir
            .join(format!("{:04}-{}", spec.index, spec.file_name()))
    }

    /// Stage every input concurrently; output order equals input order.
    ///
    /// # Errors
    /// The first [`PipelineError::Read`] / [`PipelineError::Write`] raised by
    /// any transfer. Assets already staged stay on disk.
    pub async fn acquire_all(&self, inputs: Vec<InputSpec>) -> Result<Vec<StagedAsset>, PipelineError> {
        tokio::fs::create_dir_all(&self.staged_dir)
            .await
            .map_err(|source| write_error(&self.staged_dir, source))?;

        let total = inputs.len();
        let staged = fan_out(Stage::Acquire, inputs, |_, spec| {
            let client = self.client.clone();
            let dest = self.staged_path(&spec);
            let log = self.log;
            async move {
                let len = match spec.kind {
                    InputKind::Remote => fetch_to(&client, &spec.token, &dest).await?,
                    InputKind::Local => copy_to(&spec.token, &dest).await?,
                };
                log.info(format!("staged {} ({len} bytes)", spec.token));
                Ok(StagedAsset {
                    origin: spec,
                    path: dest,
                    len,
                })
            }
        })
        .await?;

        self.log.success(format!("acquired {total} asset(s)"));
        Ok(staged)
    }
}

async fn copy_to(source: &str, dest: &Path) -> Result<u64, PipelineError> {
    let mut input = File::open(source)
        .await
        .map_err(|e| read_error(source, e))?;
    let mut output = File::create(dest)
        .await
        .map_err(|e| write_error(dest, e))?;
    let len = tokio::io::copy(&mut input, &mut output)
        .await
        .map_err(|e| read_error(source, e))?;
    output.flush().await.map_err(|e| write_error(dest, e))?;
    Ok(len)
}

async fn fetch_to(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64, PipelineError> {
    let mut response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| read_error(url, e))?;

    let mut output = File::create(dest)
        .await
        .map_err(|e| write_error(dest, e))?;
    let mut len = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(|e| read_error(url, e))? {
        output
            .write_all(&chunk)
            .await
            .map_err(|e| write_error(dest, e))?;
        len += chunk.len() as u64;
    }
    output.flush().await.map_err(|e| write_error(dest, e))?;
    Ok(len)
}

fn read_error(origin: &str, source: impl std::error::Error + Send + Sync + 'static) -> PipelineError {
    PipelineError::Read {
        origin: origin.to_string(),
        source: Box::new(source),
    }
}

fn write_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::Write {
        stage: Stage::Acquire,
        path: path.to_path_buf(),
        source,
    }
}
