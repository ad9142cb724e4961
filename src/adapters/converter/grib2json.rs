//! grib2json converter - Implementation of Converter over a child process.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::adapters::storage::exists;
use crate::ports::{ConversionError, Converter, FilePath};

/// Settings for the external converter.
#[derive(Debug, Clone)]
pub struct Grib2JsonConfig {
    /// Program followed by any leading arguments, whitespace separated.
    pub command: String,
    /// Bound on captured stdout and on captured stderr.
    pub max_output_bytes: usize,
    pub timeout: Duration,
}

impl Grib2JsonConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            max_output_bytes: 500 * 1024,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs `<command> --data --output <json> --names --compact <raw>`.
pub struct Grib2JsonConverter {
    config: Grib2JsonConfig,
}

impl Grib2JsonConverter {
    pub fn new(config: Grib2JsonConfig) -> Self {
        Self { config }
    }

    fn command(&self, raw: &FilePath, output: &FilePath) -> Result<Command, ConversionError> {
        let mut parts = self.config.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ConversionError::spawn("converter command is empty"))?;

        let mut command = Command::new(program);
        command
            .args(parts)
            .arg("--data")
            .arg("--output")
            .arg(output.as_path())
            .arg("--names")
            .arg("--compact")
            .arg(raw.as_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(command)
    }
}

async fn read_bounded<R>(reader: Option<R>, max_bytes: usize) -> Result<Vec<u8>, ConversionError>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    reader
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut buf)
        .await
        .map_err(|e| ConversionError::spawn(format!("Failed to read converter output: {}", e)))?;

    if buf.len() > max_bytes {
        return Err(ConversionError::OutputTooLarge { max_bytes });
    }
    Ok(buf)
}

fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

#[async_trait]
impl Converter for Grib2JsonConverter {
    async fn convert(&self, raw: &FilePath, output: &FilePath) -> Result<(), ConversionError> {
        let mut child = self
            .command(raw, output)?
            .spawn()
            .map_err(|e| ConversionError::spawn(format!("{}: {}", self.config.command, e)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let max_bytes = self.config.max_output_bytes;

        let run = async {
            let (_, stderr) = tokio::try_join!(
                read_bounded(stdout, max_bytes),
                read_bounded(stderr, max_bytes)
            )?;
            let status = child
                .wait()
                .await
                .map_err(|e| ConversionError::spawn(format!("Failed to wait for converter: {}", e)))?;
            Ok::<_, ConversionError>((status, stderr))
        };

        let outcome = tokio::time::timeout(self.config.timeout, run).await;
        let (status, stderr) = match outcome {
            Ok(Ok(finished)) => finished,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(e);
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(ConversionError::TimedOut {
                    secs: self.config.timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            return Err(ConversionError::NonZeroExit {
                status: describe_exit(&status),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        if !exists(output.as_path()).await? {
            return Err(ConversionError::missing_output(output.to_string_lossy()));
        }

        Ok(())
    }
}
