//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::connector::{Connector, ConnectorSpec};
use crate::error::{Error, Result};
use crate::output::{JsonLinesWriter, MessageSink};
use crate::state::StateManager;
use crate::tap::Tap;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing protocol output to stdout
    pub async fn run(&self) -> Result<()> {
        let mut out = std::io::stdout();
        self.run_with(&mut out).await
    }

    /// Run the CLI command against any output
    pub async fn run_with<W: Write + Send>(&self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(out),
            Commands::Check => self.check(out).await,
            Commands::Discover => self.discover(out).await,
            Commands::Read { streams, state_out } => {
                let selection = Commands::stream_selection(streams.as_deref());
                self.read(out, selection.as_deref(), state_out.as_deref())
                    .await
            }
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json(json_str);
        }

        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use --config)"))?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
        TapConfig::from_json(&content)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    fn spec<W: Write>(&self, out: &mut W) -> Result<()> {
        write_json(
            out,
            &json!({
                "type": "SPEC",
                "spec": ConnectorSpec::tap_bitbucket(),
            }),
        )
    }

    /// Check connection
    async fn check<W: Write + Send>(&self, out: &mut W) -> Result<()> {
        let tap = Tap::new(self.load_config()?);
        let result = tap.check().await?;

        let status = if result.success { "SUCCEEDED" } else { "FAILED" };
        write_json(
            out,
            &json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": status,
                    "message": result.message.unwrap_or_else(|| "Connection successful".to_string()),
                }
            }),
        )
    }

    /// Discover streams
    async fn discover<W: Write + Send>(&self, out: &mut W) -> Result<()> {
        let tap = Tap::new(self.load_config()?);
        let catalog = tap.discover().await?;
        write_json(out, &serde_json::to_value(&catalog)?)
    }

    /// Read data
    async fn read<W: Write + Send>(
        &self,
        out: &mut W,
        selection: Option<&[String]>,
        state_out: Option<&Path>,
    ) -> Result<()> {
        let tap = Tap::new(self.load_config()?);
        let state = self.load_state()?;

        let mut writer = JsonLinesWriter::new(out);
        let stats = tap.read(selection, state.clone(), &mut writer).await?;
        writer.flush()?;

        if let Some(path) = state_out {
            state.save_to_file(path).await?;
            info!(path = %path.display(), "Wrote final state");
        }

        info!(
            records = stats.records_synced,
            streams = stats.streams_synced,
            "Read finished"
        );
        Ok(())
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
