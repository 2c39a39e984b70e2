//! Runtime configuration for scenarios.

use std::fmt;
use std::time::Duration;

/// Which process channel backs a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ChannelKind {
    /// Child attached to a pseudo-terminal.
    Pty,
    /// Child attached to standard-stream pipes.
    Pipe,
}

impl Default for ChannelKind {
    #[cfg(windows)]
    fn default() -> Self {
        ChannelKind::Pipe
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        ChannelKind::Pty
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Pty => f.write_str("pty"),
            ChannelKind::Pipe => f.write_str("pipe"),
        }
    }
}

/// Knobs for launching and driving a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub channel: ChannelKind,
    /// Pause between two reads of the capture loop.
    pub capture_interval: Duration,
    /// Pause between two scans of `expect`.
    pub poll_tick: Duration,
    /// How long a pipe-backed child may take to exit after its stdin closes.
    pub stop_grace: Duration,
    pub pty_rows: u16,
    pub pty_cols: u16,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::default(),
            capture_interval: Duration::from_millis(10),
            poll_tick: Duration::from_millis(10),
            stop_grace: Duration::from_millis(500),
            pty_rows: 24,
            pty_cols: 80,
        }
    }
}

impl ScenarioConfig {
    pub fn with_channel(mut self, channel: ChannelKind) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_capture_interval(mut self, interval: Duration) -> Self {
        self.capture_interval = interval;
        self
    }

    pub fn with_poll_tick(mut self, tick: Duration) -> Self {
        self.poll_tick = tick;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }
}
