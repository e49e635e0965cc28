//! Presentation-level configuration
//!
//! Resolves how a response is shown from command-line flags layered over
//! the `[output]` section of the configuration file.

use parley_domain::OutputFormat;

/// Effective output behavior for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub color: bool,
    pub progress: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            color: true,
            progress: true,
        }
    }
}

impl OutputSettings {
    /// Start from file settings.
    pub fn from_file(format: Option<OutputFormat>, color: bool, progress: bool) -> Self {
        Self {
            format: format.unwrap_or_default(),
            color,
            progress,
        }
    }

    /// Apply command-line flags; flags only ever narrow what the file allows.
    pub fn with_flags(mut self, format: Option<OutputFormat>, no_color: bool, quiet: bool) -> Self {
        if let Some(format) = format {
            self.format = format;
        }
        self.color &= !no_color;
        self.progress &= !quiet;
        // Machine-readable output stays free of progress noise
        if self.format == OutputFormat::Json {
            self.progress = false;
        }
        self
    }

    /// Apply the color choice process-wide.
    pub fn apply_color(&self) {
        if !self.color {
            colored::control::set_override(false);
        }
    }
}
