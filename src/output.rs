//! # Terminal Output
//!
//! Colour, emoji and progress helpers shared by the `epicsenv` commands.
//!
//! Colour follows the `--color=always|never|auto` flag. In `auto` mode it is
//! disabled by `NO_COLOR` (any value), `CLICOLOR=0`, `TERM=dumb` or a
//! non-terminal stdout, and forced on by `CLICOLOR_FORCE=1`.

use std::env;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag against the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        console::set_colors_enabled(use_color);
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// `emoji` when colour is on, `plain` otherwise.
    pub fn emoji<'a>(&self, emoji: &'a str, plain: &'a str) -> &'a str {
        if self.use_color {
            emoji
        } else {
            plain
        }
    }

    /// A success line: `✅ message` or `[OK] message`.
    pub fn success(&self, message: &str) -> String {
        let text = if self.use_color {
            style(message).green().to_string()
        } else {
            message.to_string()
        };
        format!("{} {}", self.emoji("✅", "[OK]"), text)
    }

    /// A header followed by one `  - NAME` line per failed module.
    pub fn failure_list(&self, header: &str, modules: &[String]) -> String {
        let header = if self.use_color {
            style(header).red().bold().to_string()
        } else {
            header.to_string()
        };
        let mut out = format!("{} {}", self.emoji("❌", "[FAILED]"), header);
        for module in modules {
            out.push_str(&format!("\n  - {}", module));
        }
        out
    }

    /// `from -> to` for a rewritten module version.
    pub fn version_change(&self, module: &str, from: &str, to: &str) -> String {
        if self.use_color {
            format!(
                "{} {}: {} -> {}",
                self.emoji("⬆️", "[UPDATE]"),
                style(module).bold(),
                style(from).dim(),
                style(to).cyan()
            )
        } else {
            format!("[UPDATE] {}: {} -> {}", module, from, to)
        }
    }

    /// A ticking spinner for long network operations. Hidden when stderr is
    /// not a terminal.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            spinner.set_style(template);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
