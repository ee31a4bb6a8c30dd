use std::env;

use color_eyre::owo_colors::OwoColorize;
use qdvc_core::CommandStatus;

pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn status(&self, status: CommandStatus, text: &str) -> String {
        let (symbol, tone) = match status {
            CommandStatus::Ok => ("✔", Tone::Green),
            CommandStatus::UserError(_) => ("✗", Tone::Yellow),
            CommandStatus::Failure => ("✖", Tone::Red),
        };
        let line = format!("{symbol} {text}");
        self.paint(&line, tone)
    }

    pub fn banner(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.cyan().bold().to_string()
    }

    pub fn dimmed(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.dimmed().to_string()
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.enabled {
            return text.to_string();
        }
        match tone {
            Tone::Green => text.green().bold().to_string(),
            Tone::Yellow => text.yellow().bold().to_string(),
            Tone::Red => text.red().bold().to_string(),
        }
    }
}

enum Tone {
    Green,
    Yellow,
    Red,
}

#[cfg(test)]
mod tests {
    use qdvc_core::UserErrorReason;

    use super::*;

    #[test]
    fn plain_when_disabled() {
        let style = Style::new(true, true);
        assert_eq!(style.status(CommandStatus::Ok, "done"), "✔ done");
        assert_eq!(
            style.status(CommandStatus::UserError(UserErrorReason::NoFiles), "No files found."),
            "✗ No files found."
        );
        assert_eq!(style.banner("Quick DVC"), "Quick DVC");
    }
}
