#![allow(clippy::format_push_string)]

use crate::stats::AccuracyStats;

const RULE_HEAVY: &str = "═══════════════════════════════════════════════════════════════\n";
const RULE_LIGHT: &str = "───────────────────────────────────────────────────────────────\n";

/// Builds the fixed-width text reports printed by the CLI.
#[derive(Debug, Default)]
pub struct ReportFormatter {
    output: String,
}

impl ReportFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed title banner.
    pub fn banner(&mut self, title: &str) -> &mut Self {
        self.output.push('\n');
        self.output.push_str(RULE_HEAVY);
        self.output.push_str(&format!("{title:^63}\n"));
        self.output.push_str(RULE_HEAVY);
        self.output.push('\n');
        self
    }

    pub fn section(&mut self, title: &str) -> &mut Self {
        self.output.push_str(title);
        self.output.push('\n');
        self.output.push_str(RULE_LIGHT);
        self
    }

    pub fn field(&mut self, label: &str, value: impl std::fmt::Display) -> &mut Self {
        self.output.push_str(&format!("{:<23}{}\n", format!("{label}:"), value));
        self
    }

    /// One accuracy line: `label  correct/total (xx.x%)  [lo–hi]`.
    pub fn stats(&mut self, label: &str, stats: &AccuracyStats) -> &mut Self {
        if stats.total == 0 {
            self.output.push_str(&format!("{:<23}N/A (no verified predictions)\n", format!("{label}:")));
            return self;
        }
        self.output.push_str(&format!(
            "{:<23}{}/{} ({:.1}%)  95% CI [{:.1}%, {:.1}%]\n",
            format!("{label}:"),
            stats.correct,
            stats.total,
            stats.accuracy,
            stats.wilson_lower,
            stats.wilson_upper
        ));
        self
    }

    pub fn line(&mut self, text: &str) -> &mut Self {
        self.output.push_str(text);
        self.output.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.output.push('\n');
        self
    }

    pub fn rule(&mut self) -> &mut Self {
        self.output.push_str(RULE_HEAVY);
        self
    }

    #[must_use]
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}
