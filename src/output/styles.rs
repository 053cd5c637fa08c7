//! Colour roles for terminal output, applied through owo-colors.

use owo_colors::Style;

/// One style per role. All plain until [`Styles::colorize`] runs, so
/// `--no-color` and non-TTY output need no special casing.
#[derive(Default, Clone)]
pub struct Styles {
    /// `✓` marks and passing doctor checks.
    pub success: Style,
    /// `⚠` marks, e.g. an unpatched loopback config.
    pub warning: Style,
    /// `✗` marks for failed doctor checks.
    pub failure: Style,
    pub info: Style,
    /// Left column of key/value summaries.
    pub key: Style,
    pub label: Style,
    pub header: Style,
    /// `→` prefix of pipeline steps when no spinner is shown.
    pub step: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.failure = Style::new().red().bold();
        self.info = Style::new().blue();
        self.key = Style::new().dimmed();
        self.label = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.step = Style::new().cyan();
    }
}
