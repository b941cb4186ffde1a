//! CLI styling utilities
//!
//! Semantic styling via the [`Stylize`] trait; terminal color support
//! detection is delegated to `owo-colors` (respects `NO_COLOR`, `CLICOLOR`,
//! `CLICOLOR_FORCE`, and TTY detection).

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Style};
use std::fmt::{self, Display};
use std::sync::OnceLock;

pub use owo_colors::Stream;

const ACCENT: Style = Style::new().cyan();
const SUCCESS: Style = Style::new().green();
const ERROR: Style = Style::new().red();
const MUTED: Style = Style::new().dimmed();
const EMPHASIS: Style = Style::new().bold();

/// A value with semantic styling applied; renders with ANSI codes only when
/// the target stream supports them.
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    style: Style,
    stream: Stream,
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.value
                .if_supports_color(self.stream, |v| v.style(self.style))
        )
    }
}

/// Extension trait for semantic terminal styling, implemented for all
/// [`Display`] types. Methods take `&self` so borrowed data can be styled.
pub trait Stylize: Display {
    /// Cyan, for primary information: repos, branches, PR numbers
    fn accent(&self) -> Styled<&Self> {
        Styled {
            value: self,
            style: ACCENT,
            stream: Stream::Stdout,
        }
    }

    /// Green, for completed operations
    fn success(&self) -> Styled<&Self> {
        Styled {
            value: self,
            style: SUCCESS,
            stream: Stream::Stdout,
        }
    }

    /// Red, for failures (renders for stderr)
    fn error(&self) -> Styled<&Self> {
        Styled {
            value: self,
            style: ERROR,
            stream: Stream::Stderr,
        }
    }

    /// Dim, for secondary information
    fn muted(&self) -> Styled<&Self> {
        Styled {
            value: self,
            style: MUTED,
            stream: Stream::Stdout,
        }
    }

    /// Bold, for headers and the current action
    fn emphasis(&self) -> Styled<&Self> {
        Styled {
            value: self,
            style: EMPHASIS,
            stream: Stream::Stdout,
        }
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green checkmark for success states
pub fn check() -> Styled<&'static str> {
    "✓".success()
}

/// Red cross for failure states
pub fn cross() -> Styled<&'static str> {
    "✗".error()
}

/// Create a clickable hyperlink showing the URL itself, falling back to the
/// plain URL in terminals without OSC 8 support.
pub fn hyperlink_url(url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        terminal_link::Link::new(url, url).to_string()
    } else {
        url.to_string()
    }
}

/// Spinner style for long-running waits (fork readiness polling).
///
/// Template validated once on first call via `OnceLock`.
pub fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("hardcoded spinner template is valid")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        })
        .clone()
}
