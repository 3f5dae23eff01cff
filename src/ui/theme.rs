use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles by role in relink's output
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub repaired: Style,
    pub failed: Style,
    pub warn: Style,
    pub info: Style,
    /// Reasons and labels next to a value
    pub detail: Style,
    /// Catalog primary keys
    pub record_key: Style,
    /// A resolved path with nothing on disk
    pub missing_path: Style,
}

impl Theme {
    /// Colored only on a terminal, and never when `NO_COLOR`/`CLICOLOR=0` asks otherwise
    pub fn detect() -> Self {
        if !console::Term::stdout().is_term() || !console::colors_enabled() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            repaired: Style::new().green().bold(),
            failed: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            detail: Style::new().white().dimmed(),
            record_key: Style::new().bright_black(),
            missing_path: Style::new().bright_black().strikethrough(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            header: none,
            repaired: none,
            failed: none,
            warn: none,
            info: none,
            detail: none,
            record_key: none,
            missing_path: none,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
