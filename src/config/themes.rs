use ratatui::style::{Color, Modifier, Style};

use super::ThemeName;
use crate::records::TagCategory;

/// Resolved style palette for the TUI. Tag colors keep one hue per
/// category: version orange, run type blue, completed green, hardcore
/// red, co-op cyan, cheats magenta.
#[derive(Debug, Clone)]
pub struct Theme {
    pub base: Style,
    pub header: Style,
    pub accent: Style,
    pub dim: Style,
    pub selected_row: Style,
    pub error: Style,
    pub loading: Style,
    pub highlight: Style,
    tag_version: Style,
    tag_run_type: Style,
    tag_completed: Style,
    tag_hardcore: Style,
    tag_coop: Style,
    tag_cheats: Style,
}

impl Theme {
    pub fn resolve(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    pub fn tag(&self, category: TagCategory) -> Style {
        match category {
            TagCategory::Version => self.tag_version,
            TagCategory::RunType => self.tag_run_type,
            TagCategory::Completed => self.tag_completed,
            TagCategory::Hardcore => self.tag_hardcore,
            TagCategory::Coop => self.tag_coop,
            TagCategory::CheatsAllowed => self.tag_cheats,
        }
    }

    fn dark() -> Self {
        Self {
            base: Style::default(),
            header: Style::default().add_modifier(Modifier::BOLD),
            accent: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Gray),
            selected_row: Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            error: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            loading: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
            highlight: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            tag_version: Style::default().fg(Color::LightYellow),
            tag_run_type: Style::default().fg(Color::LightBlue),
            tag_completed: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            tag_hardcore: Style::default().fg(Color::LightRed),
            tag_coop: Style::default().fg(Color::Cyan),
            tag_cheats: Style::default().fg(Color::Magenta),
        }
    }

    fn light() -> Self {
        Self {
            base: Style::default().fg(Color::Black),
            header: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            accent: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            selected_row: Style::default()
                .bg(Color::LightBlue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            error: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            loading: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            highlight: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            tag_version: Style::default().fg(Color::Rgb(212, 107, 8)),
            tag_run_type: Style::default().fg(Color::Blue),
            tag_completed: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            tag_hardcore: Style::default().fg(Color::Red),
            tag_coop: Style::default().fg(Color::Cyan),
            tag_cheats: Style::default().fg(Color::Magenta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_category_has_a_style_in_both_themes() {
        let categories = [
            TagCategory::Version,
            TagCategory::RunType,
            TagCategory::Completed,
            TagCategory::Hardcore,
            TagCategory::Coop,
            TagCategory::CheatsAllowed,
        ];
        for name in [ThemeName::Dark, ThemeName::Light] {
            let theme = Theme::resolve(name);
            for category in categories {
                // styling differs per theme; it just has to exist and
                // carry a foreground so tags stay distinguishable
                assert!(theme.tag(category).fg.is_some(), "{name:?}/{category:?}");
            }
        }
    }
}
