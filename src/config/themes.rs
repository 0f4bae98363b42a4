use std::collections::HashSet;

use ratatui::style::{Color, Modifier, Style};

use super::ThemeName;

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    names: HashSet<ThemeName>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.names.contains(theme)
    }

    pub fn all(&self) -> impl Iterator<Item = &ThemeName> {
        self.names.iter()
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let names = [
            ThemeName::Dark,
            ThemeName::Light,
            ThemeName::HighContrast,
            ThemeName::Solarized,
        ]
        .into_iter()
        .collect();
        Self { names }
    }
}

/// Resolved widget styles for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub border: Color,
    pub completed: Style,
    pub overdue: Style,
    pub due_soon: Style,
    pub priority_high: Style,
    pub selection: Style,
    pub cursor_row: Style,
    pub hint_key: Style,
    pub hint_label: Style,
    pub status: Style,
}

impl Theme {
    pub fn resolve(name: &ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
            ThemeName::HighContrast => Self::high_contrast(),
            ThemeName::Solarized => Self::solarized(),
        }
    }

    fn dark() -> Self {
        Self {
            accent: Color::Cyan,
            border: Color::DarkGray,
            completed: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
            overdue: Style::default().fg(Color::Red),
            due_soon: Style::default().fg(Color::Yellow),
            priority_high: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            selection: Style::default().fg(Color::Green),
            cursor_row: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            hint_key: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            hint_label: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::Yellow),
        }
    }

    fn light() -> Self {
        Self {
            accent: Color::Blue,
            border: Color::Gray,
            completed: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
            overdue: Style::default().fg(Color::Red),
            due_soon: Style::default().fg(Color::Rgb(160, 110, 0)),
            priority_high: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            selection: Style::default().fg(Color::Green),
            cursor_row: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            hint_key: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            hint_label: Style::default().fg(Color::DarkGray),
            status: Style::default().fg(Color::Rgb(160, 110, 0)),
        }
    }

    fn high_contrast() -> Self {
        Self {
            accent: Color::White,
            border: Color::White,
            completed: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
            overdue: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            due_soon: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            priority_high: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            selection: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            cursor_row: Style::default()
                .fg(Color::Black)
                .bg(Color::White),
            hint_key: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            hint_label: Style::default().fg(Color::White),
            status: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }

    fn solarized() -> Self {
        Self {
            accent: Color::Rgb(38, 139, 210),
            border: Color::Rgb(88, 110, 117),
            completed: Style::default()
                .fg(Color::Rgb(88, 110, 117))
                .add_modifier(Modifier::CROSSED_OUT),
            overdue: Style::default().fg(Color::Rgb(220, 50, 47)),
            due_soon: Style::default().fg(Color::Rgb(181, 137, 0)),
            priority_high: Style::default()
                .fg(Color::Rgb(211, 54, 130))
                .add_modifier(Modifier::BOLD),
            selection: Style::default().fg(Color::Rgb(133, 153, 0)),
            cursor_row: Style::default()
                .fg(Color::Rgb(38, 139, 210))
                .add_modifier(Modifier::BOLD),
            hint_key: Style::default()
                .fg(Color::Rgb(38, 139, 210))
                .add_modifier(Modifier::BOLD),
            hint_label: Style::default().fg(Color::Rgb(131, 148, 150)),
            status: Style::default().fg(Color::Rgb(181, 137, 0)),
        }
    }
}
