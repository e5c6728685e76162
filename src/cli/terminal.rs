//! Terminal styling for command output

use owo_colors::{Color, OwoColorize, colors::css};
use srsgen::{Category, Priority};

/// Below this many columns listings drop their detail columns.
const NARROW_COLUMNS: u16 = 80;

/// Output styling, decided once from the capabilities of stdout.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
    width: Option<u16>,
}

impl Palette {
    pub fn detect() -> Self {
        Self {
            color: supports_color::on(supports_color::Stream::Stdout).is_some(),
            width: terminal_size::terminal_size().map(|(w, _)| w.0),
        }
    }

    pub fn is_narrow(self) -> bool {
        self.width.is_some_and(|w| w < NARROW_COLUMNS)
    }

    pub fn heading(self, text: &str) -> String {
        if self.color {
            text.fg::<css::LightBlue>().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn ok(self, text: &str) -> String {
        self.paint::<css::Green>(text)
    }

    pub fn alert(self, text: &str) -> String {
        self.paint::<css::Orange>(text)
    }

    pub fn muted(self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// Priority label padded to a fixed column, coloured by urgency.
    pub fn priority(self, priority: Priority) -> String {
        let label = format!("{:<6}", priority.to_string());
        match priority {
            Priority::High => self.alert(&label),
            Priority::Medium => self.paint::<css::LightBlue>(&label),
            Priority::Low => self.muted(&label),
        }
    }

    /// Category code padded to a fixed column, one colour per section.
    pub fn category(self, category: Category) -> String {
        let code = format!("{:<3}", category.code());
        match category {
            Category::DataManagement => self.paint::<css::SteelBlue>(&code),
            Category::Ui => self.paint::<css::Plum>(&code),
            Category::BusinessLogic => self.paint::<css::GoldenRod>(&code),
            Category::Integration => self.paint::<css::Teal>(&code),
            Category::Security => self.paint::<css::Crimson>(&code),
        }
    }

    fn paint<C: Color>(self, text: &str) -> String {
        if self.color {
            text.fg::<C>().to_string()
        } else {
            text.to_string()
        }
    }
}
