use console::Style;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Prefix shown when a style name is not registered.
pub const MISSING_STYLE_INDICATOR: &str = "(!?)";

/// Named `console` styles, applied only when color is on.
#[derive(Clone, Default)]
pub struct Theme {
    styles: HashMap<&'static str, Style>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: &'static str, style: Style) -> Self {
        self.styles.insert(name, style);
        self
    }

    pub fn apply(&self, name: &str, text: &str, color: bool) -> String {
        match self.styles.get(name) {
            Some(_) if !color => text.to_string(),
            Some(style) => style.clone().force_styling(true).apply_to(text).to_string(),
            None => format!("{} {}", MISSING_STYLE_INDICATOR, text),
        }
    }
}

pub static CF_THEME: Lazy<Theme> = Lazy::new(|| {
    Theme::new()
        .add("flavor", Style::new().cyan().bold())
        .add("ok", Style::new().green().bold())
        .add("failed", Style::new().red().bold())
        .add("header", Style::new().bold())
        .add("warning", Style::new().yellow())
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_without_color_is_plain() {
        assert_eq!(CF_THEME.apply("ok", "OK", false), "OK");
    }

    #[test]
    fn test_apply_with_color_adds_ansi() {
        let styled = CF_THEME.apply("failed", "FAILED", true);
        assert!(styled.contains("\u{1b}["));
        assert!(styled.contains("FAILED"));
    }

    #[test]
    fn test_unknown_style_is_flagged() {
        assert_eq!(CF_THEME.apply("nope", "x", true), "(!?) x");
    }
}
