//! # Terminal UI
//!
//! Every byte a command shows the user goes through the [`Ui`] trait. Commands
//! describe *what* to say with a [`Message`]; the UI decides how it looks.
//!
//! ## Messages
//!
//! A [`Message`] is an English template plus named values:
//!
//! ```rust
//! use cfcli::ui::Message;
//!
//! let msg = Message::new("Deleting app {{ app }} in org {{ org }}...")
//!     .arg("app", "web")
//!     .arg("org", "acme");
//! ```
//!
//! Rendering happens in two steps. The template is first looked up in the
//! active message catalog (see [`crate::i18n`]), then the values are
//! substituted with [minijinja](https://docs.rs/minijinja). Translating the
//! template rather than the rendered text means one catalog entry covers every
//! value a message is shown with.
//!
//! ## Streams
//!
//! - **stdout**: command output, prompts, `OK` and `FAILED`
//! - **stderr**: warnings and error messages
//!
//! Keeping warnings on stderr lets scripts parse stdout while still surfacing
//! platform advisories to a human.
//!
//! ## Styling
//!
//! Styles come from [`style::CF_THEME`]. Color is decided once when the UI is
//! built (configuration, `CF_COLOR`, and whether stdout is a terminal); when
//! it is off every style is a no-op.

use crate::error::{CliError, Result};
use crate::i18n::Translator;
use minijinja::Environment;
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Write};

pub mod style;
pub mod table;

use style::CF_THEME;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(Environment::new);

/// A translatable template with named values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    template: String,
    values: BTreeMap<String, String>,
}

impl Message {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl ToString) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the message in English with plain values.
    pub fn render(&self) -> String {
        self.render_with(&Translator::identity(), |v| v.to_string())
    }

    /// Renders the translated template, passing each value through `decorate`.
    pub fn render_with(&self, translator: &Translator, decorate: impl Fn(&str) -> String) -> String {
        let template = translator.translate(&self.template);
        if self.values.is_empty() {
            return template.into_owned();
        }
        let values: BTreeMap<&str, String> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), decorate(v)))
            .collect();
        TEMPLATES
            .render_str(&template, values)
            .unwrap_or_else(|err| {
                tracing::warn!(template = %template, error = %err, "unable to render message");
                template.into_owned()
            })
    }
}

impl From<&str> for Message {
    fn from(template: &str) -> Self {
        Message::new(template)
    }
}

impl From<String> for Message {
    fn from(template: String) -> Self {
        Message::new(template)
    }
}

/// Output and interaction surface used by commands.
pub trait Ui {
    /// Writes the message and a newline to stdout.
    fn display_text(&self, message: Message);

    /// Like [`Ui::display_text`], with the values highlighted.
    fn display_text_with_flavor(&self, message: Message);

    fn display_text_no_newline(&self, message: Message);

    fn display_newline(&self);

    /// Writes a green `OK` to stdout.
    fn display_ok(&self);

    /// Writes the message to stderr.
    fn display_warning(&self, message: Message);

    /// Writes each warning to stderr, in order.
    fn display_warnings(&self, warnings: &[String]);

    /// Asks a yes/no question until it gets a valid answer. An empty answer
    /// takes `default`.
    fn display_bool_prompt(&self, default: bool, message: Message) -> Result<bool>;

    /// Aligned rows of cells. The first column is translated.
    fn display_key_value_table(&self, prefix: &str, rows: Vec<Vec<String>>, padding: usize);

    /// Aligned rows with the first row translated and rendered bold.
    fn display_table_with_header(&self, prefix: &str, rows: Vec<Vec<String>>, padding: usize);

    /// Writes the error to stderr and a red `FAILED` to stdout.
    fn display_error(&self, err: &CliError);
}

/// [`Ui`] over arbitrary input and output streams.
pub struct TerminalUi {
    input: RefCell<Box<dyn BufRead>>,
    out: RefCell<Box<dyn Write>>,
    err: RefCell<Box<dyn Write>>,
    color: bool,
    translator: Translator,
}

impl TerminalUi {
    pub fn new(input: Box<dyn BufRead>, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            input: RefCell::new(input),
            out: RefCell::new(out),
            err: RefCell::new(err),
            color: false,
            translator: Translator::identity(),
        }
    }

    /// The process's standard streams.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = translator;
        self
    }

    fn style(&self, name: &str, text: &str) -> String {
        CF_THEME.apply(name, text, self.color)
    }

    fn plain(&self, message: &Message) -> String {
        message.render_with(&self.translator, |v| v.to_string())
    }

    fn write_out(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn write_err(&self, text: &str) {
        let mut err = self.err.borrow_mut();
        let _ = err.write_all(text.as_bytes());
        let _ = err.flush();
    }

    fn write_table(&self, lines: Vec<String>, header: bool) {
        for (i, line) in lines.into_iter().enumerate() {
            if header && i == 0 {
                self.write_out(&format!("{}\n", self.style("header", &line)));
            } else {
                self.write_out(&format!("{}\n", line));
            }
        }
    }
}

impl Ui for TerminalUi {
    fn display_text(&self, message: Message) {
        self.write_out(&format!("{}\n", self.plain(&message)));
    }

    fn display_text_with_flavor(&self, message: Message) {
        let text = message.render_with(&self.translator, |v| self.style("flavor", v));
        self.write_out(&format!("{}\n", text));
    }

    fn display_text_no_newline(&self, message: Message) {
        self.write_out(&self.plain(&message));
    }

    fn display_newline(&self) {
        self.write_out("\n");
    }

    fn display_ok(&self) {
        let ok = self.translator.translate("OK");
        self.write_out(&format!("{}\n", self.style("ok", &ok)));
    }

    fn display_warning(&self, message: Message) {
        self.write_err(&format!("{}\n", self.plain(&message)));
    }

    fn display_warnings(&self, warnings: &[String]) {
        for warning in warnings {
            self.write_err(&format!("{}\n", self.translator.translate(warning)));
        }
    }

    fn display_bool_prompt(&self, default: bool, message: Message) -> Result<bool> {
        let choices = if default { "[Yn]" } else { "[yN]" };
        let prompt = format!("{} {}: ", self.plain(&message), choices);

        loop {
            self.write_out(&prompt);
            let mut answer = String::new();
            let read = self
                .input
                .borrow_mut()
                .read_line(&mut answer)
                .map_err(|e| CliError::Prompt(e.to_string()))?;
            if read == 0 {
                return Err(CliError::Prompt("unexpected end of input".to_string()));
            }

            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {
                    let invalid = self
                        .translator
                        .translate("invalid input (not y, n, yes, or no)");
                    self.write_out(&format!("{}\n", invalid));
                }
            }
        }
    }

    fn display_key_value_table(&self, prefix: &str, rows: Vec<Vec<String>>, padding: usize) {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|mut row| {
                if let Some(key) = row.first_mut() {
                    *key = self.translator.translate(key).into_owned();
                }
                row
            })
            .collect();
        self.write_table(table::format_rows(prefix, &rows, padding), false);
    }

    fn display_table_with_header(&self, prefix: &str, mut rows: Vec<Vec<String>>, padding: usize) {
        if let Some(header) = rows.first_mut() {
            for cell in header.iter_mut() {
                *cell = self.translator.translate(cell).into_owned();
            }
        }
        self.write_table(table::format_rows(prefix, &rows, padding), true);
    }

    fn display_error(&self, err: &CliError) {
        let message = err.to_string();
        self.write_err(&format!("{}\n", self.translator.translate(&message)));
        let failed = self.translator.translate("FAILED");
        self.write_out(&format!("{}\n", self.style("failed", &failed)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorError;
    use crate::test_utils::TestUi;

    #[test]
    fn test_message_substitutes_values() {
        let msg = Message::new("Deleting app {{ app }} in org {{ org }}...")
            .arg("app", "web")
            .arg("org", "acme");
        assert_eq!(msg.render(), "Deleting app web in org acme...");
    }

    #[test]
    fn test_message_without_values_is_literal() {
        assert_eq!(Message::new("Use '{{' carefully").render(), "Use '{{' carefully");
    }

    #[test]
    fn test_message_translates_template_before_substitution() {
        let translator =
            Translator::from_entries([("Hello {{ name }}", "Bonjour {{ name }}")]);
        let msg = Message::new("Hello {{ name }}").arg("name", "Ada");
        assert_eq!(msg.render_with(&translator, |v| v.to_string()), "Bonjour Ada");
    }

    #[test]
    fn test_flavor_styles_values_only() {
        let t = TestUi::new("");
        let ui = TerminalUi::new(
            Box::new(io::Cursor::new(Vec::new())),
            Box::new(t.out.clone()),
            Box::new(t.err.clone()),
        )
        .with_color(true);
        ui.display_text_with_flavor(Message::new("App {{ app }} ok").arg("app", "web"));
        let out = t.out.contents();
        assert!(out.starts_with("App "));
        assert!(out.contains("\u{1b}["));
        assert!(out.ends_with(" ok\n"));
    }

    #[test]
    fn test_warnings_go_to_stderr_in_order() {
        let t = TestUi::new("");
        t.ui.display_warnings(&["first".to_string(), "second".to_string()]);
        assert_eq!(t.err.contents(), "first\nsecond\n");
        assert_eq!(t.out.contents(), "");
    }

    #[test]
    fn test_display_error_splits_streams() {
        let t = TestUi::new("");
        t.ui.display_error(&CliError::Actor(ActorError::UpgradeNotAvailable));
        assert_eq!(t.err.contents(), "No upgrade is available.\n");
        assert_eq!(t.out.contents(), "FAILED\n");
    }

    #[test]
    fn test_bool_prompt_yes() {
        let t = TestUi::new("y\n");
        assert!(t.ui.display_bool_prompt(false, "Really?".into()).unwrap());
        assert_eq!(t.out.contents(), "Really? [yN]: ");
    }

    #[test]
    fn test_bool_prompt_empty_takes_default() {
        let t = TestUi::new("\n");
        assert!(!t.ui.display_bool_prompt(false, "Really?".into()).unwrap());
        let t = TestUi::new("\n");
        assert!(t.ui.display_bool_prompt(true, "Really?".into()).unwrap());
    }

    #[test]
    fn test_bool_prompt_reprompts_on_invalid_input() {
        let t = TestUi::new("maybe\nNO\n");
        assert!(!t.ui.display_bool_prompt(false, "Really?".into()).unwrap());
        assert_eq!(
            t.out.contents(),
            "Really? [yN]: invalid input (not y, n, yes, or no)\nReally? [yN]: "
        );
    }

    #[test]
    fn test_bool_prompt_end_of_input_is_error() {
        let t = TestUi::new("");
        assert!(matches!(
            t.ui.display_bool_prompt(false, "Really?".into()),
            Err(CliError::Prompt(_))
        ));
    }

    #[test]
    fn test_key_value_table_alignment() {
        let t = TestUi::new("");
        t.ui.display_key_value_table(
            "",
            vec![
                vec!["api endpoint:".to_string(), "https://api".to_string()],
                vec!["org:".to_string(), "acme".to_string()],
            ],
            3,
        );
        assert_eq!(t.out.contents(), "api endpoint:   https://api\norg:            acme\n");
    }
}
