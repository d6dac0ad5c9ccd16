use super::{BaseCommand, Command};
use crate::error::Result;
use crate::ui::Message;
use clap::Args;
use tracing::debug;

#[derive(Args, Debug, Clone, Default)]
pub struct ApiCommand {
    /// API endpoint (e.g. https://api.example.com)
    #[arg(value_name = "URL")]
    pub url: Option<String>,
}

fn display_endpoint(base: &BaseCommand<'_>) {
    let target = base.config.target();
    if target.is_empty() {
        base.ui.display_text(
            Message::new("No API endpoint set. Use '{{ bin }} api' to set an endpoint")
                .arg("bin", base.config.binary_name()),
        );
        return;
    }
    base.ui.display_key_value_table(
        "",
        vec![
            vec!["API endpoint:".to_string(), target],
            vec!["API version:".to_string(), base.config.api_version()],
        ],
        3,
    );
}

impl Command for ApiCommand {
    fn execute(&self, base: &BaseCommand<'_>) -> Result<()> {
        let Some(url) = self.url.as_deref() else {
            display_endpoint(base);
            return Ok(());
        };

        let url = url.trim_end_matches('/');
        base.ui.display_text_with_flavor(
            Message::new("Setting API endpoint to {{ url }}...").arg("url", url),
        );

        let version = base.actor.cloud_controller_api_version();
        debug!(target = url, version = %version, "setting api endpoint");
        base.config.set_target_information(url, &version);
        base.config.unset_user_information();

        base.ui.display_ok();
        base.ui.display_newline();
        display_endpoint(base);
        Ok(())
    }
}
