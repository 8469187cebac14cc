//! `lumen config` - show or edit the saved configuration

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use lumen_core::{Config, ConfigStore};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the saved configuration
    Show,
    /// Update saved fields; an empty value clears a text field
    Set(ConfigUpdate),
}

#[derive(Args, Debug, Default)]
pub struct ConfigUpdate {
    #[arg(long)]
    pub app_id: Option<String>,
    #[arg(long)]
    pub display_name: Option<String>,
    /// Top line
    #[arg(long)]
    pub details: Option<String>,
    /// Bottom line
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub large_image: Option<String>,
    #[arg(long)]
    pub large_text: Option<String>,
    #[arg(long)]
    pub small_image: Option<String>,
    #[arg(long)]
    pub small_text: Option<String>,
    /// Show time elapsed since the session started
    #[arg(long)]
    pub elapsed: Option<bool>,
}

pub fn handle(command: ConfigCommand) -> Result<()> {
    let store = ConfigStore::default_location();
    let mut config = store.load().context("failed to load config")?;

    match command {
        ConfigCommand::Show => print_config(&config),
        ConfigCommand::Set(update) => {
            apply(&mut config, update);
            store.save(&config).context("failed to save config")?;
            println!("Saved {}", store.path().display());
        }
    }

    Ok(())
}

fn apply(config: &mut Config, update: ConfigUpdate) {
    if let Some(app_id) = update.app_id {
        config.application_id = app_id.trim().to_string();
    }
    if let Some(name) = update.display_name {
        config.display_name = name.trim().to_string();
    }

    let presence = &mut config.presence;
    set_text(&mut presence.details, update.details);
    set_text(&mut presence.state, update.state);
    set_text(&mut presence.large_image_key, update.large_image);
    set_text(&mut presence.large_image_text, update.large_text);
    set_text(&mut presence.small_image_key, update.small_image);
    set_text(&mut presence.small_image_text, update.small_text);
    if let Some(enabled) = update.elapsed {
        presence.set_show_elapsed_time(enabled);
    }
}

fn set_text(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        *field = (!value.is_empty()).then(|| value.to_string());
    }
}

fn print_config(config: &Config) {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let presence = &config.presence;

    println!("application id: {}", or_dash(&config.application_id));
    println!("display name:   {}", or_dash(&config.display_name));
    println!("details:        {}", show(&presence.details));
    println!("state:          {}", show(&presence.state));
    println!("large image:    {}", show(&presence.large_image_key));
    println!("large text:     {}", show(&presence.large_image_text));
    println!("small image:    {}", show(&presence.small_image_key));
    println!("small text:     {}", show(&presence.small_image_text));
    println!("elapsed time:   {}", presence.show_elapsed_time);
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_and_clears_fields() {
        let mut config = Config::default();
        config.presence.state = Some("old".to_string());

        apply(
            &mut config,
            ConfigUpdate {
                app_id: Some(" 42 ".to_string()),
                details: Some("Shipping".to_string()),
                state: Some("  ".to_string()),
                elapsed: Some(true),
                ..Default::default()
            },
        );

        assert_eq!(config.application_id, "42");
        assert_eq!(config.presence.details.as_deref(), Some("Shipping"));
        assert_eq!(config.presence.state, None);
        assert!(config.presence.show_elapsed_time);
    }

    #[test]
    fn test_apply_leaves_unset_fields_alone() {
        let mut config = Config::default();
        config.display_name = "Bot".to_string();
        config.presence.large_image_key = Some("banner".to_string());

        apply(&mut config, ConfigUpdate::default());

        assert_eq!(config.display_name, "Bot");
        assert_eq!(config.presence.large_image_key.as_deref(), Some("banner"));
    }
}
