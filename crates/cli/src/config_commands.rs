use {
    anyhow::Result,
    clap::Subcommand,
    serde_json::Value,
    tgwire_config::{ClientConfig, config_dir, find_config_file},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration with the token redacted.
    Show,
    /// Print where configuration is read from.
    Path,
}

pub fn handle_config(config: &ClientConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&redacted(config)?)?);
        },
        ConfigAction::Path => {
            match find_config_file() {
                Some(path) => println!("{}", path.display()),
                None => eprintln!("No config file found; using defaults."),
            }
            if let Some(dir) = config_dir() {
                eprintln!("User config directory: {}", dir.display());
            }
        },
    }
    Ok(())
}

fn redacted(config: &ClientConfig) -> Result<Value> {
    let mut value = serde_json::to_value(config)?;
    if let Some(token) = value.get_mut("token") {
        *token = if config.has_token() {
            Value::from("[REDACTED]")
        } else {
            Value::from("")
        };
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn show_hides_token() {
        let value = redacted(&ClientConfig::with_token("42:SECRET")).unwrap();
        assert_eq!(value["token"], "[REDACTED]");
        assert_eq!(value["api_root"], "https://api.telegram.org");
        assert_eq!(value["webhook_reply"], true);
        assert!(!value.to_string().contains("SECRET"));
    }

    #[test]
    fn show_marks_missing_token() {
        let value = redacted(&ClientConfig::default()).unwrap();
        assert_eq!(value["token"], "");
    }
}
