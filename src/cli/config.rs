use crate::cli::ConfigArgs;
use crate::config::Config;

pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    let config = Config::resolve(&args.config, args.env_file.as_deref())?;

    println!("{}", serde_yaml::to_string(&masked(&config))?);

    let issues = config.issues();
    if !issues.is_empty() {
        println!("Issues:");
        for issue in &issues {
            println!("  - {}", issue);
        }
    }

    config.validate()?;
    Ok(())
}

/// Copy of the config with every secret replaced by a short hint
pub fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    for secret in [
        &mut config.agent.api_key,
        &mut config.chat.api_key,
        &mut config.github.token,
        &mut config.storage.key,
    ] {
        if let Some(value) = secret.as_mut() {
            *value = mask(value);
        }
    }
    config
}

fn mask(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_masked() {
        let mut config = Config::default();
        config.chat.api_key = Some("sk-1234567890abcdef".to_string());
        config.github.token = Some("short".to_string());

        let masked = masked(&config);
        assert_eq!(masked.chat.api_key.as_deref(), Some("sk-1****"));
        assert_eq!(masked.github.token.as_deref(), Some("****"));
        assert!(masked.storage.key.is_none());

        let yaml = serde_yaml::to_string(&masked).unwrap();
        assert!(!yaml.contains("abcdef"));
    }
}
