//! `meetwise config`: Configuration commands.

use meetwise_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");
            if config.missing_api_key() {
                println!("   ⚠️  No API key set (set MEETWISE_API_KEY or OPENROUTER_API_KEY)");
            }
            println!();
            println!("   Provider:  {}", config.default_provider);
            println!("   Model:     {}", config.default_model);
            println!("   Timeout:   {}s", config.model.timeout_secs);
            println!("   Memory:    {}", config.memory.backend);
            println!(
                "   Context:   {} records, post-hoc delta {}",
                config.context.max_records,
                if config.context.post_hoc_delta { "on" } else { "off" }
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Print the effective config. `api_key` never reaches the output.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let has_key = config.api_key.take().is_some();
    for provider in config.providers.values_mut() {
        provider.api_key = None;
    }

    println!("{}", toml::to_string_pretty(&config)?);
    if has_key {
        println!("# api_key: [REDACTED]");
    }
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_dir().join("config.toml").display());
    Ok(())
}
