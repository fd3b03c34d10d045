// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, CapitalSettings, Settings};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
///
/// The merged settings are validated before they are returned.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name("config/base"))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        // e.g. `APP_CAPITAL__INITIAL_CAPITAL=5000`
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// Parses and validates settings from a TOML document.
pub fn load_settings_from_str(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// Renders the effective settings back to TOML.
pub fn to_toml_string(settings: &Settings) -> Result<String> {
    Ok(toml::to_string_pretty(settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{StrategyKind, VenueId};
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
        [app]
        environment = "test"
        log_level = "debug"

        [capital]
        initial_capital = "1000"
        venues = ["binance", "bybit"]

        [[capital.strategies]]
        id = "scalper"
        kind = "scalping"

        [[capital.strategies]]
        id = "swing"
    "#;

    #[test]
    fn minimal_document_fills_defaults() {
        let settings = load_settings_from_str(MINIMAL).unwrap();
        assert_eq!(settings.capital.initial_capital, dec!(1000));
        assert_eq!(settings.capital.reserve_ratio, dec!(0.2));
        assert_eq!(settings.capital.venues[1], VenueId::new("bybit"));
        assert_eq!(settings.capital.strategies[0].kind, StrategyKind::Scalping);
        assert_eq!(settings.capital.strategies[1].kind, StrategyKind::Session);
        assert_eq!(settings.caps.max_risk_pct, 3.0);
        assert_eq!(settings.governor.loss_cooldown_mins, 30);
        assert_eq!(settings.calendar.close_weekday, chrono::Weekday::Fri);
        assert_eq!(settings.performance.window, 200);
        assert!(settings.audit.journal_path.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let doc = format!(
            "{MINIMAL}\n[governor]\nmax_daily_loss_pct = 2.5\n\n[calendar]\nclose_weekday = \"Sat\"\nclose_hour = 0\nopen_weekday = \"Sun\"\nopen_hour = 22\n"
        );
        let settings = load_settings_from_str(&doc).unwrap();
        assert_eq!(settings.governor.max_daily_loss_pct, 2.5);
        assert_eq!(settings.governor.volatility_cooldown_mins, 15);
        assert_eq!(settings.calendar.close_weekday, chrono::Weekday::Sat);
        assert_eq!(settings.calendar.open_hour, 22);
    }

    #[test]
    fn invalid_documents_are_rejected() {
        let bad_reserve = MINIMAL.replace(
            "initial_capital = \"1000\"",
            "initial_capital = \"1000\"\nreserve_ratio = \"1.0\"",
        );
        assert!(matches!(
            load_settings_from_str(&bad_reserve),
            Err(Error::Invalid(_))
        ));

        let dup = format!("{MINIMAL}\n[[capital.strategies]]\nid = \"swing\"\n");
        assert!(load_settings_from_str(&dup).is_err());

        let bad_caps = format!(
            "{MINIMAL}\n[caps]\nmax_risk_pct = 0.0\nmax_leverage = 5.0\nmax_drawdown_pct = 15.0\ncapital_floor = \"0\"\n"
        );
        assert!(matches!(load_settings_from_str(&bad_caps), Err(Error::Risk(_))));
    }

    #[test]
    fn settings_render_back_to_toml() {
        let settings = load_settings_from_str(MINIMAL).unwrap();
        let rendered = to_toml_string(&settings).unwrap();
        assert!(rendered.contains("[capital]"));
        assert!(rendered.contains("max_risk_pct"));
    }
}
