//! Wallet settings

use std::path::PathBuf;
use std::str::FromStr;

use config::{Config, ConfigError, Environment, File};
use ecash::nuts::CurrencyUnit;
use ecash::MintUrl;
use serde::{Deserialize, Serialize};

const DEFAULT_MINT_URL: &str = "http://localhost:3338";
const ENV_PREFIX: &str = "ECASH_WALLET";

/// Wallet settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSettings {
    /// Mint url
    pub mint_url: MintUrl,
    /// Highest denomination order, used until the mint's keyset is known
    pub max_order: u8,
    /// Unit
    pub unit: CurrencyUnit,
    /// Verify DLEQ proofs returned by the mint
    pub verify_dleq: bool,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            mint_url: MintUrl::from_str(DEFAULT_MINT_URL)
                .unwrap_or_else(|_| unreachable!("default mint url is valid")),
            max_order: 64,
            unit: CurrencyUnit::Sat,
            verify_dleq: true,
        }
    }
}

impl WalletSettings {
    /// Load settings from defaults, a toml file and `ECASH_WALLET_*` environment variables
    ///
    /// Without a path `~/.ecash-wallet/config.toml` is read when it exists. Falls back to the
    /// defaults on any error.
    pub fn new<P>(config_file_name: Option<P>) -> Self
    where
        P: Into<PathBuf>,
    {
        let default_settings = Self::default();

        match Self::new_from_default(&default_settings, config_file_name) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(
                    "Error reading config file, falling back to defaults. Error: {e:?}"
                );
                default_settings
            }
        }
    }

    fn new_from_default<P>(
        default: &WalletSettings,
        config_file_name: Option<P>,
    ) -> Result<Self, ConfigError>
    where
        P: Into<PathBuf>,
    {
        let file = match config_file_name {
            Some(path) => File::from(path.into()).required(true),
            None => {
                let default_config_file_name = home::home_dir()
                    .ok_or(ConfigError::NotFound("Config Path".to_string()))?
                    .join(".ecash-wallet")
                    .join("config.toml");

                File::from(default_config_file_name).required(false)
            }
        };

        let config: Config = Config::builder()
            // use defaults
            .add_source(Config::try_from(default)?)
            // override with file contents
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let settings: WalletSettings = config.try_deserialize()?;

        tracing::debug!("Wallet settings loaded for {}", settings.mint_url);

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("{}.toml", uuid::Uuid::new_v4()));

        assert_eq!(WalletSettings::new(Some(path)), WalletSettings::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "mint_url = \"https://Mint.Example.com/\"").unwrap();
        writeln!(file, "max_order = 32").unwrap();
        writeln!(file, "verify_dleq = false").unwrap();
        drop(file);

        let settings = WalletSettings::new(Some(path.clone()));
        std::fs::remove_file(path).unwrap();

        assert_eq!(settings.mint_url.to_string(), "https://mint.example.com");
        assert_eq!(settings.max_order, 32);
        assert!(!settings.verify_dleq);
        assert_eq!(settings.unit, CurrencyUnit::Sat);
    }
}
