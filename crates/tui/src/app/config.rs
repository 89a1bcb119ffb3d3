use crate::{
    error::ConfigError,
    types::{ChainType, EndpointUrl},
};
use serde::{Deserialize, Serialize};
use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::{Path, PathBuf},
    str::FromStr as _,
    time::Duration,
};
use xray_core::{EngineConfig, ResolverConfig};

const DEFAULT_CONFIG_FILE: &str = "xray.toml";
const DEFAULT_ENDPOINT: &str = "https://rpc.cosmos.directory/cosmoshub";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrayConfig {
    #[serde(default = "default_redraw_interval")]
    pub redraw_interval_ms: u64,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_pending_limit")]
    pub pending_limit: usize,
    #[serde(default = "default_resolve_attempts")]
    pub resolve_attempts: u32,
    #[serde(default)]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_stream_capacity")]
    pub stream_capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_type: ChainType,
    pub rpc_endpoint: String,
    #[serde(default = "default_polling_rate")]
    pub polling_rate_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ChainConfig {
    pub fn new(chain_type: ChainType, rpc_endpoint: impl Into<String>) -> Self {
        Self {
            chain_type,
            rpc_endpoint: rpc_endpoint.into(),
            polling_rate_ms: default_polling_rate(),
            alias: None,
        }
    }

    /// Parses a `<chain_type>=<url>` command line argument
    pub fn from_arg(arg: &str) -> Result<Self, ConfigError> {
        let (chain_type, url) = arg
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidEndpointArg(arg.to_owned()))?;
        let chain_type = ChainType::from_str(chain_type.trim())
            .map_err(|_| ConfigError::InvalidEndpointArg(arg.to_owned()))?;
        Ok(Self::new(chain_type, url.trim()))
    }

    pub fn endpoint(&self) -> Result<EndpointUrl, ConfigError> {
        EndpointUrl::new(&self.rpc_endpoint, self.chain_type).map_err(|reason| {
            ConfigError::InvalidEndpoint {
                url: self.rpc_endpoint.clone(),
                reason,
            }
        })
    }

    pub fn polling_rate(&self) -> Duration {
        Duration::from_millis(self.polling_rate_ms)
    }

    /// Alias if configured, otherwise the chain kind and endpoint
    pub fn display_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!(
                "{} - {}",
                self.chain_type.display_name(),
                self.rpc_endpoint
            ),
        }
    }
}

fn default_redraw_interval() -> u64 {
    100
}

fn default_call_timeout() -> u64 {
    10
}

fn default_history_limit() -> usize {
    50
}

fn default_pending_limit() -> usize {
    1000
}

fn default_resolve_attempts() -> u32 {
    5
}

fn default_max_batch_size() -> usize {
    100
}

fn default_stream_capacity() -> usize {
    8
}

fn default_polling_rate() -> u64 {
    300
}

impl Default for XrayConfig {
    fn default() -> Self {
        Self {
            redraw_interval_ms: default_redraw_interval(),
            call_timeout_secs: default_call_timeout(),
            history_limit: default_history_limit(),
            pending_limit: default_pending_limit(),
            resolve_attempts: default_resolve_attempts(),
            retry_backoff_ms: 0,
            max_batch_size: default_max_batch_size(),
            stream_capacity: default_stream_capacity(),
            log_file: None,
            chains: Vec::new(),
        }
    }
}

impl XrayConfig {
    /// Loads the configuration from `config_path`, then `./xray.toml`, then
    /// `<config dir>/xray/config.toml`, falling back to defaults when none
    /// of the implicit locations exist
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = match config_path {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
            None => {
                // Try current directory first
                let current_dir_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if current_dir_path.exists() {
                    current_dir_path
                } else if let Some(config_dir) = dirs::config_dir() {
                    config_dir.join("xray").join("config.toml")
                } else {
                    return Ok(Self::default());
                }
            }
        };

        if config_file.exists() {
            Self::from_file(&config_file)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Appends chains given as `<chain_type>=<url>` arguments
    pub fn add_endpoint_args(&mut self, args: &[String]) -> Result<(), ConfigError> {
        for arg in args {
            self.chains.push(ChainConfig::from_arg(arg)?);
        }
        Ok(())
    }

    /// Fills in the default chain when none is configured and checks every
    /// value the monitors depend on
    pub fn finalize(mut self) -> Result<Self, ConfigError> {
        if self.chains.is_empty() {
            self.chains
                .push(ChainConfig::new(ChainType::Cosmos, DEFAULT_ENDPOINT));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()?;
        self.stream_capacity()?;
        non_zero(self.redraw_interval_ms, "redraw_interval_ms")?;
        for chain in &self.chains {
            chain.endpoint()?;
            non_zero(chain.polling_rate_ms, "polling_rate_ms")?;
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        non_zero(self.call_timeout_secs, "call_timeout_secs")?;
        Ok(EngineConfig {
            pending_limit: self.pending_limit,
            history_limit: NonZeroUsize::new(self.history_limit).ok_or(ConfigError::Zero {
                field: "history_limit",
            })?,
            resolver: ResolverConfig {
                attempts: NonZeroU32::new(self.resolve_attempts).ok_or(ConfigError::Zero {
                    field: "resolve_attempts",
                })?,
                backoff: Duration::from_millis(self.retry_backoff_ms),
                max_batch_size: NonZeroUsize::new(self.max_batch_size).ok_or(
                    ConfigError::Zero {
                        field: "max_batch_size",
                    },
                )?,
                call_timeout: self.call_timeout(),
            },
        })
    }

    pub fn stream_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.stream_capacity).ok_or(ConfigError::Zero {
            field: "stream_capacity",
        })
    }
}

fn non_zero(value: u64, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    #[test]
    fn test_parse_full_config() {
        let config: XrayConfig = toml::from_str(
            r#"
            history_limit = 20
            retry_backoff_ms = 250
            log_file = "xray.log"

            [[chains]]
            chain_type = "eth"
            rpc_endpoint = "http://localhost:8545"
            polling_rate_ms = 1000
            alias = "Local Geth"

            [[chains]]
            chain_type = "eth_sub"
            rpc_endpoint = "ws://localhost:8546"
            "#,
        )
        .unwrap();

        assert_eq!(config.history_limit, 20);
        assert_eq!(config.resolve_attempts, 5);
        assert_eq!(config.log_file, Some(PathBuf::from("xray.log")));
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.chains[0].display_name(), "Local Geth");
        assert_eq!(config.chains[1].chain_type, ChainType::EthSub);
        assert_eq!(config.chains[1].polling_rate_ms, 300);

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.history_limit.get(), 20);
        assert_eq!(engine.resolver.backoff, Duration::from_millis(250));
        assert_eq!(engine.resolver.call_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_default_chain_is_cosmos_hub() {
        let config = XrayConfig::default().finalize().unwrap();
        assert_eq!(
            config.chains,
            vec![ChainConfig::new(ChainType::Cosmos, DEFAULT_ENDPOINT)]
        );
        assert_eq!(
            config.chains[0].display_name(),
            "Cosmos - https://rpc.cosmos.directory/cosmoshub"
        );
    }

    #[test]
    fn test_endpoint_args() {
        let mut config = XrayConfig::default();
        config
            .add_endpoint_args(&[
                "eth=http://localhost:8545".to_owned(),
                "cosmos = https://rpc.example.org".to_owned(),
            ])
            .unwrap();
        let config = config.finalize().unwrap();

        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.chains[1].rpc_endpoint, "https://rpc.example.org");
        assert!(ChainConfig::from_arg("http://localhost:8545").is_err());
        assert!(ChainConfig::from_arg("btc=http://localhost:8332").is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = XrayConfig {
            history_limit: 0,
            ..XrayConfig::default()
        };
        assert!(matches!(
            config.clone().finalize(),
            Err(ConfigError::Zero {
                field: "history_limit"
            })
        ));

        config.history_limit = 10;
        config
            .chains
            .push(ChainConfig::new(ChainType::EthSub, "http://localhost:8546"));
        assert!(matches!(
            config.finalize(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[chains]]\nchain_type = \"cosmos\"\nrpc_endpoint = \"http://localhost:26657\""
        )
        .unwrap();

        let config = XrayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.chains.len(), 1);
        assert_eq!(config.redraw_interval_ms, 100);

        let missing = XrayConfig::load(Some(Path::new("/nonexistent/xray.toml")));
        assert!(matches!(missing, Err(ConfigError::NotFound(_))));
    }
}
