use clap::Parser;
use eyre::{Result, WrapErr as _};
use std::path::PathBuf;
use xray_tui::{
    app::{config::XrayConfig, App},
    utils::{logging, terminal::TerminalSession},
};

#[derive(Parser, Debug)]
#[command(name = "xray")]
#[command(about = "Live view of blockchain mempools and where their transactions end up")]
struct Cli {
    #[arg(
        value_name = "ENDPOINTS",
        help = "Chains to watch as <cosmos|eth|eth_sub>=<url>"
    )]
    endpoints: Vec<String>,

    #[arg(
        short,
        long,
        help = "Configuration file path (defaults to ./xray.toml, then the user config dir)"
    )]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[arg(long, help = "Append logs to this file instead of discarding them")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = XrayConfig::load(cli.config.as_deref()).wrap_err("loading configuration")?;
    config
        .add_endpoint_args(&cli.endpoints)
        .wrap_err("parsing endpoint arguments")?;
    let config = config.finalize().wrap_err("validating configuration")?;

    let log_file = cli.log_file.as_deref().or(config.log_file.as_deref());
    logging::init(&cli.log_level, log_file)?;

    let mut app = App::new(&config)?;
    let app_result = match TerminalSession::enter() {
        Ok(mut terminal) => app.run(&mut terminal).await,
        Err(e) => Err(e.into()),
    };

    app.shutdown().await;

    app_result.map_err(Into::into)
}
