use clap::Parser;

use crate::config::{AppConfig, Environment};

#[derive(Parser, Debug)]
#[command(name = "blog")]
#[command(about = "Blog server - HTML pages and a JSON API over one SQLite database")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Address to listen on, e.g. 127.0.0.1:8080")]
    pub addr: Option<String>,

    #[arg(long, help = "SQLite connection URL, e.g. sqlite://goblog.db")]
    pub database_url: Option<String>,

    #[arg(
        long,
        env = "APP_ENV",
        help = "Configuration preset: development, staging or production"
    )]
    pub config_env: Option<Environment>,
}

impl Cli {
    /// Preset, then environment variables, then command line flags.
    pub fn load_config(&self) -> AppConfig {
        let mut config = match self.config_env {
            Some(environment) => AppConfig::for_environment(environment).with_env_overrides(),
            None => AppConfig::from_env(),
        };

        if let Some(addr) = &self.addr {
            config.server.addr = addr.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }

        config
    }
}
