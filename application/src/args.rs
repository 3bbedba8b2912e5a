//! Command line [`Args`] of the listing site server.

use clap::Parser;

/// Server of the real estate agency site.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file, overridden by `CONF.`-prefixed
    /// environment variables.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// If the command line is malformed, or help or version is requested.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn reads_config_path() {
        let args = Args::try_parse_from(["application"]).unwrap();
        assert_eq!(args.config, "config.toml");

        let args = Args::try_parse_from(["application", "-c", "/etc/site.toml"])
            .unwrap();
        assert_eq!(args.config, "/etc/site.toml");
    }
}
