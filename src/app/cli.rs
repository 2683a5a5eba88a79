//! Command-line argument definitions (clap).

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "oob-gpu-exporter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Out-of-band GPU metrics exporter for Redfish BMCs", long_about = None)]
pub struct Args {
    // === Server ===
    /// Path to config.json (default: next to the executable)
    #[arg(short = 'c', long, help_heading = "Server")]
    pub config: Option<String>,

    /// Address to serve /metrics on, overriding exporter.listen_address
    #[arg(short = 'l', long, help_heading = "Server")]
    pub listen: Option<String>,

    // === Logging ===
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
    #[arg(long = "log-level", help_heading = "Logging")]
    pub log_level: Option<String>,

    // === Debug ===
    /// Scrape one BMC (host[:port]), print the metrics and exit
    #[arg(long, value_name = "TARGET", help_heading = "Debug")]
    pub check: Option<String>,

    /// Serve --check from a captured JSON fixture ({"<path>": <document>}) instead of the network
    #[arg(long, value_name = "PATH", requires = "check", help_heading = "Debug")]
    pub fixture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_with_fixture() {
        let args = Args::try_parse_from([
            "oob-gpu-exporter",
            "--check",
            "10.0.0.5",
            "--fixture",
            "dell.json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.check.as_deref(), Some("10.0.0.5"));
        assert_eq!(args.fixture.as_deref(), Some("dell.json"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }

    #[test]
    fn fixture_requires_check() {
        assert!(Args::try_parse_from(["oob-gpu-exporter", "--fixture", "dell.json"]).is_err());
    }
}
