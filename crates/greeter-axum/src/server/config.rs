use anyhow::{Context, bail};
use clap::Parser;
use core::time::Duration;
use std::net::SocketAddr;

/// Runtime configuration for the `greeter-server` binary.
///
/// Values are parsed from CLI arguments or environment variables. The defaults
/// reproduce the fixed behavior of the service: listen on port 3000 and spend
/// one second on every name.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "greeter-server",
    version,
    about = "Compares sequential and worker-pool dispatch of simulated work"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:3000"))]
    pub server_addr: String,

    /// Simulated latency of one unit of work, in milliseconds.
    ///
    /// Environment variable: `WORK_DELAY_MS`
    #[arg(long, env = "WORK_DELAY_MS", default_value_t = 1_000)]
    pub work_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub work_delay: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.work_delay_ms == 0 {
            bail!("WORK_DELAY_MS must be greater than 0");
        }

        let server_addr = args
            .server_addr
            .parse()
            .with_context(|| format!("invalid SERVER_ADDR `{}`", args.server_addr))?;

        Ok(Self {
            server_addr,
            work_delay: Duration::from_millis(args.work_delay_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = std::iter::once("greeter-server").chain(args.iter().copied());
        let args = CliArgs::try_parse_from(argv)?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn explicit_flags() {
        let config = parse(&[
            "--server-addr",
            "127.0.0.1:8080",
            "--work-delay-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.work_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_zero_delay() {
        let err = parse(&["--work-delay-ms", "0"]).unwrap_err();
        assert!(err.to_string().contains("WORK_DELAY_MS"));
    }

    #[test]
    fn rejects_unparseable_address() {
        let err = parse(&["--server-addr", "localhost"]).unwrap_err();
        assert!(err.to_string().contains("invalid SERVER_ADDR"));
    }
}
