/*!
# Configuration Surface

CLI flags for both binaries, parsed with `clap`'s derive macros the way the
pack's other CLI-bearing crates do. The Pipeline binary only needs
[`ServerConfig`]'s common fields; the LF binary additionally reads
`pool_size`/`select_timeout_secs`.
*/

use clap::builder::TypedValueParser;
use clap::Parser;
use std::time::Duration;

/// Shared server configuration: listen port and accept backlog.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct ServerConfig {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 4050)]
    pub port: u16,

    /// Listen backlog passed to the socket's `listen` call.
    #[arg(long, default_value_t = 10)]
    pub backlog: u32,
}

/// Configuration specific to the Leader-Follower binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct LfServerConfig {
    #[command(flatten)]
    pub server: ServerConfig,

    /// Number of worker threads contending for the reactor leadership. Must
    /// be at least 2: with one worker there is no distinct follower to
    /// promote (I3 in SPEC_FULL.md §4.7), which deadlocks the pool the
    /// moment it blocks in `select`.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(2..).map(|v| v as usize))]
    pub pool_size: usize,

    /// Granularity, in seconds, of the reactor's `select` timeout. Bounds
    /// how long shutdown can take if the self-pipe write is ever missed.
    #[arg(long, default_value_t = 2)]
    pub select_timeout_secs: u64,
}

impl LfServerConfig {
    pub fn select_timeout(&self) -> Duration {
        Duration::from_secs(self.select_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn server_config_has_expected_defaults() {
        let config = ServerConfig::parse_from(["pipeline-server"]);
        assert_eq!(config.port, 4050);
        assert_eq!(config.backlog, 10);
    }

    #[test]
    fn lf_server_config_has_expected_defaults() {
        let config = LfServerConfig::parse_from(["lf-server"]);
        assert_eq!(config.server.port, 4050);
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.select_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn clap_definitions_are_internally_consistent() {
        ServerConfig::command().debug_assert();
        LfServerConfig::command().debug_assert();
    }

    #[test]
    fn pool_size_of_one_is_rejected() {
        let result = LfServerConfig::try_parse_from(["lf-server", "--pool-size", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn pool_size_of_two_is_accepted() {
        let config = LfServerConfig::parse_from(["lf-server", "--pool-size", "2"]);
        assert_eq!(config.pool_size, 2);
    }
}
