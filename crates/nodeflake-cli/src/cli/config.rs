use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use nodeflake::{ClockBackoff, SnowflakeId};

/// Runtime configuration for the `nodeflake` binary.
///
/// Every global option can also be set through the environment (or a `.env`
/// file in the working directory), which is how a node ID is usually pinned
/// per host.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodeflake",
    version,
    about = "Generate and decode time-ordered Snowflake IDs"
)]
pub struct CliArgs {
    /// Node ID embedded in every generated ID (0..=1023).
    ///
    /// Must be unique among all processes generating IDs concurrently.
    ///
    /// Environment variable: `NODE_ID`
    #[arg(
        long,
        env = "NODE_ID",
        default_value_t = 0,
        global = true,
        allow_negative_numbers = true
    )]
    pub node_id: i64,

    /// What to do when the wall clock moves backward.
    ///
    /// Environment variable: `CLOCK_BACKOFF`
    #[arg(long, env = "CLOCK_BACKOFF", value_enum, default_value_t = BackoffArg::Wait, global = true)]
    pub clock_backoff: BackoffArg,

    /// Time source used for the timestamp field.
    ///
    /// Environment variable: `CLOCK`
    #[arg(long, env = "CLOCK", value_enum, default_value_t = ClockArg::System, global = true)]
    pub clock: ClockArg,

    /// Layout of log lines written to stderr.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate new IDs, one per line.
    Generate {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// How each ID is printed.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Decimal)]
        format: OutputFormat,
    },
    /// Decode IDs into timestamp, node ID, and sequence.
    Parse {
        /// IDs to decode, in decimal.
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<i64>,

        /// Print one JSON object per ID.
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffArg {
    /// Block until the clock catches up.
    Wait,
    /// Exit with an error.
    Fail,
}

impl From<BackoffArg> for ClockBackoff {
    fn from(arg: BackoffArg) -> Self {
        match arg {
            BackoffArg::Wait => Self::Wait,
            BackoffArg::Fail => Self::Fail,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockArg {
    /// Wall clock; backward jumps are detected.
    System,
    /// Ticker anchored at startup; never moves backward.
    Monotonic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain decimal.
    Decimal,
    /// Zero-padded to 20 digits.
    Padded,
    /// JSON object with the decoded fields.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub node_id: i64,
    pub backoff: ClockBackoff,
    pub clock: ClockArg,
    pub log_format: LogFormat,
    pub command: Command,
}

impl TryFrom<CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let max_node_id = SnowflakeId::max_node_id();

        if u64::try_from(args.node_id).map_or(true, |id| id > max_node_id) {
            bail!(
                "NODE_ID ({}) is outside the Snowflake node ID space (0..={})",
                args.node_id,
                max_node_id
            );
        }

        if let Command::Generate { count: 0, .. } = args.command {
            bail!("--count must be greater than 0");
        }

        Ok(Self {
            node_id: args.node_id,
            backoff: args.clock_backoff.into(),
            clock: args.clock,
            log_format: args.log_format,
            command: args.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use clap::{CommandFactory, FromArgMatches};

    use super::*;

    fn config_from(argv: &[&str]) -> anyhow::Result<Config> {
        let args = CliArgs::try_parse_from(argv)?;
        Config::try_from(args)
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&["nodeflake", "generate"]).unwrap();
        assert_eq!(config.node_id, 0);
        assert_eq!(config.backoff, ClockBackoff::Wait);
        assert_eq!(config.clock, ClockArg::System);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(
            config.command,
            Command::Generate {
                count: 1,
                format: OutputFormat::Decimal
            }
        );
    }

    #[test]
    fn global_options_follow_subcommand() {
        let config = config_from(&[
            "nodeflake",
            "generate",
            "-n",
            "5",
            "--format",
            "json",
            "--node-id",
            "1023",
            "--clock-backoff",
            "fail",
            "--clock",
            "monotonic",
        ])
        .unwrap();

        assert_eq!(config.node_id, 1023);
        assert_eq!(config.backoff, ClockBackoff::Fail);
        assert_eq!(config.clock, ClockArg::Monotonic);
        assert_eq!(
            config.command,
            Command::Generate {
                count: 5,
                format: OutputFormat::Json
            }
        );
    }

    #[test]
    fn rejects_out_of_range_node_ids() {
        for node_id in ["-1", "1024"] {
            let err = config_from(&["nodeflake", "--node-id", node_id, "generate"]).unwrap_err();
            assert!(err.to_string().contains("NODE_ID"), "{err}");
        }
    }

    #[test]
    fn rejects_zero_count() {
        let err = config_from(&["nodeflake", "generate", "--count", "0"]).unwrap_err();
        assert!(err.to_string().contains("--count"));
    }

    #[test]
    fn global_options_declare_env_fallbacks() {
        let command = CliArgs::command();
        for (id, var) in [
            ("node_id", "NODE_ID"),
            ("clock_backoff", "CLOCK_BACKOFF"),
            ("clock", "CLOCK"),
            ("log_format", "LOG_FORMAT"),
        ] {
            let arg = command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .unwrap();
            assert_eq!(arg.get_env(), Some(OsStr::new(var)), "{id}");
        }
    }

    #[test]
    fn env_values_fill_unset_options() {
        // Rebind to variables no other test reads so parallel tests are unaffected.
        let vars = [
            ("node_id", "NODEFLAKE_TEST_ENV_NODE_ID", "512"),
            ("clock_backoff", "NODEFLAKE_TEST_ENV_CLOCK_BACKOFF", "fail"),
            ("clock", "NODEFLAKE_TEST_ENV_CLOCK", "monotonic"),
            ("log_format", "NODEFLAKE_TEST_ENV_LOG_FORMAT", "json"),
        ];

        let mut command = CliArgs::command();
        for (id, var, value) in vars {
            // SAFETY: each variable is unique to this test and no other thread
            // reads or writes it.
            unsafe { std::env::set_var(var, value) };
            command = command.mut_arg(id, |arg| arg.env(var));
        }

        let matches = command
            .clone()
            .try_get_matches_from(["nodeflake", "generate"])
            .unwrap();
        let config = Config::try_from(CliArgs::from_arg_matches(&matches).unwrap()).unwrap();
        assert_eq!(config.node_id, 512);
        assert_eq!(config.backoff, ClockBackoff::Fail);
        assert_eq!(config.clock, ClockArg::Monotonic);
        assert_eq!(config.log_format, LogFormat::Json);

        // Flags still win over the environment.
        let matches = command
            .try_get_matches_from(["nodeflake", "--node-id", "7", "generate"])
            .unwrap();
        let config = Config::try_from(CliArgs::from_arg_matches(&matches).unwrap()).unwrap();
        assert_eq!(config.node_id, 7);
        assert_eq!(config.clock, ClockArg::Monotonic);

        for (_, var, _) in vars {
            // SAFETY: as above.
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn parse_requires_ids() {
        assert!(config_from(&["nodeflake", "parse"]).is_err());

        let config = config_from(&["nodeflake", "parse", "42", "-7", "--json"]).unwrap();
        assert_eq!(
            config.command,
            Command::Parse {
                ids: vec![42, -7],
                json: true
            }
        );
    }
}
