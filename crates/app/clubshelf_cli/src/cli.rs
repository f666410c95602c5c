use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clubshelf", version, about = "Subscription gating and member administration")]
pub struct Cli {
    /// YAML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// State file, overrides the configured one.
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Print a member's derived account view as JSON.
    Show {
        #[arg(long)]
        user: i64,
    },

    /// Decide whether a route may be rendered for a member.
    ///
    /// Without `--user` the visitor is treated as unauthenticated.
    Gate {
        #[arg(long)]
        user: Option<i64>,
        #[arg(long)]
        route: String,
    },

    /// Extend a member's subscription.
    Extend {
        #[arg(long)]
        actor: i64,
        #[arg(long)]
        user: i64,
        #[arg(long, allow_negative_numbers = true)]
        days: i64,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Toggle a member's auto-renew flag.
    ToggleAutorenew {
        #[arg(long)]
        actor: i64,
        #[arg(long)]
        user: i64,
    },

    /// Set a member's loyalty tier (none, silver, gold, platinum).
    SetTier {
        #[arg(long)]
        actor: i64,
        #[arg(long)]
        user: i64,
        #[arg(long)]
        tier: String,
    },

    /// Credit (positive) or debit (negative) a member's referral balance.
    AdjustBalance {
        #[arg(long)]
        actor: i64,
        #[arg(long)]
        user: i64,
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show the administrative audit log, newest first.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Print JSON instead of one line per entry.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_amounts_parse() {
        let cli = Cli::try_parse_from([
            "clubshelf",
            "adjust-balance",
            "--actor",
            "1",
            "--user",
            "2",
            "--amount",
            "-300",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::AdjustBalance { amount: -300, .. }));
    }
}
