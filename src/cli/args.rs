use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pomobot")]
#[command(about = "A multi-user focus session bot with tasks, pomodoro timers and stats")]
#[command(long_about = "pomobot - focus sessions for many users at once

Runs the chat flow over a line-oriented console gateway. Each input line is
one message from one user:

  <user_id> <text>

Replies are printed as `[user_id] text`, with the reply keyboard, if any,
on the indented lines that follow.

QUICK START:
  echo '1 /start' | pomobot
  pomobot --data-dir /tmp/pomobot --log-level debug

State lives in ~/.pomobot/ unless --data-dir says otherwise.")]
#[command(version)]
pub struct Cli {
    /// Path to the YAML configuration file
    ///
    /// Defaults to `config.yaml` inside the data directory.
    #[arg(short, long, env = "POMOBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the configuration and the database
    #[arg(short, long, env = "POMOBOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset (overrides the config file)
    #[arg(short, long)]
    pub log_level: Option<String>,
}
