use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use trth::TICK_HISTORY_URL;

/// Running raw extractions (e.g. time and sales) against the Tick History REST API and saving
/// the result to a local file.
#[derive(Parser)]
#[command(version)]
pub(crate) struct Cli {
  #[command(flatten)]
  pub(crate) account: Account,
  /// Base URL of the REST API.
  #[clap(long, env = "TRTH_BASE_URL", default_value = TICK_HISTORY_URL)]
  pub(crate) base_url: String,
  #[command(subcommand)]
  pub(crate) command: Command,
}

#[derive(Args)]
pub(crate) struct Account {
  /// The username (user id) of your account.
  #[clap(long, short, env = "TRTH_USERNAME")]
  pub(crate) username: Option<String>,
  /// The password of your account.
  #[clap(long, short, env = "TRTH_PASSWORD", hide_env_values = true)]
  pub(crate) password: Option<String>,
  /// A JSON file holding `{"Credentials": {"Username": .., "Password": ..}}`. Takes precedence
  /// over `--username` and `--password`.
  #[clap(long, short)]
  pub(crate) credentials: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
  /// Request a token and show whether it is valid and when it expires.
  Token,
  /// Run a raw extraction and download its result.
  Extract {
    /// JSON file with the extraction request, sent to the server as is.
    #[clap(long, short)]
    request: PathBuf,
    /// File the result is written to. Unless `--auto-decompress` is given this is the gzip
    /// compressed CSV as delivered by the server.
    #[clap(long, short, default_value = "output.csv.gz")]
    output: PathBuf,
    /// Seconds to wait between two status checks.
    #[clap(long, default_value = "30")]
    poll_interval: u64,
    /// Seconds after which waiting for the extraction is given up.
    #[clap(long, default_value = "300")]
    timeout: u64,
    /// Decompress the result while downloading.
    #[clap(long)]
    auto_decompress: bool,
    /// Ask the server to deliver the result directly from object storage.
    #[clap(long)]
    direct_download: bool,
    /// Don't draw progress spinners, e.g. when running from a script.
    #[clap(long, short)]
    quiet: bool,
  },
}
