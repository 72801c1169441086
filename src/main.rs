mod cli;
mod logging;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::HumanBytes;
use trth::input::{credentials_from_file, credentials_from_parts, read_extraction_request};
use trth::{Credentials, Error, ExtractionService, FetchOptions, PollPolicy, RawExtractor};

use cli::{Account, Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
  dotenvy::dotenv().ok();
  logging::init_tracing();

  match run(Cli::parse()).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      eprintln!("{error}");
      ExitCode::FAILURE
    }
  }
}

async fn run(Cli { account, base_url, command }: Cli) -> Result<(), Error> {
  let credentials = credentials(account)?;

  match command {
    Command::Token => {
      let service = ExtractionService::new(&base_url, PollPolicy::default(), FetchOptions::default())?;
      let token = service.request_token(&credentials).await?;
      println!("{info}", info = service.validate_token(&token).await?);
      Ok(())
    }
    Command::Extract {
      request,
      output,
      poll_interval,
      timeout,
      auto_decompress,
      direct_download,
      quiet,
    } => {
      let request = read_extraction_request(&request)?;
      let poll_policy = PollPolicy {
        interval: Duration::from_secs(poll_interval),
        timeout: Duration::from_secs(timeout),
      };
      let fetch_options = FetchOptions { auto_decompress, direct_download };

      let mut service = ExtractionService::new(&base_url, poll_policy, fetch_options)?;
      if quiet {
        service = service.without_progress();
      }
      let report = service.extract(&credentials, &request, &output).await?;

      println!("Received JobId={job_id}", job_id = report.status.job_id);
      if !report.status.notes.is_empty() {
        println!("========================================");
        report.status.notes.iter().for_each(|note| println!("{note}"));
        println!("========================================");
      }
      println!(
        "Downloaded {size} to: `{path}`",
        size = HumanBytes(report.bytes_written),
        path = report.output.display()
      );
      Ok(())
    }
  }
}

fn credentials(Account { username, password, credentials }: Account) -> Result<Credentials, Error> {
  match credentials {
    Some(path) => credentials_from_file(&path),
    None => credentials_from_parts(username, password),
  }
}
