use std::env;
use std::process::ExitCode;

use gift_sync::csv::write_gifts;
use gift_sync::view::load_gifts;
use gift_sync::{Address, Config, Direction, HttpLedger, LedgerQueryClient};
use tracing::error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: gift-sync <sent|received|balance> <address>";

enum Command {
    Gifts(Direction),
    Balance,
}

fn parse_args(args: &[String]) -> Result<(Command, Address), String> {
    let [command, address] = args else {
        return Err(USAGE.to_string());
    };
    let command = match command.as_str() {
        "sent" => Command::Gifts(Direction::Sent),
        "received" => Command::Gifts(Direction::Received),
        "balance" => Command::Balance,
        other => return Err(format!("unknown command '{other}'\n{USAGE}")),
    };
    let address = address.parse::<Address>().map_err(|e| e.to_string())?;
    Ok((command, address))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (command, account) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let reader = match HttpLedger::new(reqwest::Client::new(), &config.node_url) {
        Ok(reader) => reader,
        Err(e) => {
            error!(node_url = %config.node_url, "{e}");
            return ExitCode::FAILURE;
        }
    };
    let ledger = LedgerQueryClient::from_config(reader, &config);

    match command {
        Command::Gifts(direction) => {
            let gifts = load_gifts(&ledger, direction, &account).await;
            if let Err(e) = write_gifts(std::io::stdout().lock(), &gifts) {
                error!("failed to write gifts: {e}");
                return ExitCode::FAILURE;
            }
        }
        Command::Balance => {
            println!("{}", ledger.balance(&account).await);
        }
    }

    ExitCode::SUCCESS
}
