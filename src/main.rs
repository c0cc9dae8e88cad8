use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use mealbook::cli::{Cli, Command};
use mealbook::commands::{self, Session};
use mealbook::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    mealbook::logging::init(cli.global.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    let config = Config::resolve(&cli.global).context("resolve config")?;
    tracing::debug!(?config, "resolved config");
    let mut session = Session::open(config).context("open session")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Search(args) => {
            commands::search(&session, args, &mut out)
                .await
                .context("search")?;
        }
        Command::Browse(args) => {
            commands::browse(&session, args, &mut out)
                .await
                .context("browse")?;
        }
        Command::Show(args) => {
            commands::show(&session, args, &mut out)
                .await
                .context("show")?;
        }
        Command::Categories => {
            commands::categories(&session, &mut out)
                .await
                .context("categories")?;
        }
        Command::Select { command } => {
            commands::select(&mut session, command, &mut out)
                .await
                .context("select")?;
        }
        Command::ShoppingList(args) => {
            commands::shopping_list(&session, args, &mut out)
                .context("shopping list")?;
        }
    }

    Ok(())
}
