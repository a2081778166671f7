mod cli;
mod commands;
mod config;
mod observability;
mod output;
mod terminal;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use medconsole_client::{ClientConfig, ClientError, Console, FileStorage, Route, SessionStore};
use tracing::debug;

use cli::{Cli, Commands, DicomCommands, HospitalCommands};
use output::print_error;
use terminal::TerminalNavigator;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        if let Some(hint) = e
            .downcast_ref::<ClientError>()
            .and_then(|err| output::hint_for(err.category()))
        {
            eprintln!("  {hint}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);
    let profile = &cli.profile;

    if let Commands::Config(args) = &cli.command {
        return match &args.command {
            cli::ConfigCommands::Show => {
                let cfg = config::load_profile(profile)?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    cfg.format.as_deref().unwrap_or("table")
                );
                Ok(())
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(profile)?;
                config::set_key(&mut cfg, &set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
                Ok(())
            }
        };
    }

    let format = config::resolve_format(cli.format, &config::load_profile(profile)?);
    let server = config::resolve_server(&cli.server, profile)?;
    let start = match &cli.command {
        Commands::Login(_) => Route::Login,
        Commands::Register(_) => Route::Register,
        _ => Route::Hospitals,
    };
    let console = make_console(&server, profile, start)?;
    let navigator = console.api().navigator().clone();

    match &cli.command {
        Commands::Login(args) => commands::auth::login(&console, args, profile).await?,
        Commands::Register(args) => commands::auth::register(&console, args).await?,
        Commands::Logout => commands::auth::logout(&console, profile).await?,
        Commands::Whoami => commands::auth::whoami(&console, profile)?,
        Commands::Refresh => commands::auth::refresh(&console).await?,
        Commands::Hospital(args) => {
            commands::guard(console.session(), navigator.as_ref(), &Route::Hospitals)?;
            match &args.command {
                HospitalCommands::List(list) => {
                    commands::hospital::list(&console, list, format).await?
                }
                HospitalCommands::Create(form) => {
                    commands::hospital::create(&console, form, format).await?
                }
                HospitalCommands::Update(update) => {
                    commands::hospital::update(&console, update, format).await?
                }
                HospitalCommands::Delete(delete) => {
                    commands::hospital::delete(&console, delete).await?
                }
            }
        }
        Commands::Dicom(args) => {
            commands::guard(console.session(), navigator.as_ref(), &Route::Hospitals)?;
            match &args.command {
                DicomCommands::Show { id } => commands::dicom::show(&console, id, format).await?,
                DicomCommands::Upload { id, file } => {
                    commands::dicom::upload(&console, id, file, format).await?
                }
                DicomCommands::Export { id, output } => {
                    commands::dicom::export(&console, id, output.as_deref()).await?
                }
            }
        }
        Commands::Config(_) => {}
    }

    Ok(())
}

fn make_console(server: &str, profile: &str, start: Route) -> Result<Console> {
    let durable = Arc::new(FileStorage::durable(profile)?);
    let ephemeral = Arc::new(FileStorage::session_scoped(profile));
    debug!(
        durable = %durable.path().display(),
        ephemeral = %ephemeral.path().display(),
        "Opening session"
    );
    let session = Arc::new(SessionStore::open(durable, ephemeral));
    let navigator = Arc::new(TerminalNavigator::new(start));
    Ok(Console::new(ClientConfig::new(server), session, navigator)?)
}
