mod config;
mod interactive;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ChannelNotifier, OptionsController, OptionsDependencies, PersistedOptions, PhraseClient,
    ProjectsRefresh, RemoteClient, SaveOutcome,
};
use shared::domain::ProjectId;
use storage::{SettingsStore, SqliteSettingsStore};
use tokio::{io::BufReader, sync::mpsc};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "options", about = "Manage translation tool credentials and project settings")]
struct Cli {
    /// Optional TOML file with database and default settings.
    #[arg(long, default_value = "options.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current options state.
    Show,
    /// Validate and persist credentials, optionally selecting a project.
    Save {
        #[arg(long)]
        token: String,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },
    /// Re-fetch the project list with the saved credentials.
    Refresh,
    /// Select a cached project and resolve its default locale.
    Select { project_id: String },
    /// Turn clipboard integration on or off.
    Clipboard {
        #[arg(value_parser = interactive::parse_toggle, action = clap::ArgAction::Set)]
        state: bool,
    },
    /// Wipe all persisted settings.
    Reset,
    /// Read commands from stdin until EOF or `quit`.
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings(&cli.config)?;

    let sqlite = Arc::new(
        SqliteSettingsStore::new(&settings.database_url)
            .await
            .with_context(|| format!("failed to open settings database '{}'", settings.database_url))?,
    );
    sqlite.health_check().await?;
    info!(database_url = %settings.database_url, "settings store ready");

    let store: Arc<dyn SettingsStore> = sqlite.clone();
    let remote: Arc<dyn RemoteClient> = Arc::new(PhraseClient::new(
        &settings.api_base_url,
        PersistedOptions::new(store.clone()),
    )?);
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let dependencies =
        OptionsDependencies::new(store, remote, Arc::new(ChannelNotifier::new(notice_tx)));

    let mut controller =
        OptionsController::initialize(dependencies, settings.options_defaults()).await?;

    let outcome = match cli.command {
        Command::Interactive => {
            interactive::run(controller, notice_rx, BufReader::new(tokio::io::stdin())).await?;
            sqlite.close().await;
            return Ok(());
        }
        command => run_command(&mut controller, command).await,
    };

    while let Ok(notification) = notice_rx.try_recv() {
        interactive::print_notification(&notification);
    }
    println!("{}", serde_json::to_string_pretty(controller.state())?);
    sqlite.close().await;
    outcome
}

async fn run_command(controller: &mut OptionsController, command: Command) -> Result<()> {
    match command {
        Command::Show | Command::Interactive => {}
        Command::Save {
            token,
            domain,
            project,
        } => {
            controller.edit_token(token);
            if let Some(domain) = domain {
                controller.edit_domain(domain);
            }
            match controller.save().await? {
                SaveOutcome::Saved { rotated } => info!(rotated, "credentials saved"),
                SaveOutcome::Rejected {
                    domain_valid,
                    token_valid,
                } => bail!("credentials rejected (domain valid: {domain_valid}, token valid: {token_valid})"),
            }
            if let Some(project) = project {
                refresh(controller).await?;
                select(controller, ProjectId::from(project)).await?;
            }
        }
        Command::Refresh => refresh(controller).await?,
        Command::Select { project_id } => select(controller, ProjectId::from(project_id)).await?,
        Command::Clipboard { state } => controller.set_clipboard(state).await?,
        Command::Reset => controller.reset().await?,
    }
    Ok(())
}

async fn refresh(controller: &mut OptionsController) -> Result<()> {
    match controller.refresh_projects().await? {
        ProjectsRefresh::Applied { count } => {
            info!(count, "projects refreshed");
            Ok(())
        }
        ProjectsRefresh::Failed => bail!("project refresh failed"),
        ProjectsRefresh::Stale => bail!("project refresh was superseded"),
    }
}

async fn select(controller: &mut OptionsController, project_id: ProjectId) -> Result<()> {
    let Some(request) = controller.select_project(&project_id).await? else {
        bail!("unknown project '{project_id}'; run `refresh` first");
    };
    let resolution = controller.run_locale_request(request).await?;
    info!(?resolution, "project selected");
    Ok(())
}
