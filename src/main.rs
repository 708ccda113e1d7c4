use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use config::Config;
use dotenvy::dotenv;
use thiserror::Error;

use pushkind_audience::domain::audience::{
    AudienceRecord, ExportFormat, MessageKind, OutgoingMessage, Scope, SubscriptionStatus,
};
use pushkind_audience::domain::types::{
    AgentId, AudienceId, BrandId, Credential, TypeConstraintError,
};
use pushkind_audience::export::{ExportError, export_file_name, render_page_csv, write_export};
use pushkind_audience::forms::audience::{AddCustomerForm, ImportCustomersForm};
use pushkind_audience::gateway::AudienceGateway;
use pushkind_audience::gateway::http::HttpAudienceGateway;
use pushkind_audience::modal::ModalCoordinator;
use pushkind_audience::models::config::AudienceConfig;
use pushkind_audience::pagination::PageStrip;
use pushkind_audience::sync::{AudienceSynchronizer, Confirm, FetchTicket, ListState, SyncError};

#[derive(Parser)]
#[command(name = "pushkind-audience")]
#[command(about = "Manage the audience of a messaging brand")]
#[command(version)]
struct Cli {
    /// Brand to operate on (overrides config)
    #[arg(long, env = "APP_BRAND_ID")]
    brand: Option<String>,

    /// Agent to operate on (overrides config)
    #[arg(long, env = "APP_AGENT_ID")]
    agent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one page of customers with page stats
    #[command(visible_alias = "ls")]
    List {
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Match against name and phone
        #[arg(short, long)]
        search: Option<String>,

        /// subscribed, unsubscribed, or any backend status
        #[arg(long)]
        status: Option<String>,
    },

    /// Add a single customer
    Create {
        name: String,

        phone_number: String,

        /// Dialing code such as +1
        #[arg(short, long)]
        country_code: String,
    },

    /// Delete a customer
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Opt a customer out
    Unsubscribe {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Upload a CSV or Excel contacts file
    Import { file: PathBuf },

    /// Download the audience as a file
    Export {
        /// csv or xlsx
        #[arg(short, long, default_value = "csv", value_parser = parse_format)]
        format: ExportFormat,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Send a direct message to a customer
    Message { id: i64, text: String },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("invalid value: {0}")]
    Invalid(#[from] TypeConstraintError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("failed to load customers: {0}")]
    List(String),

    #[error("customer {0} not found")]
    NotFound(AudienceId),
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "csv" => Ok(ExportFormat::Csv),
        "xlsx" => Ok(ExportFormat::Xlsx),
        other => Err(format!("unsupported format '{other}', expected csv or xlsx")),
    }
}

/// Asks on the terminal; anything but `y`/`yes` declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(|_: &str| true)
    } else {
        Box::new(StdinConfirm)
    }
}

fn resolve_scope(cli: &Cli, config: &AudienceConfig) -> Result<Scope, CliError> {
    let brand = cli
        .brand
        .clone()
        .or_else(|| config.brand_id.clone())
        .ok_or(CliError::Missing("brand"))?;
    let agent = cli
        .agent
        .clone()
        .or_else(|| config.agent_id.clone())
        .ok_or(CliError::Missing("agent"))?;
    Ok(Scope::new(BrandId::new(brand)?, AgentId::new(agent)?))
}

/// Runs `ticket`, or a fresh fetch without one, and fails if the list errored.
async fn load<G>(
    sync: &mut AudienceSynchronizer,
    gateway: &G,
    ticket: Option<FetchTicket>,
) -> Result<(), CliError>
where
    G: AudienceGateway + ?Sized,
{
    match ticket {
        Some(ticket) => {
            sync.fetch(gateway, ticket).await;
        }
        None => {
            sync.refresh(gateway).await;
        }
    }
    ensure_loaded(sync)
}

fn ensure_loaded(sync: &AudienceSynchronizer) -> Result<(), CliError> {
    match sync.state() {
        ListState::Errored(message) => Err(CliError::List(message.clone())),
        _ => Ok(()),
    }
}

/// Finds `id` on the loaded page, falling back to a direct lookup.
async fn find_record<G>(
    sync: &AudienceSynchronizer,
    gateway: &G,
    id: AudienceId,
) -> Result<AudienceRecord, CliError>
where
    G: AudienceGateway + ?Sized,
{
    if let Some(record) = sync.records().iter().find(|r| r.id == id) {
        return Ok(record.clone());
    }
    gateway
        .get_user(sync.credential(), id)
        .await
        .map_err(|err| match err.status() {
            Some(404) => CliError::NotFound(id),
            _ => CliError::Sync(err.into()),
        })
}

fn print_page(sync: &AudienceSynchronizer) {
    for record in sync.records() {
        println!(
            "{:>6}  {:<24}  {}{:<14}  {:<12}  {}",
            record.id.get(),
            record.name,
            record.country_code,
            record.phone_number,
            record.status_label(),
            record.message_count()
        );
    }

    let stats = sync.stats();
    println!(
        "customers: {}  subscribed: {}  unsubscribed: {}  messages: {}",
        stats.total_customers,
        stats.subscribed_customers,
        stats.unsubscribed_customers,
        stats.total_messages
    );

    let pagination = sync.pagination();
    let strip = PageStrip::new(&pagination);
    if strip.visible {
        let pages: Vec<String> = strip
            .pages
            .iter()
            .map(|page| match page {
                Some(n) if *n == strip.page => format!("[{n}]"),
                Some(n) => n.to_string(),
                None => "...".to_string(),
            })
            .collect();
        println!("page {} of {}: {}", strip.page, pagination.total_pages, pages.join(" "));
    }
}

async fn run(cli: Cli, config: AudienceConfig) -> Result<(), CliError> {
    let scope = resolve_scope(&cli, &config)?;
    let credential = Credential::new(config.token.as_str())?;
    let gateway = HttpAudienceGateway::new(config.api_base_url.as_str(), config.request_timeout())
        .map_err(SyncError::from)?;
    let mut sync = AudienceSynchronizer::new(credential)
        .with_page_size(config.page_size)
        .with_fetch_timeout(config.request_timeout())
        .with_scope(scope.clone());

    match cli.command {
        Commands::List {
            page,
            search,
            status,
        } => {
            // Only the last issued ticket is current; earlier ones are superseded.
            let ticket = search.and_then(|search| sync.set_search(search));
            let ticket = match status {
                Some(status) => sync.set_status(SubscriptionStatus::parse_filter(&status)),
                None => ticket,
            };
            load(&mut sync, &gateway, ticket).await?;
            if page != 1 {
                match sync.set_page(page) {
                    Some(ticket) => {
                        sync.fetch(&gateway, ticket).await;
                        ensure_loaded(&sync)?;
                    }
                    None => log::warn!(
                        "Page {page} is out of range, showing page {}",
                        sync.pagination().page
                    ),
                }
            }
            print_page(&sync);
        }
        Commands::Create {
            name,
            phone_number,
            country_code,
        } => {
            let mut modals = ModalCoordinator::new();
            modals.open_create();
            let form = AddCustomerForm {
                name,
                phone_number,
                country_code,
            };
            let result = sync.create_user(&gateway, &form).await;
            modals.close_create();
            let record = result?;
            log::info!("Created customer {} ({})", record.name, record.id);
            print_page(&sync);
        }
        Commands::Delete { id, yes } => {
            load(&mut sync, &gateway, None).await?;
            let record = find_record(&sync, &gateway, AudienceId::new(id)?).await?;
            sync.delete_user(&gateway, &record, confirmer(yes).as_ref()).await?;
            log::info!("Deleted customer {}", record.name);
            print_page(&sync);
        }
        Commands::Unsubscribe { id, yes } => {
            load(&mut sync, &gateway, None).await?;
            let record = find_record(&sync, &gateway, AudienceId::new(id)?).await?;
            sync.unsubscribe_user(&gateway, &record, confirmer(yes).as_ref()).await?;
            log::info!("Unsubscribed customer {}", record.name);
            print_page(&sync);
        }
        Commands::Import { file } => {
            let mut modals = ModalCoordinator::new();
            modals.open_import();
            let form = ImportCustomersForm::from_path(&file)?;
            let result = sync.import_users(&gateway, form).await;
            modals.close_import();
            let summary = result?;
            log::info!("Imported {} customers", summary.imported);
            for error in &summary.errors {
                log::warn!("Import problem: {error}");
            }
            print_page(&sync);
        }
        Commands::Export { format, out_dir } => {
            load(&mut sync, &gateway, None).await?;
            let bytes = match sync.export_users(&gateway, format).await {
                Ok(bytes) => bytes,
                Err(err) if err.is_not_implemented() && format == ExportFormat::Csv => {
                    log::warn!("Backend export unavailable, writing the loaded page instead");
                    render_page_csv(sync.records())?
                }
                Err(err) => return Err(err.into()),
            };
            let file_name = export_file_name(&scope, format, Utc::now().date_naive());
            let path = write_export(&out_dir, &file_name, &bytes)?;
            println!("{}", path.display());
        }
        Commands::Message { id, text } => {
            load(&mut sync, &gateway, None).await?;
            let record = find_record(&sync, &gateway, AudienceId::new(id)?).await?;
            let mut modals = ModalCoordinator::new();
            modals.open_message(record);
            let message = OutgoingMessage {
                recipient_id: AudienceId::new(id)?,
                message: text,
                kind: MessageKind::Text,
            };
            let result = sync.send_message(&gateway, &message).await;
            if let Some(record) = modals.selected() {
                match &result {
                    Ok(_) => log::info!("Message sent to {}", record.name),
                    Err(err) if err.is_not_implemented() => {
                        log::warn!("Messaging is not available yet")
                    }
                    Err(_) => {}
                }
            }
            modals.close_message();
            result?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let audience_config = match settings.try_deserialize::<AudienceConfig>() {
        Ok(audience_config) => audience_config,
        Err(err) => {
            log::error!("Error loading audience config: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, audience_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Sync(SyncError::Cancelled)) => {
            log::info!("Cancelled");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
