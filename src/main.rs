// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Keyveve: document organizer for an accounting-firm client portal

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use keyveve::api::ApiClient;
use keyveve::classifier::{classify_fields, ClassificationStrategy, Classifier, FolderGroup};
use keyveve::config::AppConfig;
use keyveve::journal::{Drift, Journal, Mutation};
use keyveve::models::{DocCategory, DocumentStatus, ProjectFilter, RenameAction, StorageLocation, UploadRequest};
use keyveve::poller::spawn_poller;
use keyveve::simulator::{AnalysisEvent, AnalysisSimulator};
use keyveve::store::DocumentStore;
use keyveve::taxonomy::{get_folders, ServiceCategory};
use keyveve::Result;

/// Keyveve CLI - accounting portal document organizer
#[derive(Parser, Debug)]
#[command(name = "keyveve")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "0.1.0")]
#[command(about = "Organize and classify accounting portal documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Portal API base URL (overrides config and KEYVEVE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the folder taxonomy for a service line
    Folders {
        /// Service label, e.g. "Tax Return - Individual"
        service: String,
    },

    /// Classify a single document without contacting the server
    Classify {
        /// Service label of the project
        #[arg(short, long)]
        service: String,

        /// Declared document type
        #[arg(short, long, default_value = "")]
        doc_type: String,

        /// Original file name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Use keyword scoring instead of first match
        #[arg(long)]
        scored: bool,
    },

    /// Run the staged analysis and organize a project's documents
    Analyze {
        project_id: String,

        /// Service label (default: the project's own service type)
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Document operations
    Documents {
        #[command(subcommand)]
        action: DocumentCommands,
    },

    /// Project operations
    Projects {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Notification operations
    Notifications {
        #[command(subcommand)]
        action: NotificationCommands,
    },

    /// Poll a project and notifications until interrupted
    Watch {
        project_id: String,

        /// Poll interval in seconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Local mutation journal
    Journal {
        #[command(subcommand)]
        action: JournalCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DocumentCommands {
    /// List a project's documents grouped into folders
    List {
        project_id: String,

        #[arg(short, long)]
        service: Option<String>,
    },

    /// Set a document's review status
    Status {
        project_id: String,
        doc_id: String,
        /// awaiting_review, reviewed, signed or filed
        status: DocumentStatus,
    },

    /// Accept or dismiss a suggested rename
    Rename {
        project_id: String,
        doc_id: String,
        /// accept or dismiss
        action: RenameAction,
    },

    /// Upload a file into a project
    Upload {
        project_id: String,
        path: PathBuf,

        #[arg(long, default_value = "keyveve")]
        storage: StorageLocation,

        #[arg(long, default_value = "client")]
        category: DocCategory,

        /// Let the server extract text in the background
        #[arg(long)]
        process_async: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommands {
    /// List projects
    List {
        #[arg(short, long, default_value = "50")]
        limit: u32,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        service_type: Option<String>,

        #[arg(long)]
        staff_id: Option<String>,
    },

    /// Show one project
    Show { project_id: String },

    /// Change a project's status
    Status {
        project_id: String,
        new_status: String,
    },
}

#[derive(Subcommand, Debug)]
enum NotificationCommands {
    /// List notifications
    List {
        #[arg(long)]
        unread_only: bool,

        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Mark a notification read
    Read { notification_id: String },
}

#[derive(Subcommand, Debug)]
enum JournalCommands {
    /// List recent journal entries
    List {
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Only entries for this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Compare a project's documents on the portal with the journal
    Audit { project_id: String },

    /// Clear the journal
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
        config.validate()?;
    }

    let json = cli.format == "json";

    match cli.command {
        Commands::Folders { service } => run_folders(&service, json),
        Commands::Classify { service, doc_type, name, scored } => {
            run_classify(&service, &doc_type, &name, scored, json)
        }
        Commands::Analyze { project_id, service } => {
            run_analyze(config, project_id, service, json).await
        }
        Commands::Documents { action } => run_documents(config, action, json).await,
        Commands::Projects { action } => run_projects(config, action, json).await,
        Commands::Notifications { action } => run_notifications(config, action, json).await,
        Commands::Watch { project_id, interval } => run_watch(config, project_id, interval).await,
        Commands::Journal { action } => run_journal(config, action, json).await,
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

fn run_folders(service: &str, json: bool) -> Result<()> {
    let folders = get_folders(service);
    if json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
    } else {
        println!("{} folders:", ServiceCategory::from_service(service));
        for folder in folders {
            println!("  {}", folder.name);
        }
    }
    Ok(())
}

fn run_classify(service: &str, doc_type: &str, name: &str, scored: bool, json: bool) -> Result<()> {
    let strategy = if scored {
        ClassificationStrategy::Scored
    } else {
        ClassificationStrategy::FirstMatch
    };
    let folder = classify_fields(doc_type, name, ServiceCategory::from_service(service), strategy);

    if json {
        let output = serde_json::json!({
            "service": service,
            "doc_type": doc_type,
            "original_name": name,
            "folder": folder,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", folder);
    }
    Ok(())
}

/// Service label for a project: explicit flag, then the project, then config
async fn resolve_service(
    client: &ApiClient,
    config: &AppConfig,
    project_id: &str,
    explicit: Option<String>,
) -> Result<String> {
    if let Some(service) = explicit {
        return Ok(service);
    }
    let project = client.get_project(project_id).await?;
    if project.service_type.trim().is_empty() {
        Ok(config.analysis.default_service.clone())
    } else {
        Ok(project.service_type)
    }
}

fn print_groups(groups: &[FolderGroup], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(groups)?);
        return Ok(());
    }
    for group in groups {
        println!("{} ({})", group.folder.name, group.documents.len());
        for doc in &group.documents {
            let suggestion = doc.ai_suggested_name
                .as_deref()
                .map(|s| format!(" -> suggested: {}", s))
                .unwrap_or_default();
            println!("  [{}] {} ({}){}", doc.id, doc.display_name(), doc.status, suggestion);
        }
    }
    Ok(())
}

async fn run_analyze(
    config: AppConfig,
    project_id: String,
    service: Option<String>,
    json: bool,
) -> Result<()> {
    let client = Arc::new(ApiClient::new(&config.api)?);
    let service = resolve_service(&client, &config, &project_id, service).await?;
    let store = Arc::new(DocumentStore::new(Classifier::new(config.classifier.strategy)));

    let simulator = AnalysisSimulator::new(
        client,
        store,
        service.clone(),
        config.analysis.stage_offsets(),
    )?;

    let mut events = simulator.subscribe_events();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                AnalysisEvent::StageChanged(stage) => eprintln!("  {}", stage),
                AnalysisEvent::Completed { documents, .. } => {
                    eprintln!("Organized {} documents", documents);
                    break;
                }
                AnalysisEvent::Failed(message) => {
                    eprintln!("{}", message);
                    break;
                }
            }
        }
    });

    info!("Analyzing project {} as {}", project_id, service);
    let outcome = simulator.run(&project_id).await;
    let _ = reporter.await;

    let outcome = outcome?;
    print_groups(&outcome.groups, json)
}

async fn run_documents(config: AppConfig, action: DocumentCommands, json: bool) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    let store = DocumentStore::new(Classifier::new(config.classifier.strategy));
    let journal = Journal::new(&config.journal.path);

    match action {
        DocumentCommands::List { project_id, service } => {
            let service = resolve_service(&client, &config, &project_id, service).await?;
            store.replace_all(client.list_documents(&project_id).await?);
            print_groups(&store.grouped(&service), json)?;
        }
        DocumentCommands::Status { project_id, doc_id, status } => {
            store.replace_all(client.list_documents(&project_id).await?);
            store.set_status(&client, &doc_id, status).await?;
            journal.record(&project_id, &doc_id, Mutation::Status { status })?;
            println!("Document {} is now {}", doc_id, status);
        }
        DocumentCommands::Rename { project_id, doc_id, action } => {
            store.replace_all(client.list_documents(&project_id).await?);
            store.resolve_rename(&client, &doc_id, action).await?;
            let name = store.get(&doc_id).and_then(|d| d.final_name);
            journal.record(&project_id, &doc_id, Mutation::Rename { action, name: name.clone() })?;
            match name {
                Some(name) if action == RenameAction::Accept => println!("Renamed {} to {}", doc_id, name),
                _ => println!("Dismissed suggested name for {}", doc_id),
            }
        }
        DocumentCommands::Upload { project_id, path, storage, category, process_async } => {
            let upload = UploadRequest {
                project_id,
                path,
                process_async,
                storage_location: storage,
                doc_category: category,
            };
            let response = client.upload_document(&upload).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("Uploaded {}", upload.path.display());
            }
        }
    }

    Ok(())
}

async fn run_projects(config: AppConfig, action: ProjectCommands, json: bool) -> Result<()> {
    let client = ApiClient::new(&config.api)?;

    match action {
        ProjectCommands::List { limit, status, service_type, staff_id } => {
            let filter = ProjectFilter { limit: Some(limit), status, service_type, staff_id };
            let projects = client.list_projects(&filter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else {
                for p in projects {
                    println!("  {}: {} - {} [{}] {}", p.id, p.client_name, p.service_type, p.status, p.due_date.unwrap_or_default());
                }
            }
        }
        ProjectCommands::Show { project_id } => {
            let project = client.get_project(&project_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                println!("{} ({})", project.name, project.id);
                println!("  Client: {}", project.client_name);
                println!("  Service: {}", project.service_type);
                println!("  Status: {}", project.status);
                let staff: Vec<_> = project.assigned_staff.iter().map(|s| s.name.as_str()).collect();
                println!("  Staff: {}", staff.join(", "));
                println!("  Documents: {}", project.documents.len());
            }
        }
        ProjectCommands::Status { project_id, new_status } => {
            client.update_project_status(&project_id, &new_status).await?;
            println!("Project {} is now {}", project_id, new_status);
        }
    }

    Ok(())
}

async fn run_notifications(config: AppConfig, action: NotificationCommands, json: bool) -> Result<()> {
    let client = ApiClient::new(&config.api)?;

    match action {
        NotificationCommands::List { unread_only, limit } => {
            let limit = limit.unwrap_or(config.polling.notification_limit);
            let notifications = client.list_notifications(unread_only, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&notifications)?);
            } else {
                for n in notifications {
                    let marker = if n.read { " " } else { "*" };
                    println!("{} {}: {}", marker, n.id, n.message);
                }
            }
        }
        NotificationCommands::Read { notification_id } => {
            client.mark_notification_read(&notification_id).await?;
            println!("Marked {} read", notification_id);
        }
    }

    Ok(())
}

/// Poll a project's documents and the notification feed until Ctrl+C
async fn run_watch(config: AppConfig, project_id: String, interval: Option<u64>) -> Result<()> {
    let period = interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.polling.interval());
    let client = Arc::new(ApiClient::new(&config.api)?);
    let store = Arc::new(DocumentStore::new(Classifier::new(config.classifier.strategy)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let documents = {
        let client = client.clone();
        let store = store.clone();
        let project_id = project_id.clone();
        spawn_poller("documents", period, shutdown_rx.clone(), move || {
            let client = client.clone();
            let store = store.clone();
            let project_id = project_id.clone();
            async move {
                let docs = client.list_documents(&project_id).await?;
                store.replace_all(docs);
                Ok(())
            }
        })?
    };

    let limit = config.polling.notification_limit;
    let notifications = {
        let client = client.clone();
        spawn_poller("notifications", period, shutdown_rx, move || {
            let client = client.clone();
            async move {
                let unread = client.list_notifications(true, limit).await?;
                if !unread.is_empty() {
                    info!("{} unread notifications", unread.len());
                }
                Ok(())
            }
        })?
    };

    let mut changes = store.subscribe();
    let reporter = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let count = changes.borrow_and_update().len();
            info!("Project documents refreshed: {}", count);
        }
    });

    info!("Watching project {} every {:?}. Press Ctrl+C to stop.", project_id, period);
    wait_for_shutdown().await;
    let _ = shutdown_tx.send(true);

    let _ = documents.await;
    let _ = notifications.await;
    drop(store);
    reporter.abort();

    info!("Keyveve stopped.");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

async fn run_journal(config: AppConfig, action: JournalCommands, json: bool) -> Result<()> {
    let journal = Journal::new(&config.journal.path);

    match action {
        JournalCommands::List { count, project } => {
            let entries = journal.recent(count, project.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            println!("Recent changes ({} entries):", entries.len());
            for entry in entries {
                let change = match entry.mutation {
                    Mutation::Status { status } => format!("status -> {}", status),
                    Mutation::Rename { action: RenameAction::Accept, name } => {
                        format!("renamed -> {}", name.unwrap_or_default())
                    }
                    Mutation::Rename { action: RenameAction::Dismiss, .. } => "rename dismissed".to_string(),
                };
                println!("  {} project {} document {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.project_id,
                    entry.document_id,
                    change
                );
            }
        }
        JournalCommands::Audit { project_id } => {
            let client = ApiClient::new(&config.api)?;
            let documents = client.list_documents(&project_id).await?;
            let drift = journal.audit(&project_id, &documents)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&drift)?);
            } else if drift.is_empty() {
                println!("Project {} matches the journal", project_id);
            } else {
                for d in &drift {
                    match d {
                        Drift::Missing { document_id } => {
                            println!("  {}: no longer on the portal", document_id)
                        }
                        Drift::Status { document_id, expected, actual } => {
                            println!("  {}: status is {}, expected {}", document_id, actual, expected)
                        }
                        Drift::Name { document_id, expected, actual } => {
                            println!("  {}: name is {}, expected {}",
                                document_id, actual.as_deref().unwrap_or("(none)"), expected)
                        }
                        Drift::SuggestionPending { document_id, suggestion } => {
                            println!("  {}: suggestion {} still pending", document_id, suggestion)
                        }
                    }
                }
                warn!("{} journaled changes are not reflected on the portal", drift.len());
            }
        }
        JournalCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing the journal");
                return Ok(());
            }
            journal.clear()?;
            println!("Journal cleared");
        }
    }

    Ok(())
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  API: {}", config.api.base_url);
            println!("  Poll interval: {}s", config.polling.interval_secs);
            println!("  Classifier: {:?}", config.classifier.strategy);
        }
    }

    Ok(())
}
