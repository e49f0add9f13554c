use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Target};
use log::LevelFilter;
use marathon_console::app::ConsoleApp;
use marathon_console::domains::runners::{
    RunnerDetail, RunnersEvent, RunnersSnapshot,
};
use marathon_console::infra::config::ConsoleConfig;
use marathon_core::console_prelude::{
    RunnerFilters, RunnerId, RunnerStatus, UpdateRunnerRequest,
};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "marathon-console",
    about = "Admin console for marathon runner management"
)]
struct Cli {
    /// API base URL; overrides the config file and MARATHON_API_URL
    #[arg(long, global = true)]
    server_url: Option<String>,

    #[arg(long, env = "MARATHON_ADMIN_EMAIL", global = true)]
    email: Option<String>,

    #[arg(
        long,
        env = "MARATHON_ADMIN_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one page of runners
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, value_parser = parse_status)]
        status: Option<RunnerStatus>,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Follow live runner locations on the first page
    Watch,
    /// Change a runner's status
    SetStatus {
        id: String,
        #[arg(value_parser = parse_status)]
        status: RunnerStatus,
    },
    /// Show one runner in detail
    Show { id: String },
    /// Download the runners CSV export
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_status(raw: &str) -> Result<RunnerStatus, String> {
    raw.parse().map_err(|e| format!("{e}"))
}

fn init_logger() {
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("marathon_console", LevelFilter::Debug)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let cli = Cli::parse();

    let mut config = ConsoleConfig::load().context("loading configuration")?;
    if let Some(url) = cli.server_url {
        config.server_url = url;
        config.validate()?;
    }

    let app = ConsoleApp::new(config)?;
    let (Some(email), Some(password)) = (cli.email, cli.password) else {
        bail!(
            "credentials required: pass --email/--password or set MARATHON_ADMIN_EMAIL/MARATHON_ADMIN_PASSWORD"
        );
    };
    let user = app.auth().login(&email, &password).await?;
    log::info!("Signed in as {} ({})", user.name, user.email);

    match cli.command {
        Command::List {
            page,
            limit,
            status,
            category,
            search,
        } => {
            let filters = RunnerFilters {
                status,
                category,
                search,
            };
            list(&app, filters, page, limit).await
        }
        Command::Watch => watch(&app).await,
        Command::SetStatus { id, status } => {
            let id = RunnerId::parse(&id)?;
            let record = app
                .runner_service()
                .update_runner(&id, UpdateRunnerRequest::status(status))
                .await?;
            println!("{} is now {}", record.name, record.status.label());
            Ok(())
        }
        Command::Show { id } => {
            let id = RunnerId::parse(&id)?;
            let record = app.runner_service().fetch_runner(&id).await?;
            print_detail(&RunnerDetail::from_record(&record));
            Ok(())
        }
        Command::Export { out } => export(&app, out).await,
    }
}

async fn list(
    app: &ConsoleApp,
    filters: RunnerFilters,
    page: u32,
    limit: Option<u32>,
) -> Result<()> {
    let (handle, mut events, _controller) = app.start_runners();
    handle.set_filters(filters);
    if page > 1 || limit.is_some() {
        handle.fetch_page(page, limit);
    }

    loop {
        match next_event(&mut events).await? {
            RunnersEvent::PageLoaded { .. } => break,
            RunnersEvent::FetchFailed(error) => bail!(error),
            RunnersEvent::SessionExpired => bail!("session expired"),
            _ => {}
        }
    }

    print_page(&handle.snapshot());
    handle.shutdown();
    Ok(())
}

async fn watch(app: &ConsoleApp) -> Result<()> {
    let _feed = app.start_live_feed();
    let (handle, mut events, _controller) = app.start_runners();
    handle.mount();

    loop {
        let event = tokio::select! {
            event = next_event(&mut events) => event?,
            _ = tokio::signal::ctrl_c() => break,
        };

        match event {
            RunnersEvent::PageLoaded { .. } => print_page(&handle.snapshot()),
            RunnersEvent::RunnerMoved {
                runner_id,
                location,
                status,
            } => {
                let snapshot = handle.snapshot();
                let name = snapshot
                    .record(&runner_id)
                    .map_or(runner_id.as_str(), |r| r.name.as_str());
                match status {
                    Some(status) => println!(
                        "{name}: {} [{}]",
                        location.format_lat_lon(6),
                        status.label()
                    ),
                    None => println!("{name}: {}", location.format_lat_lon(6)),
                }
            }
            RunnersEvent::FetchFailed(error) => eprintln!("Fetch failed: {error}"),
            RunnersEvent::FeedClosed => {
                eprintln!("Live feed closed");
                break;
            }
            RunnersEvent::SessionExpired => bail!("session expired"),
            _ => {}
        }
    }

    handle.unmount();
    handle.shutdown();
    Ok(())
}

async fn export(app: &ConsoleApp, out: Option<PathBuf>) -> Result<()> {
    let (handle, mut events, _controller) = app.start_runners();
    handle.export(out);

    loop {
        match next_event(&mut events).await? {
            RunnersEvent::ExportReady(path) => {
                println!("Exported runners to {}", path.display());
                break;
            }
            RunnersEvent::ExportFailed(error) => bail!(error),
            RunnersEvent::SessionExpired => bail!("session expired"),
            _ => {}
        }
    }

    handle.shutdown();
    Ok(())
}

async fn next_event(
    events: &mut mpsc::UnboundedReceiver<RunnersEvent>,
) -> Result<RunnersEvent> {
    events
        .recv()
        .await
        .context("runners controller stopped unexpectedly")
}

fn print_page(snapshot: &RunnersSnapshot) {
    let p = snapshot.pagination;
    for record in &snapshot.records {
        println!(
            "{:<10} {:<28} {:<11} {}",
            record.runner_number.as_str(),
            record.name,
            record.status.label(),
            record
                .last_known_location
                .as_ref()
                .map(|point| point.format_lat_lon(6))
                .unwrap_or_default()
        );
    }
    match p.visible_range() {
        Some((first, last)) => println!(
            "Showing {first}-{last} of {} (page {}/{})",
            p.total, p.page, p.total_pages
        ),
        None => println!("No runners found"),
    }
}

fn print_detail(detail: &RunnerDetail) {
    println!("Name:                  {}", detail.name);
    println!("Runner Number:         {}", detail.runner_number);
    println!("Email:                 {}", detail.email);
    println!("Phone:                 {}", detail.phone);
    println!("Status:                {}", detail.status_label);
    println!("Registered Categories: {}", detail.categories);
    println!("Registered Date:       {}", detail.registered_on);
    match &detail.coordinates {
        Some(coordinates) => println!("Last Known Location:   {coordinates}"),
        None => println!("Last Known Location:   No location data available"),
    }
}
