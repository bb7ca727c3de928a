use clap::{Args, Parser, Subcommand};
use sentinel_client::client::{ApiClient, DEFAULT_API_URL};
use sentinel_client::error::{ClientError, ClientResult};
use sentinel_client::token_store::TokenStore;
use sentinel_client::types::{DashboardStats, Event, ListQuery, Policy, PolicyPatch, Violation};
use sentinel_client::views::{
    DashboardPoller, DashboardSnapshot, DashboardView, EventView, Filter, PolicyView,
    ViolationView,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Terminal client for the sentinel AI governance API", long_about = None)]
#[command(version)]
struct Cli {
    /// API base URL
    #[arg(long, env = "SENTINEL_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Where the bearer token is kept between runs
    #[arg(long, env = "SENTINEL_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        username: String,
        #[arg(long, env = "SENTINEL_PASSWORD")]
        password: String,
    },
    Logout,
    Whoami,
    Health,
    Dashboard {
        /// Keep refreshing every 30 seconds until interrupted
        #[arg(long)]
        watch: bool,
    },
    Policies {
        #[command(subcommand)]
        action: PolicyCommand,
    },
    Events {
        #[command(subcommand)]
        action: EventCommand,
    },
    Violations {
        #[command(subcommand)]
        action: ViolationCommand,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Case-insensitive match on title/name, description and type
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    severity: Option<String>,
    /// Category for policies, type for events and violations
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    skip: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

impl ListArgs {
    fn query(&self) -> ListQuery {
        ListQuery {
            skip: self.skip,
            limit: self.limit,
            ..ListQuery::default()
        }
    }

    fn filter(&self) -> Filter {
        Filter {
            search: self.search.clone(),
            status: self.status.clone(),
            severity: self.severity.clone(),
            category: self.category.clone(),
        }
    }
}

#[derive(Subcommand)]
enum PolicyCommand {
    List(ListArgs),
    Show {
        id: i64,
    },
    /// Switch a policy between open and draft
    Toggle {
        id: i64,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        definition: Option<String>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "mode")]
        performance_mode: Option<String>,
    },
    Delete {
        id: i64,
    },
    Templates,
    /// Run the mock evaluator against a JSON sample
    Test {
        id: i64,
        #[arg(long, default_value = "{}")]
        sample: String,
    },
}

#[derive(Subcommand)]
enum EventCommand {
    List {
        #[command(flatten)]
        args: ListArgs,
        #[arg(long)]
        policy_id: Option<i64>,
    },
    Show {
        id: i64,
    },
    Violations {
        id: i64,
    },
    Ack {
        id: i64,
    },
    Resolve {
        id: i64,
    },
    Stats,
}

#[derive(Subcommand)]
enum ViolationCommand {
    List(ListArgs),
    Show { id: i64 },
    Ack { id: i64 },
    Resolve { id: i64 },
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let tokens = match &cli.token_file {
        Some(path) => TokenStore::file(path),
        None => match TokenStore::default_file() {
            Ok(store) => store,
            Err(e) => {
                error!(error = %e, "token store unavailable; using memory");
                TokenStore::memory()
            }
        },
    };
    let client = ApiClient::new(cli.api_url, tokens);

    match run(&client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(client: &ApiClient, command: Commands) -> ClientResult<()> {
    match command {
        Commands::Login { username, password } => {
            let token = client.login(&username, &password).await?;
            println!("logged in as {username} ({})", token.token_type);
        }
        Commands::Logout => {
            let msg = client.logout().await?;
            println!("{}", msg.message);
        }
        Commands::Whoami => print_json(&client.me().await?)?,
        Commands::Health => print_json(&client.health().await?)?,
        Commands::Dashboard { watch } => dashboard(client, watch).await?,
        Commands::Policies { action } => policies(client, action).await?,
        Commands::Events { action } => events(client, action).await?,
        Commands::Violations { action } => violations(client, action).await?,
    }
    Ok(())
}

async fn dashboard(client: &ApiClient, watch: bool) -> ClientResult<()> {
    if !watch {
        let mut view = DashboardView::new(client.clone());
        view.refresh().await?;
        print_dashboard(&view.snapshot);
        return Ok(());
    }

    let poller = DashboardPoller::start(client.clone());
    let mut snapshots = poller.snapshots();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_dashboard(&snapshot);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    poller.stop();
    Ok(())
}

async fn policies(client: &ApiClient, action: PolicyCommand) -> ClientResult<()> {
    let mut view = PolicyView::new(client.clone());
    match action {
        PolicyCommand::List(args) => {
            view.query = args.query();
            view.list.filter = args.filter();
            view.refresh().await?;
            for policy in view.list.visible() {
                print_policy_row(policy);
            }
        }
        PolicyCommand::Show { id } => print_json(&client.get_policy(id).await?)?,
        PolicyCommand::Toggle { id } => {
            let policy = view.toggle_status(id).await?;
            println!("policy {} is now {}", policy.id, policy.status);
        }
        PolicyCommand::Edit {
            id,
            name,
            definition,
            severity,
            status,
            performance_mode,
        } => {
            let patch = PolicyPatch {
                name,
                definition,
                severity,
                status,
                performance_mode,
                ..PolicyPatch::default()
            };
            print_json(&view.edit(id, &patch).await?)?;
        }
        PolicyCommand::Delete { id } => {
            let msg = view.delete(id).await?;
            println!("{}", msg.message);
        }
        PolicyCommand::Templates => {
            for template in client.list_templates().await? {
                println!(
                    "{:>4}  {:<36} {:<18} {}",
                    template.id,
                    template.name,
                    template.category,
                    template.tags.join(",")
                );
            }
        }
        PolicyCommand::Test { id, sample } => {
            let sample: serde_json::Value = serde_json::from_str(&sample)
                .map_err(|e| ClientError::Decode(format!("sample is not JSON: {e}")))?;
            print_json(&client.test_policy(id, &sample).await?)?;
        }
    }
    Ok(())
}

async fn events(client: &ApiClient, action: EventCommand) -> ClientResult<()> {
    let mut view = EventView::new(client.clone());
    match action {
        EventCommand::List { args, policy_id } => {
            view.query = ListQuery {
                policy_id,
                ..args.query()
            };
            view.list.filter = args.filter();
            view.refresh().await?;
            for event in view.list.visible() {
                print_event_row(event);
            }
        }
        EventCommand::Show { id } => print_json(&client.get_event(id).await?)?,
        EventCommand::Violations { id } => {
            for violation in client.event_violations(id).await? {
                print_violation_row(&violation);
            }
        }
        EventCommand::Ack { id } => {
            let me = client.me().await?;
            let event = view.acknowledge(id, me.id).await?;
            println!("event {} acknowledged by {}", event.id, me.username);
        }
        EventCommand::Resolve { id } => {
            let event = view.resolve(id).await?;
            println!("event {} is now {}", event.id, event.status);
        }
        EventCommand::Stats => print_json(&client.event_stats().await?)?,
    }
    Ok(())
}

async fn violations(client: &ApiClient, action: ViolationCommand) -> ClientResult<()> {
    let mut view = ViolationView::new(client.clone());
    match action {
        ViolationCommand::List(args) => {
            view.query = args.query();
            view.list.filter = args.filter();
            view.refresh().await?;
            for violation in view.list.visible() {
                print_violation_row(violation);
            }
        }
        ViolationCommand::Show { id } => print_json(&client.get_violation(id).await?)?,
        ViolationCommand::Ack { id } => {
            let me = client.me().await?;
            let violation = view.acknowledge(id, me.id).await?;
            println!("violation {} acknowledged by {}", violation.id, me.username);
        }
        ViolationCommand::Resolve { id } => {
            let violation = view.resolve(id).await?;
            println!("violation {} is now {}", violation.id, violation.status);
        }
        ViolationCommand::Stats => print_json(&client.violation_stats().await?)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> ClientResult<()> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| ClientError::Decode(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn print_policy_row(p: &Policy) {
    println!(
        "{:>4}  {:<40} {:<18} {:<12} {:<8} {}",
        p.id, p.name, p.category, p.status, p.severity, p.performance_mode
    );
}

fn print_event_row(e: &Event) {
    println!(
        "{:>4}  {:<14} {:<40} {:<13} {:<8} {}",
        e.id,
        e.event_id,
        e.title,
        e.status,
        e.severity,
        e.trigger_date.format("%Y-%m-%d %H:%M")
    );
}

fn print_violation_row(v: &Violation) {
    println!(
        "{:>4}  {:<40} {:<20} {:<14} {:<8} {:.2}",
        v.id, v.title, v.violation_type, v.status, v.severity, v.confidence_score
    );
}

fn print_dashboard(snapshot: &DashboardSnapshot) {
    let DashboardStats {
        total_policies,
        active_policies,
        total_events,
        open_violations,
        events_last_24h,
        critical_violations,
    } = &snapshot.stats;
    println!(
        "policies {active_policies}/{total_policies} active, events {total_events} \
         ({events_last_24h} in 24h), open violations {open_violations} \
         ({critical_violations} critical)"
    );
    for bucket in &snapshot.timeline {
        let b = &bucket.severity_breakdown;
        println!(
            "  {}  {:>4}  low {} medium {} high {} critical {}",
            bucket.date, bucket.total, b.low, b.medium, b.high, b.critical
        );
    }
    for item in &snapshot.activity {
        println!(
            "  [{}] #{} {} ({}, {})",
            item.kind, item.id, item.title, item.severity, item.status
        );
    }
    if let Some(err) = &snapshot.error {
        println!("  last refresh failed: {err}");
    }
}
