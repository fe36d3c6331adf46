use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use outreach_tracker::blob::ImageFile;
use outreach_tracker::config::{self, Config};
use outreach_tracker::errors::{self, Notice};
use outreach_tracker::form::EntryForm;
use outreach_tracker::health::{HealthStatus, RefreshTrigger};
use outreach_tracker::model::{
    CraftCategory, EventType, HookTemplate, Principal, ResponseStatus, TypeOfInterest, UserProfile,
    UserRole,
};
use outreach_tracker::render;
use outreach_tracker::service::{DashboardSnapshot, OutreachService, QueryState};
use outreach_tracker::session::{self, SessionSources};
use outreach_tracker::views;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "outreach.yaml")]
    config: PathBuf,

    /// Admin secret; outranks any configured identity
    #[arg(long)]
    admin_token: Option<String>,

    /// Launch link carrying a `caffeineAdminToken` parameter
    #[arg(long)]
    launch_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render every dashboard card
    Dashboard {
        /// Re-probe the backend before loading
        #[arg(long)]
        retry: bool,
    },
    Entries {
        #[command(subcommand)]
        action: EntriesCommand,
    },
    Notes {
        #[command(subcommand)]
        action: NotesCommand,
    },
    Hooks {
        #[command(subcommand)]
        action: HooksCommand,
    },
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    Role {
        #[command(subcommand)]
        action: RoleCommand,
    },
    /// Probe the backend
    Health {
        /// Ignore a cached probe result
        #[arg(long)]
        refresh: bool,
    },
    /// Print an example config file
    ExampleConfig,
}

#[derive(Debug, Subcommand)]
enum EntriesCommand {
    List,
    Show { id: u64 },
    Add(EntryArgs),
    Edit {
        id: u64,
        #[command(flatten)]
        fields: EntryArgs,
        /// Clear the entry's image
        #[arg(long, conflicts_with = "image")]
        remove_image: bool,
    },
    Delete { id: u64 },
}

#[derive(Debug, Subcommand)]
enum NotesCommand {
    Get { group_url: String },
    Set { group_url: String, notes: String },
    List,
}

#[derive(Debug, Subcommand)]
enum HooksCommand {
    Show,
    /// Replace one of the three hooks
    Save {
        /// 1-based hook number
        #[arg(long)]
        index: usize,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Print a hook's content for pasting
    Copy { index: usize },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    Show,
    Set { name: String },
}

#[derive(Debug, Subcommand)]
enum RoleCommand {
    Show,
    Assign { principal: String, role: UserRole },
    IsAdmin,
}

#[derive(Debug, Default, ClapArgs)]
struct EntryArgs {
    #[arg(long)]
    group_name: Option<String>,
    #[arg(long)]
    group_url: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    date_posted: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    reactions: Option<String>,
    #[arg(long)]
    comments: Option<String>,
    /// No Response | Question | Lead | Negative Feedback
    #[arg(long)]
    status: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    follow_up: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    interest: Option<String>,
    #[arg(long)]
    event_type: Option<String>,
    #[arg(long)]
    contact: Option<String>,
    /// Notes saved for the group URL
    #[arg(long)]
    notes: Option<String>,
    /// Image to attach
    #[arg(long)]
    image: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!(err = %format!("{:#}", err), "command failed");
        print_notice(&errors::notice_for(&err));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if let Command::ExampleConfig = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let mut cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    cfg.apply_env_overrides()?;
    let service = connect(&cfg, &args).await?;

    match args.command {
        Command::Dashboard { retry } => dashboard(&service, retry).await,
        Command::Entries { action } => entries(&service, action).await,
        Command::Notes { action } => notes(&service, action).await,
        Command::Hooks { action } => hooks(&service, action).await,
        Command::Profile { action } => profile(&service, action).await,
        Command::Role { action } => role(&service, action).await,
        Command::Health { refresh } => health(&service, refresh).await,
        Command::ExampleConfig => Ok(()),
    }
}

async fn connect(cfg: &Config, args: &Args) -> Result<OutreachService> {
    let admin_token = args
        .admin_token
        .clone()
        .or_else(|| args.launch_url.as_deref().and_then(session::admin_token_from_url));
    let sources = SessionSources::connect(cfg, admin_token.as_deref()).await?;
    let resolved = session::resolve(&sources);
    info!(mode = %resolved.mode, ready = resolved.ready_for_queries, "session resolved");
    if !resolved.ready_for_queries {
        warn!(?sources, "no actor available for the resolved session");
    }
    Ok(OutreachService::new(resolved, cfg))
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::Toast(msg) => eprintln!("error: {}", msg),
        Notice::RetryBanner(msg) => {
            eprintln!("!! {}", msg);
            eprintln!("!! Run `outreach-tracker dashboard --retry` to try again.");
        }
    }
}

fn print_health_banner(status: &HealthStatus) {
    match status {
        HealthStatus::Healthy => {}
        HealthStatus::Unavailable(_) => print_notice(&Notice::RetryBanner(
            errors::SERVICE_UNAVAILABLE_MESSAGE.to_string(),
        )),
        HealthStatus::Failed(msg) => print_notice(&Notice::Toast(msg.clone())),
        HealthStatus::Pending => eprintln!("Connecting to backend..."),
    }
}

/// Print a card, or the notice for a failed query. Disabled queries print nothing.
fn show<T>(state: &QueryState<T>, card: impl FnOnce(&T) -> String) {
    match state {
        QueryState::Ready(value) => println!("{}", card(value)),
        QueryState::Error(err) => print_notice(&errors::notice_for(err)),
        QueryState::Disabled(_) => {}
    }
}

async fn dashboard(service: &OutreachService, retry: bool) -> Result<()> {
    let snapshot: DashboardSnapshot = if retry {
        service.retry().await
    } else {
        service.load_dashboard().await
    };
    print_health_banner(&snapshot.health);

    let today = service.today();
    show(&snapshot.follow_ups, |e| render::follow_ups(e));
    show(&snapshot.entries, |e| render::winning_posts(&views::winning_posts(e)));
    show(&snapshot.entries, |e| {
        render::days_since_last_post(&views::days_since_last_post(e, today))
    });
    show(&snapshot.group_summary, |c| render::success_rate(&views::success_rate_bars(c)));
    show(&snapshot.inquiry_summary, |s| {
        render::event_type_ranking(&views::rank_event_types(s))
    });
    show(&snapshot.entries, |e| render::entries_table(e));
    Ok(())
}

async fn entries(service: &OutreachService, action: EntriesCommand) -> Result<()> {
    match action {
        EntriesCommand::List => {
            let list = service.list_entries().await.into_result()?;
            println!("{}", render::entries_table(&list));
        }
        EntriesCommand::Show { id } => {
            let entry = service.get_entry(id).await.into_result()?;
            let notes = match service.group_notes(&entry.group_url).await {
                QueryState::Ready(notes) => notes,
                _ => None,
            };
            println!("{}", render::entry_detail(&entry, notes.as_deref()));
        }
        EntriesCommand::Add(fields) => {
            let mut form = EntryForm::new(service.today());
            apply_entry_args(&mut form, fields, service).await?;
            submit(&form, service).await?;
        }
        EntriesCommand::Edit {
            id,
            fields,
            remove_image,
        } => {
            let entry = service.get_entry(id).await.into_result()?;
            let mut form = EntryForm::edit(&entry);
            form.set_group_url(&entry.group_url, service).await?;
            if remove_image {
                form.select_image(None)?;
            }
            apply_entry_args(&mut form, fields, service).await?;
            submit(&form, service).await?;
        }
        EntriesCommand::Delete { id } => {
            service.delete_entry(id).await?;
            println!("Entry deleted successfully");
        }
    }
    Ok(())
}

async fn apply_entry_args(form: &mut EntryForm, args: EntryArgs, service: &OutreachService) -> Result<()> {
    if let Some(v) = args.group_name {
        form.group_name = v;
    }
    if let Some(v) = args.group_url {
        form.set_group_url(&v, service).await?;
    }
    if let Some(v) = args.date_posted {
        form.date_posted = v;
    }
    if let Some(v) = args.content {
        form.post_content = v;
    }
    if let Some(v) = args.reactions {
        form.num_reactions = v;
    }
    if let Some(v) = args.comments {
        form.num_comments = v;
    }
    if let Some(v) = args.status {
        form.response_status =
            ResponseStatus::parse(&v).ok_or_else(|| anyhow!("unknown response status '{}'", v))?;
    }
    if let Some(v) = args.follow_up {
        form.follow_up_date = v;
    }
    if let Some(v) = args.category {
        form.craft_category = Some(choose(&CraftCategory::ALL, CraftCategory::label, &v)?);
    }
    if let Some(v) = args.interest {
        form.type_of_interest = Some(choose(&TypeOfInterest::ALL, TypeOfInterest::label, &v)?);
    }
    if let Some(v) = args.event_type {
        form.event_type = Some(choose(&EventType::ALL, EventType::label, &v)?);
    }
    if let Some(v) = args.contact {
        form.contact_info = v;
    }
    if let Some(v) = args.notes {
        form.group_notes = v;
    }
    if let Some(path) = args.image {
        let file = ImageFile::read(&path).await?;
        form.select_image(Some(file))?;
    }
    Ok(())
}

/// Match a display label or variant name, case-insensitively.
fn choose<T: Copy + std::fmt::Debug>(all: &[T], label: fn(&T) -> &'static str, text: &str) -> Result<T> {
    let needle = text.trim();
    all.iter()
        .copied()
        .find(|v| label(v).eq_ignore_ascii_case(needle) || format!("{:?}", v).eq_ignore_ascii_case(needle))
        .ok_or_else(|| {
            let options: Vec<&str> = all.iter().map(label).collect();
            anyhow!("unknown value '{}', expected one of: {}", text, options.join(", "))
        })
}

async fn submit(form: &EntryForm, service: &OutreachService) -> Result<()> {
    let outcome = form.submit(service).await?;
    if form.editing().is_some() {
        println!("Entry updated successfully");
    } else {
        println!("Entry created successfully");
    }
    println!("{}", render::entry_detail(&outcome.entry, None));
    if let Some(err) = outcome.notes_error {
        eprintln!("Entry saved, but group notes could not be saved.");
        print_notice(&errors::notice_for(&err));
    }
    Ok(())
}

async fn notes(service: &OutreachService, action: NotesCommand) -> Result<()> {
    match action {
        NotesCommand::Get { group_url } => {
            match service.group_notes(&group_url).await.into_result()? {
                Some(notes) => println!("{}", notes),
                None => println!("(no notes for {})", group_url.trim()),
            }
        }
        NotesCommand::Set { group_url, notes } => {
            if group_url.trim().is_empty() {
                bail!("group URL is required");
            }
            service.set_group_notes(group_url.trim(), notes.trim()).await?;
            println!("Notes saved");
        }
        NotesCommand::List => {
            for item in service.all_group_notes().await.into_result()? {
                println!("{}\n    {}", item.group_url, item.notes);
            }
        }
    }
    Ok(())
}

async fn hooks(service: &OutreachService, action: HooksCommand) -> Result<()> {
    match action {
        HooksCommand::Show => {
            let templates = service.hook_templates().await.into_result()?;
            println!("{}", render::hook_library(&templates));
        }
        HooksCommand::Save {
            index,
            title,
            content,
        } => {
            let mut templates = service.hook_templates().await.into_result()?;
            templates.set(hook_slot(index)?, HookTemplate { title, content })?;
            service.save_hook_templates(&templates).await?;
            println!("Hook templates saved successfully!");
        }
        HooksCommand::Copy { index } => {
            let templates = service.hook_templates().await.into_result()?;
            let content = templates.copyable_content(hook_slot(index)?)?;
            println!("{}", content);
        }
    }
    Ok(())
}

/// Hooks are numbered from 1 on the command line.
fn hook_slot(index: usize) -> Result<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| anyhow!("hook numbers start at 1"))
}

async fn profile(service: &OutreachService, action: ProfileCommand) -> Result<()> {
    match action {
        ProfileCommand::Show => match service.caller_profile().await.into_result()? {
            Some(p) => println!("{}", p.name),
            None => println!("(no profile saved)"),
        },
        ProfileCommand::Set { name } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("name is required");
            }
            service.save_caller_profile(&UserProfile { name }).await?;
            println!("Profile saved");
        }
    }
    Ok(())
}

async fn role(service: &OutreachService, action: RoleCommand) -> Result<()> {
    match action {
        RoleCommand::Show => {
            let role = service.caller_role().await.into_result()?;
            println!("{}", role.as_str());
        }
        RoleCommand::Assign { principal, role } => {
            service.assign_role(&Principal::new(principal), role).await?;
            println!("Role assigned");
        }
        RoleCommand::IsAdmin => {
            println!("{}", service.is_caller_admin().await.into_result()?);
        }
    }
    Ok(())
}

async fn health(service: &OutreachService, refresh: bool) -> Result<()> {
    let status = if refresh {
        service.refresh_health(RefreshTrigger::Manual).await
    } else {
        service.check_health().await
    };
    println!("mode: {}", service.session().mode);
    match &status {
        HealthStatus::Healthy => println!("backend: healthy"),
        other => {
            print_health_banner(other);
            bail!("backend health check did not pass");
        }
    }
    Ok(())
}
