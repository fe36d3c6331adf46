use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use outreach_tracker::config;
use outreach_tracker::health::HealthStatus;
use outreach_tracker::service::{OutreachService, QueryState};
use outreach_tracker::session::{self, SessionSources};

#[derive(Parser, Debug)]
#[command(about = "Print backend health, the resolved session mode and the caller's role.")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "outreach.yaml")]
    config: PathBuf,

    /// Admin secret to resolve the admin-token session
    #[arg(long)]
    admin_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    cfg.apply_env_overrides()?;

    let sources = SessionSources::connect(&cfg, args.admin_token.as_deref()).await?;
    let resolved = session::resolve(&sources);
    println!("Backend: {}", cfg.backend.base_url);
    println!("Sources: {:?}", sources);
    println!("Mode: {} (cache key: {})", resolved.mode, resolved.cache_key);

    let service = OutreachService::new(resolved, &cfg);
    let status = service.check_health().await;
    match &status {
        HealthStatus::Healthy => println!("Health: ok"),
        HealthStatus::Pending => println!("Health: no actor to probe with"),
        HealthStatus::Unavailable(msg) => println!("Health: unavailable ({})", msg),
        HealthStatus::Failed(msg) => println!("Health: failed ({})", msg),
    }
    if !status.is_healthy() {
        return Ok(());
    }

    match service.caller_role().await {
        QueryState::Ready(role) => println!("Role: {}", role.as_str()),
        other => println!("Role: {:?}", other),
    }
    match service.is_caller_admin().await {
        QueryState::Ready(admin) => println!("Admin: {}", admin),
        other => println!("Admin: {:?}", other),
    }
    Ok(())
}
