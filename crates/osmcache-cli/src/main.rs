//! osmcache - a console harness for the OSM client library.
//!
//! Authorises once (saving the session to the settings file), then walks
//! the user's groups, sections, terms, members and badges, and prints the
//! progress report of the first award-scheme badge of each section.

mod config;

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use osmcache_core::{ApiError, BadgeType, Manager, Section, Session, Term};

use config::Config;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=osmcache_core=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("osmcache starting");

    let mut config = Config::load()?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--logout" {
        config.forget_session();
        config.save()?;
        println!("Saved session removed.");
        return Ok(());
    }

    if !config.has_credentials() {
        bail!("No application credentials: set OSM_API_ID and OSM_TOKEN");
    }

    let manager = connect(&mut config).await?;
    if let Err(e) = walk(&manager).await {
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
            warn!("Saved session rejected");
            config.forget_session();
            config.save()?;
            bail!("The saved session has expired; run again to sign in");
        }
        return Err(e);
    }
    Ok(())
}

/// Build the manager, signing in when there is no saved session.
async fn connect(config: &mut Config) -> Result<Manager> {
    let mut session = Session::new(config.api_id.as_str(), config.token.as_str());
    if let Some(data) = config.session() {
        session = session.with_authorisation(data.user_id, data.secret);
    }
    let manager = Manager::with_config(
        session,
        config.connection_config(),
        config.cache_settings(),
    )?;
    if manager.is_authorised() {
        return Ok(manager);
    }

    let email = prompt_email(config.last_email.as_deref())?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    if !manager.authorise(&email, &password).await? {
        bail!("OSM did not accept those credentials");
    }

    if let Some(data) = manager.authorisation() {
        config.remember_session(&data);
    }
    config.last_email = Some(email);
    config.save()?;
    Ok(manager)
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let email = line.trim();
    match (email.is_empty(), last) {
        (false, _) => Ok(email.to_string()),
        (true, Some(last)) => Ok(last.to_string()),
        (true, None) => bail!("An email address is required"),
    }
}

async fn walk(manager: &Manager) -> Result<()> {
    let groups = manager.group()?.load_for_current_user().await?;
    if groups.is_empty() {
        println!("No groups visible to this user.");
    }

    for group in &groups {
        println!("{} ({})", group.name, group.id);
        for section in &group.sections {
            println!("  {} [{}]", section.name, section.section_type);

            let terms = manager.term()?.list_for_section(section).await?;
            for term in &terms {
                let marker = if terms.current().map(|c| c.id == term.id).unwrap_or(false) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "   {} {} ({} to {})",
                    marker, term.name, term.start_date, term.end_date
                );
            }

            match terms.current() {
                Some(term) => show_term(manager, section, term).await?,
                None => println!("    No current term."),
            }
        }
    }
    Ok(())
}

async fn show_term(manager: &Manager, section: &Section, term: &Term) -> Result<()> {
    let mut members = manager.member()?.list_for_section(section, term).await?;
    members.sort_by_key(|m| m.display_name());
    println!("    Members ({}):", members.len());
    for member in &members {
        let patrol = if member.patrol.is_empty() {
            String::new()
        } else {
            format!(" - {}", member.patrol)
        };
        println!("      {}{}", member.display_name(), patrol);
    }

    let badges = manager.badge()?;
    for badge_type in BadgeType::ALL {
        let list = badges.list_for_section(section, badge_type, term).await?;
        println!("    {} badges ({}):", badge_type, list.len());
        for badge in &list {
            println!("      {} ({} tasks)", badge.name, badge.tasks().len());
        }

        if badge_type != BadgeType::AwardScheme {
            continue;
        }
        let Some(first) = list.first() else {
            continue;
        };
        let report = badges.list_progress_for_badge(section, first, term).await?;
        println!("    Progress on {}:", report.badge.name);
        for progress in &report {
            let done = first
                .tasks()
                .iter()
                .filter(|t| progress.is_task_completed(&t.id))
                .count();
            let status = match (progress.when_awarded, progress.is_completed) {
                (Some(date), _) => format!("awarded {}", date),
                (None, true) => "completed".to_string(),
                (None, false) => format!("{}/{} tasks", done, first.tasks().len()),
            };
            println!("      {}: {}", progress.member.display_name(), status);
        }
    }
    Ok(())
}
