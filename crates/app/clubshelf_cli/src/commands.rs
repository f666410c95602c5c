//! Subcommand implementations.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;

use clubshelf_core::access::observer::{SessionEvent, SessionObserver};
use clubshelf_core::admin::AdminService;
use clubshelf_core::config::ClubConfig;
use clubshelf_core::models::audit::{Actor, AdminAction};
use clubshelf_core::notify::LogNotifier;
use clubshelf_core::store::{AdminStore, JsonFileStore};

use crate::cli::Commands;
use crate::{Error, Result};

pub fn dispatch(command: &Commands, config: &ClubConfig) -> Result<()> {
    let now = Utc::now();
    debug!("using state file {}", config.state_path.display());

    match command {
        Commands::Version => {
            println!(
                "{} {} (core {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                clubshelf_core::version()
            );
        }
        Commands::Show { user } => show(config, *user, now)?,
        Commands::Gate { user, route } => gate(config, *user, route, now)?,
        Commands::Extend {
            actor,
            user,
            days,
            reason,
        } => {
            let svc = service(config);
            let actor = resolve_actor(&svc, *actor)?;
            let sub = svc.extend_subscription(&actor, *user, *days, reason.clone(), now)?;
            println!("days left: {}", sub.days_left_label());
        }
        Commands::ToggleAutorenew { actor, user } => {
            let svc = service(config);
            let actor = resolve_actor(&svc, *actor)?;
            let enabled = svc.toggle_auto_renew(&actor, *user, now)?;
            println!("auto-renew: {}", if enabled { "on" } else { "off" });
        }
        Commands::SetTier { actor, user, tier } => {
            let svc = service(config);
            let actor = resolve_actor(&svc, *actor)?;
            let status = svc.set_loyalty_tier(&actor, *user, tier, now)?;
            println!("loyalty tier: {}", status.tier);
        }
        Commands::AdjustBalance {
            actor,
            user,
            amount,
            comment,
        } => {
            let svc = service(config);
            let actor = resolve_actor(&svc, *actor)?;
            let stats = svc.adjust_referral_balance(&actor, *user, *amount, comment.clone(), now)?;
            println!(
                "balance: {} (total earned {})",
                stats.balance, stats.total_earned
            );
        }
        Commands::History { limit, json } => {
            let entries = JsonFileStore::new(&config.state_path).history(*limit)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("{}", history_line(entry));
                }
            }
        }
    }

    Ok(())
}

fn service(config: &ClubConfig) -> AdminService<JsonFileStore> {
    AdminService::new(
        JsonFileStore::new(&config.state_path),
        config.admin_ids.iter().copied(),
        Arc::new(LogNotifier),
    )
}

/// Administrators are members too; use their display name when known.
fn resolve_actor(svc: &AdminService<JsonFileStore>, id: i64) -> Result<Actor> {
    let name = svc
        .store()
        .account(id)?
        .map(|account| account.identity.name)
        .unwrap_or_else(|| format!("admin {id}"));
    Ok(Actor { id, name })
}

fn show(config: &ClubConfig, user: i64, now: DateTime<Utc>) -> Result<()> {
    let state = JsonFileStore::new(&config.state_path).load()?;
    let account = state
        .accounts
        .iter()
        .find(|a| a.identity.id == user)
        .ok_or_else(|| Error::Custom(format!("account {user} not found")))?;
    let view = account.view(now, state.total_materials);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn gate(config: &ClubConfig, user: Option<i64>, route: &str, now: DateTime<Utc>) -> Result<()> {
    let store = JsonFileStore::new(&config.state_path);
    let account = match user {
        Some(id) => store.account(id)?,
        None => None,
    };
    let entitled = account
        .as_ref()
        .is_some_and(|account| account.view(now, 0).has_active_subscription());

    let mut observer = SessionObserver::new(route);
    let effects = observer.dispatch(SessionEvent::AuthResolved {
        authenticated: account.is_some(),
        entitled,
    });
    debug!("observer effects: {effects:?}");

    match observer.snapshot().decision() {
        Some(decision) => println!("{decision}"),
        None => println!("pending"),
    }
    Ok(())
}

fn history_line(entry: &AdminAction) -> String {
    let mut line = format!(
        "{} {} ({}) {} {}",
        entry.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        entry.actor.name,
        entry.actor.id,
        entry.action,
        entry.entity,
    );
    if let Some(title) = &entry.entity_title {
        line.push_str(&format!(" \"{title}\""));
    }
    if !entry.details.is_empty() {
        line.push_str(&format!(": {}", entry.details));
    }
    line
}
