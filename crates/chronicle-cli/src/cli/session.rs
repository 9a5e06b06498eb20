//! Session management CLI commands: list, show, new, rename, switch,
//! delete.
//!
//! Provides session browsing with rich tables and deletion with a
//! confirmation prompt.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use chronicle_types::chat::MessageRole;

use crate::state::AppState;

/// Resolve a full session id or a unique id prefix.
fn resolve_session(state: &AppState, query: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(query) {
        if state.store.sessions().iter().any(|s| s.id == id) {
            return Ok(id);
        }
        bail!("session '{query}' not found");
    }

    let needle = query.to_lowercase();
    let matches: Vec<Uuid> = state
        .store
        .sessions()
        .iter()
        .filter(|s| s.id.to_string().starts_with(&needle))
        .map(|s| s.id)
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("session '{query}' not found"),
        _ => bail!("session id '{query}' is ambiguous ({} matches)", matches.len()),
    }
}

/// List sessions with id, title, last update, and message count.
pub fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sessions = state.store.sessions();

    if json {
        println!("{}", serde_json::to_string_pretty(sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("chron new").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Active").fg(Color::White),
    ]);

    let active = state.store.active_session_id();
    for session in sessions {
        let short_id: String = session.id.to_string().chars().take(8).collect();

        let title_display = if session.title.chars().count() > 40 {
            let head: String = session.title.chars().take(37).collect();
            format!("{head}...")
        } else {
            session.title.clone()
        };

        let active_cell = if Some(session.id) == active {
            Cell::new("*").fg(Color::Green)
        } else {
            Cell::new("")
        };

        table.add_row(vec![
            Cell::new(short_id).fg(Color::DarkGrey),
            Cell::new(title_display).fg(Color::Cyan),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string())
                .fg(Color::White),
            Cell::new(session.messages.len().to_string()).fg(Color::White),
            active_cell,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Print one session's metadata and transcript.
pub fn show_session(state: &AppState, query: &str, json: bool) -> Result<()> {
    let id = resolve_session(state, query)?;
    let Some(session) = state.store.sessions().iter().find(|s| s.id == id) else {
        bail!("session '{query}' not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {}  {}",
        style(&session.title).cyan().bold(),
        style(session.id).dim()
    );
    println!(
        "  created {}  updated {}",
        session.created_at.format("%Y-%m-%d %H:%M"),
        session.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!();

    for message in &session.messages {
        let role = match message.role {
            MessageRole::User => style("user     ").cyan(),
            MessageRole::Assistant => style("assistant").green(),
        };
        println!("  {role}  {}", message.content);
    }
    println!();
    Ok(())
}

/// Create a new session and make it active.
pub fn new_session(state: &mut AppState, title: Option<String>, json: bool) -> Result<()> {
    let id = state.store.create_new_chat();
    if let Some(title) = title {
        state.store.update_chat_title(id, title);
    }
    state.ensure_saved()?;

    if json {
        println!("{}", serde_json::json!({ "id": id }));
        return Ok(());
    }
    println!(
        "  {} Created session {}",
        style("+").green().bold(),
        style(id).dim()
    );
    Ok(())
}

/// Rename an existing session.
pub fn rename_session(state: &mut AppState, query: &str, title: String) -> Result<()> {
    let id = resolve_session(state, query)?;
    if !state.store.update_chat_title(id, title.clone()) {
        bail!("session '{query}' not found");
    }
    state.ensure_saved()?;
    println!(
        "  {} Renamed {} to '{}'",
        style("~").yellow().bold(),
        style(id).dim(),
        style(title).cyan()
    );
    Ok(())
}

/// Make a session the active one.
pub fn switch_session(state: &mut AppState, query: &str) -> Result<()> {
    let id = resolve_session(state, query)?;
    if !state.store.switch_to_chat(id) {
        bail!("session '{query}' not found");
    }
    state.ensure_saved()?;
    println!(
        "  {} Active session is now {}",
        style("*").green().bold(),
        style(id).dim()
    );
    Ok(())
}

/// Delete a session, prompting for confirmation unless `--yes`.
pub fn delete_session(state: &mut AppState, query: &str, yes: bool) -> Result<()> {
    let id = resolve_session(state, query)?;
    let title = state
        .store
        .sessions()
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.title.clone())
        .unwrap_or_default();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{title}' and its transcript?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Aborted.");
            return Ok(());
        }
    }

    if !state.store.delete_chat(id) {
        bail!("session '{query}' not found");
    }
    state.ensure_saved()?;
    println!(
        "  {} Deleted '{}'",
        style("-").red().bold(),
        style(title).cyan()
    );
    Ok(())
}
