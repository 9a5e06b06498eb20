//! Storage usage CLI command.

use anyhow::Result;
use console::style;

use chronicle_core::codec;

use crate::state::AppState;

/// Show session/message counts and the optimized payload size against
/// the configured budget.
pub fn show_stats(state: &AppState, json: bool) -> Result<()> {
    let policy = state.adapter.policy();
    let sessions = state.store.sessions();
    let message_count: usize = sessions.iter().map(|s| s.messages.len()).sum();

    let optimized = codec::optimize(sessions, policy);
    let estimated = codec::estimate_size(&optimized);
    let percent = if policy.max_total_bytes > 0 {
        (estimated as f64 / policy.max_total_bytes as f64) * 100.0
    } else {
        0.0
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "data_dir": state.data_dir,
                "sessions": sessions.len(),
                "messages": message_count,
                "estimated_bytes": estimated,
                "budget_bytes": policy.max_total_bytes,
                "warn_bytes": policy.warn_bytes,
            })
        );
        return Ok(());
    }

    let usage = format!(
        "{} of {} ({percent:.1}%)",
        format_bytes(estimated),
        format_bytes(policy.max_total_bytes)
    );
    let usage_styled = if estimated > policy.warn_bytes {
        style(usage).red().bold()
    } else {
        style(usage).green()
    };

    println!();
    println!("  Store      {}", style(state.data_dir.display()).dim());
    println!("  Sessions   {} (limit {})", sessions.len(), policy.max_sessions);
    println!(
        "  Messages   {message_count} (limit {}/session)",
        policy.max_messages_per_session
    );
    println!("  Size       {usage_styled}");
    println!();
    Ok(())
}

fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}
