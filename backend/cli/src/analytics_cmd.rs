//! CLI Analytics Command
//!
//! Reads the outcome store directly; the server does not need to be running.

use anyhow::Result;

use routeforge_analytics::AnalyticsStore;
use routeforge_config::RouteForgeConfig;

use crate::terminal_output::{dim, render_table, yes_no};

pub fn run(config: &RouteForgeConfig, limit: usize) -> Result<()> {
    let store = AnalyticsStore::open(&config.db_path.to_string_lossy())?;

    let summary: Vec<Vec<String>> = store
        .provider_summary()?
        .into_iter()
        .map(|s| {
            vec![
                s.provider.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                s.attempts.to_string(),
                format!("{:.0}%", s.success_rate() * 100.0),
                format!("{:.0}", s.avg_response_time_ms),
                s.input_tokens.to_string(),
                s.output_tokens.to_string(),
            ]
        })
        .collect();

    let recent: Vec<Vec<String>> = store
        .recent(limit)?
        .into_iter()
        .map(|e| {
            vec![
                e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.task_category.to_string(),
                e.provider_used.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                yes_no(e.success),
                e.response_time_ms.to_string(),
                e.error_message.unwrap_or_default(),
            ]
        })
        .collect();

    if summary.is_empty() {
        println!("{}", dim("No routing outcomes recorded yet."));
        return Ok(());
    }

    println!("\nPer provider");
    print!(
        "{}",
        render_table(&["Provider", "Attempts", "Success", "Avg ms", "In", "Out"], &summary)
    );
    println!("\nRecent outcomes");
    print!(
        "{}",
        render_table(&["Time", "Category", "Provider", "OK", "ms", "Error"], &recent)
    );
    Ok(())
}
