//! CLI Stats Command
//!
//! Reports provider availability, model names and the routing policy.

use std::sync::Arc;

use anyhow::Result;

use routeforge_config::RouteForgeConfig;
use routeforge_routing::{RouterStats, TracingReporter};

use crate::terminal_output::{render_table, yes_no};

pub async fn run(config: &RouteForgeConfig) -> Result<()> {
    let router = crate::bootstrap::build_router(config, Arc::new(TracingReporter)).await?;
    print!("{}", render(&router.stats()));
    Ok(())
}

fn render(stats: &RouterStats) -> String {
    let providers: Vec<Vec<String>> = stats
        .availability
        .iter()
        .map(|(provider, available)| {
            vec![
                provider.to_string(),
                yes_no(*available),
                stats.models.get(provider).cloned().unwrap_or_default(),
            ]
        })
        .collect();

    let policy: Vec<Vec<String>> = stats
        .policy
        .iter()
        .map(|(category, order)| {
            let order: Vec<&str> = order.iter().map(|p| p.as_str()).collect();
            vec![category.to_string(), order.join(" → ")]
        })
        .collect();

    format!(
        "\nProviders\n{}\nRouting policy\n{}",
        render_table(&["Provider", "Available", "Model"], &providers),
        render_table(&["Category", "Preference"], &policy),
    )
}
