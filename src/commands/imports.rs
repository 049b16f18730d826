// ABOUTME: Import subcommands: list, start/stop/run, bulk delete, schedules
// ABOUTME: `watch` renders live progress bars from the projector and the push feed

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use import_console::display::{format_percent, format_timestamp, PLACEHOLDER};
use import_console::jobs::{JobListProjector, JobRow};
use import_console::progress::{FeedSettings, ProgressFeed, ProgressReconciler};
use import_console::remote::models::ImportId;
use import_console::remote::{ApiClient, ImportBackend};
use import_console::{Config, CurrentUser};

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

fn status_label(row: &JobRow) -> String {
    row.status
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn print_rows(rows: &[JobRow]) {
    if rows.is_empty() {
        println!("No imports yet.");
        return;
    }
    println!(
        "{:<6} {:<28} {:<22} {:<22} {:<22} {:>8} {:<10} RUNNING",
        "ID", "NAME", "CREATED", "STARTED", "COMPLETED", "PROGRESS", "STATUS"
    );
    for row in rows {
        println!(
            "{:<6} {:<28} {:<22} {:<22} {:<22} {:>8} {:<10} {}",
            row.id,
            row.name,
            format_timestamp(row.created_at),
            format_timestamp(row.start_datetime),
            format_timestamp(row.completion_datetime),
            format_percent(row.progress_percent),
            status_label(row),
            if row.toggle_checked { "on" } else { "off" }
        );
    }
}

pub async fn list(client: &ApiClient, user: &CurrentUser) -> Result<()> {
    let mut projector = JobListProjector::new(user.uuid.clone(), ProgressReconciler::detached());
    projector.refresh(client).await?;
    print_rows(&projector.rows());
    Ok(())
}

pub async fn toggle(client: &ApiClient, user: &CurrentUser, id: ImportId, start: bool) -> Result<()> {
    let mut projector = JobListProjector::new(user.uuid.clone(), ProgressReconciler::detached());
    projector
        .toggle(client, id, start)
        .await
        .with_context(|| format!("Failed to {} import {}", if start { "start" } else { "stop" }, id))?;
    print_rows(&projector.rows());
    Ok(())
}

pub async fn run_now(client: &ApiClient, id: ImportId) -> Result<()> {
    client.run_import(id).await?;
    println!("Import {} triggered.", id);
    Ok(())
}

pub async fn delete(client: &ApiClient, user: &CurrentUser, ids: &[ImportId], yes: bool) -> Result<()> {
    if !super::confirm_delete("import(s)", ids.len(), yes)? {
        return Ok(());
    }
    let mut projector = JobListProjector::new(user.uuid.clone(), ProgressReconciler::detached());
    let deleted = projector.delete_selected(client, ids).await?;
    println!("Deleted {} import(s).", deleted);
    Ok(())
}

pub async fn schedules(client: &ApiClient) -> Result<()> {
    let mut schedules: Vec<_> = client.scheduled_cron_expressions().await?.into_iter().collect();
    if schedules.is_empty() {
        println!("No scheduled imports.");
        return Ok(());
    }
    schedules.sort_by_key(|(id, _)| *id);
    for (id, cron) in schedules {
        println!("{:<6} {}", id, cron);
    }
    Ok(())
}

/// One bar per import, kept in sync with the projector's rows.
struct Dashboard {
    multi: MultiProgress,
    style: ProgressStyle,
    bars: HashMap<ImportId, ProgressBar>,
}

impl Dashboard {
    fn new() -> Result<Self> {
        let style = ProgressStyle::with_template(
            "{prefix:<28} [{bar:30.cyan/blue}] {msg}",
        )?
        .progress_chars("=> ");
        Ok(Self {
            multi: MultiProgress::new(),
            style,
            bars: HashMap::new(),
        })
    }

    fn render(&mut self, rows: &[JobRow], live: bool) {
        self.bars.retain(|id, bar| {
            let keep = rows.iter().any(|r| r.id == *id);
            if !keep {
                bar.finish_and_clear();
            }
            keep
        });

        for row in rows {
            let bar = self.bars.entry(row.id).or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new(100));
                bar.set_style(self.style.clone());
                bar.set_prefix(row.name.clone());
                bar
            });
            bar.set_position(row.progress_percent.unwrap_or(0) as u64);
            bar.set_message(format!(
                "{:>5} {:<10} started {}{}",
                format_percent(row.progress_percent),
                status_label(row),
                format_timestamp(row.start_datetime),
                if live { "" } else { " (offline)" }
            ));
        }
    }

    fn clear(&mut self) {
        for (_, bar) in self.bars.drain() {
            bar.finish_and_clear();
        }
    }
}

pub async fn watch(client: &ApiClient, user: &CurrentUser, config: &Config) -> Result<()> {
    let feed = ProgressFeed::subscribe(FeedSettings::from(config));
    let mut projector = JobListProjector::new(user.uuid.clone(), feed.reconciler());
    let mut dashboard = Dashboard::new()?;

    let mut poll = tokio::time::interval(config.poll_interval());
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    info!("Watching imports; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                if let Err(e) = projector.refresh(client).await {
                    warn!("Failed to load imports: {}", e);
                }
            }
            _ = redraw.tick() => {
                dashboard.render(&projector.rows(), projector.is_live());
            }
        }
    }

    dashboard.clear();
    feed.release().await;
    Ok(())
}
