//! Report module.
//!
//! This module renders comparison trees and restore logs into the
//! plain-text artifact of a run, and writes it to a timestamped
//! path. The artifact is meant for humans, but its section headers
//! and count labels are kept stable so that downstream tooling can
//! grep them.

use chrono::Local;
use log::info;
use std::{fs, io, path::PathBuf, result};
use thiserror::Error;

use crate::{
    config::{self, ReconcileConfig},
    ComparisonKind, ComparisonNode, ComparisonReport, RestoreOutcome, RestoreReport, Store,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot create report directory {1}")]
    CreateReportDirError(#[source] io::Error, PathBuf),
    #[error("cannot write report file {1}")]
    WriteReportError(#[source] io::Error, PathBuf),

    #[error(transparent)]
    ConfigError(#[from] config::Error),
}

pub type Result<T> = result::Result<T, Error>;

const RULE_HEAVY: &str =
    "================================================================";
const RULE_LIGHT: &str =
    "----------------------------------------------------------------";

const COMPARISON_LEGEND: &str = "\
LEGEND
 =   present on both sides, item counts equal
 !=  present on both sides, item counts differ
 ->  present in source only (restore candidate)
 <-  present in target only
 >>  traversal depth bound reached, subtree not compared
 !!  comparison failed, see log output
";

const RESTORE_LEGEND: &str = "\
LEGEND
 [restored-folder]  folder was absent in target and copied whole
 [restored-items]   missing items were copied into an existing folder
 [checked]          folder needed no action
 [error]            action failed and was skipped
";

fn identity(store: &dyn Store) -> String {
    match store.path() {
        Some(path) => format!("{} ({})", store.name(), path.display()),
        None => store.name().to_owned(),
    }
}

fn header(out: &mut String, title: &str, source: &dyn Store, target: &dyn Store) {
    out.push_str(RULE_HEAVY);
    out.push('\n');
    out.push_str(&format!(" {}\n", title));
    out.push_str(&format!(
        " generated: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(" source: {}\n", identity(source)));
    out.push_str(&format!(" target: {}\n", identity(target)));
    out.push_str(RULE_HEAVY);
    out.push_str("\n\n");
}

fn marker(kind: &ComparisonKind) -> String {
    match kind {
        ComparisonKind::Matched => "=".into(),
        ComparisonKind::CountDiffers => "!=".into(),
        ComparisonKind::AbsentInTarget => "->".into(),
        ComparisonKind::AbsentInSource => "<-".into(),
        ComparisonKind::DepthExceeded => ">>".into(),
        ComparisonKind::Failed(reason) => format!("!! {}", reason),
    }
}

fn node_line(node: &ComparisonNode) -> String {
    format!(
        "{} [source: {} | target: {}] {}",
        node.name,
        node.source_count,
        node.target_count,
        marker(&node.kind)
    )
}

fn render_children(node: &ComparisonNode, prefix: &str, out: &mut String) {
    for (pos, child) in node.children.iter().enumerate() {
        let last = pos + 1 == node.children.len();
        let branch = if last { "└── " } else { "├── " };
        out.push_str(&format!("{}{}{}\n", prefix, branch, node_line(child)));

        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(child, &child_prefix, out);
    }
}

/// Renders a comparison run into its text artifact.
pub fn render_comparison(
    report: &ComparisonReport,
    source: &dyn Store,
    target: &dyn Store,
) -> String {
    let mut out = String::new();
    header(&mut out, "MAIL STORE COMPARISON REPORT", source, target);

    out.push_str(&format!("{}\n", node_line(&report.root)));
    render_children(&report.root, "", &mut out);

    let counters = &report.counters;
    out.push('\n');
    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str("SUMMARY\n");
    out.push_str(&format!(" folders matched:           {}\n", counters.matched));
    out.push_str(&format!(
        " folders with count diff:   {}\n",
        counters.count_differs
    ));
    out.push_str(&format!(
        " folders missing in target: {} ({} items)\n",
        counters.absent_in_target, counters.absent_in_target_items
    ));
    out.push_str(&format!(
        " folders missing in source: {} ({} items)\n",
        counters.absent_in_source, counters.absent_in_source_items
    ));
    out.push_str(&format!(" folders beyond depth:      {}\n", counters.truncated));
    out.push_str(&format!(" folders in error:          {}\n", counters.errors));
    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str(COMPARISON_LEGEND);

    out
}

/// Renders a restore run into its text artifact.
pub fn render_restore(report: &RestoreReport, source: &dyn Store, target: &dyn Store) -> String {
    let mut out = String::new();
    header(&mut out, "MAIL STORE RESTORE LOG", source, target);

    if report.dry_run {
        out.push_str(" mode: dry run, nothing was written\n\n");
    }

    for record in &report.records {
        let line = match &record.outcome {
            RestoreOutcome::RestoredFolder { items } => {
                format!("[restored-folder]  {} (items: {})", record.folder, items)
            }
            RestoreOutcome::RestoredItems { copied, skipped } => format!(
                "[restored-items]   {} (copied: {}, skipped: {})",
                record.folder, copied, skipped
            ),
            RestoreOutcome::Checked => format!("[checked]          {}", record.folder),
            RestoreOutcome::Failed { reason } => {
                format!("[error]            {}: {}", record.folder, reason)
            }
        };
        out.push_str(&format!(" {}\n", line));
    }

    out.push('\n');
    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str("SUMMARY\n");
    out.push_str(&format!(" folders restored:     {}\n", report.folders_restored));
    out.push_str(&format!(" items restored:       {}\n", report.items_restored));
    out.push_str(&format!(
        " duplicates skipped:   {}\n",
        report.duplicates_skipped
    ));
    out.push_str(&format!(" folders checked:      {}\n", report.folders_checked));
    out.push_str(&format!(" folders beyond depth: {}\n", report.truncated));
    out.push_str(&format!(" errors:               {}\n", report.errors));
    out.push_str(RULE_LIGHT);
    out.push('\n');
    out.push_str(RESTORE_LEGEND);

    out
}

/// Writes an artifact to the configured report directory, under a
/// name qualified by the current timestamp. Returns the path
/// written to.
pub fn write_artifact(config: &ReconcileConfig, prefix: &str, contents: &str) -> Result<PathBuf> {
    let dir = config.report_dir()?;
    fs::create_dir_all(&dir).map_err(|err| Error::CreateReportDirError(err, dir.clone()))?;

    let path = dir.join(format!(
        "{}_{}.txt",
        prefix,
        Local::now().format("%Y%m%d-%H%M%S")
    ));
    fs::write(&path, contents).map_err(|err| Error::WriteReportError(err, path.clone()))?;

    info!("report written to {}", path.display());
    Ok(path)
}

/// Renders and writes the artifact of a comparison run.
pub fn write_comparison(
    config: &ReconcileConfig,
    report: &ComparisonReport,
    source: &dyn Store,
    target: &dyn Store,
) -> Result<PathBuf> {
    write_artifact(config, "compare", &render_comparison(report, source, target))
}

/// Renders and writes the artifact of a restore run.
pub fn write_restore(
    config: &ReconcileConfig,
    report: &RestoreReport,
    source: &dyn Store,
    target: &dyn Store,
) -> Result<PathBuf> {
    write_artifact(config, "restore", &render_restore(report, source, target))
}
