// Report generation from a mirror session summary

use crate::mirror::extract_url_path;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use url::Url;
use webmirror_scanner::result::Rejection;
use webmirror_scanner::{CrawlSummary, MirroredResource, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unsupported report format '{}'", other)),
        }
    }
}

pub fn generate_mirror_report(
    summary: &CrawlSummary,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(summary)),
        ReportFormat::Json => serde_json::to_string_pretty(summary),
    }
}

pub fn save_report(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn generate_text_report(summary: &CrawlSummary) -> String {
    let scope_rejections = summary
        .rejected
        .iter()
        .filter(|r| r.reason == Rejection::Scope)
        .count();
    let extension_rejections = summary.rejected.len() - scope_rejections;

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Seed: {}\n", summary.seed));
    report.push_str(&format!("  Max depth: {}\n", summary.max_depth));
    report.push_str(&format!("  Addresses visited: {}\n", summary.visited));
    report.push_str(&format!("  Documents saved: {}\n", summary.documents()));
    report.push_str(&format!("  Files saved: {}\n", summary.files()));
    report.push_str(&format!(
        "  Bytes written: {}\n",
        format_bytes(summary.total_bytes())
    ));
    report.push_str(&format!("  Dead links: {}\n", summary.dead_links.len()));
    report.push_str(&format!(
        "  Rejected: {} out of scope, {} by extension\n",
        scope_rejections, extension_rejections
    ));
    report.push_str(&format!(
        "  Elapsed: {:.2}s\n",
        summary.elapsed.as_secs_f64()
    ));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group resources by host
    let mut by_host: BTreeMap<String, Vec<&MirroredResource>> = BTreeMap::new();
    for resource in &summary.resources {
        let host = Url::parse(&resource.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        by_host.entry(host).or_default().push(resource);
    }

    for (host, resources) in by_host.iter() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} resources saved\n\n", resources.len()));

        for resource in resources {
            let kind = match resource.kind {
                ResourceKind::Document => "html".green(),
                ResourceKind::File => "file".cyan(),
            };
            report.push_str(&format!(
                "  {} {} {}\n",
                kind,
                extract_url_path(&resource.url),
                format_bytes(resource.bytes).bright_black()
            ));
        }
        report.push('\n');
    }

    if !summary.dead_links.is_empty() {
        report.push_str("## Dead links\n");
        for dead in &summary.dead_links {
            report.push_str(&format!("  {} {}\n", "✗".red(), dead.url));
            report.push_str(&format!("      {}\n", dead.error));
        }
        report.push('\n');
    }

    report
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
