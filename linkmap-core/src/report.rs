// Report generation from a finished crawl

use crate::crawl::{CrawlSummary, extract_url_path};
use linkmap_scanner::LinkGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Graph,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "graph" | "force" => Some(ReportFormat::Graph),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json | ReportFormat::Graph => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

/// Node of a force-layout graph. `group` is 1 for fetched locations and 2
/// for locations that were only ever seen as link targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceNode {
    pub name: String,
    pub group: u8,
}

/// Edge between two node indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceLink {
    pub source: usize,
    pub target: usize,
    pub value: u32,
}

/// The `{nodes, links}` shape consumed by d3-style force layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceGraph {
    pub nodes: Vec<ForceNode>,
    pub links: Vec<ForceLink>,
}

impl ForceGraph {
    /// Index nodes in order of first appearance while walking the sorted
    /// adjacency map, so the same graph always yields the same indices.
    pub fn from_graph(graph: &LinkGraph) -> Self {
        let adjacency = graph.to_sorted_map();
        let fetched: BTreeSet<&String> = adjacency.keys().collect();

        let mut force = ForceGraph::default();
        let mut position: HashMap<String, usize> = HashMap::new();

        let mut index_of = |name: &String, nodes: &mut Vec<ForceNode>| -> usize {
            *position.entry(name.clone()).or_insert_with(|| {
                nodes.push(ForceNode {
                    name: name.clone(),
                    group: if fetched.contains(name) { 1 } else { 2 },
                });
                nodes.len() - 1
            })
        };

        for (source, targets) in &adjacency {
            let source_idx = index_of(source, &mut force.nodes);
            for target in targets {
                let target_idx = index_of(target, &mut force.nodes);
                force.links.push(ForceLink {
                    source: source_idx,
                    target: target_idx,
                    value: 1,
                });
            }
        }

        force
    }
}

/// Render `summary` in the requested format.
pub fn render_report(format: ReportFormat, summary: &CrawlSummary) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(summary)),
        ReportFormat::Markdown => Ok(generate_markdown_report(summary)),
        ReportFormat::Json => generate_json_report(&summary.graph),
        ReportFormat::Graph => generate_graph_report(&summary.graph),
    }
}

/// The adjacency map itself: sorted keys, sorted edge lists.
pub fn generate_json_report(graph: &LinkGraph) -> Result<String, serde_json::Error> {
    graph.to_json_pretty()
}

pub fn generate_graph_report(graph: &LinkGraph) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ForceGraph::from_graph(graph))
}

pub fn generate_text_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                          LINKMAP CRAWL REPORT\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("Seeds:        {}\n", format_seeds(&summary.seeds)));
    report.push_str(&format!(
        "Crawl Date:   {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!(
        "Duration:     {:.2} seconds\n",
        summary.duration().num_milliseconds() as f64 / 1000.0
    ));
    report.push_str(&format!("Pages:        {}\n", summary.stats.fetched));
    report.push_str(&format!("Failures:     {}\n", summary.stats.failed));
    report.push_str(&format!("Discovered:   {}\n", summary.stats.discovered));
    report.push_str(&format!("Edges:        {}\n", summary.graph.edge_count()));
    if summary.stats.timed_out {
        report.push_str("Note:         crawl timeout reached, graph is partial\n");
    }
    report.push('\n');

    report.push_str(RULE);
    report.push_str("PAGES\n");
    report.push_str(RULE);
    report.push('\n');

    let by_host = summary.pages_by_host();
    if by_host.is_empty() {
        report.push_str("  (empty)\n");
    }

    for (host, pages) in &by_host {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages\n\n", pages.len()));

        for page in pages {
            let path = extract_url_path(&page.url);
            let line = match page.error {
                Some(ref error) => format!("  ✗ {}  ({})", path, error),
                None => format!("  ✓ {}  [{} links]", path, page.links_found),
            };
            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

pub fn generate_markdown_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();

    report.push_str("# Link Map\n\n");
    report.push_str("| | |\n|---|---|\n");
    report.push_str(&format!("| Seeds | {} |\n", format_seeds(&summary.seeds)));
    report.push_str(&format!(
        "| Crawl date | {} |\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("| Pages | {} |\n", summary.stats.fetched));
    report.push_str(&format!("| Failures | {} |\n", summary.stats.failed));
    report.push_str(&format!("| Edges | {} |\n\n", summary.graph.edge_count()));

    report.push_str("## Links\n\n");
    for (source, targets) in summary.graph.to_sorted_map() {
        report.push_str(&format!("### {}\n\n", source));
        if targets.is_empty() {
            report.push_str("_no outbound links_\n\n");
            continue;
        }
        for target in targets {
            report.push_str(&format!("- <{}>\n", target));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_seeds(seeds: &[String]) -> String {
    match seeds.len() {
        0 => "none".to_string(),
        1 => seeds[0].clone(),
        n => format!("{} URLs", n),
    }
}
