//! Output rendering and formatting

use afsctl_types::{AfsServer, ArcadInstance, JettyServer, ServerKind, ServerLocation};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;
use std::io;

use crate::events::FinishedOperation;

/// Final result of one CLI command.
pub enum OperationResult {
    Locations(Vec<ServerLocation>),
    Servers(Vec<AfsServer>),
    Instances(Vec<ArcadInstance>),
    Jetty(JettyServer),
    Probe(serde_json::Value),
    /// An install or update orchestration, with the captured installer output.
    Orchestration(FinishedOperation),
    Success(String),
}

/// Output renderer for CLI results
pub struct OutputRenderer {
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_human(result)
        }
    }

    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = match result {
            OperationResult::Locations(locations) => to_json(locations)?,
            OperationResult::Servers(servers) => to_json(servers)?,
            OperationResult::Instances(instances) => to_json(instances)?,
            OperationResult::Jetty(server) => to_json(server)?,
            OperationResult::Probe(value) => {
                serde_json::to_string_pretty(value).map_err(io::Error::other)?
            }
            OperationResult::Orchestration(finished) => to_json(&serde_json::json!({
                "operation": finished.operation,
                "success": finished.success,
                "stdout": finished.stdout,
                "stderr": finished.stderr,
            }))?,
            OperationResult::Success(message) => to_json(&serde_json::json!({
                "success": true,
                "message": message,
            }))?,
        };
        println!("{json}");
        Ok(())
    }

    fn render_human(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Locations(locations) => render_locations(locations),
            OperationResult::Servers(servers) => render_servers(servers),
            OperationResult::Instances(instances) => render_instances(instances),
            OperationResult::Jetty(server) => render_jetty(server),
            OperationResult::Probe(value) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(value).map_err(io::Error::other)?
                );
                Ok(())
            }
            OperationResult::Orchestration(finished) => render_orchestration(finished),
            OperationResult::Success(message) => {
                println!("{message}");
                Ok(())
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn render_locations(locations: &[ServerLocation]) -> io::Result<()> {
    if locations.is_empty() {
        println!("No AFS or Jetty product libraries found.");
        return Ok(());
    }

    let mut table = new_table(&["Library", "Type", "Version / Home", "iASP"]);
    for location in locations {
        let kind = match location.kind {
            ServerKind::Afs => "AFS",
            ServerKind::Jetty => "Jetty",
        };
        let iasp = location
            .iasp
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        table.add_row(vec![
            Cell::new(location.library.to_string()),
            Cell::new(kind),
            Cell::new(&location.data_area_value),
            Cell::new(iasp),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn render_servers(servers: &[AfsServer]) -> io::Result<()> {
    if servers.is_empty() {
        println!("No AFS servers registered.");
        return Ok(());
    }

    let mut table = new_table(&["Server", "State", "Job", "User", "IFS path", "Ports"]);
    for server in servers {
        let state = if server.running {
            match &server.job.status {
                Some(status) => format!("running ({status})"),
                None => "running".to_string(),
            }
        } else {
            "stopped".to_string()
        };
        let (http, https) = server.rest_ports();
        let ports = match (http, https) {
            (Some(http), Some(https)) => format!("{http} / {https} (ssl)"),
            (Some(http), None) => http.to_string(),
            (None, Some(https)) => format!("{https} (ssl)"),
            (None, None) => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(&server.name),
            Cell::new(state),
            Cell::new(server.job.triple()),
            Cell::new(&server.user),
            Cell::new(&server.ifs_path),
            Cell::new(ports),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn render_instances(instances: &[ArcadInstance]) -> io::Result<()> {
    if instances.is_empty() {
        println!("No ARCAD instances registered.");
        return Ok(());
    }

    let mut table = new_table(&["Code", "Description", "Library", "Version", "iASP"]);
    for instance in instances {
        table.add_row(vec![
            Cell::new(instance.code.to_string()),
            Cell::new(&instance.text),
            Cell::new(instance.library.to_string()),
            Cell::new(instance.version.to_string()),
            Cell::new(instance.iasp.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn render_jetty(server: &JettyServer) -> io::Result<()> {
    let state = if server.running { "running" } else { "stopped" };
    println!("Jetty server in {}: {state}", server.library);
    if let Some(job) = &server.job {
        println!("  Last job: {}", job.triple());
    }
    Ok(())
}

fn render_orchestration(finished: &FinishedOperation) -> io::Result<()> {
    if finished.success {
        println!("{} completed.", finished.operation);
    } else {
        println!("{} failed.", finished.operation);
    }
    if !finished.stdout.trim().is_empty() {
        println!("--- installer output ---");
        println!("{}", finished.stdout.trim_end());
    }
    if !finished.stderr.trim().is_empty() {
        println!("--- installer errors ---");
        println!("{}", finished.stderr.trim_end());
    }
    Ok(())
}
