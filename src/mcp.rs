use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json;
use crate::outline::Outline;
use crate::pdf::{save_outline, save_outline_as, PdfDocument, WriteSummary};
use crate::target::Target;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TocSetRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(
        description = "New bookmarks as [level, title, page] triples; page is a number, a 'start-end' string, or -1 for none"
    )]
    pub entries: Vec<Value>,
    #[schemars(description = "Write to this file instead of updating the PDF in place")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TocExportRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "JSON file to write")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TocImportRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "JSON file with [level, title, page] triples")]
    pub json_path: String,
    #[schemars(description = "Write to this file instead of updating the PDF in place")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TocServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl TocServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for TocServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl TocServer {
    #[tool(description = "Get the bookmarks (table of contents) of a PDF as a flat list with levels and pages")]
    fn toc_get(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let doc = match PdfDocument::open(&path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {:#}", e),
        };
        match doc.outline() {
            Ok(outline) => {
                let result = TocResult {
                    path,
                    page_count: doc.page_count(),
                    entries: entry_results(&outline),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {:#}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Replace the bookmarks of a PDF. An empty list removes all bookmarks.")]
    fn toc_set(&self, Parameters(req): Parameters<TocSetRequest>) -> String {
        let outline = match json::from_value(&Value::Array(req.entries)) {
            Ok(o) => o,
            Err(e) => return format!("Error: {:#}", e),
        };
        write_result(&req.path, req.output.as_deref(), &outline)
    }

    #[tool(description = "Export the bookmarks of a PDF to a JSON file of [level, title, page] triples")]
    fn toc_export(&self, Parameters(req): Parameters<TocExportRequest>) -> String {
        let outline = match PdfDocument::open(&req.path).and_then(|doc| doc.outline()) {
            Ok(o) => o,
            Err(e) => return format!("Error: {:#}", e),
        };
        if let Err(e) = json::export_file(&req.output, &outline, true) {
            return format!("Error: {:#}", e);
        }
        let result = ExportResult {
            output_path: req.output,
            entries: outline.len(),
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {:#}", e))
    }

    #[tool(description = "Replace the bookmarks of a PDF with the contents of a JSON file of [level, title, page] triples")]
    fn toc_import(&self, Parameters(req): Parameters<TocImportRequest>) -> String {
        let outline = match json::import_file(&req.json_path) {
            Ok(o) => o,
            Err(e) => return format!("Error: {:#}", e),
        };
        write_result(&req.path, req.output.as_deref(), &outline)
    }
}

fn entry_results(outline: &Outline) -> Vec<TocEntryResult> {
    outline
        .entries()
        .into_iter()
        .map(|e| TocEntryResult {
            level: e.level,
            title: e.title,
            page: e.target.start_page(),
            end_page: match e.target {
                Target::Range { end, .. } => Some(end),
                _ => None,
            },
        })
        .collect()
}

fn write_result(path: &str, output: Option<&str>, outline: &Outline) -> String {
    let saved: Result<WriteSummary> = match output {
        Some(dest) => save_outline_as(path, dest, outline),
        None => save_outline(path, outline),
    };
    match saved {
        Ok(summary) => {
            let result = WriteResult {
                output_path: output.unwrap_or(path).to_string(),
                entries: summary.entries,
                without_destination: summary.without_destination,
            };
            serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {:#}", e))
        }
        Err(e) => format!("Error: {:#}", e),
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TocResult {
    pub path: String,
    pub page_count: u32,
    pub entries: Vec<TocEntryResult>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TocEntryResult {
    pub level: u32,
    pub title: String,
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WriteResult {
    pub output_path: String,
    pub entries: usize,
    pub without_destination: usize,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExportResult {
    pub output_path: String,
    pub entries: usize,
}

impl ServerHandler for TocServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF bookmark tools. Use toc_get to read the table of contents, toc_set to replace \
                 it with [level, title, page] triples, and toc_export/toc_import to move it \
                 through a JSON file. Writes are appended as incremental updates."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = TocServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::write_fixture;

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).unwrap_or_else(|_| panic!("not JSON: {output}"))
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.pdf");
        write_fixture(&path, 8);
        let path = path.to_string_lossy().to_string();
        let server = TocServer::new();

        let written = server.toc_set(Parameters(TocSetRequest {
            path: path.clone(),
            entries: vec![
                serde_json::json!([1, "Intro", 1]),
                serde_json::json!([2, "Scope", "3-4"]),
                serde_json::json!([1, "Appendix", 20]),
            ],
            output: None,
        }));
        let written = parse(&written);
        assert_eq!(written["entries"], 3);
        assert_eq!(written["without_destination"], 1);

        let got = parse(&server.toc_get(Parameters(PathRequest { path })));
        assert_eq!(got["page_count"], 8);
        assert_eq!(got["entries"][1]["title"], "Scope");
        assert_eq!(got["entries"][1]["level"], 2);
        assert_eq!(got["entries"][1]["page"], 3);
        assert!(got["entries"][2]["page"].is_null());
    }

    #[test]
    fn test_export_and_import_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        let copy = dir.path().join("b.pdf");
        let json_path = dir.path().join("toc.json");
        write_fixture(&source, 4);
        std::fs::write(&json_path, r#"[[1, "Only", 2]]"#).unwrap();
        let server = TocServer::new();

        let imported = server.toc_import(Parameters(TocImportRequest {
            path: source.to_string_lossy().to_string(),
            json_path: json_path.to_string_lossy().to_string(),
            output: Some(copy.to_string_lossy().to_string()),
        }));
        assert_eq!(parse(&imported)["entries"], 1);

        let out = dir.path().join("out.json");
        let exported = server.toc_export(Parameters(TocExportRequest {
            path: copy.to_string_lossy().to_string(),
            output: out.to_string_lossy().to_string(),
        }));
        assert_eq!(parse(&exported)["entries"], 1);
        assert_eq!(
            json::import_file(&out).unwrap().entries()[0].title,
            "Only"
        );
        // Source untouched.
        assert!(PdfDocument::open(&source).unwrap().outline().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_reports_error() {
        let server = TocServer::new();
        let result = server.toc_get(Parameters(PathRequest {
            path: "/nonexistent/book.pdf".into(),
        }));
        // The cause follows the context message.
        assert!(result.starts_with("Error: Failed to open PDF: /nonexistent/book.pdf: "));
    }

    #[test]
    fn test_unreadable_outline_reports_cause() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        let server = TocServer::new();
        let result = server.toc_get(Parameters(PathRequest {
            path: path.to_string_lossy().to_string(),
        }));
        let prefix = format!("Error: Failed to open PDF: {}: ", path.display());
        assert!(result.starts_with(&prefix));
        assert!(result.len() > prefix.len());
    }
}
