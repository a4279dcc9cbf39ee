//! services/api/src/bin/openapi.rs
//!
//! Dumps the Carbon Lens OpenAPI document without starting the server, so
//! client code can be generated from it in CI.
//!
//! Usage: `openapi [OUTPUT]`. The document is written to `openapi.json` when
//! no path is given.

use api_lib::web::rest::ApiDoc;
use std::path::{Path, PathBuf};
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_document(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiDoc::openapi();
    std::fs::write(path, api.to_pretty_json()?)?;
    println!("OpenAPI document for {} routes written to {}", api.paths.paths.len(), path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    write_document(&output)
}
