//! API server handlers

use crate::api::serve_api;
use crate::cli::output::*;
use crate::AppConfig;
use crate::Result;

/// CLI flags override the `[server]` config section
pub async fn handle_serve_api(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let cors = cors || config.server.enable_cors;

    println!("🚀 Starting Policy QA API Server");
    println!("================================\n");
    println!("📍 Host: {host}");
    println!("🔌 Port: {port}");
    println!("🌐 CORS: {}", if cors { "Enabled" } else { "Disabled" });
    if config.api_key().is_none() {
        print_warning("SECURITY_API_KEY is not set; all question requests will be rejected");
    }
    println!();

    serve_api(config, host, port, cors).await
}
