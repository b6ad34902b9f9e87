//! Demo: Signed REST Requests
//!
//! Showcases: HMAC-SHA256 header signing, signed GET and POST, request hooks
//!
//! Run: BYBIT_API_KEY=... BYBIT_API_SECRET=... cargo run --bin signed_requests
//!
//! Always targets the testnet; use testnet API keys.
//!
//! Set RUST_LOG=bybit_rest=debug to see the client's request/response tracing.

use bybit_auth::{build_get_headers, canonical_query_string};
use bybit_rest::{BybitRestClient, Credentials, ExchangeConfig, Hooks, RestError};
use colored::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("{}", "═".repeat(60).cyan());
    println!("{}", "  SIGNED REQUEST DEMO".cyan().bold());
    println!("{}", "  Bybit V5 HMAC-SHA256 authentication".cyan());
    println!("{}", "═".repeat(60).cyan());
    println!();

    // Places a real order, so never point this at mainnet
    let config = ExchangeConfig::testnet();
    let credentials = Credentials::from_env()?;

    println!("  Endpoint:      {}", config.base_endpoint.cyan());
    println!("  Receive window: {} ms", credentials.recv_window_ms().to_string().cyan());
    println!();

    // Headers only, for callers that bring their own HTTP stack
    let query = canonical_query_string(&[("accountType", "UNIFIED")])?;
    let headers = build_get_headers(&credentials, &query)?;

    println!("{}", "  SIGNED HEADERS".white().bold());
    println!("  {}", "─".repeat(50));
    for (name, value) in headers.iter() {
        println!("  {:<20} {}", name.yellow(), value);
    }
    println!();

    let hooks = Hooks::new()
        .on_request(|request| {
            println!("  {} {} {}", "→".green(), request.method, request.url);
        })
        .on_response(|_, response, elapsed| {
            println!(
                "  {} {} in {:.1} ms",
                "←".green(),
                response.status,
                elapsed.as_secs_f64() * 1000.0
            );
        });

    let client = BybitRestClient::with_config(config)?
        .with_credentials(credentials)
        .with_hooks(hooks);

    println!("{}", "  SIGNED GET".white().bold());
    println!("  {}", "─".repeat(50));
    report(client.get("/v5/account/wallet-balance", &query).await);
    println!();

    println!("{}", "  SIGNED POST".white().bold());
    println!("  {}", "─".repeat(50));
    let order = serde_json::json!({
        "category": "spot",
        "symbol": "BTCUSDT",
        "side": "Buy",
        "orderType": "Limit",
        "qty": "0.001",
        "price": "10000",
        "timeInForce": "PostOnly",
    });
    report(client.post("/v5/order/create", &order).await);

    Ok(())
}

fn report(result: Result<bybit_rest::HttpResponse, RestError>) {
    match result {
        Ok(response) => println!("  {}", response.text()),
        Err(e) if e.is_auth_rejected() => {
            println!("  {} {}", "Authentication rejected:".red(), e)
        }
        Err(e) => println!("  {} {}", "Error:".red(), e),
    }
}
