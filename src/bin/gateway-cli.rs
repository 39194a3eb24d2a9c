use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the Domain Gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health and active route count
    Health,
    /// List a tenant's domains
    List { tenant: Uuid },
    /// Register a domain for a tenant
    Add {
        tenant: Uuid,
        domain: String,
        /// Force the kind: subdomain or custom
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Show one domain
    Show { tenant: Uuid, id: Uuid },
    /// Show DNS setup instructions for a custom domain
    Instructions { tenant: Uuid, id: Uuid },
    /// Check DNS now and activate the domain if delegated
    Verify { tenant: Uuid, id: Uuid },
    /// Make a verified domain the tenant's primary
    Primary { tenant: Uuid, id: Uuid },
    /// Remove a domain and its route
    Delete { tenant: Uuid, id: Uuid },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let domains = |tenant: &Uuid| format!("{}/api/tenants/{}/domains", cli.url, tenant);

    let (method, url, body) = match &cli.command {
        Commands::Health => (Method::GET, format!("{}/health", cli.url), None),
        Commands::List { tenant } => (Method::GET, domains(tenant), None),
        Commands::Add { tenant, domain, kind } => {
            let mut body = json!({ "domain": domain });
            if let Some(kind) = kind {
                body["type"] = json!(kind);
            }
            (Method::POST, domains(tenant), Some(body))
        }
        Commands::Show { tenant, id } => (Method::GET, format!("{}/{}", domains(tenant), id), None),
        Commands::Instructions { tenant, id } => (
            Method::GET,
            format!("{}/{}/instructions", domains(tenant), id),
            None,
        ),
        Commands::Verify { tenant, id } => (
            Method::POST,
            format!("{}/{}/verify", domains(tenant), id),
            None,
        ),
        Commands::Primary { tenant, id } => (
            Method::POST,
            format!("{}/{}/primary", domains(tenant), id),
            None,
        ),
        Commands::Delete { tenant, id } => {
            (Method::DELETE, format!("{}/{}", domains(tenant), id), None)
        }
    };

    let mut request = client.request(method, url).headers(headers);
    if let Some(body) = body {
        request = request.json(&body);
    }
    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
