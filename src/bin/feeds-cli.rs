use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "feeds-cli")]
#[command(about = "Management CLI for the portfolio feeds service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "FEEDS_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key (only needed for `status` and `cache`).
    #[arg(short, long, env = "FEEDS_ADMIN_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service version and enabled feeds
    Status,
    /// Inspect cache age and freshness per feed
    Cache,
    /// Fetch one feed the way the site does
    Get {
        #[arg(value_enum)]
        feed: FeedName,
        /// Content collection (experience, project, certification)
        #[arg(required_if_eq("feed", "content"))]
        collection: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedName {
    NowPlaying,
    Presence,
    Analytics,
    Github,
    Content,
}

impl FeedName {
    fn path(&self, collection: Option<&str>) -> String {
        match self {
            FeedName::NowPlaying => "/api/now-playing".to_string(),
            FeedName::Presence => "/api/presence".to_string(),
            FeedName::Analytics => "/api/analytics".to_string(),
            FeedName::Github => "/api/github".to_string(),
            FeedName::Content => format!("/api/content/{}", collection.unwrap_or_default()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let res = match &cli.command {
        Commands::Status => {
            client
                .get(format!("{base}/admin/status"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Cache => {
            client
                .get(format!("{base}/admin/cache"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Get { feed, collection } => {
            let res = client
                .get(format!("{base}{}", feed.path(collection.as_deref())))
                .send()
                .await?;
            if let Some(outcome) = res.headers().get("x-feed-outcome") {
                eprintln!("outcome: {}", outcome.to_str().unwrap_or("?"));
            }
            res
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
