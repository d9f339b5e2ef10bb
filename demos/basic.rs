use resilient_http::{Request, RequestOptions, WebClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: basic <url>"))?;

    let client = WebClient::from_env()?;
    let response = client
        .send_request_with(
            &Request::get(url).header("Accept", "application/json"),
            &RequestOptions {
                max_attempts: Some(3),
                ..RequestOptions::default()
            },
        )
        .await?;

    println!("{} {}", response.status_code, response.status_message);
    println!("{}", response.text());

    Ok(())
}
