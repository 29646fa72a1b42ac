use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use std::io::Write;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Command line client for the inference proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print recently recorded generate queries, newest first
    History,
    /// Send a generation request and stream the reply
    Generate {
        /// Model to run
        #[arg(short, long)]
        model: String,
        /// Prompt text
        prompt: String,
        /// Raw query string recorded in the proxy history (e.g. "q=hello")
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Ask the model server to pull a model
    Pull {
        /// Model to pull
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    match cli.command {
        Commands::History => {
            let res = client.get(format!("{}/history", cli.url)).send().await?;
            if !check_status(&res) {
                return Ok(());
            }
            print!("{}", res.text().await?);
        }
        Commands::Generate { model, prompt, query } => {
            let mut url = format!("{}/generate", cli.url);
            if let Some(q) = query {
                url.push('?');
                url.push_str(&q);
            }
            let res = client
                .post(url)
                .headers(headers)
                .json(&json!({ "model": model, "prompt": prompt }))
                .send()
                .await?;
            stream_response(res).await?;
        }
        Commands::Pull { model } => {
            let res = client
                .post(format!("{}/pull", cli.url))
                .headers(headers)
                .json(&json!({ "model": model }))
                .send()
                .await?;
            stream_response(res).await?;
        }
    }

    Ok(())
}

fn check_status(res: &reqwest::Response) -> bool {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
    }
    status.is_success()
}

/// Print a newline-delimited JSON stream, showing the `response` or
/// `status` field of each object when present.
async fn stream_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let ok = check_status(&res);
    let mut stream = res.bytes_stream();
    let mut pending = Vec::new();
    let mut stdout = std::io::stdout();

    while let Some(chunk) = stream.next().await {
        pending.extend_from_slice(&chunk?);
        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            print_line(&mut stdout, &line, ok)?;
        }
    }
    if !pending.is_empty() {
        print_line(&mut stdout, &pending, ok)?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn print_line(out: &mut impl Write, line: &[u8], ok: bool) -> std::io::Result<()> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(v) if ok => {
            if let Some(s) = v.get("response").and_then(Value::as_str) {
                write!(out, "{}", s)?;
            } else if let Some(s) = v.get("status").and_then(Value::as_str) {
                writeln!(out, "{}", s)?;
            } else {
                writeln!(out, "{}", v)?;
            }
        }
        _ => writeln!(out, "{}", text)?,
    }
    out.flush()
}
