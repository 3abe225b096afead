use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the local API gateway", long_about = None)]
struct Cli {
    /// Direct invocation listener (base port + 2)
    #[arg(long, default_value = "http://localhost:3002")]
    invoke_url: String,

    /// WebSocket listener (base port + 1)
    #[arg(long, default_value = "http://localhost:3001")]
    websocket_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a function with a raw payload
    Invoke {
        function: String,
        /// JSON payload sent as-is
        #[arg(short, long, default_value = "{}")]
        payload: String,
        /// Fire and forget (Event invocation)
        #[arg(long)]
        event: bool,
    },
    /// Push a frame to a connected WebSocket client
    Post {
        connection_id: String,
        data: String,
        #[arg(short, long, default_value = "dev")]
        stage: String,
    },
    /// Show a WebSocket connection's details
    Connection {
        connection_id: String,
        #[arg(short, long, default_value = "dev")]
        stage: String,
    },
    /// Close a WebSocket connection
    Disconnect {
        connection_id: String,
        #[arg(short, long, default_value = "dev")]
        stage: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Invoke { function, payload, event } => {
            let invocation_type = if event { "Event" } else { "RequestResponse" };
            let res = client
                .post(format!("{}/2015-03-31/functions/{}/invocations", cli.invoke_url, function))
                .header("X-Amz-Invocation-Type", invocation_type)
                .header(CONTENT_TYPE, "application/json")
                .body(payload)
                .send()
                .await?;
            if let Some(error) = res.headers().get("x-amz-function-error") {
                eprintln!("Function error: {}", error.to_str().unwrap_or("unknown"));
            }
            print_response(res).await?;
        }
        Commands::Post { connection_id, data, stage } => {
            let res = client
                .post(connection_url(&cli.websocket_url, &stage, &connection_id))
                .body(data)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Connection { connection_id, stage } => {
            let res = client
                .get(connection_url(&cli.websocket_url, &stage, &connection_id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Disconnect { connection_id, stage } => {
            let res = client
                .delete(connection_url(&cli.websocket_url, &stage, &connection_id))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn connection_url(base: &str, stage: &str, connection_id: &str) -> String {
    format!("{}/{}/@connections/{}", base, stage, connection_id)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
