use clap::Parser;
use std::net::SocketAddr;
use volley_server::{Server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "volley-server", about = "Echo target server for volley runs")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    address: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

    // Print "Listening on <addr>" once the server signals it is bound.
    tokio::spawn(async move {
        if let Ok(addr) = ready_rx.await {
            println!("Listening on {}", addr);
        }
    });

    Server::new(ServerConfig { address: args.address })
        .run(ready_tx)
        .await?;
    Ok(())
}
