//! chat - a line-based terminal client for chatterd.
//!
//! Reads commands from stdin and prints server lines to stdout. The session
//! ends when either the server closes the connection or stdin reaches EOF.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:9123".to_string());

    let stream = TcpStream::connect(&address).await.map_err(|e| {
        error!(%address, error = %e, "Failed to connect");
        e
    })?;
    info!(%address, "Connected");

    let mut framed = Framed::new(stream, LinesCodec::new());
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            inbound = framed.next() => match inbound {
                Some(Ok(line)) => println!("{line}"),
                Some(Err(e)) => {
                    error!(error = %e, "Read error");
                    break;
                }
                None => {
                    info!("Server closed the connection");
                    break;
                }
            },
            typed = stdin.next_line() => match typed {
                Ok(Some(line)) => {
                    if framed.send(line).await.is_err() {
                        info!("Server closed the connection");
                        break;
                    }
                }
                Ok(None) | Err(_) => break,
            },
        }
    }

    Ok(())
}
