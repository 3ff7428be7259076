use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use peer_transport::codec::encode_frame;

#[derive(Parser)]
#[command(name = "transport-cli")]
#[command(about = "Talk to a peer-transport node from the command line", long_about = None)]
struct Cli {
    /// Node address to dial
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    to: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send each argument as one length-prefixed frame
    Send {
        messages: Vec<String>,
    },
    /// Connect and report when the node closes the connection
    Probe {
        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut stream = TcpStream::connect(&cli.to).await?;
    println!("connected {} -> {}", stream.local_addr()?, stream.peer_addr()?);

    match cli.command {
        Commands::Send { messages } => {
            for message in &messages {
                stream.write_all(&encode_frame(message.as_bytes())?).await?;
            }
            stream.flush().await?;
            println!("sent {} frame(s)", messages.len());
        }
        Commands::Probe { timeout_secs } => {
            let mut buf = [0u8; 1024];
            let outcome = tokio::time::timeout(Duration::from_secs(timeout_secs), async {
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) => return Ok(()),
                        Ok(_) => continue,
                        Err(e) => return Err(e),
                    }
                }
            })
            .await;

            match outcome {
                Ok(Ok(())) => println!("node closed the connection"),
                Ok(Err(e)) => println!("connection error: {}", e),
                Err(_) => println!("connection still open after {}s", timeout_secs),
            }
        }
    }

    Ok(())
}
