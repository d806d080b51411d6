// Interactive console: type XF;YB;ZL;WR sequences, stop, status, help, quit
use clap::Parser;
use crossterm::style::{Color, Stylize, style};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::info;

use lbot_socket_runtime::motion::{parse, split_sequence};

#[derive(Debug, Parser)]
#[command(name = "lbot-console", about = "Interactive client for lbot-runtime")]
struct Args {
    /// Runtime host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Runtime command port
    #[arg(long, default_value_t = 9999)]
    port: u16,
}

const HELP: &str = "\
Format: XF;YB;ZL;WR
  F = forward, B = backward (X units)
  L / R = turn 90° then move X units
  R<deg>L / R<deg>R = rotate in place, e.g. R90L
Examples:
  10F        move 10 units forward
  10F;R90R   move 10 forward, then rotate 90° right
  23B;7L;8F  back 23, turn left and move 7, forward 8
Special: stop, status, help, quit";

/// Local check before sending; the runtime validates again
fn is_valid_line(line: &str) -> bool {
    let tokens = split_sequence(line);
    !tokens.is_empty() && tokens.into_iter().all(|token| parse(token).is_ok())
}

fn print_response(line: &str) {
    let color = if line.starts_with("ERROR:") {
        Color::Red
    } else if line.starts_with("OK:") {
        Color::Green
    } else if line.starts_with("STATUS:") {
        Color::Cyan
    } else {
        Color::Yellow
    };
    println!("{}", style(line).with(color));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    info!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    let (read_half, mut write_half) = stream.into_split();

    // Print whatever the runtime sends, until it hangs up
    let receiver = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            print_response(&line);
        }
        println!("{}", "Disconnected.".dark_grey());
    });

    println!("{}", HELP);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(input) = stdin.next_line().await? {
        let command = input.trim();
        if command.is_empty() {
            continue;
        }

        let lower = command.to_lowercase();
        match lower.as_str() {
            "help" => {
                println!("{}", HELP);
                continue;
            }
            "quit" | "exit" | "q" => {
                write_half.write_all(b"quit\n").await?;
                break;
            }
            "stop" | "status" => {}
            _ if is_valid_line(command) => {}
            _ => {
                println!("{}", "Invalid format! Use: XF;YB;ZL;WR (e.g. 10F;5R), or type help".red());
                continue;
            }
        }

        write_half.write_all(format!("{}\n", command).as_bytes()).await?;
        if receiver.is_finished() {
            break;
        }
    }

    // Let the last replies arrive before exiting
    let _ = tokio::time::timeout(std::time::Duration::from_millis(500), receiver).await;
    Ok(())
}
