//! Line-oriented console transport: each stdin line is a chat message from
//! the local operator, replies are printed to stdout.

use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use super::{ChatEvent, OutgoingReply, TransportHandles};

pub const CONSOLE_CHANNEL: &str = "console";
pub const CONSOLE_AUTHOR: &str = "operator";

pub fn spawn_console() -> TransportHandles {
    let (events_tx, events_rx) = mpsc::unbounded_channel::<ChatEvent>();
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<OutgoingReply>();

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let event = ChatEvent {
                        channel: CONSOLE_CHANNEL.to_string(),
                        author: CONSOLE_AUTHOR.to_string(),
                        author_is_bot: false,
                        content: line,
                    };
                    if events_tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Console input closed");
                    break;
                }
                Err(e) => {
                    warn!("Console read error: {}", e);
                    break;
                }
            }
        }
    });

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(reply) = outgoing_rx.recv().await {
            let line = format!("{}\n", reply.content);
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                warn!("Console write error: {}", e);
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    TransportHandles {
        events_rx,
        outgoing_tx,
        tasks: vec![reader, writer],
    }
}
