//! Capture trigger — the "button".
//!
//! Each line read from the input is one activation: an empty line or `c`
//! captures, `q` quits. EOF quits as well.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Capture,
    Quit,
}

/// Map one input line to an event. Unknown input is ignored.
pub fn parse_line(line: &str) -> Option<TriggerEvent> {
    match line.trim().to_lowercase().as_str() {
        "" | "c" | "capture" => Some(TriggerEvent::Capture),
        "q" | "quit" | "exit" => Some(TriggerEvent::Quit),
        _ => None,
    }
}

/// Read lines from `reader` on a background task and forward trigger events.
pub fn spawn_line_trigger<R>(reader: R) -> mpsc::Receiver<TriggerEvent>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_line(&line) {
                    Some(event) => {
                        if tx.send(event).await.is_err() || event == TriggerEvent::Quit {
                            return;
                        }
                    }
                    None => log::warn!("[TRIGGER] Ignoring input {:?}", line.trim()),
                },
                Ok(None) => break,
                Err(e) => {
                    log::error!("[TRIGGER] Failed to read input: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(TriggerEvent::Quit).await;
    });
    rx
}

/// Trigger driven by the terminal.
pub fn stdin_trigger() -> mpsc::Receiver<TriggerEvent> {
    spawn_line_trigger(tokio::io::stdin())
}
