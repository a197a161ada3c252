//! JSON-lines bridge to the UI process.
//!
//! Each stdin line is one [`UiToCore`] message; each outbound
//! [`CoreToUi`] message is written to stdout as one line. Logs go to stderr.

use std::io::{BufRead, Write};

use avatar_ipc::{decode_message, encode_message, CoreToUi, IpcError, UiToCore};
use avatar_scene::{OutboundUiMessages, UiCommand};
use bevy::prelude::*;
use tokio::sync::mpsc::{self, error::TryRecvError};

pub struct StdioBridgePlugin;

impl Plugin for StdioBridgePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(StdinBridge::spawn())
            .add_systems(PreUpdate, read_stdin)
            .add_systems(PostUpdate, write_stdout);
    }
}

/// Receiving end of the stdin reader thread
#[derive(Resource)]
pub struct StdinBridge {
    receiver: mpsc::UnboundedReceiver<Result<UiToCore, IpcError>>,
    closed: bool,
}

impl StdinBridge {
    fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            error!("stdin read failed: {}", e);
                            break;
                        }
                    };
                    let Some(decoded) = decode_line(&line) else {
                        continue;
                    };
                    if sender.send(decoded).is_err() {
                        break;
                    }
                }
                info!("stdin closed");
            });
        if let Err(e) = spawned {
            error!("Could not start stdin reader: {}", e);
        }
        Self {
            receiver,
            closed: false,
        }
    }
}

/// Decode one input line. Blank lines are skipped.
fn decode_line(line: &str) -> Option<Result<UiToCore, IpcError>> {
    if line.trim().is_empty() {
        return None;
    }
    Some(decode_message(line))
}

/// Reply sent for a line that could not be decoded
fn decode_error(e: &IpcError) -> CoreToUi {
    CoreToUi::Error {
        code: "invalid_message".to_string(),
        message: e.to_string(),
    }
}

fn read_stdin(
    mut bridge: ResMut<StdinBridge>,
    mut commands: MessageWriter<UiCommand>,
    mut outbound: ResMut<OutboundUiMessages>,
    mut exit: MessageWriter<AppExit>,
) {
    if bridge.closed {
        return;
    }
    loop {
        match bridge.receiver.try_recv() {
            Ok(Ok(msg)) => {
                debug!("UI -> core: {:?}", msg);
                commands.write(UiCommand(msg));
            }
            Ok(Err(e)) => {
                warn!("Ignoring malformed message: {}", e);
                outbound.send(decode_error(&e));
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                info!("UI disconnected, shutting down");
                bridge.closed = true;
                exit.write(AppExit::Success);
                break;
            }
        }
    }
}

fn write_stdout(mut outbound: ResMut<OutboundUiMessages>) {
    let messages = outbound.drain();
    if messages.is_empty() {
        return;
    }
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for msg in &messages {
        match encode_message(msg) {
            Ok(line) => {
                if let Err(e) = writeln!(out, "{}", line) {
                    error!("stdout write failed: {}", e);
                    return;
                }
            }
            Err(e) => error!("Could not encode {:?}: {}", msg, e),
        }
    }
    if let Err(e) = out.flush() {
        error!("stdout flush failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_ipc::HistoryCommand;

    #[test]
    fn test_blank_lines_skipped() {
        assert!(decode_line("").is_none());
        assert!(decode_line("   ").is_none());
    }

    #[test]
    fn test_decode_line() {
        let decoded = decode_line(r#"{"type":"HistoryCommand","data":"Redo"}"#);
        assert!(matches!(
            decoded,
            Some(Ok(UiToCore::HistoryCommand(HistoryCommand::Redo)))
        ));
    }

    #[test]
    fn test_malformed_line_becomes_error_reply() {
        let Some(Err(e)) = decode_line("{not json") else {
            panic!("expected a decode error");
        };
        match decode_error(&e) {
            CoreToUi::Error { code, message } => {
                assert_eq!(code, "invalid_message");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
