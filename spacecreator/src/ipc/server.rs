use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use spacecreator_ipc::{Command, Response};

use crate::app::IpcCommandWithResponse;

use super::SOCKET_PATH;

/// Line-delimited JSON command socket. Each request line is forwarded to the
/// automation loop and answered with exactly one response line.
pub struct IpcServer {
    socket_path: PathBuf,
    cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
}

impl IpcServer {
    pub fn new(cmd_tx: mpsc::Sender<IpcCommandWithResponse>) -> Self {
        Self::with_path(PathBuf::from(SOCKET_PATH), cmd_tx)
    }

    pub fn with_path(socket_path: PathBuf, cmd_tx: mpsc::Sender<IpcCommandWithResponse>) -> Self {
        Self {
            socket_path,
            cmd_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        // A stale socket from a previous run blocks bind
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let cmd_tx = self.cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, cmd_tx).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => tracing::error!("Accept error: {}", e),
            }
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn handle_connection(
    stream: UnixStream,
    cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(request) {
            Ok(cmd) => forward(cmd, &cmd_tx).await,
            Err(e) => Response::Error {
                message: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

async fn forward(cmd: Command, cmd_tx: &mpsc::Sender<IpcCommandWithResponse>) -> Response {
    tracing::debug!("Received command: {:?}", cmd);
    let (resp_tx, mut resp_rx) = mpsc::channel(1);

    if cmd_tx.send((cmd, resp_tx)).await.is_err() {
        return Response::Error {
            message: "Internal error: command channel closed".to_string(),
        };
    }
    resp_rx.recv().await.unwrap_or(Response::Error {
        message: "Internal error: no response".to_string(),
    })
}
