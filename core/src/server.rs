//! Command channel: a Unix domain socket accepting one token per connection.
//!
//! The listener runs on its own thread with a current-thread tokio runtime.
//! Connections are handled strictly one after another, so commands reach the
//! [`CommandHandler`] in arrival order and never concurrently.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::oneshot;

use crate::command::{extract_token, Command};
use crate::dispatch::CommandHandler;

/// Longest payload read from a single connection.
const MAX_PAYLOAD: usize = 1024;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind command socket {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("command server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running command channel. Dropping it stops the listener and removes the
/// socket file.
pub struct CommandServer {
    path: PathBuf,
    read_timeout: Duration,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CommandServer {
    pub fn start(path: &Path, handler: Arc<dyn CommandHandler>) -> Result<Self, ServerError> {
        Self::start_with_timeout(path, handler, DEFAULT_READ_TIMEOUT)
    }

    /// Bind `path` and start serving. A stale socket file left at `path` by
    /// a previous run is removed first; any other bind failure is returned.
    pub fn start_with_timeout(
        path: &Path,
        handler: Arc<dyn CommandHandler>,
        read_timeout: Duration,
    ) -> Result<Self, ServerError> {
        remove_stale_socket(path)?;

        let bind_error = |source| ServerError::Bind {
            path: path.to_path_buf(),
            source,
        };
        let std_listener = std::os::unix::net::UnixListener::bind(path).map_err(bind_error)?;
        std_listener.set_nonblocking(true)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        let listener = {
            let _guard = runtime.enter();
            UnixListener::from_std(std_listener)?
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let thread = thread::Builder::new()
            .name("cyfi-command-server".to_string())
            .spawn(move || {
                runtime.block_on(serve(listener, handler, read_timeout, shutdown_rx));
            })?;

        log::info!("CommandServer: Listening on {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            read_timeout,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop this server and start a new one on the same socket path bound to
    /// `handler`. The old listener releases the address before the new one
    /// binds it.
    pub fn replace(mut self, handler: Arc<dyn CommandHandler>) -> Result<Self, ServerError> {
        self.stop();
        log::info!("CommandServer: Rebinding {} to a new handler", self.path.display());
        Self::start_with_timeout(&self.path, handler, self.read_timeout)
    }

    /// Stop listening and remove the socket file.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if thread.join().is_err() {
            log::error!("CommandServer: Listener thread panicked");
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "CommandServer: Failed to remove {}: {}",
                self.path.display(),
                e
            ),
        }
        log::info!("CommandServer: Stopped listening on {}", self.path.display());
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn remove_stale_socket(path: &Path) -> Result<(), ServerError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::info!("CommandServer: Removed stale socket {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ServerError::Bind {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn serve(
    listener: UnixListener,
    handler: Arc<dyn CommandHandler>,
    read_timeout: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                log::debug!("CommandServer: Shutdown requested");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => handle_connection(stream, handler.as_ref(), read_timeout).await,
                Err(e) => {
                    log::warn!("CommandServer: Accept failed: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
        }
    }
}

async fn handle_connection(mut stream: UnixStream, handler: &dyn CommandHandler, read_timeout: Duration) {
    let payload = match tokio::time::timeout(read_timeout, read_payload(&mut stream)).await {
        Ok(Ok(payload)) => payload,
        Ok(Err(e)) => {
            log::warn!("CommandServer: Read failed: {}", e);
            return;
        }
        Err(_) => {
            log::warn!("CommandServer: Client sent nothing within {:?}", read_timeout);
            return;
        }
    };

    let Some(token) = extract_token(&payload) else {
        log::debug!("CommandServer: Empty payload ignored");
        return;
    };
    let Some(command) = Command::parse(&token) else {
        log::warn!("CommandServer: Unknown command '{}'", token);
        return;
    };

    log::info!("CommandServer: Received '{}'", command);
    if catch_unwind(AssertUnwindSafe(|| handler.handle(command))).is_err() {
        log::error!("CommandServer: Handler panicked on '{}'", command);
    }
}

/// Read until a line or NUL terminator, EOF or [`MAX_PAYLOAD`] bytes.
async fn read_payload(stream: &mut UnixStream) -> std::io::Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(64);
    let mut chunk = [0u8; 256];
    while payload.len() < MAX_PAYLOAD {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        payload.extend_from_slice(&chunk[..n]);
        if chunk[..n].iter().any(|b| *b == b'\n' || *b == 0) {
            break;
        }
    }
    payload.truncate(MAX_PAYLOAD);
    Ok(payload)
}
