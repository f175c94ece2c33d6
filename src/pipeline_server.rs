/*!
# Pipeline Front-End

Accepts TCP clients and, for each, runs a session loop on its own thread:
read one command (possibly multi-line, for `Newgraph`), submit it to the
shared [`Pipeline`], block on its [`Completion`], write the reply. The
listener is polled non-blocking so the accept loop can also observe
[`ShutdownCoordinator::is_shutting_down`] without a dedicated cancellation
mechanism.
*/

use crate::concurrency::pipeline::Pipeline;
use crate::config::ServerConfig;
use crate::error::{MstError, Result};
use crate::protocol::{self, Command};
use crate::session::{Completion, SharedState};
use crate::shutdown::ShutdownCoordinator;
use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(config: ServerConfig, shutdown: ShutdownCoordinator) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .map_err(|e| MstError::fatal_setup(format!("bind failed: {e}")))?;
    listener
        .set_nonblocking(true)
        .map_err(|e| MstError::fatal_setup(e.to_string()))?;
    tracing::info!(port = config.port, backlog = config.backlog, "pipeline server listening");

    let state = Arc::new(SharedState::new());
    let pipeline = Arc::new(Pipeline::new());

    while !shutdown.is_shutting_down() {
        match listener.accept() {
            Ok((stream, addr)) => {
                tracing::info!(%addr, "client connected");
                let state = Arc::clone(&state);
                let pipeline = Arc::clone(&pipeline);
                let shutdown = shutdown.clone();
                std::thread::spawn(move || {
                    if let Err(err) = serve_client(stream, state, pipeline, shutdown) {
                        tracing::warn!(error = %err, "client session ended with an error");
                    }
                });
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => return Err(MstError::fatal_runtime(e.to_string())),
        }
    }
    tracing::info!("pipeline server shutting down");
    Ok(())
}

fn serve_client(
    stream: TcpStream,
    state: Arc<SharedState>,
    pipeline: Arc<Pipeline>,
    shutdown: ShutdownCoordinator,
) -> Result<()> {
    stream.set_nonblocking(false)?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    loop {
        if shutdown.is_shutting_down() {
            return Ok(());
        }
        let command = match protocol::read_command(&mut reader)? {
            Some(command) => command,
            None => return Ok(()),
        };
        let is_exit = matches!(command, Command::Exit);

        let completion = Arc::new(Completion::new());
        pipeline.submit(command, Arc::clone(&state), Arc::clone(&completion));
        let reply = completion.wait();

        writer.write_all(reply.as_bytes())?;
        writer.write_all(b"\n")?;

        if is_exit {
            return Ok(());
        }
    }
}
