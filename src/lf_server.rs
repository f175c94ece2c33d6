/*!
# Leader-Follower Front-End

Wires a [`Reactor`] to the shared command dispatcher: the listening socket is
one handle whose handler accepts new clients and registers each with its own
handle; a client handle's handler reads and answers exactly one command per
readiness notification. A pool of [`LfThreadPool`] workers takes turns being
the leader blocked inside the reactor's `select`.
*/

use crate::concurrency::lf_pool::LfThreadPool;
use crate::concurrency::reactor::{EventKind, Reactor};
use crate::config::LfServerConfig;
use crate::error::{MstError, Result};
use crate::protocol::{self, Command};
use crate::session::SharedState;
use crate::shutdown::ShutdownCoordinator;
use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::Arc;
use std::time::Duration;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(config: LfServerConfig, shutdown: ShutdownCoordinator) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.server.port))
        .map_err(|e| MstError::fatal_setup(format!("bind failed: {e}")))?;
    tracing::info!(
        port = config.server.port,
        pool_size = config.pool_size,
        "lf server listening"
    );

    let state = Arc::new(SharedState::new());
    let mut reactor = Reactor::new()?;
    let registry = reactor.registry();

    let accept_state = Arc::clone(&state);
    let listener_fd = listener.as_raw_fd();
    reactor.add_handle(
        listener_fd,
        EventKind::Accept,
        Box::new(move || accept_one(&listener, &registry, &accept_state)),
    );

    let select_timeout = config.select_timeout();
    let pool = LfThreadPool::new(config.pool_size, reactor, select_timeout);

    while !shutdown.is_shutting_down() {
        std::thread::sleep(SHUTDOWN_POLL_INTERVAL);
    }
    tracing::info!("lf server shutting down");
    pool.stop();
    Ok(())
}

fn accept_one(
    listener: &TcpListener,
    registry: &crate::concurrency::reactor::Registry,
    state: &Arc<SharedState>,
) {
    match listener.accept() {
        Ok((stream, addr)) => {
            tracing::info!(%addr, "client connected");
            register_client(stream, registry.clone(), Arc::clone(state));
        }
        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
        Err(err) => tracing::warn!(error = %err, "accept failed"),
    }
}

fn register_client(
    stream: TcpStream,
    registry: crate::concurrency::reactor::Registry,
    state: Arc<SharedState>,
) {
    let fd = stream.as_raw_fd();
    let writer = match stream.try_clone() {
        Ok(w) => w,
        Err(err) => {
            tracing::warn!(error = %err, "failed to clone client stream");
            return;
        }
    };
    let mut reader = BufReader::new(stream);
    let mut writer = writer;

    let handler_registry = registry.clone();
    registry.add(
        fd,
        EventKind::Read,
        Box::new(move || {
            handle_client_ready(fd, &mut reader, &mut writer, &state, &handler_registry)
        }),
    );
}

fn handle_client_ready(
    fd: RawFd,
    reader: &mut BufReader<TcpStream>,
    writer: &mut TcpStream,
    state: &Arc<SharedState>,
    registry: &crate::concurrency::reactor::Registry,
) {
    match protocol::read_command(reader) {
        Ok(Some(command)) => {
            let is_exit = matches!(command, Command::Exit);
            let reply = state.dispatch(command);
            if writer.write_all(reply.as_bytes()).is_ok() {
                let _ = writer.write_all(b"\n");
            }
            if is_exit {
                registry.remove(fd);
            }
        }
        Ok(None) => registry.remove(fd),
        Err(err) => {
            tracing::warn!(error = %err, "client session ended with an error");
            registry.remove(fd);
        }
    }
}
