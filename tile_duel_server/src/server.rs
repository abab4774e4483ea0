// TCP listener and worker supervision.
//
// Architecture: one accept thread plus one worker thread per seated player.
//
// - **Accept thread** (`run_accept_loop`): polls a non-blocking listener so
//   it can check `keep_running` between attempts. Each new connection is
//   offered to the `SessionTable`; when both slots are taken the stream is
//   closed without writing anything. Otherwise a named worker thread runs
//   `handler::serve_connection` for it.
// - **Workers**: block on their own socket with the tick interval as read
//   timeout, and take the table lock for each step (see `handler.rs`).
//   Sockets also get a write timeout of a few ticks, so a player who stops
//   reading is dropped rather than stalling whoever writes to them.
//
// The accept thread keeps the `JoinHandle` of every worker it spawned and
// reaps finished ones while idle. Shutdown: `ServerHandle::stop` clears
// `keep_running`; workers notice within one tick and tear down, the accept
// loop exits and joins all of them before its own thread ends.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tile_duel_prng::TileRng;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::serve_connection;
use crate::session::{PeerWriter, SessionTable};

/// Sleep between accept attempts when no connection is pending.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// A write that makes no progress for this many ticks fails, and the
/// connection is dropped.
const WRITE_TIMEOUT_TICKS: u32 = 5;

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    table: Arc<SessionTable>,
}

impl ServerHandle {
    /// The live session table. Lets embedders and tests inspect or arrange
    /// game state under the same lock the workers use.
    pub fn table(&self) -> &SessionTable {
        &self.table
    }

    /// Signal the server to stop and wait for the accept loop and every
    /// connection worker to finish.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.wait();
    }

    /// Block until the server stops on its own (for the standalone binary,
    /// that is never).
    pub fn join(mut self) {
        self.wait();
    }

    fn wait(&mut self) {
        let panicked = self.thread.take().is_some_and(|handle| handle.join().is_err());
        if panicked {
            warn!("accept thread panicked");
        }
    }
}

/// Bind the listener and start the accept loop on a background thread.
/// Returns a handle for stopping it and the actual bound address (useful
/// when port 0 is used to let the OS pick a free port).
pub fn start_server(config: ServerConfig) -> Result<(ServerHandle, SocketAddr), ServerError> {
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).map_err(|source| ServerError::Bind {
        addr: bind_addr,
        source,
    })?;
    let addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    let rng = config.seed.map_or_else(TileRng::from_entropy, TileRng::new);
    let table = Arc::new(SessionTable::new(config.rules.clone(), rng));
    let keep_running = Arc::new(AtomicBool::new(true));
    let tick = config.tick_interval();

    let thread = {
        let table = Arc::clone(&table);
        let keep_running = Arc::clone(&keep_running);
        thread::Builder::new()
            .name("tile-duel-accept".into())
            .spawn(move || run_accept_loop(listener, table, tick, keep_running))?
    };

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
            table,
        },
        addr,
    ))
}

/// Accept loop. Runs until `keep_running` is cleared, then joins all workers.
fn run_accept_loop(
    listener: TcpListener,
    table: Arc<SessionTable>,
    tick: Duration,
    keep_running: Arc<AtomicBool>,
) {
    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    while keep_running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Some(worker) = admit(stream, peer, &table, tick, &keep_running) {
                    workers.push(worker);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                reap_finished(&mut workers);
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }

    for worker in workers {
        if worker.join().is_err() {
            warn!("connection worker panicked");
        }
    }
    info!("server stopped");
}

/// Seat a new connection and spawn its worker, or close it if the table is
/// full.
fn admit(
    stream: TcpStream,
    peer: SocketAddr,
    table: &Arc<SessionTable>,
    tick: Duration,
    keep_running: &Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    if let Err(e) = stream.set_nonblocking(false) {
        warn!(%peer, error = %e, "could not configure connection");
        return None;
    }
    stream.set_nodelay(true).ok();
    if let Err(e) = stream.set_write_timeout(Some(tick * WRITE_TIMEOUT_TICKS)) {
        warn!(%peer, error = %e, "could not set write timeout");
        return None;
    }
    let write_half = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!(%peer, error = %e, "could not clone connection");
            return None;
        }
    };

    let Some(id) = table.assign(PeerWriter::new(write_half)) else {
        info!(%peer, "server full; rejecting connection");
        stream.shutdown(Shutdown::Both).ok();
        return None;
    };
    info!(%peer, %id, "player connected");

    let worker_table = Arc::clone(table);
    let worker_flag = Arc::clone(keep_running);
    let spawned = thread::Builder::new()
        .name(format!("tile-duel-slot-{}", id.index()))
        .spawn(move || serve_connection(&worker_table, id, stream, tick, &worker_flag));
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(%peer, %id, error = %e, "could not spawn connection worker");
            table.release(id);
            None
        }
    }
}

/// Join workers that have already exited.
fn reap_finished(workers: &mut Vec<JoinHandle<()>>) {
    let (finished, running): (Vec<_>, Vec<_>) =
        workers.drain(..).partition(|worker| worker.is_finished());
    *workers = running;
    for worker in finished {
        if worker.join().is_err() {
            warn!("connection worker panicked");
        }
    }
}
