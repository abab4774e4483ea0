// TCP client for a Tile Duel server.
//
// Programmatic counterpart of the terminal client, used by the integration
// tests and by anything that wants to drive a game without a UI.
// Architecture:
// - `connect()` opens the TCP stream on the calling thread, then spawns a
//   background reader thread.
// - The reader thread decodes fixed-size snapshot records in a loop and pushes
//   them into an `mpsc` channel. It exits on EOF, on a malformed record, or
//   when the receiver is dropped; the channel then reports disconnection.
// - The calling thread holds a `BufWriter<TcpStream>` for sending actions.
// - `poll()` drains the inbox without blocking; `recv_timeout()` waits for
//   the next snapshot.
//
// The server signals "full" by closing the connection without sending
// anything, so `wait_first_snapshot()` reports a disconnect before any
// record as `ClientError::ServerFull`.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tile_duel_protocol::{Action, Snapshot, read_snapshot, write_action};
use tracing::debug;

use crate::error::ClientError;

pub struct Client {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<Snapshot>,
    reader_thread: Option<JoinHandle<()>>,
}

impl Client {
    /// Connect and start the background reader.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).map_err(ClientError::Connect)?;
        stream.set_nodelay(true).ok();
        let reader_stream = stream.try_clone().map_err(ClientError::Connect)?;

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::Builder::new()
            .name("tile-duel-client-reader".into())
            .spawn(move || reader_loop(BufReader::new(reader_stream), tx))
            .map_err(ClientError::Connect)?;

        Ok(Self {
            writer: BufWriter::new(stream),
            inbox: rx,
            reader_thread: Some(reader_thread),
        })
    }

    pub fn send(&mut self, action: Action) -> Result<(), ClientError> {
        write_action(&mut self.writer, action)?;
        Ok(())
    }

    /// Drain all snapshots received so far (non-blocking).
    pub fn poll(&self) -> Vec<Snapshot> {
        self.inbox.try_iter().collect()
    }

    /// Wait up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Snapshot, ClientError> {
        self.inbox.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => ClientError::Timeout,
            RecvTimeoutError::Disconnected => ClientError::Disconnected,
        })
    }

    /// Wait for the snapshot the server sends on entry. A connection closed
    /// before it arrives means both slots were taken.
    pub fn wait_first_snapshot(&self, timeout: Duration) -> Result<Snapshot, ClientError> {
        match self.recv_timeout(timeout) {
            Err(ClientError::Disconnected) => Err(ClientError::ServerFull),
            other => other,
        }
    }

    /// Send QUIT and close the write half. Snapshots already in flight can
    /// still be drained with `poll()`.
    pub fn quit(&mut self) -> Result<(), ClientError> {
        self.send(Action::Quit)?;
        self.writer.get_ref().shutdown(Shutdown::Write).ok();
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.writer.get_ref().shutdown(Shutdown::Both).ok();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Reader thread: decode snapshot records in a loop, push to channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<Snapshot>) {
    loop {
        match read_snapshot(&mut reader) {
            Ok(snapshot) => {
                if tx.send(snapshot).is_err() {
                    break; // Client dropped the receiver
                }
            }
            Err(e) if e.is_eof() => break,
            Err(e) => {
                debug!(error = %e, "client reader stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use tile_duel_protocol::{GameStatus, read_action, write_snapshot};

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn receives_snapshots_and_sends_actions() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = Client::connect(listener.local_addr().unwrap()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        write_snapshot(&mut server, &Snapshot::waiting()).unwrap();
        assert_eq!(
            client.wait_first_snapshot(WAIT).unwrap().status,
            GameStatus::Waiting
        );
        assert!(client.poll().is_empty());

        client.send(Action::MoveLeft).unwrap();
        client.quit().unwrap();
        assert_eq!(read_action(&mut server).unwrap(), Action::MoveLeft);
        assert_eq!(read_action(&mut server).unwrap(), Action::Quit);
    }

    #[test]
    fn close_before_first_snapshot_means_full() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = Client::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        drop(server);

        assert!(matches!(
            client.wait_first_snapshot(WAIT),
            Err(ClientError::ServerFull)
        ));
    }

    #[test]
    fn recv_times_out_when_idle() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = Client::connect(listener.local_addr().unwrap()).unwrap();
        let (_server, _) = listener.accept().unwrap();

        assert!(matches!(
            client.recv_timeout(Duration::from_millis(30)),
            Err(ClientError::Timeout)
        ));
    }
}
