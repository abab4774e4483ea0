// Per-connection worker.
//
// Each seated player gets one thread running `serve_connection`. The worker
// owns the read half of its socket; the write half lives in the session table
// as a `PeerWriter` so the other worker can push snapshots to it too.
//
// Lifecycle:
// - Entry: send this player a snapshot, and refresh the opponent (if any),
//   whose status flips from WAITING to PLAYING.
// - Loop: read one action byte with the tick interval as read timeout.
//   A move runs `turn::play_move`; a timeout advances the idle timer; QUIT,
//   EOF, an unknown byte, or any other read error ends the loop. The loop
//   also ends when the server is stopping.
// - Teardown: release the slot, send the survivor a WAITING snapshot (or
//   note the joint reset if nobody is left), and shut the socket down.
//
// Every step composes under the table lock and writes after releasing it.

use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tile_duel_protocol::{ProtocolError, SlotId, read_action};
use tracing::{debug, info, warn};

use crate::session::{Release, SessionTable};
use crate::snapshot::Dispatch;
use crate::turn::{IdleTimer, direction_of, play_move};

/// Why a connection's loop ended.
#[derive(Debug)]
enum Exit {
    Quit,
    Stopping,
    Failed(ProtocolError),
}

/// Serve the player seated in `id` until they leave or the server stops.
/// Always releases the slot before returning.
pub fn serve_connection(
    table: &SessionTable,
    id: SlotId,
    stream: TcpStream,
    tick: Duration,
    keep_running: &AtomicBool,
) {
    let exit = match stream.set_read_timeout(Some(tick)) {
        Ok(()) => run(table, id, &stream, keep_running),
        Err(e) => Exit::Failed(e.into()),
    };
    match exit {
        Exit::Quit => info!(%id, "player quit"),
        Exit::Stopping => debug!(%id, "server stopping"),
        Exit::Failed(e) if e.is_eof() => info!(%id, "connection closed"),
        Exit::Failed(e) => warn!(%id, error = %e, "dropping connection"),
    }
    teardown(table, id);
    stream.shutdown(Shutdown::Both).ok();
}

fn run(
    table: &SessionTable,
    id: SlotId,
    mut stream: &TcpStream,
    keep_running: &AtomicBool,
) -> Exit {
    let entry = {
        let slots = table.lock();
        Dispatch::to_all(&slots, None)
    };
    if let Err(e) = entry.deliver(Some(id)) {
        return Exit::Failed(e);
    }

    let mut idle = IdleTimer::default();
    while keep_running.load(Ordering::SeqCst) {
        let dispatch = match read_action(&mut stream) {
            Ok(action) => {
                idle.reset();
                let Some(dir) = direction_of(action) else {
                    return Exit::Quit;
                };
                let mut slots = table.lock();
                let outcome = play_move(&mut slots, id, dir);
                debug!(%id, ?action, ?outcome, "action applied");
                outcome.dispatch(&slots, id)
            }
            Err(e) if e.is_timeout() => {
                let mut slots = table.lock();
                idle.on_timeout(&mut slots, id).map(|forced| {
                    debug!(%id, ?forced, "forced idle attack");
                    Dispatch::to_all(&slots, forced.landed.then_some(id))
                })
            }
            Err(e) => return Exit::Failed(e),
        };
        let delivered = dispatch.map_or(Ok(()), |d| d.deliver(Some(id)));
        if let Err(e) = delivered {
            return Exit::Failed(e);
        }
    }
    Exit::Stopping
}

fn teardown(table: &SessionTable, id: SlotId) {
    let survivor = {
        let mut slots = table.lock();
        match slots.release(id) {
            Release::OpponentRemains(other) => Some(Dispatch::to_slot(&slots, other, None)),
            Release::Emptied => {
                info!(%id, "last player left; both games reset");
                None
            }
        }
    };
    if let Some(dispatch) = survivor {
        info!(%id, "slot freed; opponent waiting");
        // Failures toward the survivor are logged inside `deliver`.
        dispatch.deliver(None).ok();
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Write};
    use std::thread;

    use tile_duel_protocol::{Action, GameStatus, read_snapshot, write_action};

    use super::*;
    use crate::session::PeerWriter;
    use crate::session::tests::{seated_table, tcp_pair};

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn quit_frees_slot_and_tells_survivor() {
        let (table, clients) = seated_table(1);
        let (mut client, server) = tcp_pair();
        let id = table.assign(PeerWriter::new(server.try_clone().unwrap())).unwrap();
        assert_eq!(id, SlotId::SECOND);
        let keep_running = AtomicBool::new(true);

        let mut survivor = BufReader::new(clients[0].try_clone().unwrap());
        let mut own = BufReader::new(client.try_clone().unwrap());
        thread::scope(|s| {
            let worker = s.spawn(|| serve_connection(&table, id, server, TICK, &keep_running));

            // Entry: both get a PLAYING snapshot.
            assert_eq!(read_snapshot(&mut own).unwrap().status, GameStatus::Playing);
            assert_eq!(read_snapshot(&mut survivor).unwrap().status, GameStatus::Playing);

            write_action(&mut client, Action::Quit).unwrap();
            worker.join().unwrap();
        });

        assert_eq!(table.occupancy(), 1);
        assert_eq!(read_snapshot(&mut survivor).unwrap().status, GameStatus::Waiting);
    }

    #[test]
    fn unknown_action_byte_tears_down() {
        let (table, _) = seated_table(0);
        let (mut client, server) = tcp_pair();
        let id = table.assign(PeerWriter::new(server.try_clone().unwrap())).unwrap();
        let keep_running = AtomicBool::new(true);

        thread::scope(|s| {
            let worker = s.spawn(|| serve_connection(&table, id, server, TICK, &keep_running));
            let mut own = BufReader::new(client.try_clone().unwrap());
            assert_eq!(read_snapshot(&mut own).unwrap().status, GameStatus::Waiting);
            client.write_all(&[9]).unwrap();
            worker.join().unwrap();
        });
        assert_eq!(table.occupancy(), 0);
    }

    #[test]
    fn stop_flag_ends_the_loop() {
        let (table, _) = seated_table(0);
        let (client, server) = tcp_pair();
        let id = table.assign(PeerWriter::new(server.try_clone().unwrap())).unwrap();
        let keep_running = AtomicBool::new(true);

        thread::scope(|s| {
            let worker = s.spawn(|| serve_connection(&table, id, server, TICK, &keep_running));
            let mut own = BufReader::new(client.try_clone().unwrap());
            read_snapshot(&mut own).unwrap();
            keep_running.store(false, Ordering::SeqCst);
            worker.join().unwrap();
        });
        assert_eq!(table.occupancy(), 0);
    }
}
