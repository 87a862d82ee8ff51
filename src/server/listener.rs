use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ProcessOutcome, ReadStatus, WriteOutcome};
use crate::server::context::ServerContext;

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!(
        "Listening on {}, serving {}",
        cfg.server.listen_addr,
        cfg.static_files.root.display()
    );

    let ctx = Arc::new(ServerContext::new(cfg.static_files.clone()));
    let idle = Duration::from_secs(cfg.server.idle_timeout_secs);

    loop {
        let (socket, peer) = listener.accept().await?;

        if ctx.user_count() >= cfg.server.max_connections {
            warn!(peer = %peer, users = ctx.user_count(), "Too many connections, refusing");
            drop(socket);
            continue;
        }
        info!("Accepted connection from {}", peer);

        let conn = Connection::new(socket, peer, Arc::clone(&ctx));
        tokio::spawn(async move {
            if let Err(e) = serve(conn, idle).await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

/// Drives one connection from readiness notifications until it closes.
///
/// Each wait for readiness is bounded by `idle`; an idle connection is
/// closed without a response.
pub async fn serve(mut conn: Connection<TcpStream>, idle: Duration) -> anyhow::Result<()> {
    let result = drive(&mut conn, idle).await;
    conn.close_conn(true);
    result
}

async fn drive(conn: &mut Connection<TcpStream>, idle: Duration) -> anyhow::Result<()> {
    loop {
        match conn.process() {
            ProcessOutcome::Close => return Ok(()),
            ProcessOutcome::NeedRead => {
                let Some(socket) = conn.socket() else {
                    return Ok(());
                };
                match timeout(idle, socket.readable()).await {
                    Ok(ready) => ready?,
                    Err(_) => {
                        debug!(peer = %conn.peer_addr(), "Idle timeout");
                        return Ok(());
                    }
                }
                if conn.read()? == ReadStatus::PeerClosed {
                    return Ok(());
                }
            }
            ProcessOutcome::ReadyToWrite => loop {
                match conn.write()? {
                    WriteOutcome::KeepAlive => break,
                    WriteOutcome::Close => return Ok(()),
                    WriteOutcome::WouldBlock => {
                        let Some(socket) = conn.socket() else {
                            return Ok(());
                        };
                        match timeout(idle, socket.writable()).await {
                            Ok(ready) => ready?,
                            Err(_) => {
                                debug!(peer = %conn.peer_addr(), "Write timeout");
                                return Ok(());
                            }
                        }
                    }
                }
            },
        }
    }
}
