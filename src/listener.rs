//! TCP intake: one syslog message per connection, each handled on its own task.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::Result;
use crate::config::ListenerSettings;
use crate::error::{Error, ListenerError};
use crate::relay::{Outcome, Relay};
use crate::webhook::body_preview;

const READ_CHUNK: usize = 1024;
/// Pause after a failed `accept`, so fd exhaustion does not spin the loop.
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

pub struct Listener {
    inner: TcpListener,
    settings: ListenerSettings,
}

impl Listener {
    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] when the socket cannot be bound.
    pub async fn bind(settings: &ListenerSettings) -> Result<Self> {
        let inner = TcpListener::bind(settings.addr)
            .await
            .map_err(|source| ListenerError::Bind {
                address: settings.addr,
                source,
            })?;
        Ok(Self {
            inner,
            settings: settings.clone(),
        })
    }

    /// Address actually bound, useful when the configured port is 0.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner
            .local_addr()
            .map_err(|source| Error::from(ListenerError::LocalAddr { source }))
    }

    /// Accept connections until `shutdown` resolves, then wait for in-flight
    /// connections to finish.
    ///
    /// At most `max_connections` connections are processed at once; further
    /// connections wait in the kernel backlog.
    pub async fn serve<F>(self, relay: Arc<Relay>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let permits = Arc::new(Semaphore::new(self.settings.max_connections));
        let mut tasks = JoinSet::new();

        loop {
            let permit = tokio::select! {
                biased;
                () = &mut shutdown => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                biased;
                () = &mut shutdown => break,
                accepted = self.inner.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(source) => {
                        let err = ListenerError::Accept { source };
                        warn!(error = %err, "accept failed");
                        sleep(ACCEPT_ERROR_PAUSE).await;
                        continue;
                    }
                },
            };

            let conn_id = Uuid::now_v7();
            let span = info_span!("connection", %peer, %conn_id);
            let relay = Arc::clone(&relay);
            let settings = self.settings.clone();
            tasks.spawn(
                async move {
                    let _permit = permit;
                    handle_connection(stream, peer, &settings, &relay).await;
                }
                .instrument(span),
            );

            while let Some(joined) = tasks.try_join_next() {
                if let Err(err) = joined {
                    warn!(error = %err, "connection task failed");
                }
            }
        }

        info!(in_flight = tasks.len(), "listener stopped accepting connections");
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "connection task failed");
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    settings: &ListenerSettings,
    relay: &Relay,
) {
    debug!("connection established");
    let message = match read_message(
        &mut stream,
        peer,
        settings.max_message_bytes,
        settings.read_timeout,
    )
    .await
    {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "dropping connection");
            return;
        }
    };
    debug!(bytes = message.len(), raw = %body_preview(message.as_bytes()), "received syslog message");

    match relay.process(&message).await {
        Ok(Outcome::Delivered(delivery)) => {
            info!(
                status = %delivery.status,
                attempts = delivery.attempts,
                "alarm forwarded"
            );
        }
        Ok(Outcome::Skipped { text }) => {
            info!(markdown = %text, "dry-run: would forward alarm");
        }
        Err(Error::Payload(err)) => {
            warn!(
                error = %err,
                input = %body_preview(message.as_bytes()),
                "dropping malformed alarm payload"
            );
        }
        Err(err) => {
            warn!(error = %err, "webhook delivery failed");
        }
    }
}

/// Read one message: everything the peer sends until EOF, `max_bytes`, or
/// the read deadline, whichever comes first. Line feeds inside the payload
/// are kept; one trailing `\n` or `\r\n` is trimmed. Bytes past the limit
/// are dropped.
///
/// # Errors
///
/// Returns [`ListenerError::Read`] on socket errors, [`ListenerError::Idle`]
/// when the deadline passes with nothing received, and
/// [`ListenerError::Decode`] when the bytes are not UTF-8.
pub async fn read_message<R>(
    reader: &mut R,
    peer: SocketAddr,
    max_bytes: usize,
    read_timeout: Duration,
) -> std::result::Result<String, ListenerError>
where
    R: AsyncRead + Unpin,
{
    let deadline = Instant::now() + read_timeout;
    let mut buf = Vec::with_capacity(max_bytes.min(4096));
    let mut chunk = [0_u8; READ_CHUNK];

    while buf.len() < max_bytes {
        let want = (max_bytes - buf.len()).min(READ_CHUNK);
        let read = match timeout_at(deadline, reader.read(&mut chunk[..want])).await {
            Ok(Ok(0)) => break,
            Ok(Ok(read)) => read,
            Ok(Err(source)) => return Err(ListenerError::Read { peer, source }),
            Err(_elapsed) if buf.is_empty() => return Err(ListenerError::Idle { peer }),
            Err(_elapsed) => break,
        };
        buf.extend_from_slice(&chunk[..read]);
    }

    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }

    String::from_utf8(buf).map_err(|err| ListenerError::Decode {
        peer,
        source: err.utf8_error(),
    })
}

#[cfg(test)]
mod tests {
    use super::{ACCEPT_ERROR_PAUSE, read_message};
    use crate::error::ListenerError;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40_000))
    }

    #[tokio::test]
    async fn reads_until_eof() {
        let mut input: &[u8] = b"<11> {\"a\":1}";
        let message = read_message(&mut input, peer(), 4096, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(message, "<11> {\"a\":1}");
    }

    #[test]
    fn accept_errors_back_off() {
        assert!(ACCEPT_ERROR_PAUSE >= Duration::from_millis(10));
        assert!(ACCEPT_ERROR_PAUSE < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn keeps_line_feeds_inside_the_payload() {
        let mut input: &[u8] = b"<11> {\n  \"a\": 1\n}\r\n";
        let message = read_message(&mut input, peer(), 4096, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(message, "<11> {\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn truncates_at_byte_cap() {
        let data = vec![b'x'; 5000];
        let mut input: &[u8] = &data;
        let message = read_message(&mut input, peer(), 4096, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(message.len(), 4096);
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_decode_error() {
        let mut input: &[u8] = &[b'{', 0xff, 0xfe, b'}'];
        let err = read_message(&mut input, peer(), 4096, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ListenerError::Decode { .. }));
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let err = read_message(&mut server, peer(), 4096, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ListenerError::Idle { .. }));
        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn partial_message_is_kept_on_timeout() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"<11> {\"a\":1}").await.unwrap();
        let message = read_message(&mut server, peer(), 4096, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(message, "<11> {\"a\":1}");
        drop(client);
    }
}
