//! Log bus consumer.
//!
//! One long-lived task owns a dedicated Redis pub/sub connection, subscribed
//! with the pattern `logs:*`. Each incoming message is fanned out to the
//! broadcast group for its concrete channel before the next message is read;
//! fan-out itself is non-blocking per observer, so a slow observer cannot
//! starve consumption.
//!
//! On connection loss the task reconnects with capped backoff, re-subscribes,
//! and resets the backoff once a subscription is established. Observer
//! registrations live in [`Rooms`] and are untouched by a reconnect —
//! observers never need to rejoin.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use loft_core::LOG_TOPIC_PATTERN;

use crate::config::BusConfig;
use crate::error::ControlResult;

use super::rooms::Rooms;

/// Capped exponential reconnect delay.
#[derive(Debug)]
struct Backoff {
    current: Duration,
    initial: Duration,
    max: Duration,
}

impl Backoff {
    const fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial,
            initial,
            max,
        }
    }

    /// The delay to wait before the next attempt. Doubles per call, capped.
    fn delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (delay * 2).min(self.max);
        delay
    }

    /// Return to the initial delay after a healthy connection.
    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Run the bus consumer until cancelled.
///
/// Never returns an error to the caller: bus connectivity failures are
/// recovered internally, and everything else is logged and retried.
pub async fn run(config: BusConfig, rooms: Arc<Rooms>, cancel: CancellationToken) {
    let mut backoff = Backoff::new(config.reconnect_initial(), config.reconnect_max());

    loop {
        match connect(&config).await {
            Ok(pubsub) => {
                // Subscription established: past outages no longer inform
                // the retry delay.
                backoff.reset();

                match pump(pubsub, &rooms, &cancel).await {
                    Ok(()) => {
                        info!("log bus consumer stopped");
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "log bus connection lost");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "log bus connection failed");
            }
        }

        if cancel.is_cancelled() {
            return;
        }

        let delay = backoff.delay();
        debug!(retry_in = ?delay, "retrying log bus connection");

        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

/// Establish the pub/sub connection and subscribe to the log pattern.
async fn connect(config: &BusConfig) -> ControlResult<redis::aio::PubSub> {
    let client = redis::Client::open(config.url.as_str())?;
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.psubscribe(LOG_TOPIC_PATTERN).await?;

    info!(pattern = LOG_TOPIC_PATTERN, "subscribed to log topics");
    Ok(pubsub)
}

/// Forward messages until the connection drops or we are cancelled.
/// `Ok(())` means cancellation; any error means the connection should be
/// re-established.
async fn pump(
    mut pubsub: redis::aio::PubSub,
    rooms: &Rooms,
    cancel: &CancellationToken,
) -> ControlResult<()> {
    let mut messages = pubsub.on_message();

    loop {
        tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            msg = messages.next() => {
                let Some(msg) = msg else {
                    return Err(redis::RedisError::from((
                        redis::ErrorKind::IoError,
                        "pub/sub stream ended",
                    ))
                    .into());
                };

                let channel = msg.get_channel_name().to_owned();
                match msg.get_payload::<String>() {
                    Ok(line) => {
                        let stats = rooms.fan_out(&channel, &line);
                        debug!(
                            channel,
                            delivered = stats.delivered,
                            dropped = stats.dropped,
                            "log line relayed"
                        );
                    }
                    Err(e) => {
                        // Malformed payloads affect only this message.
                        debug!(channel, error = %e, "discarding undecodable log payload");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;
    use tokio::time::{sleep, timeout};

    #[test]
    fn backoff_doubles_to_cap_and_resets_to_initial() {
        let mut backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(40));

        assert_eq!(backoff.delay(), Duration::from_millis(10));
        assert_eq!(backoff.delay(), Duration::from_millis(20));
        assert_eq!(backoff.delay(), Duration::from_millis(40));
        assert_eq!(backoff.delay(), Duration::from_millis(40));

        backoff.reset();
        assert_eq!(backoff.delay(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn registrations_survive_a_bus_outage() {
        let rooms = Arc::new(Rooms::new());
        let (tx, _rx) = mpsc::channel(8);
        let mut guard = rooms.register(tx);
        guard.join("logs:alpha");

        // Nothing listens on this port, so every connection attempt fails
        // and the consumer cycles through its reconnect path.
        let config = BusConfig {
            url: "redis://127.0.0.1:1".to_owned(),
            reconnect_initial_ms: 10,
            reconnect_max_ms: 20,
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(config, Arc::clone(&rooms), cancel.clone()));

        sleep(Duration::from_millis(100)).await;

        // Several reconnect attempts later, the observer is still joined —
        // recovery never requires a rejoin.
        assert_eq!(rooms.observer_count("logs:alpha"), 1);

        cancel.cancel();
        task.await.unwrap();
    }

    async fn read_until_psubscribe(socket: &mut TcpStream) {
        let mut seen = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            seen.extend_from_slice(&buf[..n]);
            if seen
                .windows(b"PSUBSCRIBE".len())
                .any(|window| window == b"PSUBSCRIBE")
            {
                return;
            }
        }
    }

    /// A bus that accepts two subscriptions in sequence: the first pushes
    /// one line and drops the connection, the second pushes another line
    /// and stays up.
    async fn spawn_flaky_bus() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for round in 0..2u8 {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_until_psubscribe(&mut socket).await;

                socket
                    .write_all(b"*3\r\n$10\r\npsubscribe\r\n$6\r\nlogs:*\r\n:1\r\n")
                    .await
                    .unwrap();

                let push: &[u8] = if round == 0 {
                    b"*4\r\n$8\r\npmessage\r\n$6\r\nlogs:*\r\n$10\r\nlogs:alpha\r\n$10\r\nfirst line\r\n"
                } else {
                    b"*4\r\n$8\r\npmessage\r\n$6\r\nlogs:*\r\n$10\r\nlogs:alpha\r\n$11\r\nsecond line\r\n"
                };
                socket.write_all(push).await.unwrap();

                if round == 0 {
                    // Simulated bus drop.
                    drop(socket);
                } else {
                    // Hold the connection open until the consumer shuts down.
                    let mut buf = [0u8; 64];
                    while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
                }
            }
        });

        addr
    }

    #[tokio::test]
    async fn delivery_resumes_after_reconnect_without_rejoin() {
        let addr = spawn_flaky_bus().await;

        let rooms = Arc::new(Rooms::new());
        let (tx, mut rx) = mpsc::channel(8);
        let mut guard = rooms.register(tx);
        guard.join("logs:alpha");

        let config = BusConfig {
            url: format!("redis://{addr}"),
            reconnect_initial_ms: 10,
            reconnect_max_ms: 50,
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(config, Arc::clone(&rooms), cancel.clone()));

        let first = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("line before the drop should arrive")
            .unwrap();
        assert_eq!(&*first.line, "first line");
        assert_eq!(&*first.topic, "logs:alpha");

        // The connection dropped after the first line; the same observer
        // registration receives the next line once the consumer has
        // re-subscribed.
        let second = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("line after the reconnect should arrive")
            .unwrap();
        assert_eq!(&*second.line, "second line");

        cancel.cancel();
        task.await.unwrap();
    }
}
