use crate::error::ClientError;
use log::{debug, info, warn};
use shared::{
    read_frame, write_frame, BoxKind, Command, Direction, Envelope, MoveOutcome, PlayerId,
    Request, Response, Snapshot,
};
use std::time::Duration;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, timeout_at, Instant};

/// One persistent request/response connection to the sync server.
///
/// Every call is bounded by the request timeout. Replies are matched to
/// requests by envelope id, so a reply that arrives after its caller gave up
/// is dropped instead of being handed to the next call.
pub struct RpcClient {
    writer: OwnedWriteHalf,
    replies: mpsc::UnboundedReceiver<Envelope<Response>>,
    reader: JoinHandle<()>,
    next_id: u64,
    request_timeout: Duration,
    fake_ping: Duration,
}

impl RpcClient {
    pub async fn connect(addr: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let stream = match timeout(request_timeout, TcpStream::connect(addr)).await {
            Ok(result) => result.map_err(|source| ClientError::Connection {
                addr: addr.to_string(),
                source,
            })?,
            Err(_) => return Err(ClientError::Timeout),
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle: {}", e);
        }
        info!("Connected to {}", addr);

        let (mut read_half, writer) = stream.into_split();
        let (tx, replies) = mpsc::unbounded_channel();

        let reader = tokio::spawn(async move {
            loop {
                match read_frame::<_, Envelope<Response>>(&mut read_half).await {
                    Ok(Some(envelope)) => {
                        if tx.send(envelope).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!("Error reading from server: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            writer,
            replies,
            reader,
            next_id: 0,
            request_timeout,
            fake_ping: Duration::ZERO,
        })
    }

    /// Delays each request and each reply by half of `fake_ping`.
    pub fn with_fake_ping(mut self, fake_ping: Duration) -> Self {
        self.fake_ping = fake_ping;
        self
    }

    pub async fn call(&mut self, request: Request) -> Result<Response, ClientError> {
        self.next_id += 1;
        let id = self.next_id;
        let deadline = Instant::now() + self.request_timeout;

        if !self.fake_ping.is_zero() {
            sleep(self.fake_ping / 2).await;
        }

        let envelope = Envelope { id, body: request };
        match timeout_at(deadline, write_frame(&mut self.writer, &envelope)).await {
            Ok(result) => result?,
            Err(_) => return Err(ClientError::Timeout),
        }

        loop {
            let reply = match timeout_at(deadline, self.replies.recv()).await {
                Ok(Some(reply)) => reply,
                Ok(None) => return Err(ClientError::Closed),
                Err(_) => {
                    debug!("Request {} timed out", id);
                    return Err(ClientError::Timeout);
                }
            };

            if reply.id != id {
                debug!("Discarding late reply {} while waiting for {}", reply.id, id);
                continue;
            }

            if !self.fake_ping.is_zero() {
                sleep(self.fake_ping / 2).await;
            }
            return Ok(reply.body);
        }
    }

    pub async fn connect_match(&mut self, name: &str) -> Result<(PlayerId, Snapshot), ClientError> {
        let request = Request::Connect {
            name: name.to_string(),
        };
        match self.call(request).await? {
            Response::Connected {
                player_id,
                snapshot,
            } => Ok((player_id, snapshot)),
            Response::Refused { error } => Err(ClientError::Refused(error)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn send_move(
        &mut self,
        player_id: PlayerId,
        sequence: u64,
        direction: Direction,
    ) -> Result<(MoveOutcome, Snapshot), ClientError> {
        let command = Command::Move {
            sequence,
            direction,
        };
        match self.call(Request::Command { player_id, command }).await? {
            Response::Moved { outcome, snapshot } => Ok((outcome, snapshot)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn interact(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(Option<BoxKind>, Snapshot), ClientError> {
        let request = Request::Command {
            player_id,
            command: Command::Interact,
        };
        match self.call(request).await? {
            Response::Revealed { kind, snapshot } => Ok((kind, snapshot)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_state(&mut self, player_id: PlayerId) -> Result<Snapshot, ClientError> {
        match self.call(Request::GetState { player_id }).await? {
            Response::State { snapshot } => Ok(snapshot),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn disconnect(&mut self, player_id: PlayerId) -> Result<(), ClientError> {
        let request = Request::Command {
            player_id,
            command: Command::Disconnect,
        };
        match self.call(request).await? {
            Response::Ack => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MatchError;
    use tokio::net::TcpListener;
    use tokio_test::assert_ok;

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[tokio::test]
    async fn test_refused_connect_is_an_error() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request: Envelope<Request> = read_frame(&mut stream).await.unwrap().unwrap();
            let reply = Envelope {
                id: request.id,
                body: Response::Refused {
                    error: MatchError::MatchFinished,
                },
            };
            write_frame(&mut stream, &reply).await.unwrap();
        });

        let mut client = assert_ok!(RpcClient::connect(&addr, Duration::from_secs(2)).await);
        let result = client.connect_match("ana").await;

        assert!(matches!(
            result,
            Err(ClientError::Refused(MatchError::MatchFinished))
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            sleep(Duration::from_millis(500)).await;
            drop(stream);
        });

        let mut client = RpcClient::connect(&addr, Duration::from_millis(50))
            .await
            .unwrap();
        let result = client.get_state(PlayerId::from_u128(1)).await;

        match result {
            Err(e) => {
                assert!(matches!(e, ClientError::Timeout));
                assert!(e.is_transient());
            }
            Ok(_) => panic!("Expected a timeout"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_late_reply_is_discarded() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let first: Envelope<Request> = read_frame(&mut stream).await.unwrap().unwrap();
            let second: Envelope<Request> = read_frame(&mut stream).await.unwrap().unwrap();

            // Answer the abandoned request first, then the live one.
            write_frame(&mut stream, &Envelope { id: first.id, body: Response::Ack })
                .await
                .unwrap();
            let reply = Envelope {
                id: second.id,
                body: Response::Refused {
                    error: MatchError::NoFreeCell,
                },
            };
            write_frame(&mut stream, &reply).await.unwrap();
        });

        let mut client = RpcClient::connect(&addr, Duration::from_millis(100))
            .await
            .unwrap();
        let first = client.disconnect(PlayerId::from_u128(1)).await;
        assert!(matches!(first, Err(ClientError::Timeout)));

        // The server only answers once both requests arrived.
        client.request_timeout = Duration::from_secs(2);
        let second = client.connect_match("ana").await;

        assert!(matches!(
            second,
            Err(ClientError::Refused(MatchError::NoFreeCell))
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_connection_reports_closed() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _: Option<Envelope<Request>> = read_frame(&mut stream).await.unwrap();
        });

        let mut client = RpcClient::connect(&addr, Duration::from_secs(2))
            .await
            .unwrap();
        let result = client.get_state(PlayerId::from_u128(1)).await;

        assert!(matches!(result, Err(ClientError::Closed)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_dial_failure() {
        let (listener, addr) = listener().await;
        drop(listener);

        let result = RpcClient::connect(&addr, Duration::from_secs(2)).await;

        assert!(matches!(result, Err(ClientError::Connection { .. })));
    }
}
