//! Socket client for the OVSDB server.
//!
//! Every transaction opens a fresh connection, writes one request, reads
//! JSON documents until the matching response arrives and closes. Connect
//! and read share one deadline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use super::protocol::{self, Operation, OperationResult, Response};
use super::DatabaseClient;
use crate::error::{CliError, Result};

/// Where the OVSDB server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAddress {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl FromStr for ServerAddress {
    type Err = CliError;

    /// Parses `tcp:HOST:PORT` or `unix:PATH`.
    fn from_str(s: &str) -> Result<Self> {
        let Some((method, rest)) = s.split_once(':') else {
            return Err(CliError::config(format!("Invalid server '{s}'")));
        };
        match method {
            "tcp" => {
                let (host, port) = rest
                    .rsplit_once(':')
                    .ok_or_else(|| CliError::config(format!("Invalid server '{s}'")))?;
                let port = port
                    .parse()
                    .map_err(|_| CliError::config(format!("Invalid port in server '{s}'")))?;
                if host.is_empty() {
                    return Err(CliError::config(format!("Invalid server '{s}'")));
                }
                Ok(Self::Tcp {
                    host: host.to_string(),
                    port,
                })
            }
            "unix" if !rest.is_empty() => Ok(Self::Unix(PathBuf::from(rest))),
            "unix" => Err(CliError::config(format!("Invalid server '{s}'"))),
            other => Err(CliError::config(format!(
                "Unsupported connection method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "tcp:{host}:{port}"),
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// OVSDB client over TCP or a local socket.
#[derive(Debug)]
pub struct OvsdbClient {
    address: ServerAddress,
    database: String,
    timeout: Duration,
    seq: AtomicU64,
}

impl OvsdbClient {
    pub fn new(address: ServerAddress, database: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address,
            database: database.into(),
            timeout,
            seq: AtomicU64::new(0),
        }
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    fn connect_error(&self, err: std::io::Error) -> CliError {
        CliError::collaborator(format!("cannot connect to {}: {err}", self.address))
    }

    fn next_id(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    async fn send(&self, payload: &[u8], id: u64) -> Result<Response> {
        let deadline = Instant::now() + self.timeout;
        let timed_out =
            || CliError::collaborator(format!("no response within {:?}", self.timeout));

        match &self.address {
            ServerAddress::Tcp { host, port } => {
                let stream = timeout_at(deadline, TcpStream::connect((host.as_str(), *port)))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| self.connect_error(e))?;
                exchange(stream, payload, id, deadline).await
            }
            #[cfg(unix)]
            ServerAddress::Unix(path) => {
                let stream = timeout_at(deadline, tokio::net::UnixStream::connect(path))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| self.connect_error(e))?;
                exchange(stream, payload, id, deadline).await
            }
            #[cfg(not(unix))]
            ServerAddress::Unix(_) => Err(CliError::config(
                "unix sockets are not supported on this platform",
            )),
        }
    }
}

#[async_trait]
impl DatabaseClient for OvsdbClient {
    async fn transact(&self, operations: Vec<Operation>) -> Result<Vec<OperationResult>> {
        let id = self.next_id();
        let request = protocol::transact_request(&self.database, &operations, id)?;
        debug!(target: "ovsdb", id, %request, "transact");
        let payload = request.to_string().into_bytes();

        let response = self.send(&payload, id).await?;
        debug!(target: "ovsdb", id, result = %response.result, error = %response.error, "response");
        response.into_results()
    }
}

/// Writes one request and waits for the response carrying `id`.
pub(crate) async fn exchange<S>(
    mut stream: S,
    payload: &[u8],
    id: u64,
    deadline: Instant,
) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let io_error = |e: std::io::Error| CliError::collaborator(format!("socket error: {e}"));
    stream.write_all(payload).await.map_err(io_error)?;
    stream.flush().await.map_err(io_error)?;

    let mut reader = DocumentReader::new();
    loop {
        let document = timeout_at(deadline, reader.next_document(&mut stream))
            .await
            .map_err(|_| CliError::collaborator("timed out waiting for response"))??;
        let response: Response = serde_json::from_value(document)
            .map_err(|e| CliError::collaborator(format!("malformed response: {e}")))?;
        if response.answers(id) {
            return Ok(response);
        }
        trace!(target: "ovsdb", id = %response.id, "skipping unrelated message");
    }
}

/// Splits a byte stream into JSON documents.
///
/// Bytes after a complete document are kept for the next call.
#[derive(Debug, Default)]
pub struct DocumentReader {
    buf: Vec<u8>,
}

impl DocumentReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads until one complete document is buffered and returns it.
    pub async fn next_document<R>(&mut self, reader: &mut R) -> Result<Value>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(document) = self.take_document()? {
                return Ok(document);
            }
            let n = reader
                .read(&mut chunk)
                .await
                .map_err(|e| CliError::collaborator(format!("socket error: {e}")))?;
            if n == 0 {
                return Err(CliError::collaborator(
                    "connection closed before a complete response",
                ));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn take_document(&mut self) -> Result<Option<Value>> {
        let Some(start) = self.buf.iter().position(|b| !b.is_ascii_whitespace()) else {
            self.buf.clear();
            return Ok(None);
        };

        let mut stream =
            serde_json::Deserializer::from_slice(&self.buf[start..]).into_iter::<Value>();
        let parsed = match stream.next() {
            Some(Ok(value)) => Some((value, start + stream.byte_offset())),
            Some(Err(e)) if e.is_eof() => None,
            Some(Err(e)) => {
                return Err(CliError::collaborator(format!("malformed response: {e}")))
            }
            None => None,
        };
        drop(stream);

        Ok(parsed.map(|(value, used)| {
            self.buf.drain(..used);
            value
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::protocol::Condition;
    use serde_json::json;
    use tokio::io::duplex;
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_tcp_address() {
        let addr: ServerAddress = "tcp:127.0.0.1:6640".parse().unwrap();
        assert_eq!(
            addr,
            ServerAddress::Tcp {
                host: "127.0.0.1".to_string(),
                port: 6640
            }
        );
        assert_eq!(addr.to_string(), "tcp:127.0.0.1:6640");
    }

    #[test]
    fn test_parse_unix_address() {
        let addr: ServerAddress = "unix:/var/run/openvswitch/db.sock".parse().unwrap();
        assert_eq!(
            addr,
            ServerAddress::Unix(PathBuf::from("/var/run/openvswitch/db.sock"))
        );
    }

    #[test]
    fn test_parse_invalid_addresses() {
        assert!("localhost".parse::<ServerAddress>().is_err());
        assert!("tcp:127.0.0.1".parse::<ServerAddress>().is_err());
        assert!("tcp:127.0.0.1:http".parse::<ServerAddress>().is_err());
        assert!("unix:".parse::<ServerAddress>().is_err());
        let err = "ssl:1.2.3.4:6640".parse::<ServerAddress>().unwrap_err();
        assert!(err.to_string().contains("Unsupported connection method"));
    }

    #[tokio::test]
    async fn test_reader_accumulates_partial_documents() {
        let mut mock = tokio_test::io::Builder::new()
            .read(b"{\"id\": 1, \"res")
            .read(b"ult\": []}")
            .build();
        let mut reader = DocumentReader::new();
        let doc = reader.next_document(&mut mock).await.unwrap();
        assert_eq!(doc, json!({"id": 1, "result": []}));
    }

    #[tokio::test]
    async fn test_reader_keeps_trailing_bytes() {
        let mut mock = tokio_test::io::Builder::new()
            .read(b"{\"id\": 1} {\"id\"")
            .read(b": 2}\n")
            .build();
        let mut reader = DocumentReader::new();
        assert_eq!(reader.next_document(&mut mock).await.unwrap()["id"], 1);
        assert_eq!(reader.next_document(&mut mock).await.unwrap()["id"], 2);
    }

    #[tokio::test]
    async fn test_reader_closed_connection() {
        let mut mock = tokio_test::io::Builder::new().read(b"{\"id\":").build();
        let mut reader = DocumentReader::new();
        let err = reader.next_document(&mut mock).await.unwrap_err();
        assert!(matches!(err, CliError::Collaborator(_)));
    }

    #[tokio::test]
    async fn test_reader_malformed() {
        let mut mock = tokio_test::io::Builder::new().read(b"{]").build();
        let mut reader = DocumentReader::new();
        assert!(reader.next_document(&mut mock).await.is_err());
    }

    #[tokio::test]
    async fn test_exchange_skips_unrelated_messages() {
        let (client, mut server) = duplex(4096);
        let server_task = tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            let n = server.read(&mut buf).await.unwrap();
            let request: Value = serde_json::from_slice(&buf[..n]).unwrap();
            assert_eq!(request["id"], 5);
            server
                .write_all(b"{\"id\":\"echo\",\"method\":\"echo\",\"params\":[]}")
                .await
                .unwrap();
            server
                .write_all(b"{\"id\":5,\"result\":[{\"count\":1}],\"error\":null}")
                .await
                .unwrap();
        });

        let request = json!({"method": "transact", "params": ["OpenSwitch"], "id": 5});
        let deadline = Instant::now() + Duration::from_secs(5);
        let response = exchange(client, request.to_string().as_bytes(), 5, deadline)
            .await
            .unwrap();
        assert!(response.answers(5));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_exchange_times_out() {
        let (client, _server) = duplex(4096);
        let deadline = Instant::now() + Duration::from_millis(20);
        let err = exchange(client, b"{}", 1, deadline).await.unwrap_err();
        assert_eq!(err, CliError::collaborator("timed out waiting for response"));
    }

    #[tokio::test]
    async fn test_transact_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server_task = tokio::spawn(async move {
            for _ in 0..2 {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut reader = DocumentReader::new();
                let request = reader.next_document(&mut socket).await.unwrap();
                assert_eq!(request["method"], "transact");
                assert_eq!(request["params"][0], "OpenSwitch");
                let reply = json!({
                    "id": request["id"],
                    "result": [{"rows": [{"name": "1"}, {"name": "2"}]}],
                    "error": null,
                });
                socket.write_all(reply.to_string().as_bytes()).await.unwrap();
            }
        });

        let client = OvsdbClient::new(
            ServerAddress::Tcp {
                host: "127.0.0.1".to_string(),
                port,
            },
            "OpenSwitch",
            Duration::from_secs(5),
        );
        let rows = client
            .select("Interface", vec![Condition::eq("type", "system")], Some(&["name"]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        // Request ids keep increasing across connections.
        assert_eq!(client.next_id(), 1);
        let names = client.interface_names().await;
        assert!(names.is_ok());
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_transact_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = OvsdbClient::new(
            ServerAddress::Tcp {
                host: "127.0.0.1".to_string(),
                port,
            },
            "OpenSwitch",
            Duration::from_millis(500),
        );
        let err = client.transact(Vec::new()).await.unwrap_err();
        assert_eq!(err.category(), "Database Error");
    }
}
