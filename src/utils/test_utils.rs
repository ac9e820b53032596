use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::api::{ApiError, AuthStatus, Backend, MessageRequest, RegistrationPayload};

/// One HTTP request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }
}

pub struct StubReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl StubReply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn html(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/html",
            body: body.to_string(),
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn decode_chunked(mut raw: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    while let Some(line_end) = find_subslice(raw, b"\r\n") {
        let size_text = String::from_utf8_lossy(&raw[..line_end]);
        let size = usize::from_str_radix(size_text.trim(), 16).unwrap_or(0);
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        body.extend_from_slice(&raw[start..start + size]);
        raw = &raw[start + size + 2..];
    }
    body
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> std::io::Result<CapturedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = find_subslice(&buffer, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    let mut captured = CapturedRequest {
        request_line,
        headers,
        body: Vec::new(),
    };
    let mut body = buffer[header_end + 4..].to_vec();

    let chunked = captured
        .header("transfer-encoding")
        .map(|value| value.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false);

    if chunked {
        while find_subslice(&body, b"0\r\n\r\n").is_none() {
            let read = stream.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }
        captured.body = decode_chunked(&body);
    } else {
        let length = captured
            .header("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        while body.len() < length {
            let read = stream.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }
        captured.body = body;
    }

    Ok(captured)
}

/// Serve exactly one request on an ephemeral port with a canned reply.
/// Returns the base URL and a receiver for the captured request.
pub async fn serve_once(
    reply: StubReply,
) -> std::io::Result<(String, oneshot::Receiver<CapturedRequest>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(request) = read_request(&mut stream).await else {
            return;
        };
        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            reply.status,
            reply.content_type,
            reply.body.len(),
            reply.body
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
        let _ = tx.send(request);
    });

    Ok((format!("http://{addr}"), rx))
}

/// In-memory backend with scripted replies, recording every call.
#[derive(Default)]
pub struct ScriptedBackend {
    message_replies: Mutex<VecDeque<Result<String, ApiError>>>,
    registration_replies: Mutex<VecDeque<Result<Option<String>, ApiError>>>,
    auth_replies: Mutex<VecDeque<Result<AuthStatus, ApiError>>>,
    logout_replies: Mutex<VecDeque<Result<bool, ApiError>>>,
    pub sent_messages: Mutex<Vec<MessageRequest>>,
    pub submissions: Mutex<Vec<RegistrationPayload>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_with(self, text: &str) -> Self {
        self.message_replies
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
        self
    }

    pub fn fail_message(self, error: ApiError) -> Self {
        self.message_replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn accept_registration(self, message: Option<&str>) -> Self {
        self.registration_replies
            .lock()
            .unwrap()
            .push_back(Ok(message.map(str::to_string)));
        self
    }

    pub fn reject_registration(self, error: ApiError) -> Self {
        self.registration_replies
            .lock()
            .unwrap()
            .push_back(Err(error));
        self
    }

    pub fn auth_with(self, result: Result<AuthStatus, ApiError>) -> Self {
        self.auth_replies.lock().unwrap().push_back(result);
        self
    }

    pub fn logout_with(self, result: Result<bool, ApiError>) -> Self {
        self.logout_replies.lock().unwrap().push_back(result);
        self
    }

    pub fn message_calls(&self) -> usize {
        self.sent_messages.lock().unwrap().len()
    }

    pub fn submission_calls(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

fn unscripted() -> ApiError {
    ApiError::Malformed("no scripted reply".to_string())
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn send_message(&self, request: &MessageRequest) -> Result<String, ApiError> {
        self.sent_messages.lock().unwrap().push(request.clone());
        let next = self.message_replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted()))
    }

    async fn submit_preinscription(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<Option<String>, ApiError> {
        self.submissions.lock().unwrap().push(payload.clone());
        let next = self.registration_replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted()))
    }

    async fn check_auth(&self) -> Result<AuthStatus, ApiError> {
        let next = self.auth_replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted()))
    }

    async fn logout(&self) -> Result<bool, ApiError> {
        let next = self.logout_replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted()))
    }

    async fn profile(&self) -> Result<Value, ApiError> {
        Err(unscripted())
    }
}
