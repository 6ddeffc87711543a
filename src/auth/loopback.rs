//! One-shot loopback listener that captures the OAuth redirect.

use async_trait::async_trait;
use reqwest::Url;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use super::error::AuthError;

/// Waits for the authorization server to redirect back with a code.
#[async_trait]
pub trait AuthorizationCodeReceiver: Send + Sync {
    async fn await_code(&self, port: u16) -> Result<String, AuthError>;
}

/// Listens on `127.0.0.1:<port>` until a redirect carrying `code` or `error`
/// arrives. Requests without either (favicon probes and the like) get a 404
/// and the listener keeps waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackReceiver;

#[async_trait]
impl AuthorizationCodeReceiver for LoopbackReceiver {
    async fn await_code(&self, port: u16) -> Result<String, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.map_err(|err| {
            AuthError::Authorization(format!("cannot listen on 127.0.0.1:{port}: {err}"))
        })?;
        tracing::info!(port, "waiting for OAuth redirect");
        accept_redirect(listener).await
    }
}

pub(crate) async fn accept_redirect(listener: TcpListener) -> Result<String, AuthError> {
    loop {
        let (mut socket, peer) = listener.accept().await?;
        let request_line = read_request_head(&mut socket).await?;
        tracing::debug!(%peer, "redirect request received");

        match parse_redirect(&request_line) {
            Redirect::Code(code) => {
                respond(&mut socket, "200 OK", "Authentication complete. You can close this tab.")
                    .await?;
                return Ok(code);
            }
            Redirect::Denied(message) => {
                respond(&mut socket, "400 Bad Request", &format!("Authorization failed: {message}"))
                    .await?;
                return Err(AuthError::Authorization(message));
            }
            Redirect::Unrelated => {
                respond(&mut socket, "404 Not Found", "Not found").await?;
            }
        }
    }
}

/// Read the request line and drain the headers so the reply is not reset.
async fn read_request_head(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut reader = BufReader::new(socket);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut header = String::new();
    loop {
        header.clear();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header.trim().is_empty() {
            break;
        }
    }
    Ok(request_line)
}

#[derive(Debug, PartialEq, Eq)]
enum Redirect {
    Code(String),
    Denied(String),
    Unrelated,
}

/// Parse `GET /?code=...&scope=... HTTP/1.1`.
fn parse_redirect(request_line: &str) -> Redirect {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Redirect::Unrelated;
    };
    let Ok(url) = Url::parse(&format!("http://localhost{target}")) else {
        return Redirect::Unrelated;
    };
    let mut code = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }
    match (code, error) {
        (Some(code), _) => Redirect::Code(code),
        (None, Some(error)) => Redirect::Denied(match description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        }),
        (None, None) => Redirect::Unrelated,
    }
}

async fn respond(socket: &mut TcpStream, status: &str, message: &str) -> std::io::Result<()> {
    let body = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>cloudshell</title></head>\
         <body><p>{message}</p></body></html>"
    );
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.flush().await
}
