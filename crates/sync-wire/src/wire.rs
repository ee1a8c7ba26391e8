// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing: a 4-byte big-endian length prefix
//! followed by a JSON payload. Used for both the daemon's request/
//! response IPC and for streaming `SyncEvent`s to a subscribed client.

use crate::event::SyncEvent;
use crate::request::Request;
use crate::response::Response;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Messages longer than this are rejected outright rather than causing
/// an unbounded allocation from a malformed or malicious length prefix.
const MAX_MESSAGE_BYTES: u32 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json encode/decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message of {0} bytes exceeds the {MAX_MESSAGE_BYTES}-byte limit")]
    MessageTooLarge(u32),
}

/// Serialize `value` to JSON. Returns the raw payload with no length
/// prefix — callers that need framing call [`write_message`] with the
/// result.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize `bytes` as JSON.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write `payload` prefixed with its 4-byte big-endian length.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::MessageTooLarge(u32::MAX))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed payload, returning its raw bytes.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge(len));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Read one framed [`Request`] from `reader`. Daemon side of the
/// connection.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

/// Write one framed [`Request`] to `writer`. Client side of the
/// connection.
pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request: &Request,
) -> Result<(), ProtocolError> {
    let bytes = encode(request)?;
    write_message(writer, &bytes).await
}

/// Write one framed [`Response`] to `writer`. Daemon side of the
/// connection.
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
) -> Result<(), ProtocolError> {
    let bytes = encode(response)?;
    write_message(writer, &bytes).await
}

/// Read one framed [`Response`] from `reader`. Client side of the
/// connection.
pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Response, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

/// Write one framed [`SyncEvent`] to `writer`, used once a connection has
/// switched to streaming mode after a [`Request::Watch`].
pub async fn write_event<W: AsyncWrite + Unpin>(
    writer: &mut W,
    event: &SyncEvent,
) -> Result<(), ProtocolError> {
    let bytes = encode(event)?;
    write_message(writer, &bytes).await
}

/// Read one framed [`SyncEvent`] from `reader`.
pub async fn read_event<R: AsyncRead + Unpin>(reader: &mut R) -> Result<SyncEvent, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
