//! Length-prefixed bincode frames on a byte stream.
//!
//! A frame is a big-endian `u32` payload length followed by the payload.

use crate::error::FrameError;
use bincode::{deserialize, serialize};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 1024 * 1024;

pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serialize(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(payload.len()));
    }

    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame. Returns `Ok(None)` when the peer closed the stream.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, FrameError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(deserialize(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerId;
    use crate::protocol::Request;
    use tokio_test::io::Builder;

    fn framed(request: &Request) -> Vec<u8> {
        let payload = serialize(request).unwrap();
        let mut bytes = (payload.len() as u32).to_be_bytes().to_vec();
        bytes.extend(payload);
        bytes
    }

    #[tokio::test]
    async fn test_write_frame_prefixes_length() {
        let request = Request::Connect {
            name: "ana".to_string(),
        };
        let mut mock = Builder::new().write(&framed(&request)).build();

        write_frame(&mut mock, &request).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_frame_then_eof() {
        let request = Request::GetState {
            player_id: PlayerId::from_u128(3),
        };
        let mut mock = Builder::new().read(&framed(&request)).build();

        let first: Option<Request> = read_frame(&mut mock).await.unwrap();
        assert_eq!(first, Some(request));

        let second: Option<Request> = read_frame(&mut mock).await.unwrap();
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized_length() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes();
        let mut mock = Builder::new().read(&header).build();

        let result: Result<Option<Request>, _> = read_frame(&mut mock).await;
        assert!(matches!(result, Err(FrameError::TooLarge(len)) if len == MAX_FRAME_LEN + 1));
    }

    #[tokio::test]
    async fn test_read_frame_rejects_garbage_payload() {
        let mut bytes = 2u32.to_be_bytes().to_vec();
        bytes.extend([0xff, 0xff]);
        let mut mock = Builder::new().read(&bytes).build();

        let result: Result<Option<Request>, _> = read_frame(&mut mock).await;
        assert!(matches!(result, Err(FrameError::Codec(_))));
    }

    #[tokio::test]
    async fn test_frames_over_duplex_stream() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let request = Request::Connect {
            name: "bia".to_string(),
        };

        write_frame(&mut a, &request).await.unwrap();
        drop(a);

        let received: Option<Request> = read_frame(&mut b).await.unwrap();
        assert_eq!(received, Some(request));
        let closed: Option<Request> = read_frame(&mut b).await.unwrap();
        assert!(closed.is_none());
    }
}
