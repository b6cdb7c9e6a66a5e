use async_trait::async_trait;

/// A single message on a WebSocket-like connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Text(_) => "text",
            Frame::Binary(_) => "binary",
            Frame::Close => "close",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Receive(String),
    #[error("encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError>;
    async fn close(&mut self);
}

/// Read half of a connection. `None` means the peer went away.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
}

/// Raw audio stream forked out of a phone call. Dropping it closes the socket.
pub type AudioConnection = Box<dyn FrameSource>;
