use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};

use crate::transport::{Frame, FrameSink, FrameSource, TransportError};

pub struct WsSink(SplitSink<WebSocket, Message>);

impl WsSink {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self(sink)
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(data) => Message::Binary(data),
            Frame::Close => Message::Close(None),
        };
        self.0
            .send(message)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.0.send(Message::Close(None)).await;
        let _ = self.0.close().await;
    }
}

fn into_frame(message: Message) -> Option<Frame> {
    match message {
        Message::Text(text) => Some(Frame::Text(text)),
        Message::Binary(data) => Some(Frame::Binary(data)),
        Message::Close(_) => Some(Frame::Close),
        // Answered by axum itself.
        Message::Ping(_) | Message::Pong(_) => None,
    }
}

async fn next_from<S>(stream: &mut S) -> Option<Result<Frame, TransportError>>
where
    S: futures::Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
{
    loop {
        match stream.next().await? {
            Ok(message) => {
                if let Some(frame) = into_frame(message) {
                    return Some(Ok(frame));
                }
            }
            Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
        }
    }
}

/// Read half of a browser control socket.
pub struct WsSource(SplitStream<WebSocket>);

impl WsSource {
    pub fn new(stream: SplitStream<WebSocket>) -> Self {
        Self(stream)
    }
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        next_from(&mut self.0).await
    }
}

/// A whole socket used only for reading, as the audio fork never expects replies.
pub struct WsAudio(WebSocket);

impl WsAudio {
    pub fn new(socket: WebSocket) -> Self {
        Self(socket)
    }
}

#[async_trait]
impl FrameSource for WsAudio {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        next_from(&mut self.0).await
    }
}
