use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::transport::{Frame, FrameSink, FrameSource, TransportError};

/// Test-only sink that forwards frames to a channel. Sends fail once the
/// receiving end is dropped, after `close`, or once `fail_after` frames went out.
pub struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<Frame>>,
    fail_after: Option<usize>,
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        if let Some(left) = self.fail_after.as_mut() {
            if *left == 0 {
                return Err(TransportError::Send("connection reset".into()));
            }
            *left -= 1;
        }
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) {
        self.tx = None;
    }
}

/// Test-only source fed from a channel. With `fail_after` set, reading past
/// that many frames yields a receive error.
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Frame>,
    fail_after: Option<usize>,
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        if let Some(left) = self.fail_after.as_mut() {
            if *left == 0 {
                return Some(Err(TransportError::Receive("connection reset".into())));
            }
            *left -= 1;
        }
        self.rx.recv().await.map(Ok)
    }
}

pub fn control_channel() -> (ChannelSink, mpsc::UnboundedReceiver<Frame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx: Some(tx), fail_after: None }, rx)
}

/// Control channel whose sends start failing after `frames` successful ones.
pub fn failing_control_channel(frames: usize) -> (ChannelSink, mpsc::UnboundedReceiver<Frame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx: Some(tx), fail_after: Some(frames) }, rx)
}

pub fn audio_channel() -> (mpsc::UnboundedSender<Frame>, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSource { rx, fail_after: None })
}

/// Audio channel that reports a read error after `frames` frames.
pub fn failing_audio_channel(frames: usize) -> (mpsc::UnboundedSender<Frame>, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSource { rx, fail_after: Some(frames) })
}

/// Drains everything currently queued and returns the text frames as JSON.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Frame::Text(text) = frame {
            events.push(serde_json::from_str(&text).expect("control events are JSON"));
        }
    }
    events
}
