use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::identity::PhoneNumber;
use crate::participant::ControlConnection;
use crate::stats::SessionStats;
use crate::transport::{AudioConnection, Frame};

/// Audio arrives many times per second, so progress is only logged this often.
const REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Starts copying binary frames from a caller's audio fork into the opposing
/// browser. Returns the number of relayed bytes once either side fails.
pub fn spawn(
    from: PhoneNumber,
    audio: AudioConnection,
    to: Arc<ControlConnection>,
    stats: Arc<SessionStats>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let total = copy_audio(&from, audio, &to).await;
        stats.audio_relayed(total);
        total
    })
}

async fn copy_audio(from: &PhoneNumber, mut audio: AudioConnection, to: &ControlConnection) -> u64 {
    let mut total: u64 = 0;
    let mut last_report = Instant::now();

    loop {
        let data = match audio.next_frame().await {
            Some(Ok(Frame::Binary(data))) => data,
            Some(Ok(other)) => {
                tracing::warn!(phone_number = %from, msg_type = other.kind(), "received unexpected web socket message type");
                continue;
            }
            Some(Err(e)) => {
                tracing::warn!(phone_number = %from, error = %e, "failed to read audio from web socket");
                break;
            }
            None => {
                tracing::debug!(phone_number = %from, "audio stream ended");
                break;
            }
        };

        let bytes = data.len();
        total += bytes as u64;
        if let Err(e) = to.send_audio(data).await {
            tracing::warn!(addr = to.addr(), error = %e, "failed to stream audio to client");
            break;
        }

        tracing::trace!(addr = to.addr(), bytes, "send PCM audio to client");
        if last_report.elapsed() >= REPORT_INTERVAL {
            tracing::debug!(addr = to.addr(), bytes, total_bytes = total, "send PCM audio to client");
            last_report = Instant::now();
        }
    }

    total
}
