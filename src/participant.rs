use std::sync::Arc;

use tokio::sync::Mutex;

use crate::identity::{PhoneNumber, VerificationCode, WebhookSet};
use crate::protocol::ControlEvent;
use crate::transport::{Frame, FrameSink, TransportError};

/// Write access to a browser control socket.
///
/// The game and the audio relay write to the same socket from different
/// tasks, so every frame goes through the lock.
pub struct ControlConnection {
    addr: String,
    sink: Mutex<Box<dyn FrameSink>>,
}

impl ControlConnection {
    pub fn new(addr: impl Into<String>, sink: Box<dyn FrameSink>) -> Self {
        Self {
            addr: addr.into(),
            sink: Mutex::new(sink),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn send_event(&self, event: &ControlEvent) -> Result<(), TransportError> {
        let text = serde_json::to_string(event)?;
        tracing::info!(addr = %self.addr, data_type = event.kind(), data = %text, "send data to client");
        self.sink.lock().await.send_frame(Frame::Text(text)).await
    }

    pub async fn send_code(
        &self,
        code: VerificationCode,
        call_phone_number: &PhoneNumber,
    ) -> Result<(), TransportError> {
        self.send_event(&ControlEvent::SendCode {
            code,
            call_phone_number: call_phone_number.clone(),
        })
        .await
    }

    pub async fn send_audio(&self, data: Vec<u8>) -> Result<(), TransportError> {
        self.sink.lock().await.send_frame(Frame::Binary(data)).await
    }

    pub async fn close(&self) {
        self.sink.lock().await.close().await;
    }
}

/// A browser that has been handed a code but whose caller has not dialed it yet.
pub struct PendingParticipant {
    control: Arc<ControlConnection>,
}

impl PendingParticipant {
    pub fn new(control: ControlConnection) -> Self {
        Self {
            control: Arc::new(control),
        }
    }

    pub fn control(&self) -> &ControlConnection {
        &self.control
    }

    /// Lets the registry reach the browser after the participant is stored.
    pub fn control_handle(&self) -> Arc<ControlConnection> {
        Arc::clone(&self.control)
    }

    pub fn verify(self, phone_number: PhoneNumber, webhooks: WebhookSet) -> Participant {
        Participant {
            control: self.control,
            phone_number,
            webhooks,
        }
    }
}

/// A verified player: browser control socket, caller identity and webhooks.
pub struct Participant {
    control: Arc<ControlConnection>,
    phone_number: PhoneNumber,
    webhooks: WebhookSet,
}

impl Participant {
    pub fn control(&self) -> &ControlConnection {
        &self.control
    }

    pub fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    pub fn webhooks(&self) -> &WebhookSet {
        &self.webhooks
    }

    /// Shared handle for tasks that stream audio into this browser.
    pub fn control_handle(&self) -> Arc<ControlConnection> {
        Arc::clone(&self.control)
    }

    pub async fn send_wait_for_opponent(&self, game_room_name: &str) -> Result<(), TransportError> {
        self.control
            .send_event(&ControlEvent::WaitForOpponent {
                game_room_name: game_room_name.to_string(),
                player_phone_number: self.phone_number.clone(),
            })
            .await
    }

    pub async fn send_opponent_ready(
        &self,
        opponent: &PhoneNumber,
        player_has_first_turn: bool,
    ) -> Result<(), TransportError> {
        self.control
            .send_event(&ControlEvent::OpponentReady {
                opponent_phone_number: opponent.anonymized(),
                player_has_first_turn,
            })
            .await
    }

    pub async fn send_turn_info(&self, selected_digit: u8, is_player: bool) -> Result<(), TransportError> {
        self.control
            .send_event(&ControlEvent::TurnInfo {
                selected_digit,
                is_player,
            })
            .await
    }

    pub async fn send_game_done(&self, has_winner: bool, is_player_winner: bool) -> Result<(), TransportError> {
        self.control
            .send_event(&ControlEvent::GameDone {
                has_winner,
                is_player_winner,
            })
            .await
    }

    pub async fn close(&self) {
        self.control.close().await;
    }
}
