use serde::{Deserialize, Serialize};

use crate::identity::{AnonymizedPhoneNumber, PhoneNumber, VerificationCode};

/// Events sent from the server to a browser over the control socket.
///
/// Serialized as `{"type": "SEND_CODE", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlEvent {
    #[serde(rename_all = "camelCase")]
    SendCode {
        code: VerificationCode,
        call_phone_number: PhoneNumber,
    },
    #[serde(rename_all = "camelCase")]
    WaitForOpponent {
        game_room_name: String,
        player_phone_number: PhoneNumber,
    },
    #[serde(rename_all = "camelCase")]
    OpponentReady {
        opponent_phone_number: AnonymizedPhoneNumber,
        player_has_first_turn: bool,
    },
    #[serde(rename_all = "camelCase")]
    TurnInfo { selected_digit: u8, is_player: bool },
    #[serde(rename_all = "camelCase")]
    GameDone {
        has_winner: bool,
        is_player_winner: bool,
    },
}

impl ControlEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ControlEvent::SendCode { .. } => "SEND_CODE",
            ControlEvent::WaitForOpponent { .. } => "WAIT_FOR_OPPONENT",
            ControlEvent::OpponentReady { .. } => "OPPONENT_READY",
            ControlEvent::TurnInfo { .. } => "TURN_INFO",
            ControlEvent::GameDone { .. } => "GAME_DONE",
        }
    }
}

/// Body of the private registration call made by the phone side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub verification_code: VerificationCode,
    pub client_phone_number: PhoneNumber,
    pub select_digit_url: String,
    pub heartbeat_url: String,
    pub game_done_url: String,
    pub game_start_url: String,
}

/// Response of the select-digit webhook.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DigitResponse {
    pub digit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_use_type_and_data_envelope() {
        let event = ControlEvent::SendCode {
            code: VerificationCode(1),
            call_phone_number: PhoneNumber::new("+4930123"),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "SEND_CODE", "data": {"code": 1, "callPhoneNumber": "+4930123"}})
        );
    }

    #[test]
    fn opponent_ready_carries_masked_number() {
        let event = ControlEvent::OpponentReady {
            opponent_phone_number: PhoneNumber::new("+4917011122").anonymized(),
            player_has_first_turn: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "OPPONENT_READY",
                "data": {"opponentPhoneNumber": "+*******122", "playerHasFirstTurn": true}
            })
        );
    }

    #[test]
    fn register_request_reads_camel_case() {
        let request: RegisterRequest = serde_json::from_value(json!({
            "verificationCode": 7,
            "clientPhoneNumber": "+491",
            "selectDigitUrl": "http://a/digit",
            "heartbeatUrl": "http://a/heartbeat",
            "gameDoneUrl": "http://a/done",
            "gameStartUrl": "http://a/start"
        }))
        .unwrap();
        assert_eq!(request.verification_code, VerificationCode(7));
        assert_eq!(request.client_phone_number, PhoneNumber::new("+491"));
    }
}
