use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use crate::identity::PhoneNumber;
use crate::participant::Participant;
use crate::relay;
use crate::stats::SessionStats;
use crate::tictactoe::{Player, TicTacToe, CELLS};
use crate::transport::{AudioConnection, TransportError};
use crate::webhook::{WebhookClient, WebhookError};

/// Errors that end a single session. They never affect other sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("notify {addr} that the opponent is ready: {source}")]
    OpponentReady {
        addr: String,
        #[source]
        source: TransportError,
    },
    #[error("get digit from {phone_number}: {source}")]
    SelectDigit {
        phone_number: PhoneNumber,
        #[source]
        source: WebhookError,
    },
    #[error("send turn info to {addr}: {source}")]
    TurnInfo {
        addr: String,
        #[source]
        source: TransportError,
    },
}

#[derive(Debug)]
pub enum GameOutcome {
    Won(Player),
    Draw,
    Aborted(SessionError),
}

impl GameOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, GameOutcome::Aborted(_))
    }
}

/// A matched participant together with the audio forked out of their call.
pub struct Seat {
    pub participant: Participant,
    pub audio: AudioConnection,
}

/// One game between two matched participants, including their audio relay.
pub struct GameSession {
    one: Seat,
    two: Seat,
    webhooks: WebhookClient,
    stats: Arc<SessionStats>,
}

impl GameSession {
    pub fn new(one: Seat, two: Seat, webhooks: WebhookClient, stats: Arc<SessionStats>) -> Self {
        Self {
            one,
            two,
            webhooks,
            stats,
        }
    }

    /// Plays the game to the end and tears the session down.
    ///
    /// All four connections are closed before this returns. Both game-done
    /// webhooks are called unless the opponent-ready announcement failed.
    pub async fn run<R: Rng + Send>(self, mut rng: R) -> GameOutcome {
        let started = Instant::now();
        let Self {
            one,
            two,
            webhooks,
            stats,
        } = self;

        let relays = [
            relay::spawn(
                one.participant.phone_number().clone(),
                one.audio,
                two.participant.control_handle(),
                Arc::clone(&stats),
            ),
            relay::spawn(
                two.participant.phone_number().clone(),
                two.audio,
                one.participant.control_handle(),
                stats,
            ),
        ];
        let (one, two) = (one.participant, two.participant);

        let outcome = match play(&one, &two, &webhooks, &mut rng).await {
            Ok(Some(winner)) => GameOutcome::Won(winner),
            Ok(None) => GameOutcome::Draw,
            Err(e) => {
                tracing::warn!(error = %e, "game aborted");
                GameOutcome::Aborted(e)
            }
        };

        // The phone side only hears about the end of a game that was announced.
        if !matches!(outcome, GameOutcome::Aborted(SessionError::OpponentReady { .. })) {
            tokio::join!(
                webhooks.notify(&one.webhooks().game_done),
                webhooks.notify(&two.webhooks().game_done),
            );
        }

        // Dropping the relays closes both audio forks.
        for relay in relays {
            relay.abort();
            let _ = relay.await;
        }
        one.close().await;
        two.close().await;

        tracing::info!(
            first_addr = one.control().addr(),
            second_addr = two.control().addr(),
            game_duration_ms = started.elapsed().as_millis() as u64,
            ?outcome,
            "closed connections to clients"
        );
        outcome
    }
}

async fn play<R: Rng + Send>(
    one: &Participant,
    two: &Participant,
    webhooks: &WebhookClient,
    rng: &mut R,
) -> Result<Option<Player>, SessionError> {
    let mut is_player_one_turn = rng.gen_bool(0.5);

    for (player, opponent, has_first_turn) in [(one, two, is_player_one_turn), (two, one, !is_player_one_turn)] {
        player
            .send_opponent_ready(opponent.phone_number(), has_first_turn)
            .await
            .map_err(|source| SessionError::OpponentReady {
                addr: player.control().addr().to_string(),
                source,
            })?;
    }

    let mut game = TicTacToe::new();
    while !game.done() {
        let mover = if is_player_one_turn { one } else { two };

        let requested = webhooks
            .fetch_digit(&mover.webhooks().select_digit)
            .await
            .map_err(|source| SessionError::SelectDigit {
                phone_number: mover.phone_number().clone(),
                source,
            })?;
        let Some(digit) = place(&mut game, requested, is_player_one_turn, rng) else {
            break;
        };

        tracing::info!(current_turn_addr = mover.control().addr(), requested, digit, "client selected digit");

        for (player, is_player) in [(one, is_player_one_turn), (two, !is_player_one_turn)] {
            player
                .send_turn_info(digit, is_player)
                .await
                .map_err(|source| SessionError::TurnInfo {
                    addr: player.control().addr().to_string(),
                    source,
                })?;
        }

        is_player_one_turn = !is_player_one_turn;
    }

    let winner = game.has_winner();
    if let Some((player, line)) = winner {
        tracing::info!(?player, ?line, "game won");
    }
    let winner = winner.map(|(player, _)| player);

    for (player, side) in [(one, Player::One), (two, Player::Two)] {
        if let Err(e) = player.send_game_done(winner.is_some(), winner == Some(side)).await {
            tracing::warn!(addr = player.control().addr(), error = %e, "failed to send game done info");
        }
    }

    Ok(winner)
}

/// Marks the requested one based digit. When it does not name a free cell a
/// random free cell is taken instead. Returns the digit actually played.
fn place<R: Rng + ?Sized>(game: &mut TicTacToe, requested: i64, is_player_one: bool, rng: &mut R) -> Option<u8> {
    let index = usize::try_from(requested)
        .ok()
        .and_then(|digit| digit.checked_sub(1))
        .filter(|&index| index < CELLS);

    if let Some(index) = index {
        if game.select_field(index, is_player_one) {
            return Some(index as u8 + 1);
        }
    }
    game.select_random_field(is_player_one, rng)
        .map(|index| index as u8 + 1)
}
