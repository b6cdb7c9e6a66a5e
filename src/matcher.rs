use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;

use crate::identity::PhoneNumber;
use crate::participant::Participant;
use crate::registry::{MatchQueue, SessionRegistry};
use crate::room_name::{RandomRoomNamer, RoomNamer};
use crate::session::{GameSession, Seat};
use crate::stats::SessionStats;
use crate::transport::AudioConnection;
use crate::webhook::WebhookClient;

/// Pairs verified participants in arrival order and starts a game for every
/// pair once both audio forks are in.
///
/// A single matcher runs per server. It owns the receiving end of the queue,
/// so pairing itself needs no locking.
pub struct Matcher {
    registry: Arc<SessionRegistry>,
    queue: MatchQueue,
    webhooks: WebhookClient,
    stats: Arc<SessionStats>,
    namer: Box<dyn RoomNamer>,
    shutdown: watch::Receiver<bool>,
    audio_poll_interval: Duration,
}

impl Matcher {
    pub fn new(
        registry: Arc<SessionRegistry>,
        queue: MatchQueue,
        webhooks: WebhookClient,
        stats: Arc<SessionStats>,
        shutdown: watch::Receiver<bool>,
        audio_poll_interval: Duration,
    ) -> Self {
        Self {
            registry,
            queue,
            webhooks,
            stats,
            namer: Box::new(RandomRoomNamer::new()),
            shutdown,
            audio_poll_interval,
        }
    }

    pub fn with_namer(mut self, namer: impl RoomNamer + 'static) -> Self {
        self.namer = Box::new(namer);
        self
    }

    /// Runs until shutdown is signaled or the registry goes away.
    pub async fn run(mut self) {
        tracing::info!("started web socket client matcher");
        // First of the next pair, already told which room it is in.
        let mut waiting: Option<Participant> = None;
        let mut room_name = self.namer.next_name();

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let participant = tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                next = self.queue.next() => match next {
                    Some(participant) => participant,
                    None => break,
                },
            };

            tracing::info!(addr = participant.control().addr(), "looking for opponent to match with client");
            if let Err(e) = participant.send_wait_for_opponent(&room_name).await {
                tracing::warn!(addr = participant.control().addr(), error = %e, "failed to send wait for opponent info");
                participant.close().await;
                continue;
            }

            let Some(one) = waiting.take() else {
                waiting = Some(participant);
                continue;
            };
            self.start_match(one, participant).await;
            room_name = self.namer.next_name();
        }

        if let Some(participant) = waiting {
            participant.close().await;
        }
        tracing::info!("stopped web socket client matcher");
    }

    async fn start_match(&self, one: Participant, two: Participant) {
        tracing::info!(
            first_addr = one.control().addr(),
            second_addr = two.control().addr(),
            "matched clients"
        );

        let ((one, audio_one), (two, audio_two)) = tokio::join!(self.rendezvous(one), self.rendezvous(two));

        match (audio_one, audio_two) {
            (Some(audio_one), Some(audio_two)) => self.start_session(
                Seat {
                    participant: one,
                    audio: audio_one,
                },
                Seat {
                    participant: two,
                    audio: audio_two,
                },
            ),
            _ => {
                tracing::info!("shutting down during audio rendezvous, abandoning match");
                one.close().await;
                two.close().await;
            }
        }
    }

    /// Tells the phone side the game is starting and waits for its audio fork.
    async fn rendezvous(&self, participant: Participant) -> (Participant, Option<AudioConnection>) {
        self.webhooks.notify(&participant.webhooks().game_start).await;

        let mut shutdown = self.shutdown.clone();
        let audio = self
            .registry
            .wait_for_audio(participant.phone_number(), &mut shutdown, self.audio_poll_interval)
            .await;
        if audio.is_some() {
            tracing::info!(
                addr = participant.control().addr(),
                phone_number = %participant.phone_number(),
                "matched client web socket with incoming audio web socket"
            );
        }
        (participant, audio)
    }

    /// Spawns the game and a supervisor that cleans up after it however it ends.
    fn start_session(&self, one: Seat, two: Seat) {
        let phone_numbers: [PhoneNumber; 2] = [
            one.participant.phone_number().clone(),
            two.participant.phone_number().clone(),
        ];
        let session = GameSession::new(one, two, self.webhooks.clone(), Arc::clone(&self.stats));
        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(&self.stats);

        stats.session_started();
        let game = tokio::spawn(session.run(StdRng::from_entropy()));

        tokio::spawn(async move {
            let mut aborted = scopeguard::guard(true, move |aborted| stats.session_finished(aborted));

            match game.await {
                Ok(outcome) => {
                    tracing::info!(?outcome, "game finished");
                    *aborted = outcome.is_aborted();
                }
                Err(e) if e.is_panic() => tracing::error!(error = %e, "game session panicked"),
                Err(e) => tracing::warn!(error = %e, "game session cancelled"),
            }

            for phone_number in &phone_numbers {
                registry.remove_audio_connection(phone_number);
            }
        });
    }
}
