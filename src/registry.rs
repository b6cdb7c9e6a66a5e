use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Notify};

use crate::identity::{PhoneNumber, VerificationCode, WebhookSet};
use crate::participant::{Participant, PendingParticipant};
use crate::transport::{AudioConnection, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("verification code {0} does not exist")]
    CodeNotFound(VerificationCode),
    #[error("matcher is not accepting participants")]
    MatcherClosed,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Receiving end of the queue of verified participants, owned by the matcher.
pub struct MatchQueue(mpsc::Receiver<Participant>);

impl MatchQueue {
    pub async fn next(&mut self) -> Option<Participant> {
        self.0.recv().await
    }
}

/// Tracks browsers waiting for their code to be dialed, audio forks waiting to
/// be picked up and verified participants waiting for an opponent.
///
/// Each collection has its own lock. No lock is held across an await.
pub struct SessionRegistry {
    call_phone_number: PhoneNumber,
    code_counter: AtomicU64,
    waiting_for_code: Mutex<HashMap<VerificationCode, PendingParticipant>>,
    pending_audio: Mutex<HashMap<PhoneNumber, AudioConnection>>,
    audio_registered: Notify,
    looking_for_match: mpsc::Sender<Participant>,
}

impl SessionRegistry {
    /// `call_phone_number` is the number shown to browsers so they know whom to call.
    pub fn new(call_phone_number: PhoneNumber) -> (Arc<Self>, MatchQueue) {
        // Capacity one: verification waits until the matcher is ready for it.
        let (tx, rx) = mpsc::channel(1);
        let registry = Self {
            call_phone_number,
            code_counter: AtomicU64::new(0),
            waiting_for_code: Mutex::new(HashMap::new()),
            pending_audio: Mutex::new(HashMap::new()),
            audio_registered: Notify::new(),
            looking_for_match: tx,
        };
        (Arc::new(registry), MatchQueue(rx))
    }

    pub fn call_phone_number(&self) -> &PhoneNumber {
        &self.call_phone_number
    }

    /// Stores the participant under a fresh, strictly increasing code.
    pub fn issue_code(&self, participant: PendingParticipant) -> VerificationCode {
        let code = VerificationCode(self.code_counter.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.waiting_for_code).insert(code, participant);
        code
    }

    /// Issues a code for a newly connected browser and sends it over. A browser
    /// that cannot be reached is closed and forgotten.
    pub async fn admit(&self, participant: PendingParticipant) -> Result<VerificationCode, TransportError> {
        let control = participant.control_handle();
        let code = self.issue_code(participant);
        if let Err(e) = control.send_code(code, &self.call_phone_number).await {
            tracing::warn!(addr = control.addr(), code = code.0, error = %e, "failed to send code to client");
            lock(&self.waiting_for_code).remove(&code);
            control.close().await;
            return Err(e);
        }
        Ok(code)
    }

    /// Binds the caller to the browser holding `code` and queues it for matching.
    ///
    /// Waits until the matcher takes the participant, so callers must not hold
    /// any lock the matcher could need.
    pub async fn verify(
        &self,
        code: VerificationCode,
        phone_number: PhoneNumber,
        webhooks: WebhookSet,
    ) -> Result<(), RegistryError> {
        let pending = lock(&self.waiting_for_code)
            .remove(&code)
            .ok_or(RegistryError::CodeNotFound(code))?;

        let participant = pending.verify(phone_number, webhooks);
        tracing::info!(
            addr = participant.control().addr(),
            code = code.0,
            phone_number = %participant.phone_number(),
            "client verified code"
        );

        if let Err(mpsc::error::SendError(participant)) = self.looking_for_match.send(participant).await {
            participant.close().await;
            return Err(RegistryError::MatcherClosed);
        }
        Ok(())
    }

    /// Keeps an audio fork until the participant with the same number is matched.
    /// A previous connection for the same number is replaced and dropped.
    pub fn register_audio_connection(&self, phone_number: PhoneNumber, audio: AudioConnection) {
        let replaced = lock(&self.pending_audio).insert(phone_number.clone(), audio);
        if replaced.is_some() {
            tracing::warn!(phone_number = %phone_number, "replaced pending audio connection");
        }
        self.audio_registered.notify_waiters();
    }

    pub fn remove_audio_connection(&self, phone_number: &PhoneNumber) -> bool {
        lock(&self.pending_audio).remove(phone_number).is_some()
    }

    pub fn take_audio_connection(&self, phone_number: &PhoneNumber) -> Option<AudioConnection> {
        lock(&self.pending_audio).remove(phone_number)
    }

    /// Waits until an audio fork for `phone_number` is registered and claims it.
    ///
    /// Wakes on every registration and in any case after `poll_interval`.
    /// Returns `None` once `shutdown` fires.
    pub async fn wait_for_audio(
        &self,
        phone_number: &PhoneNumber,
        shutdown: &mut watch::Receiver<bool>,
        poll_interval: Duration,
    ) -> Option<AudioConnection> {
        loop {
            let notified = self.audio_registered.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(audio) = self.take_audio_connection(phone_number) {
                return Some(audio);
            }
            if *shutdown.borrow() {
                return None;
            }

            tracing::debug!(phone_number = %phone_number, "did not find audio web socket connection, waiting");
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    pub fn pending_codes(&self) -> usize {
        lock(&self.waiting_for_code).len()
    }

    pub fn pending_audio(&self) -> usize {
        lock(&self.pending_audio).len()
    }
}
