//! The per-session form store.

use crate::broadcast::{Broadcaster, StatePublisher};
use crate::error::FormError;
use formcall_types::{FormField, FormState};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form is incomplete; this is the first missing field.
    Missing(FormField),
    /// All fields were present and the form is marked submitted.
    Submitted,
}

impl SubmitOutcome {
    pub fn is_submitted(self) -> bool {
        matches!(self, Self::Submitted)
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "Please provide your {}.", field.label()),
            Self::Submitted => f.write_str("The form is submitted"),
        }
    }
}

/// The form collected during one session, plus the channel it is mirrored to.
///
/// Tool calls and inbound data-channel updates arrive on independent tasks,
/// so the record sits behind a mutex. Each mutation publishes its snapshot
/// while still holding the lock, so broadcasts go out in mutation order and
/// each one reflects a single consistent state.
///
/// The lock is a `std::sync::Mutex`: it is never held across an `.await`
/// and publishing does not block.
#[derive(Debug)]
pub struct FormSession {
    session_id: String,
    state: Mutex<FormState>,
    broadcaster: Broadcaster,
}

impl FormSession {
    pub fn new(session_id: impl Into<String>, publisher: Arc<dyn StatePublisher>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Mutex::new(FormState::default()),
            broadcaster: Broadcaster::new(publisher),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> FormState {
        self.lock().clone()
    }

    pub fn set_name(&self, value: &str) -> String {
        self.set_field(FormField::Name, value)
    }

    pub fn set_phone(&self, value: &str) -> String {
        self.set_field(FormField::Phone, value)
    }

    pub fn set_email(&self, value: &str) -> String {
        self.set_field(FormField::Email, value)
    }

    /// Records `value` for `field` and returns the spoken confirmation.
    ///
    /// An empty value is not recorded; the caller gets the prompt for that
    /// field back instead and nothing is broadcast. Any other string,
    /// whitespace included, is stored as given.
    pub fn set_field(&self, field: FormField, value: &str) -> String {
        match self.apply_update(field, value.to_string()) {
            Ok(()) => format!("The {} is updated to {}", field.label(), value),
            Err(_) => SubmitOutcome::Missing(field).to_string(),
        }
    }

    pub fn get_name(&self) -> String {
        self.get_field(FormField::Name)
    }

    pub fn get_phone(&self) -> String {
        self.get_field(FormField::Phone)
    }

    pub fn get_email(&self) -> String {
        self.get_field(FormField::Email)
    }

    /// Describes the stored value of `field`, stating explicitly when unset.
    pub fn get_field(&self, field: FormField) -> String {
        let state = self.lock();
        match state.get(field) {
            Some(value) => format!("User's {} is {}", field.label(), value),
            None => format!("User's {} is not set", field.label()),
        }
    }

    /// Attempts to submit the form.
    ///
    /// Succeeds only when every field is set. A repeated successful submit
    /// broadcasts the (unchanged) state again.
    pub fn submit(&self) -> SubmitOutcome {
        let mut state = self.lock();
        if let Some(missing) = state.first_missing() {
            tracing::info!(
                session_id = %self.session_id,
                missing = missing.as_str(),
                "submission rejected, form incomplete"
            );
            return SubmitOutcome::Missing(missing);
        }

        state.submitted = true;
        self.broadcaster.broadcast(&self.session_id, &state);
        tracing::info!(session_id = %self.session_id, "form submitted");
        SubmitOutcome::Submitted
    }

    /// Stores `value` for `field` and broadcasts, without producing a
    /// confirmation. This is the entry point for edits pushed by a remote
    /// peer.
    pub fn apply_update(&self, field: FormField, value: String) -> Result<(), FormError> {
        if value.is_empty() {
            return Err(FormError::EmptyValue(field));
        }

        let mut state = self.lock();
        state.set(field, value);
        self.broadcaster.broadcast(&self.session_id, &state);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        // FormState has no invariant a panicking writer could break halfway.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::RecordingPublisher;

    fn session() -> (FormSession, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        (FormSession::new("session-1", publisher.clone()), publisher)
    }

    #[test]
    fn new_session_is_empty() {
        let (session, publisher) = session();
        assert_eq!(session.snapshot(), FormState::default());
        assert!(!session.snapshot().submitted);
        assert_eq!(publisher.count(), 0);
    }

    #[test]
    fn set_returns_confirmation() {
        let (session, _) = session();
        assert_eq!(session.set_name("Ada"), "The name is updated to Ada");
        assert_eq!(
            session.set_phone("555-1234"),
            "The phone number is updated to 555-1234"
        );
        assert_eq!(
            session.set_email("ada@example.com"),
            "The email is updated to ada@example.com"
        );
    }

    #[test]
    fn get_reports_unset_explicitly() {
        let (session, _) = session();
        assert_eq!(session.get_name(), "User's name is not set");
        assert_eq!(session.get_phone(), "User's phone number is not set");
        assert_eq!(session.get_email(), "User's email is not set");

        session.set_phone("555-1234");
        assert_eq!(session.get_phone(), "User's phone number is 555-1234");
    }

    #[test]
    fn last_write_wins() {
        let (session, _) = session();
        session.set_name("Ada");
        assert_eq!(session.get_name(), "User's name is Ada");
        session.set_email("a@example.com");
        session.set_name("Grace");
        session.get_email();
        session.set_email("b@example.com");

        let state = session.snapshot();
        assert_eq!(state.name.as_deref(), Some("Grace"));
        assert_eq!(state.email.as_deref(), Some("b@example.com"));
        assert_eq!(state.phone, None);
    }

    #[test]
    fn reads_do_not_broadcast() {
        let (session, publisher) = session();
        session.get_name();
        session.get_phone();
        session.get_email();
        session.snapshot();
        assert_eq!(publisher.count(), 0);
    }

    #[test]
    fn empty_value_is_rejected_without_broadcast() {
        let (session, publisher) = session();
        assert_eq!(session.set_name(""), "Please provide your name.");
        assert_eq!(session.snapshot().name, None);
        assert_eq!(publisher.count(), 0);

        let err = session.apply_update(FormField::Email, String::new());
        assert!(matches!(err, Err(FormError::EmptyValue(FormField::Email))));
        assert_eq!(publisher.count(), 0);
    }

    #[test]
    fn whitespace_value_is_stored_as_given() {
        let (session, publisher) = session();
        session.set_name("Ada");
        assert_eq!(session.set_name(" "), "The name is updated to  ");
        assert_eq!(session.snapshot().name.as_deref(), Some(" "));
        assert_eq!(publisher.count(), 2);
        assert_eq!(publisher.last_state().unwrap().name.as_deref(), Some(" "));
    }

    #[test]
    fn submit_names_missing_fields_in_priority_order() {
        let (session, publisher) = session();
        assert_eq!(session.submit(), SubmitOutcome::Missing(FormField::Name));
        assert_eq!(session.submit().to_string(), "Please provide your name.");

        session.set_email("ada@example.com");
        assert_eq!(session.submit(), SubmitOutcome::Missing(FormField::Name));

        session.set_name("Ada");
        assert_eq!(session.submit(), SubmitOutcome::Missing(FormField::Phone));
        assert_eq!(
            session.submit().to_string(),
            "Please provide your phone number."
        );

        session.set_phone("555-1234");
        assert_eq!(session.submit(), SubmitOutcome::Submitted);
        assert_eq!(SubmitOutcome::Submitted.to_string(), "The form is submitted");

        // Three sets plus one successful submit.
        assert_eq!(publisher.count(), 4);
    }

    #[test]
    fn incomplete_submit_does_not_mark_or_broadcast() {
        let (session, publisher) = session();
        session.set_name("Ada");
        session.set_phone("555-1234");
        let before = publisher.count();

        assert_eq!(session.submit(), SubmitOutcome::Missing(FormField::Email));
        assert!(!session.snapshot().submitted);
        assert_eq!(publisher.count(), before);
    }

    #[test]
    fn submitted_never_reverts() {
        let (session, publisher) = session();
        session.set_name("Ada");
        session.set_phone("555-1234");
        session.set_email("ada@example.com");
        assert!(session.submit().is_submitted());

        session.set_name("Grace");
        assert!(session.snapshot().submitted);

        // Re-submission re-broadcasts the same state.
        assert!(session.submit().is_submitted());
        assert_eq!(publisher.count(), 6);
        let last = publisher.last_state().unwrap();
        assert!(last.submitted);
        assert_eq!(last.name.as_deref(), Some("Grace"));
    }

    #[test]
    fn every_broadcast_is_a_full_snapshot() {
        let (session, publisher) = session();
        session.set_name("Ada");
        session.set_phone("555-1234");

        let states = publisher.states();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].name.as_deref(), Some("Ada"));
        assert_eq!(states[0].phone, None);
        assert_eq!(states[1].name.as_deref(), Some("Ada"));
        assert_eq!(states[1].phone.as_deref(), Some("555-1234"));
        assert_eq!(states[1].email, None);
        assert!(!states[1].submitted);
    }

    #[test]
    fn concurrent_writers_broadcast_in_mutation_order() {
        let (session, publisher) = session();
        let session = Arc::new(session);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = session.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        session.set_name(&format!("writer-{}-{}", i, j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(publisher.count(), 200);
        // The final broadcast matches the final state.
        assert_eq!(publisher.last_state().unwrap(), session.snapshot());
    }
}
