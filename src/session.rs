//! Session controller: the single-user edit flow as a state machine.
//!
//! ```text
//! Idle --set_image--> Ready --begin_generate--> Busy --complete(Ok)--> ReadyWithResult
//!                       ^                        |                         |
//!                       +-----complete(Err)------+                         |
//!                       +-----------------------new_edit-------------------+
//! any --reset--> Idle
//! ```
//!
//! At most one request is in flight. A request can be split into
//! [`Session::begin_generate`] and [`Session::complete`] so a caller can run
//! the network call elsewhere; [`Session::generate`] does both.

use crate::error::{FailureKind, LensError, Result};
use crate::image::{EditRequest, EncodedImage, ImageEditor, ImageEditorExt};
use crate::presets::Preset;
use tokio_util::sync::CancellationToken;

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No image loaded.
    Idle,
    /// Image loaded, no successful result (possibly an error).
    Ready,
    /// A request is in flight.
    Busy,
    /// Image loaded and an edited image is available.
    ReadyWithResult,
}

/// Outcome of one edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditResult {
    /// The model produced an image.
    Success {
        /// The edited image.
        image: EncodedImage,
        /// The instruction that produced it.
        instruction_echo: String,
    },
    /// The request failed.
    Failure {
        /// Failure classification.
        reason: FailureKind,
        /// Human-readable message for display.
        message: String,
    },
}

impl EditResult {
    fn from_outcome(outcome: Result<EncodedImage>, instruction: String) -> Self {
        match outcome {
            Ok(image) => Self::Success {
                image,
                instruction_echo: instruction,
            },
            Err(err) => Self::Failure {
                reason: err.kind().unwrap_or(FailureKind::TransportError),
                message: err.to_string(),
            },
        }
    }

    /// True for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A request handed out by [`Session::begin_generate`].
#[derive(Debug, Clone)]
pub struct PendingEdit {
    ticket: u64,
    request: EditRequest,
}

impl PendingEdit {
    /// Identifies this request when completing it.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// The request to send.
    pub fn request(&self) -> &EditRequest {
        &self.request
    }
}

#[derive(Debug)]
struct InFlight {
    ticket: u64,
    instruction: String,
}

/// The edit session aggregate.
#[derive(Debug, Default)]
pub struct Session {
    image: Option<EncodedImage>,
    instruction: String,
    result: Option<EditResult>,
    in_flight: Option<InFlight>,
    last_instruction: Option<String>,
    next_ticket: u64,
}

impl Session {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.in_flight.is_some() {
            Phase::Busy
        } else if self.image.is_none() {
            Phase::Idle
        } else if self.result.as_ref().is_some_and(EditResult::is_success) {
            Phase::ReadyWithResult
        } else {
            Phase::Ready
        }
    }

    /// True while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The loaded image.
    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    /// The instruction text as currently entered.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Result of the last completed request.
    pub fn result(&self) -> Option<&EditResult> {
        self.result.as_ref()
    }

    /// The edited image, if the last request succeeded.
    pub fn generated(&self) -> Option<&EncodedImage> {
        match &self.result {
            Some(EditResult::Success { image, .. }) => Some(image),
            _ => None,
        }
    }

    /// Error message of the last request, if it failed.
    pub fn error(&self) -> Option<&str> {
        match &self.result {
            Some(EditResult::Failure { message, .. }) => Some(message),
            _ => None,
        }
    }

    /// Loads a new image, discarding instruction, result and error.
    pub fn set_image(&mut self, image: EncodedImage) -> Result<()> {
        self.ensure_not_busy()?;
        self.image = Some(image);
        self.instruction.clear();
        self.result = None;
        self.last_instruction = None;
        Ok(())
    }

    /// Replaces the instruction text.
    pub fn set_instruction(&mut self, text: impl Into<String>) -> Result<()> {
        self.ensure_not_busy()?;
        self.instruction = text.into();
        Ok(())
    }

    /// Starts a request with the current instruction.
    ///
    /// Refused locally when busy, when no image is loaded, or when the
    /// instruction is blank.
    pub fn begin_generate(&mut self) -> Result<PendingEdit> {
        self.ensure_not_busy()?;
        let image = self.image.clone().ok_or(LensError::NoImage)?;
        let request = EditRequest::new(image, self.instruction.clone())?;

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.result = None;
        self.last_instruction = Some(self.instruction.clone());
        self.in_flight = Some(InFlight {
            ticket,
            instruction: self.instruction.clone(),
        });

        tracing::debug!(ticket, instruction = %self.instruction, "edit started");
        Ok(PendingEdit { ticket, request })
    }

    /// Sets the instruction to the preset's prompt and starts a request.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<PendingEdit> {
        self.set_instruction(preset.prompt)?;
        self.begin_generate()
    }

    /// Starts a request with the instruction of the previous request.
    pub fn retry(&mut self) -> Result<PendingEdit> {
        let last = self
            .last_instruction
            .clone()
            .ok_or(LensError::EmptyInstruction)?;
        self.set_instruction(last)?;
        self.begin_generate()
    }

    /// Applies the outcome of the request identified by `ticket`.
    ///
    /// Returns `Ok(None)` if the session was reset while the request was in
    /// flight; the outcome is then dropped.
    pub fn complete(
        &mut self,
        ticket: u64,
        outcome: Result<EncodedImage>,
    ) -> Result<Option<&EditResult>> {
        if ticket >= self.next_ticket {
            return Err(LensError::NoRequestInFlight);
        }
        match self.in_flight.take() {
            Some(in_flight) if in_flight.ticket == ticket => {
                if let Err(ref err) = outcome {
                    tracing::warn!(ticket, "edit failed: {err}");
                }
                self.result = Some(EditResult::from_outcome(outcome, in_flight.instruction));
                Ok(self.result.as_ref())
            }
            other => {
                self.in_flight = other;
                tracing::debug!(ticket, "discarding outcome of a superseded edit");
                Ok(None)
            }
        }
    }

    /// Runs one edit with the current instruction through `editor`.
    pub async fn generate<E>(&mut self, editor: &E) -> Result<&EditResult>
    where
        E: ImageEditor + ?Sized,
    {
        let pending = self.begin_generate()?;
        let outcome = editor.edit(pending.request()).await;
        self.finish(pending.ticket(), outcome)
    }

    /// Like [`Session::generate`], but stops early when `token` is cancelled.
    pub async fn generate_with_cancel<E>(
        &mut self,
        editor: &E,
        token: &CancellationToken,
    ) -> Result<&EditResult>
    where
        E: ImageEditor + ?Sized,
    {
        let pending = self.begin_generate()?;
        let outcome = editor.edit_with_cancel(pending.request(), token).await;
        self.finish(pending.ticket(), outcome)
    }

    fn finish(&mut self, ticket: u64, outcome: Result<EncodedImage>) -> Result<&EditResult> {
        self.complete(ticket, outcome)?
            .ok_or(LensError::NoRequestInFlight)
    }

    /// Clears the result so another edit can be made on the same image.
    pub fn new_edit(&mut self) -> Result<()> {
        self.ensure_not_busy()?;
        self.result = None;
        Ok(())
    }

    /// Returns to `Idle`, discarding everything including any in-flight request.
    pub fn reset(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(ticket = in_flight.ticket, "reset while an edit was in flight");
        }
        self.image = None;
        self.instruction.clear();
        self.result = None;
        self.last_instruction = None;
    }

    fn ensure_not_busy(&self) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(LensError::Busy);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    fn image() -> EncodedImage {
        EncodedImage::from_bytes(b"original", "image/png").unwrap()
    }

    fn edited() -> EncodedImage {
        EncodedImage::from_bytes(b"edited", "image/png").unwrap()
    }

    fn ready() -> Session {
        let mut session = Session::new();
        session.set_image(image()).unwrap();
        session
    }

    #[test]
    fn test_idle_to_ready() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);
        session.set_image(image()).unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.image(), Some(&image()));
    }

    #[test]
    fn test_guards_refuse_locally() {
        let mut session = Session::new();
        session.set_instruction("make it pop").unwrap();
        assert!(matches!(session.begin_generate(), Err(LensError::NoImage)));

        let mut session = ready();
        session.set_instruction("  ").unwrap();
        assert!(matches!(
            session.begin_generate(),
            Err(LensError::EmptyInstruction)
        ));
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn test_success_path() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        assert_eq!(session.phase(), Phase::Busy);
        assert_eq!(pending.request().instruction(), "brighten");

        let result = session.complete(pending.ticket(), Ok(edited())).unwrap().unwrap();
        assert_eq!(
            result,
            &EditResult::Success {
                image: edited(),
                instruction_echo: "brighten".into()
            }
        );
        assert_eq!(session.phase(), Phase::ReadyWithResult);
        assert_eq!(session.generated(), Some(&edited()));
        assert!(session.error().is_none());
    }

    #[test]
    fn test_failure_returns_to_ready_with_error() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        session
            .complete(pending.ticket(), Err(LensError::ModelRefused("no".into())))
            .unwrap();

        assert_eq!(session.phase(), Phase::Ready);
        assert!(session.error().unwrap().contains("no"));
        assert!(matches!(
            session.result(),
            Some(EditResult::Failure {
                reason: FailureKind::ModelRefused,
                ..
            })
        ));
        assert_eq!(session.instruction(), "brighten");
    }

    #[test]
    fn test_new_attempt_clears_previous_error() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        session
            .complete(pending.ticket(), Err(LensError::NoImageProduced))
            .unwrap();
        assert!(session.error().is_some());

        session.begin_generate().unwrap();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_busy_refuses_mutation() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        session.begin_generate().unwrap();

        assert!(matches!(session.begin_generate(), Err(LensError::Busy)));
        assert!(matches!(session.set_instruction("x"), Err(LensError::Busy)));
        assert!(matches!(session.set_image(image()), Err(LensError::Busy)));
        assert!(matches!(session.new_edit(), Err(LensError::Busy)));
        assert!(matches!(
            session.apply_preset(&presets::PRESETS[0]),
            Err(LensError::Busy)
        ));
        assert_eq!(session.instruction(), "brighten");
    }

    #[test]
    fn test_preset_sets_instruction_and_starts() {
        let mut session = ready();
        let preset = presets::find("white-background").unwrap();
        let pending = session.apply_preset(preset).unwrap();
        assert_eq!(session.instruction(), preset.prompt);
        assert_eq!(pending.request().instruction(), preset.prompt);
        assert!(session.is_busy());
    }

    #[test]
    fn test_new_edit_keeps_image_and_instruction() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        session.complete(pending.ticket(), Ok(edited())).unwrap();

        session.new_edit().unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert!(session.result().is_none());
        assert_eq!(session.image(), Some(&image()));
        assert_eq!(session.instruction(), "brighten");
    }

    #[test]
    fn test_set_image_clears_everything_else() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        session.complete(pending.ticket(), Ok(edited())).unwrap();

        session.set_image(edited()).unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.instruction(), "");
        assert!(session.result().is_none());
    }

    #[test]
    fn test_reset_after_success() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        session.complete(pending.ticket(), Ok(edited())).unwrap();

        session.reset();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.image().is_none());
        assert_eq!(session.instruction(), "");
        assert!(session.result().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_reset_while_busy_discards_late_outcome() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let stale = session.begin_generate().unwrap();

        session.reset();
        assert_eq!(session.phase(), Phase::Idle);

        session.set_image(image()).unwrap();
        session.set_instruction("darken").unwrap();
        let current = session.begin_generate().unwrap();

        assert!(session.complete(stale.ticket(), Ok(edited())).unwrap().is_none());
        assert_eq!(session.phase(), Phase::Busy);

        session.complete(current.ticket(), Ok(edited())).unwrap();
        assert!(matches!(
            session.result(),
            Some(EditResult::Success { instruction_echo, .. }) if instruction_echo == "darken"
        ));
    }

    #[test]
    fn test_complete_unknown_ticket() {
        let mut session = ready();
        assert!(matches!(
            session.complete(0, Ok(edited())),
            Err(LensError::NoRequestInFlight)
        ));
    }

    #[test]
    fn test_retry_reuses_last_instruction() {
        let mut session = ready();
        assert!(matches!(session.retry(), Err(LensError::EmptyInstruction)));

        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        session
            .complete(pending.ticket(), Err(LensError::Cancelled))
            .unwrap();
        session.set_instruction("").unwrap();

        let pending = session.retry().unwrap();
        assert_eq!(pending.request().instruction(), "brighten");
    }

    #[test]
    fn test_unclassified_error_becomes_transport_failure() {
        let mut session = ready();
        session.set_instruction("brighten").unwrap();
        let pending = session.begin_generate().unwrap();
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        session.complete(pending.ticket(), Err(io.into())).unwrap();
        assert!(matches!(
            session.result(),
            Some(EditResult::Failure {
                reason: FailureKind::TransportError,
                ..
            })
        ));
    }
}
