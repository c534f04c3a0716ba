//! Mode selection and the request/response loop.
//!
//! [`build_request`] is the pure half: it turns explicit [`AppState`] into a
//! [`TutorRequest`], or reports which input is missing. [`Tutor`] is the effectful
//! half: one awaited completion per action, every failure converted to a displayable
//! [`Outcome::Failed`].

use std::fmt;

use tracing::{error, info, instrument, warn};

use crate::core::{render_transcript, ChatClient};
use crate::image::ImageInput;
use crate::interceptors::Interceptor;
use crate::prompt::TutorRequest;

/// The mutually exclusive top-level features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Answer a question about the excerpt
    Qa,
    /// Write one practice question modeled on the excerpt
    QuizGen,
    /// Feedback on the built-in demo question
    DemoFeedback,
    /// Diagnose a photographed wrong answer and write a twin question
    ImageDiagnosis,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Qa, Mode::QuizGen, Mode::DemoFeedback, Mode::ImageDiagnosis];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Qa => "Q&A",
            Mode::QuizGen => "Quiz generation",
            Mode::DemoFeedback => "Demo feedback",
            Mode::ImageDiagnosis => "Image error analysis",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the user has provided so far. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub excerpt: Option<String>,
    pub question: String,
    pub chosen_answer: String,
    pub image: Option<ImageInput>,
}

impl AppState {
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.chosen_answer = answer.into();
        self
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }
}

/// The first required input a mode found missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Excerpt,
    Question,
    Answer,
    Image,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Excerpt => write!(f, "document text"),
            Missing::Question => write!(f, "question"),
            Missing::Answer => write!(f, "chosen answer"),
            Missing::Image => write!(f, "photo"),
        }
    }
}

fn non_empty(value: &str, missing: Missing) -> Result<String, Missing> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(missing)
    } else {
        Ok(trimmed.to_string())
    }
}

fn excerpt(state: &AppState) -> Result<String, Missing> {
    // The excerpt is passed through verbatim; only emptiness is checked
    match state.excerpt.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(Missing::Excerpt),
    }
}

/// Compose the request for `mode`, or name the missing input.
pub fn build_request(mode: Mode, state: &AppState) -> Result<TutorRequest, Missing> {
    match mode {
        Mode::Qa => Ok(TutorRequest::Qa {
            excerpt: excerpt(state)?,
            question: non_empty(&state.question, Missing::Question)?,
        }),
        Mode::QuizGen => Ok(TutorRequest::QuizGen { excerpt: excerpt(state)? }),
        Mode::DemoFeedback => Ok(TutorRequest::DemoFeedback {
            choice: non_empty(&state.chosen_answer, Missing::Answer)?,
        }),
        Mode::ImageDiagnosis => {
            let image = state.image.clone().ok_or(Missing::Image)?;
            Ok(TutorRequest::ImageDiagnosis {
                image,
                answer: non_empty(&state.chosen_answer, Missing::Answer)?,
            })
        }
    }
}

/// Result of one user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A required input was missing; no request was issued
    Skipped(Missing),
    /// The model's text, unmodified
    Completed(String),
    /// A displayable error message
    Failed(String),
}

impl Outcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Completed(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Runs tutor actions against a chat client.
#[derive(Debug)]
pub struct Tutor<C: ChatClient> {
    client: C,
    interceptor: Option<Box<dyn Interceptor>>,
}

impl<C: ChatClient> Tutor<C> {
    pub fn new(client: C) -> Self {
        info!(model = %client.model(), "Creating tutor");
        Self { client, interceptor: None }
    }

    pub fn with_interceptor(mut self, interceptor: Box<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Build the request for `mode` and run it. Missing inputs skip silently.
    #[instrument(skip(self, state), fields(mode = %mode))]
    pub async fn run(&self, mode: Mode, state: &AppState) -> Outcome {
        match build_request(mode, state) {
            Ok(request) => self.execute(&request).await,
            Err(missing) => {
                info!(%missing, "Required input missing, not calling the model");
                Outcome::Skipped(missing)
            }
        }
    }

    /// One completion call. Every error becomes `Outcome::Failed`.
    pub async fn execute(&self, request: &TutorRequest) -> Outcome {
        let messages = request.messages();
        let transcript = self.interceptor.as_ref().map(|_| render_transcript(&messages));

        match self.client.complete(messages).await {
            Ok(text) => {
                info!(mode = %request.mode(), response_len = text.len(), "Tutor response ready");
                if let (Some(interceptor), Some(prompt)) = (&self.interceptor, transcript) {
                    if let Err(e) = interceptor.save(&prompt, &text).await {
                        warn!(error = %e, "Failed to save transcript");
                    }
                }
                Outcome::Completed(text)
            }
            Err(e) => {
                error!(mode = %request.mode(), error = %e, "Tutor request failed");
                Outcome::Failed(format!("The tutor could not answer: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_requires_excerpt_then_question() {
        let state = AppState::default().with_question("Why?");
        assert_eq!(build_request(Mode::Qa, &state), Err(Missing::Excerpt));

        let state = state.with_excerpt("   ");
        assert_eq!(build_request(Mode::Qa, &state), Err(Missing::Excerpt));

        let state = AppState::default().with_excerpt("Text").with_question("  ");
        assert_eq!(build_request(Mode::Qa, &state), Err(Missing::Question));
    }

    #[test]
    fn demo_feedback_needs_only_a_choice() {
        assert_eq!(build_request(Mode::DemoFeedback, &AppState::default()), Err(Missing::Answer));
        assert_eq!(
            build_request(Mode::DemoFeedback, &AppState::default().with_answer(" 4 ")),
            Ok(TutorRequest::DemoFeedback { choice: "4".into() })
        );
    }

    #[test]
    fn image_diagnosis_requires_image_and_answer() {
        let image = ImageInput::from_bytes(vec![0xff, 0xd8, 0xff, 0x00]).unwrap();
        let state = AppState::default().with_answer("3");
        assert_eq!(build_request(Mode::ImageDiagnosis, &state), Err(Missing::Image));

        let state = AppState::default().with_image(image.clone());
        assert_eq!(build_request(Mode::ImageDiagnosis, &state), Err(Missing::Answer));

        let state = state.with_answer("3");
        assert_eq!(
            build_request(Mode::ImageDiagnosis, &state),
            Ok(TutorRequest::ImageDiagnosis { image, answer: "3".into() })
        );
    }
}
