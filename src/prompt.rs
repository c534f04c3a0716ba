//! Prompt templates, one formatting function per tutor mode.
//!
//! Every function here is pure: the same request always renders the same messages.

use crate::core::ChatMessage;
use crate::image::ImageInput;
use crate::router::Mode;

pub const TUTOR_PERSONA: &str = "You are a kind and logical reading instructor. \
Answer the student's question using only the passage provided.";

pub const QUIZ_AUTHOR_PERSONA: &str =
    "You are an expert author of CSAT Korean-language exam questions.";

pub const DIAGNOSTICIAN_PERSONA: &str = "You are a reading instructor who specializes in \
diagnosing why students miss exam questions and writing remedial practice.";

pub const DEMO_PASSAGE: &str = "Economists distinguish between the price of a good and its value. \
Price is the amount paid in a market exchange, while value depends on the usefulness a person \
expects from the good. When supply is scarce, price can rise far above what most buyers would \
consider the good's value, and buyers who still purchase it reveal that, for them, expected \
usefulness exceeds the price. Water is cheap despite being essential because it is abundant; \
diamonds are expensive despite being inessential because they are scarce.";

pub const DEMO_QUESTION: &str = "Which of the following can be inferred from the passage?";

pub const DEMO_CHOICES: [&str; 5] = [
    "① The price of a good always equals its value.",
    "② Essential goods are always more expensive than inessential ones.",
    "③ A buyer who pays a high price judges the good's usefulness to exceed that price.",
    "④ Scarcity lowers the value of a good for every buyer.",
    "⑤ Abundant goods have no usefulness to buyers.",
];

pub const DEMO_ANSWER: &str = "③";

/// The attractive distractor the demo is built around.
pub const DEMO_WRONG_MARKER: &str = "④";

const CIRCLED_DIGITS: [&str; 5] = ["①", "②", "③", "④", "⑤"];

/// A fully specified tutor request. Each variant carries exactly the inputs its mode needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorRequest {
    Qa { excerpt: String, question: String },
    QuizGen { excerpt: String },
    DemoFeedback { choice: String },
    ImageDiagnosis { image: ImageInput, answer: String },
}

impl TutorRequest {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Qa { .. } => Mode::Qa,
            Self::QuizGen { .. } => Mode::QuizGen,
            Self::DemoFeedback { .. } => Mode::DemoFeedback,
            Self::ImageDiagnosis { .. } => Mode::ImageDiagnosis,
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        match self {
            Self::Qa { excerpt, question } => qa_messages(excerpt, question),
            Self::QuizGen { excerpt } => quiz_messages(excerpt),
            Self::DemoFeedback { choice } => demo_feedback_messages(choice),
            Self::ImageDiagnosis { image, answer } => diagnosis_messages(image, answer),
        }
    }
}

pub fn qa_messages(excerpt: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(TUTOR_PERSONA),
        ChatMessage::user(format!("Passage:\n{}\n\nQuestion: {}", excerpt, question)),
    ]
}

pub fn quiz_messages(excerpt: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        "You are a member of the CSAT Korean-language exam committee.\n\
         Read the [Passage] below and write ONE four-choice question in the style of the \
         CSAT reading (non-literature) section.\n\
         \n\
         [Conditions]\n\
         1. Make it an inference question about the passage's central content.\n\
         2. Write it as a difficult 3-point item that includes an <Example> box.\n\
         3. Put the answer and explanation at the very bottom, in a separate \
         \"Answer and Explanation\" section.\n\
         4. Keep the tone dry and precise, like a real exam paper.\n\
         \n\
         [Passage]\n\
         {}",
        excerpt
    );

    vec![ChatMessage::system(QUIZ_AUTHOR_PERSONA), ChatMessage::user(prompt)]
}

/// Which rubric the canned demo uses for a given choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoVerdict {
    /// The student fell for [`DEMO_WRONG_MARKER`]
    Feedback,
    Success,
}

pub fn demo_verdict(choice: &str) -> DemoVerdict {
    if normalize_choice(choice) == DEMO_WRONG_MARKER {
        DemoVerdict::Feedback
    } else {
        DemoVerdict::Success
    }
}

/// `"4"` and `"④"` name the same choice. Other labels are only trimmed.
pub fn normalize_choice(label: &str) -> String {
    let label = label.trim();
    match label.parse::<usize>() {
        Ok(n @ 1..=5) => CIRCLED_DIGITS[n - 1].to_string(),
        _ => label.to_string(),
    }
}

fn demo_question_block() -> String {
    format!(
        "[Passage]\n{}\n\n[Question]\n{}\n{}\n\nCorrect answer: {}",
        DEMO_PASSAGE,
        DEMO_QUESTION,
        DEMO_CHOICES.join("\n"),
        DEMO_ANSWER
    )
}

pub fn demo_feedback_messages(choice: &str) -> Vec<ChatMessage> {
    let choice = normalize_choice(choice);
    let rubric = match demo_verdict(&choice) {
        DemoVerdict::Feedback => format!(
            "The student chose {}, a tempting distractor.\n\
             1. Explain which sentence of the passage the student likely misread.\n\
             2. Name the reasoning error behind choosing {} (for example overgeneralization \
             or reversing cause and effect).\n\
             3. Walk through why {} is correct, citing the passage.\n\
             4. Write one new question with the same logical structure so the student can retry.",
            choice, choice, DEMO_ANSWER
        ),
        DemoVerdict::Success => format!(
            "The student chose {}. Congratulate the student briefly, then summarize in two or \
             three sentences the reasoning steps from the passage that lead to {}, and point out \
             why {} is the most tempting wrong choice.",
            choice, DEMO_ANSWER, DEMO_WRONG_MARKER
        ),
    };

    vec![
        ChatMessage::system(TUTOR_PERSONA),
        ChatMessage::user(format!(
            "{}\n\n[Feedback instructions]\n{}",
            demo_question_block(),
            rubric
        )),
    ]
}

pub fn diagnosis_messages(image: &ImageInput, answer: &str) -> Vec<ChatMessage> {
    let answer = normalize_choice(answer);
    let instructions = format!(
        "The photo shows an exam question the student got wrong. The student chose {}.\n\
         Respond in three sections:\n\
         1. [Correct answer] Identify the correct choice and justify it from the question.\n\
         2. [Diagnosis] Explain the misconception that most likely led the student to choose {}.\n\
         3. [Twin question] Write ONE new question with the same logical structure as the \
         original (different content, same trap), followed by its answer and explanation.",
        answer, answer
    );

    vec![
        ChatMessage::system(DIAGNOSTICIAN_PERSONA),
        ChatMessage::user_with_image(instructions, image.data_uri()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_labels_become_circled() {
        assert_eq!(normalize_choice("4"), "④");
        assert_eq!(normalize_choice(" ② "), "②");
        assert_eq!(normalize_choice("6"), "6");
        assert_eq!(normalize_choice("0"), "0");
        assert_eq!(normalize_choice("B"), "B");
    }

    #[test]
    fn wrong_marker_selects_feedback_branch() {
        assert_eq!(demo_verdict("4"), DemoVerdict::Feedback);
        assert_eq!(demo_verdict("④"), DemoVerdict::Feedback);
        assert_eq!(demo_verdict("2"), DemoVerdict::Success);
        assert_eq!(demo_verdict("3"), DemoVerdict::Success);
    }

    #[test]
    fn demo_prompt_carries_rubric_for_branch() {
        let feedback = demo_feedback_messages("4")[1].text();
        assert!(feedback.contains("The student chose ④, a tempting distractor."));
        assert!(feedback.contains(DEMO_PASSAGE));

        let success = demo_feedback_messages("2")[1].text();
        assert!(success.contains("The student chose ②. Congratulate"));
    }

    #[test]
    fn quiz_prompt_embeds_passage_last() {
        let messages = quiz_messages("Tides follow the moon.");
        assert_eq!(messages[0], ChatMessage::system(QUIZ_AUTHOR_PERSONA));
        let prompt = messages[1].text();
        assert!(prompt.contains("Answer and Explanation"));
        assert!(prompt.ends_with("[Passage]\nTides follow the moon."));
    }
}
