//! Prompt templates for minutes generation and follow-up questions.

use crate::llm::Prompt;

/// System instruction for the minutes-generation model.
pub const MINUTES_SYSTEM: &str = "You are an assistant that helps analyze meeting transcripts.";

/// User instruction template; `{transcript}` is replaced with the transcript text.
pub const MINUTES_USER_TEMPLATE: &str = "Analyze the following meeting transcript:\n\n{transcript}\n\n\
Provide very detailed meeting minutes with details like the date of the meeting, the speakers, \
what were the highlights of what the speakers said, the category, any conclusions, next steps, \
and action items. Make sure you highlight Attendees, Categories, Conclusions and Meeting Summary \
in bold. The headings should be supported by pdf format, place the bold text in Markdown format \
using **double asterisks**.";

/// System instruction for question answering.
pub const QA_SYSTEM: &str = "You are an AI assistant answering questions about meeting minutes.";

/// Build the minutes-generation prompt for a transcript.
pub fn minutes_prompt(transcript: &str, max_tokens: u32) -> Prompt {
    let user = MINUTES_USER_TEMPLATE.replace("{transcript}", transcript);
    Prompt {
        completion: format!("{MINUTES_SYSTEM}\n\n{user}"),
        system: MINUTES_SYSTEM.to_string(),
        user,
        max_tokens: Some(max_tokens),
    }
}

/// Build the question-answering prompt over a transcript.
pub fn question_prompt(transcript: &str, question: &str, max_tokens: u32) -> Prompt {
    Prompt {
        system: QA_SYSTEM.to_string(),
        user: format!(
            "Meeting Minutes:\n{transcript}\n\nQuestion: {question}\n\n\
Provide a concise and direct answer based strictly on the meeting minutes."
        ),
        completion: format!("Meeting Minutes:\n{transcript}\n\nQuestion: {question}\n\nAnswer:"),
        max_tokens: Some(max_tokens),
    }
}
