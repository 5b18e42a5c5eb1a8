//! LLM prompt engineering for article analysis

use truthlens_llm::ChatMessage;

/// Builds the two-message conversation sent to the completion API
///
/// Rendering is plain interpolation: the article is inserted verbatim and the
/// output for a given text never varies.
pub struct PromptBuilder<'a> {
    text: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// The fixed system instruction
    pub fn system_instruction(&self) -> &'static str {
        SYSTEM_INSTRUCTION
    }

    /// Build the user instruction with the article embedded
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(ANALYSIS_INSTRUCTIONS.len() + self.text.len() + 16);

        prompt.push_str(ANALYSIS_INSTRUCTIONS);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt.push_str("\n\n");
        prompt.push_str("Article: ");
        prompt.push_str(self.text);
        prompt.push('\n');

        prompt
    }

    /// Build the full conversation: system instruction, then user instruction
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_instruction()),
            ChatMessage::user(self.build()),
        ]
    }
}

const SYSTEM_INSTRUCTION: &str = "You are a JSON-only response bot. Always respond with a single, valid JSON object. No markdown, no explanations, no formatting, no additional text.";

const ANALYSIS_INSTRUCTIONS: &str = r#"You are an expert media analyst. You will receive a short news article and must return only a JSON object with this structure:

{
    "factual_accuracy": number between 0 and 100,
    "bias": one of ["left", "right", "neutral"],
    "emotional_tone": one of ["neutral", "alarmist", "euphoric"],
    "recommendation": string
}"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Do not include triple backticks, markdown formatting, or any explanations. Return ONLY the JSON object.";
