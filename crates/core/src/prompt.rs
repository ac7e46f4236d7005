//! Prompt construction for rewriting and summarizing.

use crate::client::CompletionRequest;
use crate::level::CefrLevel;

/// How long a requested summary should be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLength {
    /// Long-form input: 500 to 600 words
    Detailed,
    /// Short input: at most 100 words
    Brief,
}

impl SummaryLength {
    /// Pick the summary length for an input of `char_len` characters.
    pub fn for_input(char_len: usize, long_form_threshold: usize) -> Self {
        if char_len > long_form_threshold { SummaryLength::Detailed } else { SummaryLength::Brief }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            SummaryLength::Detailed => "The summary should be 500-600 words long.",
            SummaryLength::Brief => "The summary should be no more than 100 words long.",
        }
    }
}

fn system_message(level: CefrLevel) -> String {
    format!(
        "You are an expert language teacher who adapts texts for learners at CEFR level {} ({}).",
        level.code(),
        level.label()
    )
}

/// Build the request that rewrites one chunk for `level`.
pub fn rewrite_request(text: &str, level: CefrLevel, max_tokens: u32, temperature: f32) -> CompletionRequest {
    let user = format!(
        "Rewrite the following text for a reader at CEFR level {code}.\n\
         Level guideline: {guideline}\n\n\
         Rules:\n\
         1. Preserve the exact meaning. Do not add, remove or reorder information.\n\
         2. Adjust only vocabulary and sentence structure to match level {code}.\n\
         3. Return only the rewritten text, with no introduction, notes or quotation marks.\n\n\
         Text:\n{text}",
        code = level.code(),
        guideline = level.guideline(),
        text = text,
    );

    CompletionRequest { system: system_message(level), user, max_tokens, temperature }
}

/// Build the request that summarizes the whole page text for `level`.
pub fn summary_request(
    text: &str, level: CefrLevel, length: SummaryLength, max_tokens: u32, temperature: f32,
) -> CompletionRequest {
    let user = format!(
        "Summarize the following text for a reader at CEFR level {code}.\n\
         Level guideline: {guideline}\n\n\
         Rules:\n\
         1. Keep the key facts and the meaning of the original accurate.\n\
         2. Use only vocabulary and sentence structures suitable for level {code}.\n\
         3. {length}\n\
         4. Return only the summary text, with no title or notes.\n\n\
         Text:\n{text}",
        code = level.code(),
        guideline = level.guideline(),
        length = length.instruction(),
        text = text,
    );

    CompletionRequest { system: system_message(level), user, max_tokens, temperature }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_prompt_embeds_guideline_and_text() {
        let request = rewrite_request("The cat sat on the mat.", CefrLevel::A2, 2000, 0.3);
        assert!(request.user.contains(CefrLevel::A2.guideline()));
        assert!(request.user.contains("The cat sat on the mat."));
        assert!(request.user.contains("Preserve the exact meaning"));
        assert!(request.user.contains("Return only the rewritten text"));
        assert!(request.system.contains("A2"));
        assert_eq!(request.max_tokens, 2000);
    }

    #[test]
    fn test_summary_length_threshold() {
        assert_eq!(SummaryLength::for_input(3001, 3000), SummaryLength::Detailed);
        assert_eq!(SummaryLength::for_input(3000, 3000), SummaryLength::Brief);
        assert_eq!(SummaryLength::for_input(10, 3000), SummaryLength::Brief);
    }

    #[test]
    fn test_summary_prompt_requests_length() {
        let detailed = summary_request("text", CefrLevel::C1, SummaryLength::Detailed, 1500, 0.7);
        assert!(detailed.user.contains("500-600 words"));

        let brief = summary_request("text", CefrLevel::C1, SummaryLength::Brief, 1500, 0.7);
        assert!(brief.user.contains("no more than 100 words"));
        assert!(brief.user.contains(CefrLevel::C1.guideline()));
    }
}
