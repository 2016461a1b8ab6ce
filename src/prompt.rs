use crate::core::types::{ConversationTurn, Quote};

pub const PERSONA: &str = "You are an expert stock analyst AI assistant. You have access to real-time stock data and market information.";

const GUIDELINES: &str = "Provide comprehensive analysis including technical analysis, fundamental analysis, market sentiment, risk assessment, and investment recommendations.
Always include appropriate disclaimers about investment risks and that this is not financial advice.
Be conversational but professional in your response.";

pub const NO_HISTORY: &str = "No previous conversation.";

/// Assembles the single text prompt sent to the completion provider.
///
/// The quote line is left out entirely when there is no quote. An empty
/// history is rendered as [`NO_HISTORY`] so the model always sees the
/// section. The message itself is not validated here.
pub fn build_prompt(message: &str, quote: Option<&Quote>, history: &[ConversationTurn]) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str(PERSONA);
    prompt.push('\n');

    if let Some(quote) = quote {
        // Serializing a plain struct of numbers and strings does not fail.
        let data = serde_json::to_string(quote).unwrap_or_default();
        prompt.push_str("Current Stock Data: ");
        prompt.push_str(&data);
        prompt.push('\n');
    }

    prompt.push('\n');
    prompt.push_str(GUIDELINES);
    prompt.push_str("\n\nPrevious conversation:\n");
    prompt.push_str(&render_history(history));
    prompt.push_str("\n\nCurrent question: ");
    prompt.push_str(message);
    prompt
}

fn render_history(history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return NO_HISTORY.to_string();
    }

    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
