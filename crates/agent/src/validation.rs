//! Accuracy guard applied to model answers before they reach the user.

/// Phrases that signal the model is guessing rather than reading data.
pub const HEDGING_PHRASES: [&str; 9] = [
    "i believe",
    "i think",
    "probably",
    "might be",
    "could be",
    "i assume",
    "typically",
    "usually",
    "in general",
];

const DATA_WORDS: [&str; 4] = ["report", "status", "completion", "count"];

pub const VERIFICATION_REQUEST: &str = "I need to verify this information before providing a \
definitive answer. Let me check the exact data for you. Could you please rephrase your question \
to be more specific?";

pub const DATA_NOTE: &str = "\n\n[Note: This information is based on current data. Please verify \
critical details before making decisions.]";

/// Hedged answers are replaced outright; answers about operational figures
/// carry a verification note.
pub fn validate_response(response: &str) -> String {
    let lower = response.to_lowercase();
    if HEDGING_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return VERIFICATION_REQUEST.to_string();
    }

    let mut validated = response.to_string();
    if DATA_WORDS.iter().any(|word| lower.contains(word)) {
        validated.push_str(DATA_NOTE);
    }
    validated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hedging_is_replaced() {
        assert_eq!(
            validate_response("The football is PROBABLY in the store room."),
            VERIFICATION_REQUEST
        );
        assert_eq!(validate_response("I think so"), VERIFICATION_REQUEST);
    }

    #[test]
    fn test_data_answers_get_note() {
        let response = validate_response("Prop PROP001 status: good");
        assert!(response.starts_with("Prop PROP001 status: good"));
        assert!(response.ends_with(DATA_NOTE));
    }

    #[test]
    fn test_plain_answers_pass_through() {
        assert_eq!(validate_response("Period 2 is PE."), "Period 2 is PE.");
    }
}
