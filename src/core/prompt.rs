use crate::core::message::Turn;

/// Single-turn reply constraint sent ahead of the dialogue. Keeps the model
/// answering once as "Assistant" instead of continuing both sides.
pub const PREAMBLE: &str = "You are a helpful assistant. You do not respond as \
'User' or pretend to be 'User'. You only respond once as 'Assistant'. ";

/// Cue appended after the pending input so the model continues as the
/// assistant.
const ASSISTANT_CUE: &str = " Assistant: ";

/// Assembles the full prompt: preamble, then one role-labeled paragraph per
/// turn in order, then the pending input and the assistant cue.
///
/// Deterministic: the same turns and input always produce the same string.
pub fn build_prompt(turns: &[Turn], new_user_input: &str) -> String {
    let mut prompt = String::from(PREAMBLE);
    for turn in turns {
        prompt.push_str(turn.role.prompt_label());
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push_str("\n\n");
    }
    prompt.push_str(new_user_input);
    prompt.push_str(ASSISTANT_CUE);
    prompt
}
