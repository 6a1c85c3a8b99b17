//! Composite prompt construction.

/// Marker preceding the user's question.
pub const QUERY_MARKER: &str = "QUERY: ";
/// Marker preceding the retrieved context block.
pub const CONTEXT_MARKER: &str = "\n\nCONTEXT:";

/// Build the composite user turn sent for one exchange.
///
/// Layout: `{instructions} QUERY: {query}\n\nCONTEXT:{context}`. Empty
/// instructions drop the leading separator; an empty context leaves the
/// marker in place with nothing after it.
pub fn compose_prompt(instructions: &str, query: &str, context: &str) -> String {
    let instructions = instructions.trim_end();
    let mut prompt = String::with_capacity(
        instructions.len() + QUERY_MARKER.len() + query.len() + CONTEXT_MARKER.len() + context.len() + 1,
    );
    if !instructions.is_empty() {
        prompt.push_str(instructions);
        prompt.push(' ');
    }
    prompt.push_str(QUERY_MARKER);
    prompt.push_str(query);
    prompt.push_str(CONTEXT_MARKER);
    prompt.push_str(context);
    prompt
}
