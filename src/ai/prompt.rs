/// Fixed persona and grounding directive for every generation request.
pub const SYSTEM_PROMPT: &str = "\
You are InsightForge, an expert Business Intelligence Analyst.
Use the provided statistical context to answer questions accurately and professionally.
If the answer is not in the context, politely say you don't have that information.";

/// Embed the retrieved context and the literal question into the user turn.
/// Both values are opaque text as far as this template is concerned.
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "STATISTICAL CONTEXT:\n{}\n\nQUESTION: {}\n\nProvide a clear, professional business analysis:",
        context, question
    )
}
