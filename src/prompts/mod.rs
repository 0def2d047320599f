use minijinja::{context, Environment};
use once_cell::sync::Lazy;
use tracing::error;

// NOTE:
// The taxonomy text and the per-request template are kept separate so the
// taxonomy can be reused verbatim wherever the closed intent set matters.
// The chat client concatenates both into one system message.

pub const INTENT_DESCRIPTIONS: &str = "\
You are an AI assistant that classifies German customer support text into one of the following intents:

- login_problems: Issues with login, password, account lockout
- payment_issues: Problems with payment, cards, refunds, double charges
- account_changes: Change email, phone number, address
- technical_error: Errors, app crashes, loading issues
- subscription: Cancel subscription, upgrade, invoices
- delivery: Late delivery, tracking, missing package
- returns: Returning products, refund requests
- product_info: Product details, warranty questions
- security: Account hacked, unknown login attempts
- general_question: General information, support availability

Return ONLY the intent name.
";

const FALLBACK_TEMPLATE_NAME: &str = "fallback_request";

const FALLBACK_TEMPLATE: &str = "\
Classify the following German customer request into one of the intents described above.

Request:
\"\"\"{{ text }}\"\"\"

Return ONLY the intent name.
";

static TEMPLATE_ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template(FALLBACK_TEMPLATE_NAME, FALLBACK_TEMPLATE)
        .expect("invalid fallback template");
    env
});

/// Render the per-request half of the fallback prompt.
pub fn build_fallback_prompt(text: &str) -> String {
    let rendered = TEMPLATE_ENV
        .get_template(FALLBACK_TEMPLATE_NAME)
        .and_then(|template| template.render(context! { text }));
    match rendered {
        Ok(prompt) => prompt,
        Err(err) => {
            error!("fallback prompt render failed: {err}");
            format!("Classify the following German customer request into one of the intents described above.\n\nRequest:\n\"\"\"{text}\"\"\"\n\nReturn ONLY the intent name.")
        }
    }
}

/// Full system message for the fallback model: taxonomy plus request.
pub fn system_prompt(text: &str) -> String {
    format!("{INTENT_DESCRIPTIONS}\n{}", build_fallback_prompt(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_INTENTS: &[&str] = &[
        "login_problems",
        "payment_issues",
        "account_changes",
        "technical_error",
        "subscription",
        "delivery",
        "returns",
        "product_info",
        "security",
        "general_question",
    ];

    #[test]
    fn taxonomy_lists_every_intent() {
        for intent in ALL_INTENTS {
            assert!(
                INTENT_DESCRIPTIONS.contains(intent),
                "taxonomy text is missing {intent}"
            );
        }
    }

    #[test]
    fn request_prompt_embeds_the_query() {
        let prompt = build_fallback_prompt("Ich kann mich nicht einloggen");
        assert!(prompt.contains("Ich kann mich nicht einloggen"));
        assert!(prompt.to_lowercase().contains("intents described above"));
    }

    #[test]
    fn system_prompt_carries_both_parts() {
        let prompt = system_prompt("Wo ist mein Paket?");
        assert!(prompt.contains("login_problems"));
        assert!(prompt.contains("Wo ist mein Paket?"));
    }
}
