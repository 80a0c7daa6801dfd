use super::prompt::{DEFAULT_CONFIDENCE, HIJACK_DEFENSE, SYSTEM_PROMPT};
use crate::model::ImprovementJudgment;
use crate::providers::llm::{extract_json, LlmClient};

pub(crate) async fn call_judgment_impl(
    client: &dyn LlmClient,
    prompt: &str,
    hijack_defense: bool,
) -> anyhow::Result<ImprovementJudgment> {
    let mut sys_prompt = SYSTEM_PROMPT.to_string();
    if hijack_defense {
        sys_prompt.push_str(HIJACK_DEFENSE);
    }

    let resp = client.complete(prompt, Some(&[sys_prompt])).await?;
    parse_judgment_impl(&resp.text)
}

pub(crate) fn parse_judgment_impl(text: &str) -> anyhow::Result<ImprovementJudgment> {
    let val = extract_json(text)?;

    let should_continue = val
        .get("should_continue")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| anyhow::anyhow!("judgment JSON missing 'should_continue' field"))?;

    let reasoning = val
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let confidence_score = match val.get("confidence_score").and_then(|v| v.as_f64()) {
        None => DEFAULT_CONFIDENCE,
        Some(c) if (0.0..=1.0).contains(&c) => c,
        Some(c) => {
            let clamped = if c.is_nan() { DEFAULT_CONFIDENCE } else { c.clamp(0.0, 1.0) };
            tracing::warn!(confidence = c, clamped, "judgment confidence out of range");
            clamped
        }
    };

    Ok(ImprovementJudgment {
        should_continue,
        reasoning,
        confidence_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_decision_is_an_error() {
        let err = parse_judgment_impl(r#"{"reasoning": "unsure"}"#).unwrap_err();
        assert!(err.to_string().contains("should_continue"));
    }

    #[test]
    fn confidence_defaults_and_clamps() {
        let j = parse_judgment_impl(r#"{"should_continue": true}"#).unwrap();
        assert_eq!(j.confidence_score, 0.5);
        assert_eq!(j.reasoning, "");

        let j = parse_judgment_impl(r#"{"should_continue": true, "confidence_score": 1.7}"#)
            .unwrap();
        assert_eq!(j.confidence_score, 1.0);

        let j = parse_judgment_impl(r#"{"should_continue": false, "confidence_score": -2}"#)
            .unwrap();
        assert_eq!(j.confidence_score, 0.0);
    }

    #[test]
    fn prose_around_json_is_ignored() {
        let j = parse_judgment_impl(
            "After review:\n{\"should_continue\": true, \"reasoning\": \"metric depth is rising\", \"confidence_score\": 0.66}\nThanks.",
        )
        .unwrap();
        assert!(j.should_continue);
        assert_eq!(j.reasoning, "metric depth is rising");
    }
}
