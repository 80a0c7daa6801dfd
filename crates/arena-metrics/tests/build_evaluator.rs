use arena_core::config::{ArenaConfig, EvaluatorConfig, ResolvedJudgeSettings};
use arena_core::evaluator::Evaluator;
use arena_core::providers::llm::{ClientCache, FakeClient, LlmClient};
use arena_core::ConfigError;
use arena_metrics::build_evaluator;
use std::sync::Arc;

fn evaluator_config(raw: &str) -> EvaluatorConfig {
    serde_yaml::from_str(raw).unwrap()
}

#[tokio::test]
async fn rule_metrics_with_equal_weights() {
    let cfg = evaluator_config(
        r#"
metrics:
  - name: coverage
    type: must_contain
    terms: ["budget", "timeline"]
  - name: heading
    type: regex_match
    pattern: "^# "
"#,
    );
    let evaluator = build_evaluator(&cfg, &ClientCache::offline()).unwrap();
    assert_eq!(evaluator.weights(), vec![("coverage", 0.5), ("heading", 0.5)]);

    let result = evaluator
        .evaluate("plan a launch", "# Plan\nThe budget is fixed.", "team-a")
        .await
        .unwrap();
    // coverage 50, heading 100
    assert!((result.overall_score - 75.0).abs() < 1e-9);
    assert_eq!(result.metrics.len(), 2);
    assert_eq!(result.metrics[0].comment, "missing terms: timeline");
}

#[tokio::test]
async fn llm_metrics_share_clients_per_resolved_settings() {
    let cfg = evaluator_config(
        r#"
defaults:
  provider: fake
  model: judge-small
metrics:
  - name: clarity
    type: llm_judge
    criteria: "Is it clear?"
    weight: 0.4
  - name: depth
    type: llm_judge
    criteria: "Is it thorough?"
    weight: 0.4
  - name: bigger
    type: llm_judge
    criteria: "Overall quality"
    weight: 0.2
    judge:
      model: judge-large
"#,
    );
    let cache = ClientCache::new(Arc::new(
        |s: &ResolvedJudgeSettings| -> anyhow::Result<Arc<dyn LlmClient>> {
            let reply = if s.model == "judge-large" {
                r#"{"score": 90, "comment": "solid"}"#
            } else {
                r#"Sure. {"score": 60, "comment": "ok"}"#
            };
            Ok(Arc::new(FakeClient::new(s.model.clone()).with_response(reply)))
        },
    ));

    let evaluator = build_evaluator(&cfg, &cache).unwrap();
    assert_eq!(cache.len(), 2);

    let result = evaluator.evaluate("task", "draft", "team-a").await.unwrap();
    assert!((result.overall_score - 66.0).abs() < 1e-9);
    assert_eq!(result.metrics[2].comment, "solid");
}

#[test]
fn unknown_provider_fails_configuration() {
    let cfg = evaluator_config(
        r#"
metrics:
  - name: quality
    type: llm_judge
    criteria: "Good?"
    judge:
      provider: nowhere
"#,
    );
    let err = build_evaluator(&cfg, &ClientCache::offline()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMetric { ref name, .. } if name == "quality"));
}

#[test]
fn invalid_regex_and_bad_weights_are_rejected() {
    let cfg = evaluator_config(
        r#"
metrics:
  - name: broken
    type: regex_match
    pattern: "(["
"#,
    );
    assert!(matches!(
        build_evaluator(&cfg, &ClientCache::offline()),
        Err(ConfigError::InvalidMetric { .. })
    ));

    let cfg = evaluator_config(
        r#"
metrics:
  - name: a
    type: length
    weight: 0.7
  - name: b
    type: length
    weight: 0.7
"#,
    );
    assert!(matches!(
        build_evaluator(&cfg, &ClientCache::offline()),
        Err(ConfigError::WeightSum { .. })
    ));

    assert_eq!(
        build_evaluator(&EvaluatorConfig::default(), &ClientCache::offline()).unwrap_err(),
        ConfigError::NoMetrics
    );
}

#[tokio::test]
async fn full_yaml_document_drives_an_evaluator() {
    let cfg = ArenaConfig::from_yaml_str(
        r#"
rounds:
  max_rounds: 3
evaluator:
  metrics:
    - name: length
      type: length
      min_words: 2
      max_words: 4
"#,
    )
    .unwrap();
    let evaluator = build_evaluator(&cfg.evaluator, &ClientCache::offline()).unwrap();
    let result = evaluator.evaluate("q", "one", "team-a").await.unwrap();
    assert_eq!(result.overall_score, 50.0);
}
