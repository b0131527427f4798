// Candidate list builder tests - ordering, credential fail-closed behavior,
// model expansion, and request-signal boosts.

use cascade_llm::config::{ModelSpec, ProviderConfig, WireProtocol};
use cascade_llm::model::{ProviderEntry, RequestSignals, build_candidates, resolve_api_key};

fn model(name: &str, vision: bool, reasoning: bool) -> ModelSpec {
    ModelSpec {
        name: name.to_string(),
        vision,
        reasoning,
    }
}

fn provider(id: &str, priority: u32, models: Vec<ModelSpec>) -> ProviderConfig {
    ProviderConfig {
        id: id.to_string(),
        protocol: WireProtocol::OpenAi,
        endpoint: format!("https://{id}.example.com"),
        api_key: None,
        api_path: None,
        priority,
        requires_credential: true,
        models,
    }
}

fn entry(config: ProviderConfig, api_key: Option<&str>) -> ProviderEntry {
    ProviderEntry {
        config,
        api_key: api_key.map(str::to_string),
    }
}

fn labels(entries: &[ProviderEntry], signals: &RequestSignals) -> Vec<String> {
    build_candidates(entries, signals)
        .iter()
        .map(|c| c.label())
        .collect()
}

#[test]
fn orders_by_priority_with_declaration_tie_break() {
    let entries = vec![
        entry(provider("b", 1, vec![model("m1", false, false)]), Some("k")),
        entry(provider("a", 0, vec![model("m1", false, false)]), Some("k")),
        entry(provider("c", 1, vec![model("m1", false, false)]), Some("k")),
    ];

    let got = labels(&entries, &RequestSignals::default());
    assert_eq!(got, vec!["a/m1", "b/m1", "c/m1"]);
}

#[test]
fn expands_models_in_declaration_order() {
    let entries = vec![entry(
        provider(
            "a",
            0,
            vec![model("first", false, false), model("second", false, false)],
        ),
        Some("k"),
    )];

    let got = labels(&entries, &RequestSignals::default());
    assert_eq!(got, vec!["a/first", "a/second"]);
}

#[test]
fn excludes_providers_without_credentials() {
    let entries = vec![
        entry(provider("keyless", 0, vec![model("m1", false, false)]), None),
        entry(provider("keyed", 1, vec![model("m1", false, false)]), Some("k")),
    ];

    let got = labels(&entries, &RequestSignals::default());
    assert_eq!(got, vec!["keyed/m1"]);
}

#[test]
fn keyless_local_providers_stay_when_credential_not_required() {
    let mut config = provider("local", 0, vec![model("m1", false, false)]);
    config.requires_credential = false;
    let entries = vec![entry(config, None)];

    let got = labels(&entries, &RequestSignals::default());
    assert_eq!(got, vec!["local/m1"]);
}

#[test]
fn empty_configuration_yields_no_candidates() {
    assert!(build_candidates(&[], &RequestSignals::default()).is_empty());
}

#[test]
fn vision_candidates_jump_ahead_when_request_has_images() {
    // Vision model sits at the worst declared priority.
    let entries = vec![
        entry(provider("a", 0, vec![model("plain1", false, false)]), Some("k")),
        entry(provider("b", 1, vec![model("plain2", false, false)]), Some("k")),
        entry(provider("c", 9, vec![model("sees", true, false)]), Some("k")),
    ];

    let signals = RequestSignals {
        has_images: true,
        math_heavy: false,
    };
    let got = labels(&entries, &signals);
    assert_eq!(got, vec!["c/sees", "a/plain1", "b/plain2"]);
}

#[test]
fn reasoning_candidates_jump_ahead_for_math_prompts() {
    let entries = vec![
        entry(provider("a", 0, vec![model("plain", false, false)]), Some("k")),
        entry(provider("b", 5, vec![model("thinker", false, true)]), Some("k")),
    ];

    let signals = RequestSignals {
        has_images: false,
        math_heavy: true,
    };
    let got = labels(&entries, &signals);
    assert_eq!(got, vec!["b/thinker", "a/plain"]);
}

#[test]
fn vision_boost_wins_over_math_boost() {
    let entries = vec![
        entry(provider("a", 0, vec![model("thinker", false, true)]), Some("k")),
        entry(provider("b", 5, vec![model("sees", true, false)]), Some("k")),
    ];

    let signals = RequestSignals {
        has_images: true,
        math_heavy: true,
    };
    let got = labels(&entries, &signals);
    assert_eq!(got, vec!["b/sees", "a/thinker"]);
}

#[test]
fn boost_preserves_relative_order_among_boosted_candidates() {
    let entries = vec![
        entry(provider("a", 2, vec![model("sees-late", true, false)]), Some("k")),
        entry(provider("b", 1, vec![model("sees-early", true, false)]), Some("k")),
        entry(provider("c", 0, vec![model("plain", false, false)]), Some("k")),
    ];

    let signals = RequestSignals {
        has_images: true,
        math_heavy: false,
    };
    let got = labels(&entries, &signals);
    assert_eq!(got, vec!["b/sees-early", "a/sees-late", "c/plain"]);
}

#[test]
fn unresolvable_env_key_is_none() {
    assert_eq!(
        resolve_api_key("gateway", Some("CASCADE_TEST_UNSET_VARIABLE")),
        None
    );
    assert_eq!(resolve_api_key("gateway", Some("  ")), None);
    assert_eq!(resolve_api_key("gateway", None), None);
}
