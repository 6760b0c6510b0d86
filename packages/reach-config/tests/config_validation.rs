use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use reach_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml() -> String {
	SAMPLE_CONFIG_TEMPLATE_TOML.to_string()
}

fn sample_toml_with_storage(source: &str, keep_postgres: bool, keep_fixture: bool) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let root = value.as_table_mut().expect("Template config must be a table.");
	let storage = root
		.get_mut("storage")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [storage].");

	storage.insert("source".to_string(), Value::String(source.to_string()));

	if !keep_postgres {
		storage.remove("postgres");
	}
	if !keep_fixture {
		storage.remove("fixture");
	}

	toml::to_string(&value).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("reach_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	let payload = sample_toml();

	toml::from_str(&payload).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(sample_toml());
	let result = reach_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to be valid.");

	assert_eq!(cfg.storage.source, "postgres");
	assert_eq!(cfg.search.result_limit, 5);
	assert_eq!(cfg.search.embedding_cache_capacity, 1_024);
	assert!(cfg.providers.embedding.is_some());
	assert!(cfg.providers.llm.is_some());
}

#[test]
fn search_and_ranking_sections_default_to_reference_constants() {
	let payload = r#"
[service]
http_bind = "127.0.0.1:8080"
log_level = "info"

[storage]
source = "fixture"

[storage.fixture]
path = "fixtures/corpus.json"
"#;
	let cfg: Config = toml::from_str(payload).expect("Failed to parse minimal config.");

	reach_config::validate(&cfg).expect("Expected minimal config to be valid.");

	assert_eq!(cfg.search.result_limit, 5);
	assert_eq!(cfg.search.embedding_cache_capacity, 1_024);
	assert_eq!(cfg.search.weights.vector_weight, 0.7);
	assert_eq!(cfg.search.weights.keyword_weight, 0.3);
	assert_eq!(cfg.search.stub_weights.vector_weight, 0.3);
	assert_eq!(cfg.search.stub_weights.keyword_weight, 0.7);
	assert_eq!(cfg.ranking.campaign_base_score, 0.8);
	assert_eq!(cfg.ranking.academy_base_score, 0.75);
	assert_eq!(cfg.ranking.position_decay, 0.05);
	assert_eq!(cfg.ranking.exact_match_score, 0.95);
	assert!(cfg.providers.embedding.is_none());
	assert!(!cfg.storage.cache.enabled);
}

#[test]
fn storage_source_must_be_known() {
	let path = write_temp_config(sample_toml_with_storage("supabase", true, true));
	let result = reach_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected storage source validation error.");

	assert!(
		err.to_string().contains("storage.source must be one of postgres or fixture."),
		"Unexpected error: {err}"
	);
}

#[test]
fn storage_source_is_case_insensitive() {
	let path = write_temp_config(sample_toml_with_storage("  Fixture ", false, true));
	let result = reach_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected fixture source to be accepted.");

	assert_eq!(cfg.storage.source, "fixture");
}

#[test]
fn postgres_source_requires_postgres_section() {
	let path = write_temp_config(sample_toml_with_storage("postgres", false, true));
	let result = reach_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected missing postgres validation error.");

	assert!(
		err.to_string().contains("storage.postgres is required when storage.source is postgres."),
		"Unexpected error: {err}"
	);
}

#[test]
fn fixture_source_rejects_blank_path() {
	let payload = sample_toml_with_storage("fixture", true, true)
		.replace("fixtures/corpus.json", "   ");
	let path = write_temp_config(payload);
	let result = reach_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected blank fixture path validation error.");

	assert!(
		err.to_string().contains("storage.fixture is required when storage.source is fixture."),
		"Unexpected error: {err}"
	);
}

#[test]
fn result_limit_must_be_positive() {
	let mut cfg = base_config();

	cfg.search.result_limit = 0;

	let err = reach_config::validate(&cfg).expect_err("Expected result limit validation error.");

	assert!(
		err.to_string().contains("search.result_limit must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_cache_capacity_must_be_positive() {
	let mut cfg = base_config();

	cfg.search.embedding_cache_capacity = 0;

	let err = reach_config::validate(&cfg).expect_err("Expected cache capacity validation error.");

	assert!(
		err.to_string().contains("search.embedding_cache_capacity must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn search_weights_must_be_non_negative() {
	let mut cfg = base_config();

	cfg.search.stub_weights.keyword_weight = -0.1;

	let err = reach_config::validate(&cfg).expect_err("Expected weight validation error.");

	assert!(
		err.to_string().contains("search.stub_weights.keyword_weight must be zero or greater."),
		"Unexpected error: {err}"
	);
}

#[test]
fn search_weights_must_be_finite() {
	let mut cfg = base_config();

	cfg.search.weights.vector_weight = f32::NAN;

	let err = reach_config::validate(&cfg).expect_err("Expected weight validation error.");

	assert!(
		err.to_string().contains("search.weights.vector_weight must be a finite number."),
		"Unexpected error: {err}"
	);
}

#[test]
fn ranking_scores_must_be_in_unit_range() {
	let mut cfg = base_config();

	cfg.ranking.campaign_base_score = 1.2;

	let err = reach_config::validate(&cfg).expect_err("Expected ranking validation error.");

	assert!(
		err.to_string().contains("ranking.campaign_base_score must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn confidence_floor_cannot_exceed_ceiling() {
	let mut cfg = base_config();

	cfg.ranking.confidence_floor = 0.9;
	cfg.ranking.confidence_ceiling = 0.5;

	let err = reach_config::validate(&cfg).expect_err("Expected confidence bounds error.");

	assert!(
		err.to_string()
			.contains("ranking.confidence_floor must not exceed ranking.confidence_ceiling."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_api_key_must_be_non_empty() {
	let mut cfg = base_config();

	if let Some(embedding) = cfg.providers.embedding.as_mut() {
		embedding.api_key = " ".to_string();
	}

	let err = reach_config::validate(&cfg).expect_err("Expected api key validation error.");

	assert!(
		err.to_string().contains("Provider embedding api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn cache_ttl_must_be_positive_when_enabled() {
	let mut cfg = base_config();

	cfg.storage.cache.enabled = true;
	cfg.storage.cache.ttl_secs = 0;

	let err = reach_config::validate(&cfg).expect_err("Expected cache TTL validation error.");

	assert!(
		err.to_string().contains("storage.cache.ttl_secs must be greater than zero when enabled."),
		"Unexpected error: {err}"
	);
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("reach_config_test_missing_file.toml");

	let err = reach_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn reach_example_toml_is_valid() {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../reach.example.toml");

	reach_config::load(&path).expect("Expected reach.example.toml to be a valid config.");
}
