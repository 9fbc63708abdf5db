//! npmscan.toml 통합 설정 테스트
//!
//! - npmscan.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use npmscan_core::config::NpmscanConfig;
use npmscan_core::error::{ConfigError, NpmscanError};

// =============================================================================
// npmscan.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../npmscan.toml.example");
    let config = NpmscanConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "warn");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.scan.reports_dir, "reports");
    assert_eq!(config.audit.tool, "safe-chain");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../npmscan.toml.example");
    let config = NpmscanConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../npmscan.toml.example");
    let from_file = NpmscanConfig::parse(content).expect("should parse");
    let from_code = NpmscanConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);

    assert_eq!(from_file.scan.reports_dir, from_code.scan.reports_dir);
    assert_eq!(
        from_file.scan.step_timeout_secs,
        from_code.scan.step_timeout_secs
    );
    assert_eq!(from_file.scan.follow_symlinks, from_code.scan.follow_symlinks);
    assert_eq!(from_file.scan.max_depth, from_code.scan.max_depth);

    assert_eq!(from_file.audit.tool, from_code.audit.tool);
    assert_eq!(from_file.audit.tool_package, from_code.audit.tool_package);
    assert_eq!(
        from_file.audit.package_manager,
        from_code.audit.package_manager
    );
    assert_eq!(from_file.audit.audit_level, from_code.audit.audit_level);
    assert_eq!(
        from_file.audit.findings_exit_code,
        from_code.audit.findings_exit_code
    );
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "json"
"#;
    let config = NpmscanConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
    // 나머지 섹션은 기본값
    assert_eq!(config.scan.step_timeout_secs, 900);
    assert_eq!(config.audit.package_manager, "npm");
}

#[test]
fn partial_config_audit_only() {
    let toml = r#"
[audit]
tool = "audit-wrapper"
findings_exit_code = 3
"#;
    let config = NpmscanConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.audit.tool, "audit-wrapper");
    assert_eq!(config.audit.findings_exit_code, 3);
    assert_eq!(config.audit.tool_package, "safe-chain-test");
    assert_eq!(config.general.log_level, "warn");
}

#[test]
fn partial_config_invalid_value_fails_validation() {
    let toml = r#"
[scan]
reports_dir = "out/../../etc"
"#;
    let config = NpmscanConfig::parse(toml).expect("should parse");
    let err = config.validate().expect_err("traversal should be rejected");
    assert!(matches!(
        err,
        NpmscanError::Config(ConfigError::InvalidValue { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[scan]
step_timeout_secs = 120
"#;

    let original = std::env::var("NPMSCAN_SCAN_STEP_TIMEOUT_SECS").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("NPMSCAN_SCAN_STEP_TIMEOUT_SECS", "30");
    }

    let mut config = NpmscanConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.scan.step_timeout_secs;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("NPMSCAN_SCAN_STEP_TIMEOUT_SECS", val),
            None => std::env::remove_var("NPMSCAN_SCAN_STEP_TIMEOUT_SECS"),
        }
    }

    assert_eq!(result, 30);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_number_keeps_toml_value() {
    let toml = r#"
[scan]
max_depth = 4
"#;

    let original = std::env::var("NPMSCAN_SCAN_MAX_DEPTH").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("NPMSCAN_SCAN_MAX_DEPTH", "deep");
    }

    let mut config = NpmscanConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.scan.max_depth;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("NPMSCAN_SCAN_MAX_DEPTH", val),
            None => std::env::remove_var("NPMSCAN_SCAN_MAX_DEPTH"),
        }
    }

    assert_eq!(result, 4);
}

#[test]
#[serial_test::serial]
fn env_override_missing_var_keeps_toml_value() {
    let toml = r#"
[general]
log_level = "error"
"#;

    // SAFETY: 존재하지 않는 변수를 명시적으로 제거
    unsafe {
        std::env::remove_var("NPMSCAN_GENERAL_LOG_LEVEL");
    }

    let mut config = NpmscanConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.general.log_level, "error");
}

#[test]
#[serial_test::serial]
fn env_override_audit_tool() {
    let original = std::env::var("NPMSCAN_AUDIT_TOOL").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("NPMSCAN_AUDIT_TOOL", "other-wrapper");
    }

    let mut config = NpmscanConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.audit.tool.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("NPMSCAN_AUDIT_TOOL", val),
            None => std::env::remove_var("NPMSCAN_AUDIT_TOOL"),
        }
    }

    assert_eq!(result, "other-wrapper");
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn whitespace_only_parses_with_defaults() {
    let config = NpmscanConfig::parse("   \n\n  \t  ").expect("whitespace should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_level, "warn");
}

#[test]
fn comments_only_parses_with_defaults() {
    let toml = r#"
# 주석만 있는 설정
# [scan]
"#;
    let config = NpmscanConfig::parse(toml).expect("comments-only should parse");
    config.validate().expect("should validate");
    assert_eq!(config.scan.reports_dir, "reports");
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[scan]
step_timeout_secs = "fifteen minutes"
"#;
    let result = NpmscanConfig::parse(toml);
    assert!(matches!(
        result,
        Err(NpmscanError::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[test]
fn wrong_type_for_bool_field() {
    let toml = r#"
[scan]
follow_symlinks = "yes"
"#;
    assert!(NpmscanConfig::parse(toml).is_err());
}

#[tokio::test]
async fn from_file_reads_temp_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("npmscan.toml");
    tokio::fs::write(&path, "[scan]\nreports_dir = \"out\"\n")
        .await
        .expect("write config");

    let config = NpmscanConfig::from_file(&path)
        .await
        .expect("should load from disk");
    assert_eq!(config.scan.reports_dir, "out");
}

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let result = NpmscanConfig::from_file("/tmp/npmscan_test_nonexistent_12345.toml").await;
    assert!(matches!(
        result,
        Err(NpmscanError::Config(ConfigError::FileNotFound { .. }))
    ));
}

#[tokio::test]
async fn from_file_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("npmscan.toml");
    tokio::fs::write(&path, "[general]\nlog_level = \"loud\"\n")
        .await
        .expect("write config");

    let result = NpmscanConfig::from_file(&path).await;
    assert!(matches!(
        result,
        Err(NpmscanError::Config(ConfigError::InvalidValue { .. }))
    ));
}

// =============================================================================
// 직렬화 라운드트립 테스트
// =============================================================================

#[test]
fn example_config_serialize_roundtrip() {
    let content = include_str!("../../../npmscan.toml.example");
    let config = NpmscanConfig::parse(content).expect("should parse");
    let serialized = toml::to_string_pretty(&config).expect("should serialize");
    let reparsed = NpmscanConfig::parse(&serialized).expect("should reparse");
    reparsed.validate().expect("should validate");

    assert_eq!(config.general.log_level, reparsed.general.log_level);
    assert_eq!(config.audit.audit_level, reparsed.audit.audit_level);
}
