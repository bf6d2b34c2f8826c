use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.render.theme = Some("base16-ocean.light".to_string());

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        theme: Some("Solarized (light)".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.render.theme, "Solarized (light)");
}

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.render.theme, DEFAULT_THEME);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn rejects_unknown_theme() {
    let mut raw = RawSettings::default();
    raw.render.theme = Some("midnight-neon".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown theme");
    match err {
        LoadError::Invalid { key, reason } => {
            assert_eq!(key, "render.theme");
            assert!(reason.contains("midnight-neon"));
            assert!(reason.contains("InspiredGitHub"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_blank_theme() {
    let mut raw = RawSettings::default();
    raw.render.theme = Some("   ".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn rejects_invalid_log_level() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid level");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn parse_code_arguments() {
    let args = CliArgs::parse_from([
        "htmlconvert",
        "code",
        "src/main.rs",
        "--lexer",
        "rust",
        "--standalone",
    ]);

    match args.command {
        Command::Code(code) => {
            assert_eq!(code.lexer.as_deref(), Some("rust"));
            assert_eq!(code.input.path, std::path::PathBuf::from("src/main.rs"));
            assert!(code.input.standalone);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_global_overrides_after_subcommand() {
    let args = CliArgs::parse_from([
        "htmlconvert",
        "markdown",
        "README.md",
        "--log-level",
        "warn",
        "--log-json",
        "true",
        "--theme",
        "base16-ocean.light",
    ]);

    assert!(matches!(args.command, Command::Markdown(_)));
    assert_eq!(args.overrides.log_level.as_deref(), Some("warn"));
    assert_eq!(args.overrides.log_json, Some(true));
    assert_eq!(args.overrides.theme.as_deref(), Some("base16-ocean.light"));
}

#[test]
fn parse_css_command() {
    let args = CliArgs::parse_from(["htmlconvert", "css"]);
    assert!(matches!(args.command, Command::Css));
    assert!(args.config_file.is_none());
}
