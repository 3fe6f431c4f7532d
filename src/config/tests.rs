use clap::Parser;

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.listing.page_size = Some(12);
    raw.logging.level = Some("info".to_string());

    let overrides = ClientOverrides {
        page_size: Some(4),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.listing.page_size.get(), 4);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_the_hosted_site() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.listing.page_size.get(), 9);
    assert_eq!(settings.storage.bucket, "vitamin-images");
    assert_eq!(settings.storage.max_image_bytes.get(), 5 * 1024 * 1024);
    assert_eq!(settings.backend.timeout, Duration::from_secs(15));
    assert!(settings.backend.url.is_none());
    assert_eq!(settings.client.state_dir, PathBuf::from(".vitamins"));
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ClientOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_page_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.listing.page_size = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "listing.page_size",
            ..
        }
    ));
}

#[test]
fn backend_url_must_be_http() {
    let mut raw = RawSettings::default();
    raw.backend.url = Some("ftp://example.com".to_string());

    let err = Settings::from_raw(raw).expect_err("bad scheme");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "backend.url",
            ..
        }
    ));
}

#[test]
fn blank_anon_key_counts_as_missing() {
    let mut raw = RawSettings::default();
    raw.backend.url = Some("https://project.example.co".to_string());
    raw.backend.anon_key = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.backend.anon_key.is_none());
    assert_eq!(
        settings.backend.url.as_ref().map(Url::as_str),
        Some("https://project.example.co/")
    );
}

#[test]
fn parse_create_arguments() {
    let args = CliArgs::parse_from([
        "vitamins",
        "--backend-url",
        "https://project.example.co",
        "create",
        "--title",
        "Daily Hope",
        "--content",
        "Line one",
    ]);

    assert_eq!(
        args.overrides.backend_url.as_deref(),
        Some("https://project.example.co")
    );
    match args.command {
        Command::Create(create) => {
            assert_eq!(create.title, "Daily Hope");
            assert_eq!(create.content.as_deref(), Some("Line one"));
            assert!(create.image.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn list_rejects_zero_pages() {
    let result = CliArgs::try_parse_from(["vitamins", "list", "--pages", "0"]);
    assert!(result.is_err());
}

#[test]
fn content_and_content_file_conflict() {
    let result = CliArgs::try_parse_from([
        "vitamins",
        "create",
        "--title",
        "t",
        "--content",
        "c",
        "--content-file",
        "body.txt",
    ]);
    assert!(result.is_err());
}
