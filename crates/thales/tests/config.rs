//! Configuration driving the standard registry.

use http::Uri;
use std::io::Write;
use std::sync::Arc;
use thales::config::{ConfigLoader, ThalesConfig};
use thales::engine::{Binder, BindingRegistry, ModelSchema, Property};
use thales::{BindError, BindingContext, SourceId};

#[derive(Debug, Default)]
struct Note {
    title: String,
}

fn note_schema() -> Arc<ModelSchema<Note>> {
    Arc::new(
        ModelSchema::builder()
            .property(
                Property::scalar("title", |m: &mut Note, v: String| m.title = v)
                    .from_sources([SourceId::Route, SourceId::QueryString]),
            )
            .default_constructor()
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn configured_default_strategy_applies() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[binding]\ndefault_strategy = \"passthrough\"").unwrap();

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    let binder = Binder::new(note_schema(), Arc::new(BindingRegistry::standard(&config)));

    let ctx = BindingContext::builder()
        .uri(Uri::from_static("/?title=query"))
        .route_value("title", "route")
        .build();

    let bound = binder.bind(&ctx).await.unwrap();
    assert_eq!(bound.model.title, "query");
    assert_eq!(bound.provenance.source_of("title"), Some(&SourceId::QueryString));
}

#[tokio::test]
async fn configured_body_limit_applies() {
    let config = ConfigLoader::new()
        .with_string(r#"{"binding": {"max_body_size": 16}}"#, "json")
        .unwrap()
        .load()
        .unwrap();

    let schema = Arc::new(
        ModelSchema::<Note>::builder()
            .property(
                Property::scalar("title", |m: &mut Note, v: String| m.title = v)
                    .from_sources([SourceId::Body]),
            )
            .default_constructor()
            .build()
            .unwrap(),
    );
    let binder = Binder::new(schema, Arc::new(BindingRegistry::standard(&config)));

    let ctx = BindingContext::builder()
        .json(r#"{"title":"far too long for the limit"}"#)
        .build();

    let err = binder.bind(&ctx).await.unwrap_err();
    assert!(matches!(err, BindError::PayloadTooLarge { .. }));
    assert_eq!(err.status_code(), http::StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn form_hydration_is_opt_in() {
    let schema = Arc::new(
        ModelSchema::<Note>::builder()
            .property(
                Property::scalar("title", |m: &mut Note, v: String| m.title = v)
                    .from_sources([SourceId::Body]),
            )
            .default_constructor()
            .build()
            .unwrap(),
    );
    let ctx = || {
        BindingContext::builder()
            .header("content-type", "application/x-www-form-urlencoded")
            .body("title=hello")
            .build()
    };

    let default = Binder::new(
        Arc::clone(&schema),
        Arc::new(BindingRegistry::standard(&ThalesConfig::default())),
    );
    assert_eq!(default.bind(&ctx()).await.unwrap().model.title, "");

    let config = ConfigLoader::new()
        .with_string("[binding]\nhydrate_form_bodies = true", "toml")
        .unwrap()
        .load()
        .unwrap();
    let opted_in = Binder::new(schema, Arc::new(BindingRegistry::standard(&config)));
    assert_eq!(opted_in.bind(&ctx()).await.unwrap().model.title, "hello");
}

#[test]
fn invalid_config_is_rejected() {
    let result = ConfigLoader::new()
        .with_string("[multipart]\nmax_fields = 0", "toml")
        .unwrap()
        .load();

    assert!(result.is_err());
}
