//! Strategy and aggregation properties over generated requests.

use proptest::prelude::*;
use std::sync::Arc;
use thales::config::ThalesConfig;
use thales::engine::{Binder, BindingRegistry, ModelSchema, Passthrough, Property};
use thales::{BindingContext, SourceId};

const ORDER: [SourceId; 3] = [SourceId::Route, SourceId::Header, SourceId::Claim];

#[derive(Debug, Default)]
struct Probe {
    value: String,
    values: Vec<i64>,
}

fn context(present: &[bool; 3]) -> BindingContext {
    let mut builder = BindingContext::builder();
    if present[0] {
        builder = builder.route_value("value", "Route");
    }
    if present[1] {
        builder = builder.header("value", "Header");
    }
    if present[2] {
        builder = builder.claim("value", "Claim");
    }
    builder.build()
}

fn bind(binder: &Binder<Probe>, ctx: &BindingContext) -> thales::Bound<Probe> {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(binder.bind(ctx))
        .unwrap()
}

fn binder(passthrough: bool) -> Binder<Probe> {
    let mut property =
        Property::scalar("value", |m: &mut Probe, v: String| m.value = v).from_sources(ORDER);
    if passthrough {
        property = property.strategy(Passthrough);
    }

    let schema = ModelSchema::builder()
        .property(property)
        .property(
            Property::collection("values", |m: &mut Probe, v: Vec<i64>| m.values = v)
                .from_sources([SourceId::QueryString]),
        )
        .default_constructor()
        .build()
        .unwrap();

    Binder::new(
        Arc::new(schema),
        Arc::new(BindingRegistry::standard(&ThalesConfig::default())),
    )
}

proptest! {
    #[test]
    fn first_in_wins_takes_earliest_present(present in any::<[bool; 3]>()) {
        let bound = bind(&binder(false), &context(&present));

        match present.iter().position(|p| *p) {
            Some(first) => {
                prop_assert_eq!(bound.model.value, ORDER[first].as_str());
                prop_assert_eq!(bound.provenance.source_of("value"), Some(&ORDER[first]));
            }
            None => prop_assert!(!bound.provenance.is_bound("value")),
        }
    }

    #[test]
    fn passthrough_takes_latest_present(present in any::<[bool; 3]>()) {
        let bound = bind(&binder(true), &context(&present));

        match present.iter().rposition(|p| *p) {
            Some(last) => {
                prop_assert_eq!(bound.model.value, ORDER[last].as_str());
                prop_assert_eq!(bound.provenance.source_of("value"), Some(&ORDER[last]));
            }
            None => prop_assert!(!bound.provenance.is_bound("value")),
        }
    }

    #[test]
    fn collection_keeps_convertible_values_in_order(
        raw in prop::collection::vec(prop_oneof![any::<i64>().prop_map(|n| n.to_string()), "[a-z]{1,4}"], 1..8)
    ) {
        let query: Vec<String> = raw.iter().map(|v| format!("values={v}")).collect();
        let uri: http::Uri = format!("/?{}", query.join("&")).parse().unwrap();
        let ctx = BindingContext::builder().uri(uri).build();

        let bound = bind(&binder(false), &ctx);
        let expected: Vec<i64> = raw.iter().filter_map(|v| v.parse().ok()).collect();

        prop_assert_eq!(&bound.model.values, &expected);
        prop_assert_eq!(bound.provenance.is_bound("values"), !expected.is_empty());
    }
}
