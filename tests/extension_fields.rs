//! Integration tests for extension fields and extended values

use std::collections::HashSet;

use fieldforge::{
    Engine, EngineConfig, ExtensionFieldModel, ExtensionPoint, FieldType, FieldforgeError, StaticSecurityContext,
};
use indexmap::IndexMap;

fn engine() -> Engine {
    let engine = Engine::from_config(EngineConfig::default()).unwrap();
    engine
        .extensions()
        .register_extension_point(ExtensionPoint::new("customer", "crm.Customer"))
        .unwrap();
    engine
}

fn customer(id: &str) -> StaticSecurityContext {
    StaticSecurityContext::new("acme").owned_by("Customer", id)
}

fn values(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn violated_fields(err: &FieldforgeError) -> Vec<String> {
    err.violations().iter().map(|v| v.field.clone()).collect()
}

#[test]
fn test_field_round_trip_by_id() {
    let engine = engine();
    let ctx = customer("1");
    let model = ExtensionFieldModel::new("customer", "loyaltyPoints", FieldType::Integer)
        .label("Loyalty points")
        .required()
        .max_length(6);

    let saved = engine.extensions().save_extension_field(&model, &ctx).unwrap();
    let read = engine
        .extensions()
        .read_extension_field("customer", saved.id.unwrap(), &ctx)
        .unwrap();

    assert_eq!(read.name, "loyaltyPoints");
    assert_eq!(read.label, "Loyalty points");
    assert_eq!(read.field_type, FieldType::Integer);
    assert!(read.required);
    assert_eq!(read.max_length, Some(6));
    assert_eq!(read.column_name.as_deref(), Some("field1"));
}

#[test]
fn test_update_rejects_lov_field_without_options() {
    let engine = engine();
    let ctx = customer("1");
    let saved = engine
        .extensions()
        .save_extension_field(
            &ExtensionFieldModel::new("customer", "tier", FieldType::ListOfValues).option("G", "Gold"),
            &ctx,
        )
        .unwrap();

    let mut emptied = saved.clone();
    emptied.lov_options.clear();
    let err = engine.extensions().update_extension_field(&emptied, &ctx).unwrap_err();

    assert_eq!(violated_fields(&err), vec!["tier".to_string()]);
    let stored = engine
        .extensions()
        .read_extension_field("customer", saved.id.unwrap(), &ctx)
        .unwrap();
    assert_eq!(stored, saved);
}

#[test]
fn test_update_rejects_out_of_range_max_length() {
    let engine = engine();
    let ctx = customer("1");
    let saved = engine
        .extensions()
        .save_extension_field(
            &ExtensionFieldModel::new("customer", "code", FieldType::String).max_length(10),
            &ctx,
        )
        .unwrap();

    for max_length in [0, 1001] {
        let change = saved.clone().max_length(max_length);
        let err = engine.extensions().update_extension_field(&change, &ctx).unwrap_err();
        assert!(matches!(err, FieldforgeError::Validation { .. }));
    }

    let stored = engine
        .extensions()
        .read_extension_field("customer", saved.id.unwrap(), &ctx)
        .unwrap();
    assert_eq!(stored.max_length, Some(10));
}

#[test]
fn test_extended_records_are_scoped_to_space() {
    let engine = engine();
    let acme = customer("1");
    let globex = StaticSecurityContext::new("globex").owned_by("Customer", "1");
    for ctx in [&acme, &globex] {
        engine
            .extensions()
            .save_extension_field(&ExtensionFieldModel::new("customer", "salary", FieldType::Integer), ctx)
            .unwrap();
    }

    let submitted = values(&[("salary", "90000")]);
    let record = engine
        .extensions()
        .save_extended_record("customer", None, &submitted, &acme)
        .unwrap();

    let read = engine.extensions().read_extended_values("customer", record.id, &globex);
    assert!(matches!(read, Err(FieldforgeError::NotFound(_))));

    let overwrite = engine
        .extensions()
        .save_extended_record("customer", Some(record.id), &IndexMap::new(), &globex);
    assert!(matches!(overwrite, Err(FieldforgeError::NotFound(_))));

    assert_eq!(
        engine.extensions().read_extended_values("customer", record.id, &acme).unwrap(),
        submitted
    );
}

#[test]
fn test_duplicate_name_in_same_extension_fails() {
    let engine = engine();
    let ctx = customer("1");
    let model = ExtensionFieldModel::new("customer", "age", FieldType::Integer);

    engine.extensions().save_extension_field(&model, &ctx).unwrap();
    let err = engine.extensions().save_extension_field(&model, &ctx).unwrap_err();

    assert!(matches!(err, FieldforgeError::Validation { .. }));
    assert_eq!(engine.extensions().fetch_extension_fields("customer", &ctx).unwrap().len(), 1);
}

#[test]
fn test_two_customers_define_fields_independently() {
    let engine = engine();
    let customer1 = customer("1");
    let customer2 = customer("2");

    for (name, ty) in [
        ("field1", FieldType::Integer),
        ("field2", FieldType::Decimal),
        ("field3", FieldType::Boolean),
    ] {
        engine
            .extensions()
            .save_extension_field(&ExtensionFieldModel::new("customer", name, ty), &customer1)
            .unwrap();
    }

    for (name, ty) in [
        ("field1", FieldType::Boolean),
        ("field2", FieldType::Date),
        ("field3", FieldType::Integer),
        ("field4", FieldType::Decimal),
    ] {
        engine
            .extensions()
            .save_extension_field(&ExtensionFieldModel::new("customer", name, ty), &customer2)
            .unwrap();
    }

    let first = engine.extensions().fetch_extension_fields("customer", &customer1).unwrap();
    let second = engine.extensions().fetch_extension_fields("customer", &customer2).unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 4);
    assert_eq!(first[0].field_type, FieldType::Integer);
    assert_eq!(second[0].field_type, FieldType::Boolean);
    // Column pools are per extension
    assert_eq!(second[3].column_name.as_deref(), Some("field4"));
}

/// Fields used by the value scenarios:
/// field1 INTEGER required, field2 DECIMAL, field3 LOV {1, 2},
/// field4 BOOLEAN, field5 DATE, field6 STRING(10).
fn define_scenario_fields(engine: &Engine, ctx: &StaticSecurityContext) {
    let fields = [
        ExtensionFieldModel::new("customer", "field1", FieldType::Integer).required(),
        ExtensionFieldModel::new("customer", "field2", FieldType::Decimal),
        ExtensionFieldModel::new("customer", "field3", FieldType::ListOfValues)
            .option("1", "One")
            .option("2", "Two"),
        ExtensionFieldModel::new("customer", "field4", FieldType::Boolean),
        ExtensionFieldModel::new("customer", "field5", FieldType::Date),
        ExtensionFieldModel::new("customer", "field6", FieldType::String).max_length(10),
    ];

    for field in &fields {
        engine.extensions().save_extension_field(field, ctx).unwrap();
    }
}

#[test]
fn test_invalid_values_are_rejected_without_writes() {
    let engine = engine();
    let ctx = customer("1");
    define_scenario_fields(&engine, &ctx);

    let scenarios: Vec<(IndexMap<String, String>, &str)> = vec![
        (values(&[("field1", "123x")]), "field1"),
        (values(&[("field1", "1"), ("field2", "3.x45")]), "field2"),
        (values(&[("field1", "1"), ("field3", "4")]), "field3"),
        (values(&[("field2", "3.45")]), "field1"),
        (values(&[("field1", "1"), ("field4", "trueSD")]), "field4"),
        (values(&[("field1", "1"), ("field5", "12/qwes/2015")]), "field5"),
        (values(&[("field1", "1"), ("field6", "thirteen char")]), "field6"),
    ];

    for (submitted, expected) in scenarios {
        let err = engine
            .extensions()
            .save_extended_record("customer", None, &submitted, &ctx)
            .unwrap_err();

        assert!(matches!(err, FieldforgeError::Validation { .. }), "{:?}", submitted);
        assert_eq!(violated_fields(&err), vec![expected.to_string()]);
        assert!(err.to_string().contains(expected));
        assert_eq!(engine.extensions().record_count("customer").unwrap(), 0);
    }
}

#[test]
fn test_valid_values_are_saved() {
    let engine = engine();
    let ctx = customer("1");
    define_scenario_fields(&engine, &ctx);

    let submitted = values(&[
        ("field1", "123"),
        ("field2", "3.45"),
        ("field3", "2"),
        ("field4", "true"),
        ("field5", "12/05/2015"),
        ("field6", "ten chars!"),
    ]);
    let record = engine
        .extensions()
        .save_extended_record("customer", None, &submitted, &ctx)
        .unwrap();

    assert_eq!(engine.extensions().record_count("customer").unwrap(), 1);
    assert_eq!(
        engine.extensions().read_extended_values("customer", record.id, &ctx).unwrap(),
        submitted
    );
}

#[test]
fn test_all_violations_reported_together() {
    let engine = engine();
    let ctx = customer("1");
    define_scenario_fields(&engine, &ctx);

    let err = engine
        .extensions()
        .validate_extended_values("customer", &values(&[("field2", "x"), ("nickname", "Bob")]), &ctx)
        .unwrap_err();

    let mut fields = violated_fields(&err);
    fields.sort();
    assert_eq!(fields, vec!["field1", "field2", "nickname"]);
}

#[test]
fn test_concurrent_creation_gets_distinct_columns() {
    let engine = engine();
    let ctx = customer("1");
    let count = 12;

    let columns: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..count)
            .map(|i| {
                let engine = &engine;
                let ctx = &ctx;
                scope.spawn(move || {
                    let model = ExtensionFieldModel::new("customer", format!("attr{}", i), FieldType::Boolean);
                    engine.extensions().save_extension_field(&model, ctx)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap().column_name.unwrap())
            .collect()
    });

    let distinct: HashSet<&String> = columns.iter().collect();
    assert_eq!(distinct.len(), count);
    assert!(columns.iter().all(|c| c.starts_with("field")));
    assert_eq!(
        engine.extensions().fetch_extension_fields("customer", &ctx).unwrap().len(),
        count
    );
}

#[test]
fn test_exhausted_column_pool() {
    let config = EngineConfig {
        column_pool_size: 2,
        ..EngineConfig::default()
    };
    let engine = Engine::from_config(config).unwrap();
    engine
        .extensions()
        .register_extension_point(ExtensionPoint::new("customer", "crm.Customer"))
        .unwrap();
    let ctx = customer("1");

    for name in ["a", "b"] {
        engine
            .extensions()
            .save_extension_field(&ExtensionFieldModel::new("customer", name, FieldType::Boolean), &ctx)
            .unwrap();
    }

    let err = engine
        .extensions()
        .save_extension_field(&ExtensionFieldModel::new("customer", "c", FieldType::Boolean), &ctx)
        .unwrap_err();
    assert!(matches!(err, FieldforgeError::Validation { .. }));
}

#[test]
fn test_deleted_column_is_reused() {
    let engine = engine();
    let ctx = customer("1");
    let first = engine
        .extensions()
        .save_extension_field(&ExtensionFieldModel::new("customer", "a", FieldType::Boolean), &ctx)
        .unwrap();
    engine
        .extensions()
        .save_extension_field(&ExtensionFieldModel::new("customer", "b", FieldType::Boolean), &ctx)
        .unwrap();

    engine
        .extensions()
        .delete_extension_field("customer", first.id.unwrap(), &ctx)
        .unwrap();
    let again = engine
        .extensions()
        .save_extension_field(&ExtensionFieldModel::new("customer", "c", FieldType::Boolean), &ctx)
        .unwrap();

    assert_eq!(again.column_name.as_deref(), Some("field1"));
}

#[test]
fn test_unknown_extension_name() {
    let engine = engine();
    let err = engine
        .extensions()
        .fetch_extension_fields("supplier", &customer("1"))
        .unwrap_err();

    assert!(matches!(err, FieldforgeError::NotFound(_)));
    assert!(err.to_string().contains("Invalid extension name specified"));
}
