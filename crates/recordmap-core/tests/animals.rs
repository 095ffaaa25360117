mod common;

use chrono::NaiveDate;
use common::{animals, human, keys, meowy, meowy_json};
use recordmap_core::{
    ConvertOptions, Converter, Error, OperationMode, Value, ValueCheckingMode,
};
use serde_json::json;

#[test]
fn test_serialize_kitty() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let json = converter.serialize(&Value::from(meowy(&registry))).unwrap();
    assert_eq!(json, meowy_json());
    assert_eq!(
        keys(&json),
        vec!["catName", "owner", "birthdate", "friends", "district", "talky", "other"]
    );
}

#[test]
fn test_deserialize_kitty() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let cat = converter
        .deserialize(&meowy_json(), "Cat")
        .unwrap()
        .into_record()
        .unwrap();
    assert_eq!(cat.type_name(), "Cat");
    assert_eq!(cat.get("name").and_then(Value::as_str), Some("Meowy"));
    assert_eq!(cat.get("district").and_then(Value::as_i64), Some(100));
    assert_eq!(
        cat.get("birthdate").and_then(Value::downcast_opaque::<NaiveDate>),
        NaiveDate::from_ymd_opt(2016, 1, 2).as_ref()
    );
    let owner = cat.get("owner").and_then(Value::as_record).unwrap();
    assert_eq!(owner, &human(&registry, "Andreas", "Muster"));
}

#[test]
fn test_round_trip() {
    let registry = animals();
    let converter = Converter::new(&registry);
    let cat = Value::from(meowy(&registry));

    let json = converter.serialize(&cat).unwrap();
    assert_eq!(converter.deserialize(&json, "Cat").unwrap(), cat);
}

#[test]
fn test_inherited_mapping_without_override() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let mut dog = registry.instantiate("Dog").unwrap();
    dog.set("name", "Barky");
    dog.set("birthdate", common::date(2018, 5, 1));

    let json = converter.serialize_record(&dog).unwrap();
    assert_eq!(
        json,
        json!({"name": "Barky", "owner": null, "birthdate": "2018-05-01", "friends": [], "barking": false})
    );
}

#[test]
fn test_serialize_array_of_mixed_animals() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let mut dog = registry.instantiate("Dog").unwrap();
    dog.set("name", "Barky");
    dog.set("birthdate", common::date(2018, 5, 1));
    let animals = Value::List(vec![Value::from(meowy(&registry)), Value::from(dog)]);

    let json = converter.serialize_array(&animals).unwrap();
    assert_eq!(json[0]["catName"], json!("Meowy"));
    assert_eq!(json[1]["name"], json!("Barky"));
}

#[test]
fn test_array_element_failure_is_located() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let mut second = meowy_json();
    second["district"] = json!("100");
    let err = converter
        .deserialize(&json!([meowy_json(), second]), "Cat")
        .unwrap_err();

    match &err {
        Error::TypeMismatch {
            context,
            expected,
            actual,
            ..
        } => {
            assert_eq!(context.record, "Kitty");
            assert_eq!(context.field, "district");
            assert_eq!(context.json_name, "district");
            assert_eq!(context.path.to_string(), "$[1].district");
            assert_eq!(expected, "number");
            assert_eq!(actual, "string");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_nested_record_failure_names_inner_field() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let mut json = meowy_json();
    json["owner"] = json!({"givenName": "Andreas"});
    let err = converter.deserialize_object(&json, "Cat").unwrap_err();

    assert!(matches!(err, Error::MissingProperty { .. }));
    let context = err.context().unwrap();
    assert_eq!(context.record, "Human");
    assert_eq!(context.field, "lastname");
    assert_eq!(context.json_name, "lastName");
    assert_eq!(context.path.to_string(), "$.owner.lastName");
}

#[test]
fn test_optional_owner_absent_keeps_default() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let mut json = meowy_json();
    json.as_object_mut().unwrap().remove("owner");
    let cat = converter.deserialize_object(&json, "Cat").unwrap();
    assert_eq!(cat.as_record().unwrap().get("owner"), Some(&Value::Null));
}

#[test]
fn test_required_field_absent_fails() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let mut json = meowy_json();
    json.as_object_mut().unwrap().remove("catName");
    match converter.deserialize_object(&json, "Cat").unwrap_err() {
        Error::MissingProperty { context, expected } => {
            assert_eq!(context.json_name, "catName");
            assert_eq!(expected, "string");
        }
        other => panic!("unexpected error: {}", other),
    }

    let mut cat = meowy(&registry);
    cat.unset("birthdate");
    match converter.serialize_record(&cat).unwrap_err() {
        Error::MissingProperty { context, expected } => {
            assert_eq!(context.field, "birthdate");
            assert_eq!(expected, "custom converter DateConverter");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_custom_converter_failure_carries_reason() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let mut json = meowy_json();
    json["birthdate"] = json!("yesterday");
    let err = converter.deserialize_object(&json, "Cat").unwrap_err();

    match &err {
        Error::TypeMismatch {
            context,
            expected,
            reason,
            ..
        } => {
            assert_eq!(context.field, "birthdate");
            assert_eq!(expected, "custom converter DateConverter");
            assert!(reason.as_deref().unwrap_or_default().contains("invalid date \"yesterday\""));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("\"Kitty.birthdate\" (JSON property \"birthdate\") at $.birthdate"));
}

#[test]
fn test_invalid_top_level_shapes() {
    let registry = animals();
    let converter = Converter::new(&registry);

    assert!(matches!(
        converter.serialize(&Value::from(3)),
        Err(Error::InvalidTopLevelShape { operation: "serialize_object", .. })
    ));
    assert!(matches!(
        converter.serialize(&Value::Unset),
        Err(Error::InvalidTopLevelShape { .. })
    ));
    assert!(matches!(
        converter.deserialize(&json!("Meowy"), "Cat"),
        Err(Error::InvalidTopLevelShape { operation: "deserialize_object", .. })
    ));
    assert!(matches!(
        converter.deserialize_array(&meowy_json(), "Cat"),
        Err(Error::InvalidTopLevelShape { operation: "deserialize_array", .. })
    ));
    assert!(matches!(
        converter.serialize_object(&Value::List(Vec::new())),
        Err(Error::InvalidTopLevelShape { .. })
    ));
    assert!(matches!(
        converter.deserialize_array(&json!([meowy_json(), 3]), "Cat"),
        Err(Error::InvalidTopLevelShape { .. })
    ));
}

#[test]
fn test_unknown_record_type() {
    let registry = animals();
    let converter = Converter::new(&registry);

    let err = converter.deserialize(&json!({}), "Unicorn").unwrap_err();
    assert!(matches!(err, Error::UnknownShape { ref shape, .. } if shape == "Unicorn"));
}

#[test]
fn test_top_level_null() {
    let registry = animals();
    let converter = Converter::new(&registry);
    assert_eq!(converter.deserialize(&json!(null), "Cat").unwrap(), Value::Null);
    assert_eq!(converter.serialize(&Value::Null).unwrap(), json!(null));
    assert_eq!(converter.serialize_array(&Value::Null).unwrap(), json!(null));
    assert_eq!(converter.deserialize_array(&json!(null), "Cat").unwrap(), Value::Null);

    let strict = converter.with_options(
        ConvertOptions::default().with_value_checking_mode(ValueCheckingMode::DisallowNull),
    );
    assert!(matches!(
        strict.deserialize(&json!(null), "Cat"),
        Err(Error::NullNotAllowed { .. })
    ));
    assert!(matches!(
        strict.serialize_array(&Value::Null),
        Err(Error::NullNotAllowed { .. })
    ));
    assert!(matches!(
        strict.deserialize_array(&json!(null), "Cat"),
        Err(Error::NullNotAllowed { .. })
    ));
}

#[test]
fn test_disabled_mode_passes_values_through() {
    let registry = animals();
    let converter = Converter::new(&registry)
        .with_options(ConvertOptions::default().with_operation_mode(OperationMode::Disable));

    let json = json!({"catName": 3, "unexpected": [1, 2]});
    assert_eq!(converter.deserialize(&json, "Cat").unwrap(), Value::from(json.clone()));
    assert_eq!(converter.deserialize(&json!("scalar"), "Unicorn").unwrap(), Value::from("scalar"));

    let mut cat = registry.instantiate("Cat").unwrap();
    cat.set("name", "Meowy");
    let plain = converter.serialize(&Value::from(cat)).unwrap();
    assert_eq!(plain["name"], json!("Meowy"));
    assert_eq!(plain["birthdate"], json!(null));
}
