//! Record types shared by the integration tests.
#![allow(dead_code)]

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use recordmap_core::{CustomConverter, Json, MappingRegistry, PropertyDecl, Record, Shape, Value};
use serde_json::json;

/// Dates travel as `YYYY-MM-DD` strings.
pub struct DateConverter;

impl CustomConverter for DateConverter {
    fn name(&self) -> &str {
        "DateConverter"
    }

    fn serialize(&self, value: &Value) -> anyhow::Result<Json> {
        let date = value
            .downcast_opaque::<NaiveDate>()
            .ok_or_else(|| anyhow!("expected a date, got {}", value.type_description()))?;
        Ok(json!(date.format("%Y-%m-%d").to_string()))
    }

    fn deserialize(&self, json: &Json) -> anyhow::Result<Value> {
        let text = json.as_str().ok_or_else(|| anyhow!("expected a date string"))?;
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("invalid date \"{}\"", text))?;
        Ok(Value::opaque(date))
    }
}

pub fn date(year: i32, month: u32, day: u32) -> Value {
    Value::opaque(NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

/// Human, Animal, Cat (filed as "Kitty") and Dog.
pub fn animals() -> MappingRegistry {
    let mut builder = MappingRegistry::builder();
    builder
        .record("Human")
        .property(
            "firstname",
            "",
            PropertyDecl::named("givenName").shape(Shape::string()),
        )
        .property(
            "lastname",
            "",
            PropertyDecl::named("lastName").shape(Shape::string()),
        )
        .finish()
        .unwrap();
    builder
        .record("Animal")
        .property("name", "", PropertyDecl::named("name").shape(Shape::string()))
        .property(
            "owner",
            Value::Null,
            PropertyDecl::named("owner")
                .shape(Shape::record("Human"))
                .optional(true),
        )
        .property(
            "birthdate",
            Value::Unset,
            PropertyDecl::named("birthdate").shape(Shape::custom(DateConverter)),
        )
        .property(
            "friends",
            Value::List(Vec::new()),
            PropertyDecl::named("friends")
                .shape(Shape::list([Shape::Any]))
                .optional(true),
        )
        .finish()
        .unwrap();
    builder
        .record("Cat")
        .identifier("Kitty")
        .extends("Animal")
        .property(
            "name",
            "",
            PropertyDecl::named("catName").shape(Shape::string()),
        )
        .property("district", 0, PropertyDecl::named("district").shape(Shape::number()))
        .property("talky", false, PropertyDecl::named("talky").shape(Shape::boolean()))
        .property("other", "", PropertyDecl::named("other").shape(Shape::string()))
        .finish()
        .unwrap();
    builder
        .record("Dog")
        .extends("Animal")
        .property("barking", false, PropertyDecl::named("barking").shape(Shape::boolean()))
        .finish()
        .unwrap();
    builder.build().unwrap()
}

pub fn human(registry: &MappingRegistry, firstname: &str, lastname: &str) -> Record {
    let mut human = registry.instantiate("Human").unwrap();
    human.set("firstname", firstname);
    human.set("lastname", lastname);
    human
}

/// Meowy, owned by Andreas Muster.
pub fn meowy(registry: &MappingRegistry) -> Record {
    let mut cat = registry.instantiate("Cat").unwrap();
    cat.set("name", "Meowy");
    cat.set("district", 100);
    cat.set("owner", human(registry, "Andreas", "Muster"));
    cat.set("birthdate", date(2016, 1, 2));
    cat.set("friends", Value::List(Vec::new()));
    cat
}

pub fn meowy_json() -> Json {
    json!({
        "catName": "Meowy",
        "owner": {"givenName": "Andreas", "lastName": "Muster"},
        "birthdate": "2016-01-02",
        "friends": [],
        "district": 100,
        "talky": false,
        "other": ""
    })
}

/// Keys of a JSON object in document order.
pub fn keys(json: &Json) -> Vec<&str> {
    json.as_object()
        .map(|object| object.keys().map(String::as_str).collect())
        .unwrap_or_default()
}
