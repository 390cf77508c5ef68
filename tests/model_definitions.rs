//! Integration tests for model definition building

use std::fs;
use std::sync::Arc;

use fieldforge::lov::EnumRegistry;
use fieldforge::model::{ModelDefinitionBuilder, LovKind};
use fieldforge::{
    Engine, EngineConfig, FieldDecl, FieldType, FieldforgeError, LabelResolver, LovDecl, LovService, LovType,
    MessageCatalog, ModelDecl, ValidationDecl, ValidationRegistry, ValidationRuleMapper,
};

fn builder_with(catalog: MessageCatalog) -> ModelDefinitionBuilder {
    let labels = LabelResolver::new(Arc::new(catalog));
    let mapper = ValidationRuleMapper::new(ValidationRegistry::with_defaults().unwrap(), labels.clone());
    let lovs = LovService::new(EnumRegistry::new(), labels.clone());
    ModelDefinitionBuilder::new(labels, Arc::new(mapper), Arc::new(lovs), "%d/%m/%Y")
}

fn mail_rule() -> ModelDecl {
    ModelDecl::new("MailRule")
        .qualified("mail.MailRule")
        .marked()
        .field(FieldDecl::new("fromAddressPattern", "String").label("Sender pattern"))
}

#[test]
fn test_catalog_label_wins_over_inline_label() {
    let catalog = MessageCatalog::new("en").with_message("en", "mail.MailRule.fromAddressPattern.label", "From");
    let def = builder_with(catalog).build(&mail_rule(), None).unwrap();

    assert_eq!(def.field("fromAddressPattern").unwrap().label, "From");
}

#[test]
fn test_inline_label_used_without_catalog_entry() {
    let def = builder_with(MessageCatalog::new("en")).build(&mail_rule(), None).unwrap();

    assert_eq!(def.field("fromAddressPattern").unwrap().label, "Sender pattern");
}

#[test]
fn test_humanized_name_is_last_resort() {
    let model = ModelDecl::new("MailRule")
        .marked()
        .field(FieldDecl::new("fromAddressPattern", "String"));
    let def = builder_with(MessageCatalog::new("en")).build(&model, None).unwrap();

    assert_eq!(def.label, "Mail Rule");
    assert_eq!(def.field("fromAddressPattern").unwrap().label, "From Address Pattern");
}

#[test]
fn test_localized_labels() {
    let catalog = MessageCatalog::new("en")
        .with_message("en", "MailRule.label", "Mail rule")
        .with_message("de", "MailRule.label", "Mailregel");
    let builder = builder_with(catalog);

    assert_eq!(builder.build(&mail_rule(), None).unwrap().label, "Mail rule");
    assert_eq!(builder.build(&mail_rule(), Some("de")).unwrap().label, "Mailregel");
}

#[test]
fn test_numeric_rule_applies_to_integer_and_decimal_fields() {
    let model = ModelDecl::new("Invoice")
        .marked()
        .field(FieldDecl::new("lines", "int").validate(ValidationDecl::new("Max").attr("value", 50)))
        .field(FieldDecl::new("total", "BigDecimal").validate(ValidationDecl::new("Max").attr("value", 1000)))
        .field(FieldDecl::new("memo", "String").validate(ValidationDecl::new("Max").attr("value", 1)));
    let def = builder_with(MessageCatalog::new("en")).build(&model, None).unwrap();

    let lines = def.field("lines").unwrap();
    assert_eq!(lines.field_type, FieldType::Integer);
    assert_eq!(lines.validations[0].name, "maxValue");
    assert_eq!(lines.validations[0].values["value"], serde_json::json!(50));
    assert_eq!(lines.validations[0].error_message, "Value should be less than or equal to 50");

    let total = def.field("total").unwrap();
    assert_eq!(total.field_type, FieldType::Decimal);
    assert_eq!(total.validations[0].name, "maxValue");

    // Numeric rule has no client mapping on text
    assert!(def.field("memo").unwrap().validations.is_empty());
}

#[test]
fn test_cross_field_rule_is_flagged() {
    let model = ModelDecl::new("Booking")
        .marked()
        .field(FieldDecl::new("start", "Date"))
        .field(FieldDecl::new("end", "Date").validate(ValidationDecl::new("GreaterThan").attr("field", "start")));
    let def = builder_with(MessageCatalog::new("en")).build(&model, None).unwrap();

    let end = &def.field("end").unwrap().validations[0];
    assert_eq!(end.name, "greaterThanDate");
    assert!(end.cross_validation);
    assert_eq!(end.error_message, "Value should be greater than value of 'start'");
}

#[test]
fn test_engine_loads_models_from_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let models = dir.path().join("models");
    fs::create_dir(&models).unwrap();

    fs::write(
        models.join("party.yaml"),
        r#"
model:
  name: Party
  qualified_name: crm.Party
  marker: {}
  fields:
    - name: displayName
      type: String
      validations:
        - rule: Required
        - rule: MaxLen
          attributes: { value: 80 }
"#,
    )
    .unwrap();
    fs::write(
        models.join("customer.yaml"),
        r#"
model:
  name: Customer
  qualified_name: crm.Customer
  extends: Party
  marker: {}
  extendable: { name: customer }
  extensible: true
  fields:
    - name: tier
      type: enum:Tier
    - name: tags
      type: String
      lov: { name: customerTags, kind: stored }
"#,
    )
    .unwrap();
    fs::write(dir.path().join("enums.yaml"), "enums:\n  Tier: [GOLD, SILVER]\n").unwrap();

    let config = EngineConfig {
        models_dir: Some(models),
        enums_file: Some(dir.path().join("enums.yaml")),
        ..EngineConfig::default()
    };
    let engine = Engine::from_config(config).unwrap();
    assert_eq!(engine.check().unwrap(), 2);

    let customer = engine.models().model_def("Customer").unwrap();
    let names: Vec<_> = customer.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["displayName", "tier", "tags"]);
    assert_eq!(customer.extension_name.as_deref(), Some("customer"));

    let display = customer.field("displayName").unwrap();
    let kinds: Vec<_> = display.validations.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(kinds, vec!["required", "maxLength"]);

    let tier = customer.field("tier").unwrap().lov_details.as_ref().unwrap();
    assert_eq!(tier.lov_type, LovType::Static);
    assert_eq!(tier.lov_name, "Tier");

    let tags = customer.field("tags").unwrap().lov_details.as_ref().unwrap();
    assert_eq!(tags.lov_type, LovType::Stored);

    // Built once, then served from cache
    let again = engine.models().model_def("Customer").unwrap();
    assert!(Arc::ptr_eq(&customer, &again));
}

#[test]
fn test_definition_json_shape() {
    let model = ModelDecl::new("Customer")
        .marked()
        .field(FieldDecl::new("notes", "String").multiline())
        .field(FieldDecl::new("region", "String").lov(LovDecl::stored("regions")));
    let def = builder_with(MessageCatalog::new("en")).build(&model, None).unwrap();
    let json = serde_json::to_value(&def).unwrap();

    assert_eq!(json["dateFormat"], "%d/%m/%Y");
    assert_eq!(json["fields"][0]["fieldType"], "MULTI_LINE_STRING");
    assert!(json["fields"][0].get("lovDetails").is_none());
    assert_eq!(json["fields"][1]["fieldType"], "LIST_OF_VALUES");
    assert_eq!(json["fields"][1]["lovDetails"]["lovType"], "STORED");
    assert_eq!(LovDecl::stored("regions").kind, LovKind::Stored);
}

#[test]
fn test_unknown_model_is_not_found() {
    let engine = Engine::from_config(EngineConfig::default()).unwrap();
    assert!(matches!(
        engine.models().model_def("Nope"),
        Err(FieldforgeError::NotFound(_))
    ));
}
