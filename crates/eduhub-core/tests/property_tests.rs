// Property-based tests for the course validator
use eduhub_core::domain::{
    CourseField, CourseLevel, DomainValidator, Record, ValidationReport, ValueKind, ViolationKind,
    record_from_value,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn valid_course() -> Record {
    record_from_value(json!({
        "title": "Systems Programming in Rust",
        "price": 49.5,
        "instructorEmail": "kemi.a@eduhub.com",
        "level": "intermediate",
    }))
    .unwrap()
}

fn reported_fields(report: &ValidationReport) -> Vec<String> {
    report.fields().map(str::to_string).collect()
}

fn non_numeric() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
        prop::collection::vec(any::<i32>(), 0..4).prop_map(|v| json!(v)),
        "[a-z]{1,6}".prop_map(|key| {
            let mut object = Record::new();
            object.insert(key, json!(1));
            Value::Object(object)
        }),
    ]
}

// ========== PROPERTY 1: Missing Fields Are Reported Alone ==========

proptest! {
    #[test]
    fn prop_missing_required_fields_are_exactly_reported(
        missing in prop::collection::vec(any::<bool>(), 4),
        as_null in prop::collection::vec(any::<bool>(), 4),
    ) {
        let mut record = valid_course();
        let mut expected = Vec::new();
        for (i, field) in CourseField::REQUIRED.iter().enumerate() {
            if !missing[i] {
                continue;
            }
            if as_null[i] {
                record.insert(field.as_str().into(), Value::Null);
            } else {
                record.remove(field.as_str());
            }
            expected.push(field.as_str().to_string());
        }

        let report = DomainValidator::validate_course(&record);

        prop_assert_eq!(reported_fields(&report), expected);
        prop_assert!(
            report
                .iter()
                .all(|v| v.kind == ViolationKind::MissingRequiredField)
        );
    }
}

// ========== PROPERTY 2: Price Type ==========

proptest! {
    #[test]
    fn prop_non_numeric_price_is_one_type_mismatch(price in non_numeric()) {
        let kind = ValueKind::of(&price);
        let mut record = valid_course();
        record.insert("price".into(), price);

        let report = DomainValidator::validate_course(&record);

        prop_assert_eq!(report.len(), 1);
        let violation = report.get("price").unwrap();
        prop_assert_eq!(violation.kind, ViolationKind::TypeMismatch);
        prop_assert!(
            violation.message.contains(&format!("'{}'", kind)),
            "message {:?} should name {}",
            violation.message,
            kind
        );
    }
}

proptest! {
    #[test]
    fn prop_non_negative_float_price_is_accepted(price in 0.0f64..1.0e12) {
        let mut record = valid_course();
        record.insert("price".into(), json!(price));

        let report = DomainValidator::validate_course(&record);
        prop_assert!(!report.contains("price"), "{}", report);
    }
}

proptest! {
    #[test]
    fn prop_non_negative_integer_price_is_accepted(price in any::<u64>()) {
        let mut record = valid_course();
        record.insert("price".into(), json!(price));

        prop_assert!(DomainValidator::validate_course(&record).is_valid());
    }
}

// ========== PROPERTY 3: Level Case ==========

proptest! {
    #[test]
    fn prop_level_accepts_any_case(
        level in prop::sample::select(CourseLevel::ALL.to_vec()),
        upper in prop::collection::vec(any::<bool>(), 12),
    ) {
        let variant: String = level
            .as_str()
            .chars()
            .zip(upper.iter().cycle())
            .map(|(c, &up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();

        let mut record = valid_course();
        record.insert("level".into(), json!(variant));

        prop_assert!(DomainValidator::validate_course(&record).is_valid());
        prop_assert_eq!(variant.parse::<CourseLevel>().unwrap(), level);
    }
}

// ========== PROPERTY 4: Unknown Keys Pass Through ==========

proptest! {
    #[test]
    fn prop_extra_keys_never_change_the_report(
        extras in prop::collection::btree_map("extra_[a-z]{1,8}", any::<i64>(), 0..8),
        drop_title in any::<bool>(),
        bad_email in any::<bool>(),
    ) {
        let mut record = valid_course();
        if drop_title {
            record.remove("title");
        }
        if bad_email {
            record.insert("instructorEmail".into(), json!("kemi.at.home"));
        }
        let before = DomainValidator::validate_course(&record);

        for (key, value) in extras {
            record.insert(key, json!(value));
        }
        let after = DomainValidator::validate_course(&record);

        prop_assert_eq!(before, after);
    }
}
