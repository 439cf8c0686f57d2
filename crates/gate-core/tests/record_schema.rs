//! Serde and JsonSchema validation tests for the caller-facing types.

use chrono::{TimeZone, Utc};
use gate_core::{MembershipPage, Metadata, OrgMember, UserId, UserRecord};
use schemars::schema_for;
use serde_json::json;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

fn metadata(value: serde_json::Value) -> Metadata {
    value.as_object().cloned().expect("object literal")
}

fn full_record() -> UserRecord {
    UserRecord {
        user_id: UserId::Str("user_2abc".into()),
        org_id: Some(UserId::Str("org_9xyz".into())),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        email: Some("ada@example.com".into()),
        username: Some("ada".into()),
        phone_number: Some("+15550100".into()),
        role_slug: Some("org:admin".into()),
        profile_pic_url: Some("https://img.example.com/ada.png".into()),
        active: Some(true),
        role_ids: Some(vec![1, 4]),
        meta: Some(metadata(json!({"source": "sso"}))),
        created_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        updated_at: None,
        workspace: Some(vec![metadata(json!({"id": "ws_1"}))]),
        public_metadata: Some(metadata(json!({"plan": "pro"}))),
    }
}

#[test]
fn user_record_matches_its_schema() {
    let record = full_record();
    let schema = serde_json::to_value(schema_for!(UserRecord)).unwrap();
    let instance = serde_json::to_value(&record).unwrap();
    let errors = validate_against_schema(&schema, &instance);
    assert!(errors.is_empty(), "schema validation failed: {errors:?}");

    let recovered: UserRecord = serde_json::from_value(instance).unwrap();
    assert_eq!(recovered, record);
}

#[test]
fn integer_ids_survive_serialization() {
    let mut record = full_record();
    record.user_id = UserId::Int(1001);
    record.org_id = Some(UserId::Int(55));
    let instance = serde_json::to_value(&record).unwrap();
    assert_eq!(instance["userId"], json!(1001));
    assert_eq!(instance["orgId"], json!(55));
}

#[test]
fn membership_page_matches_its_schema() {
    let page = MembershipPage {
        members: vec![OrgMember {
            id: "orgmem_1".into(),
            user_id: "user_2abc".into(),
            role: "org:member".into(),
            role_name: Some("Member".into()),
            identifier: Some("ada@example.com".into()),
            first_name: Some("Ada".into()),
            last_name: None,
            image_url: None,
            public_metadata: Metadata::new(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()),
            updated_at: None,
        }],
        total_count: 1,
    };
    let schema = serde_json::to_value(schema_for!(MembershipPage)).unwrap();
    let instance = serde_json::to_value(&page).unwrap();
    let errors = validate_against_schema(&schema, &instance);
    assert!(errors.is_empty(), "schema validation failed: {errors:?}");
}
