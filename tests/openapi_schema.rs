use serde_json::Value;

#[test]
fn openapi_documents_the_guarded_routes() -> anyhow::Result<()> {
    let doc = change_tracker::docs::build_openapi(8000)?;
    let v = serde_json::to_value(&doc)?;

    let paths = v.get("paths").and_then(Value::as_object).expect("paths must exist");
    for path in [
        "/records",
        "/records/{id}",
        "/project-outlooks/{id}",
        "/users/{id}",
        "/wards",
        "/me/permissions",
    ] {
        assert!(paths.contains_key(path), "OpenAPI missing path '{}'", path);
    }

    let entry = v
        .pointer("/components/schemas/RecordEntry/properties")
        .and_then(Value::as_object)
        .expect("components.schemas.RecordEntry.properties must exist");
    assert!(entry.contains_key("key") && entry.contains_key("value"));

    assert!(
        v.pointer("/components/securitySchemes/bearerAuth").is_some(),
        "bearerAuth security scheme missing"
    );
    assert_eq!(v.pointer("/servers/0/url").and_then(Value::as_str), Some("http://localhost:8000"));

    Ok(())
}
