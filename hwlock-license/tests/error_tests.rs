use hwlock_license::LicenseError;

#[test]
fn error_display_unauthorized() {
    let err = LicenseError::Unauthorized;
    assert!(format!("{err}").contains("unauthorized"));
}

#[test]
fn error_display_not_found() {
    let err = LicenseError::NotFound("0192-abc".into());
    let msg = format!("{err}");
    assert!(msg.contains("not found"));
    assert!(msg.contains("0192-abc"));
}

#[test]
fn error_display_generation_collision() {
    let err = LicenseError::GenerationCollision(3);
    let msg = format!("{err}");
    assert!(msg.contains("collided"));
    assert!(msg.contains('3'));
}

#[test]
fn error_display_expired() {
    let err = LicenseError::Expired("2025-01-01".into());
    assert!(format!("{err}").contains("expired"));
}

#[test]
fn error_display_hwid_mismatch() {
    let err = LicenseError::HwidMismatch;
    assert!(format!("{err}").contains("another device"));
}

#[test]
fn error_display_validation() {
    let err = LicenseError::Validation("hwid is required".into());
    let msg = format!("{err}");
    assert!(msg.contains("validation"));
    assert!(msg.contains("hwid is required"));
}

#[test]
fn error_display_store_unavailable() {
    let err = LicenseError::StoreUnavailable("disk full".into());
    assert!(format!("{err}").contains("store unavailable"));
}

#[test]
fn error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let license_err: LicenseError = serde_err.unwrap_err().into();
    assert!(format!("{license_err}").contains("serialization"));
}

#[test]
fn error_from_io_is_store_unavailable() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let err: LicenseError = io.into();
    assert!(matches!(err, LicenseError::StoreUnavailable(_)));
}

#[test]
fn client_errors_are_classified() {
    assert!(LicenseError::Unauthorized.is_client_error());
    assert!(LicenseError::Validation("x".into()).is_client_error());
    assert!(LicenseError::NotFound("x".into()).is_client_error());
    assert!(!LicenseError::StoreUnavailable("x".into()).is_client_error());
    assert!(!LicenseError::DuplicateToken.is_client_error());
}
