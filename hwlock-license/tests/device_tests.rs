use hwlock_license::HardwareId;

#[test]
fn detected_hwid_is_not_empty() {
    let id = HardwareId::detect();
    assert_eq!(id.as_str().len(), 32);
}

#[test]
fn detected_hwid_is_stable() {
    let a = HardwareId::detect();
    let b = HardwareId::detect();
    assert_eq!(a, b);
}

#[test]
fn hwid_from_components_is_deterministic() {
    let a = HardwareId::from_components(&["linux", "x86_64", "build-01"]);
    let b = HardwareId::from_components(&["linux", "x86_64", "build-01"]);
    let c = HardwareId::from_components(&["linux", "x86_64", "build-02"]);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn hwid_from_raw_is_preserved() {
    let id = HardwareId::from_raw("4C4C4544-0042-3510-8052-B4C04F505732");
    assert_eq!(id.as_str(), "4C4C4544-0042-3510-8052-B4C04F505732");
    assert_eq!(id.to_string(), id.as_str());
}

#[test]
fn hwid_serializes_as_plain_string() {
    let id = HardwareId::from_raw("ABC");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"ABC\"");
}
