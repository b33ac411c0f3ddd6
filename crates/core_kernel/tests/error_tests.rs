//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::ContentHash;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_invalid_identifier() {
    let error = CoreError::invalid_identifier("missing CID- prefix: 42");

    match error {
        CoreError::InvalidIdentifier(msg) => assert!(msg.contains("CID-")),
        _ => panic!("Expected InvalidIdentifier error"),
    }
}

#[test]
fn test_core_error_from_bad_hash() {
    let error = "not-a-digest".parse::<ContentHash>().unwrap_err();

    assert!(matches!(error, CoreError::InvalidHash(_)));
    assert!(error.to_string().contains("Invalid content hash"));
}

#[test]
fn test_core_error_display() {
    let error = CoreError::validation("Test error");
    let display = format!("{}", error);

    assert!(display.contains("Validation error"));
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::configuration("Missing config");

    match error {
        CoreError::Configuration(msg) => assert_eq!(msg, "Missing config"),
        _ => panic!("Expected Configuration error"),
    }
}
