//! Property-based tests for the envelope and error translation.
//!
//! These tests verify universal properties across all inputs using proptest.

use chrono::NaiveDate;
use proptest::prelude::*;
use service_base::health::describe_service;
use service_base::translator::INTERNAL_ERROR_MESSAGE;
use service_base::{
    BusinessException, ErrorCode, ErrorFamily, HealthEndpoint, ResultEnvelope, ServiceError, ServiceInfo, translate,
};
use test_utils::{
    business_exception_strategy, error_code_strategy, failure_code_strategy, field_violations_strategy,
    message_strategy, request_shape_strategy, service_error_case_strategy, service_name_strategy, version_strategy,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_fail_carries_code_and_no_data(code in error_code_strategy()) {
        let envelope = ResultEnvelope::<String>::fail(code);
        prop_assert_eq!(envelope.code(), code.code());
        prop_assert_eq!(envelope.message(), code.message());
        prop_assert!(envelope.data().is_none());
    }

    #[test]
    fn prop_success_keeps_data(data in any::<i64>(), message in message_strategy()) {
        let envelope = ResultEnvelope::success(data);
        prop_assert_eq!(envelope.code(), 200);
        prop_assert_eq!(envelope.data(), Some(&data));
        prop_assert!(envelope.is_success());

        let envelope = ResultEnvelope::success_with_message(message.clone(), data);
        prop_assert_eq!(envelope.message(), message.as_str());
    }

    #[test]
    fn prop_failure_envelope_omits_data_on_the_wire(code in failure_code_strategy(), message in message_strategy()) {
        let envelope = ResultEnvelope::<Vec<u8>>::fail_with_message(code, message);
        let json = serde_json::to_value(&envelope).unwrap();
        prop_assert!(json.get("data").is_none());
        prop_assert_eq!(json["code"].as_i64(), Some(i64::from(code.code())));
    }

    #[test]
    fn prop_validation_joins_in_order(violations in field_violations_strategy(6)) {
        let expected = violations
            .iter()
            .map(|v| v.message.clone())
            .collect::<Vec<_>>()
            .join(", ");
        let translation = translate(&ServiceError::validation(violations));
        prop_assert_eq!(translation.body.code(), ErrorCode::PARAM_ERROR.code());
        prop_assert_eq!(translation.body.message(), expected.as_str());
        prop_assert_eq!(translation.family, ErrorFamily::ClientInput);
    }

    #[test]
    fn prop_translation_is_idempotent(case in service_error_case_strategy()) {
        let error = case.build();
        prop_assert_eq!(translate(&error), translate(&error));
    }

    #[test]
    fn prop_business_message_override_is_kept((code, message) in business_exception_strategy()) {
        let error = ServiceError::from(BusinessException::with_message(code, message.clone()));
        let translation = translate(&error);
        prop_assert_eq!(translation.body, ResultEnvelope::fail_with_message(code, message));
        prop_assert_eq!(translation.status, code.http_status());
    }

    #[test]
    fn prop_unclassified_errors_are_internal(detail in "[ -~]{0,120}") {
        let translation = translate(&ServiceError::internal(detail));
        prop_assert_eq!(translation.body.code(), ErrorCode::INTERNAL_ERROR.code());
        prop_assert_eq!(translation.body.message(), INTERNAL_ERROR_MESSAGE);
        prop_assert_eq!(translation.status.as_u16(), 500);
    }

    #[test]
    fn prop_every_translation_is_a_valid_failure(case in service_error_case_strategy()) {
        let translation = translate(&case.build());
        prop_assert!(!translation.body.is_success());
        prop_assert!(!translation.body.message().is_empty());
        prop_assert!(translation.body.data().is_none());
        prop_assert!(translation.status.is_client_error() || translation.status.is_server_error());
    }

    #[test]
    fn prop_request_shape_is_client_error(shape in request_shape_strategy()) {
        let translation = translate(&ServiceError::from(shape));
        prop_assert_eq!(translation.family, ErrorFamily::ClientRequestShape);
        prop_assert!(translation.is_client_error());
    }

    #[test]
    fn prop_health_is_always_up(name in service_name_strategy(), version in version_strategy()) {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(12, 0, 5).unwrap();
        let report = HealthEndpoint::new(ServiceInfo::new(name.clone(), version.clone())).report_at(now);

        prop_assert!(report.is_success());
        prop_assert_eq!(report.message(), describe_service(&name));
        let data = report.into_data().unwrap();
        prop_assert_eq!(data.status, "UP");
        prop_assert_eq!(data.service, name);
        prop_assert_eq!(data.version, version);
        prop_assert_eq!(data.timestamp, "2024-03-01T12:00:05");
    }
}
