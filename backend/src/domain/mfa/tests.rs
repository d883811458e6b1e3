//! Tests for the MFA device state machine.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockMfaGateway;

const WINDOW_MINUTES: i64 = 10;

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn sealed(ciphertext: &str) -> EncryptedSecret {
    EncryptedSecret::new(ciphertext).expect("non-empty ciphertext")
}

fn gateway_issuing(ciphertext: &'static str) -> MockMfaGateway {
    let mut gateway = MockMfaGateway::new();
    gateway
        .expect_generate_secret()
        .with(eq(MfaType::Totp))
        .returning(move |_| Ok(sealed(ciphertext)));
    gateway
}

fn enroll(gateway: &MockMfaGateway, now: DateTime<Utc>) -> MfaDevice {
    MfaDevice::enroll(
        MfaType::Totp,
        DeviceName::new("Work phone").expect("valid name"),
        gateway,
        now,
        TimeDelta::minutes(WINDOW_MINUTES),
    )
    .expect("enrollment succeeds")
}

#[rstest]
fn enrollment_starts_pending_with_deadline(now: DateTime<Utc>) {
    let gateway = gateway_issuing("sealed-1");
    let device = enroll(&gateway, now);

    assert_eq!(device.status(), MfaStatus::PendingConfirmation);
    assert!(!device.is_enabled());
    assert!(!device.is_verified());
    assert!(!device.is_device_verified());
    assert_eq!(device.secret(), &sealed("sealed-1"));
    assert_eq!(
        device.valid_until(),
        Some(now + TimeDelta::minutes(WINDOW_MINUTES))
    );
    let name = device.device_name().expect("name recorded");
    assert_eq!(name.as_ref(), "Work phone");
}

#[rstest]
fn window_past_the_calendar_is_rejected(now: DateTime<Utc>) {
    let mut gateway = MockMfaGateway::new();
    gateway.expect_generate_secret().times(0);

    let err = MfaDevice::enroll(
        MfaType::Totp,
        DeviceName::new("Phone").expect("valid name"),
        &gateway,
        now,
        TimeDelta::days(200_000_000),
    )
    .expect_err("deadline must be representable");

    assert_eq!(
        err,
        MfaError::Validation(MfaValidationError::WindowOutOfRange)
    );
    assert_eq!(Error::from(err).reason(), Some("validation_error"));
}

#[rstest]
fn enrollment_surfaces_gateway_failure(now: DateTime<Utc>) {
    let mut gateway = MockMfaGateway::new();
    gateway
        .expect_generate_secret()
        .returning(|_| Err(CapabilityError::unavailable("no key")));

    let err = MfaDevice::enroll(
        MfaType::Totp,
        DeviceName::new("Phone").expect("valid name"),
        &gateway,
        now,
        TimeDelta::minutes(WINDOW_MINUTES),
    )
    .expect_err("gateway failure propagates");

    assert!(matches!(err, MfaError::Capability(_)));
}

#[rstest]
#[case(TimeDelta::zero())]
#[case(TimeDelta::minutes(WINDOW_MINUTES))]
fn accepted_code_within_window_enables_device(#[case] elapsed: TimeDelta, now: DateTime<Utc>) {
    let mut gateway = gateway_issuing("sealed-2");
    gateway
        .expect_accepts()
        .withf(|kind, code, secret| {
            *kind == MfaType::Totp && code == "123456" && secret.ciphertext() == "sealed-2"
        })
        .times(1)
        .returning(|_, _, _| Ok(true));
    let mut device = enroll(&gateway, now);
    let confirmed_at = now + elapsed;

    device
        .confirm("123456", &gateway, confirmed_at)
        .expect("confirmation succeeds");

    assert_eq!(device.status(), MfaStatus::Enabled);
    assert!(device.is_enabled());
    assert!(device.is_verified());
    assert!(device.is_device_verified());
    assert_eq!(device.valid_until(), None);
    assert_eq!(device.updated_at(), confirmed_at);
}

#[rstest]
fn rejected_code_leaves_device_untouched(now: DateTime<Utc>) {
    let mut gateway = gateway_issuing("sealed-3");
    gateway.expect_accepts().returning(|_, _, _| Ok(false));
    let mut device = enroll(&gateway, now);
    let before = device.clone();

    let err = device
        .confirm("000000", &gateway, now + TimeDelta::minutes(1))
        .expect_err("wrong code fails");

    assert_eq!(err, MfaError::ConfirmationFailed);
    assert_eq!(device, before);
}

#[rstest]
fn confirmation_after_deadline_expires_without_consulting_gateway(now: DateTime<Utc>) {
    let mut gateway = gateway_issuing("sealed-4");
    gateway.expect_accepts().times(0);
    let mut device = enroll(&gateway, now);
    let before = device.clone();

    let err = device
        .confirm(
            "123456",
            &gateway,
            now + TimeDelta::minutes(WINDOW_MINUTES) + TimeDelta::seconds(1),
        )
        .expect_err("late confirmation fails");

    assert_eq!(err, MfaError::ConfirmationExpired);
    assert_eq!(device, before);
}

#[rstest]
fn confirming_an_enabled_device_fails(now: DateTime<Utc>) {
    let mut gateway = gateway_issuing("sealed-5");
    gateway.expect_accepts().returning(|_, _, _| Ok(true));
    let mut device = enroll(&gateway, now);
    device.confirm("123456", &gateway, now).expect("first confirm");

    let err = device
        .confirm("123456", &gateway, now)
        .expect_err("second confirm fails");
    assert_eq!(err, MfaError::AlreadyEnabled);
}

#[rstest]
fn debug_output_redacts_secret() {
    let secret = sealed("very-secret-ciphertext");
    let rendered = format!("{secret:?}");
    assert!(!rendered.contains("very-secret-ciphertext"));
}

#[rstest]
#[case(MfaError::NoDeviceEnrolled, ErrorCode::Conflict, "no_mfa_device_enrolled")]
#[case(MfaError::AlreadyEnabled, ErrorCode::Conflict, "mfa_already_enabled")]
#[case(MfaError::ConfirmationExpired, ErrorCode::Conflict, "mfa_confirmation_expired")]
#[case(
    MfaError::ConfirmationFailed,
    ErrorCode::InvalidRequest,
    "mfa_confirmation_failed"
)]
fn state_errors_map_to_reason_codes(
    #[case] error: MfaError,
    #[case] code: ErrorCode,
    #[case] reason: &str,
) {
    let mapped = Error::from(error);
    assert_eq!(mapped.code(), code);
    assert_eq!(mapped.reason(), Some(reason));
}

#[rstest]
fn capability_errors_map_to_internal() {
    let mapped = Error::from(MfaError::Capability(CapabilityError::failed("boom")));
    assert_eq!(mapped.code(), ErrorCode::InternalError);
    assert!(!mapped.message().contains("boom"));
}

#[rstest]
#[case("", MfaValidationError::EmptyDeviceName)]
#[case("   ", MfaValidationError::EmptyDeviceName)]
fn blank_device_names_are_rejected(#[case] raw: &str, #[case] expected: MfaValidationError) {
    assert_eq!(DeviceName::new(raw), Err(expected));
}

#[rstest]
fn record_round_trip_preserves_device(now: DateTime<Utc>) {
    let gateway = gateway_issuing("sealed-6");
    let device = enroll(&gateway, now);

    let record = MfaDeviceRecord::from(&device);
    let restored = MfaDevice::try_from(record.clone()).expect("valid record");

    assert_eq!(restored, device);
    assert_eq!(MfaDeviceRecord::from(&restored), record);
}

#[rstest]
fn record_verified_but_disabled_is_rejected(now: DateTime<Utc>) {
    let gateway = gateway_issuing("sealed-7");
    let mut record = MfaDeviceRecord::from(&enroll(&gateway, now));
    record.verified = true;

    assert!(matches!(
        MfaDevice::try_from(record),
        Err(crate::domain::RecordError::Inconsistent(_))
    ));
}

#[rstest]
fn record_device_verified_without_name_is_rejected(now: DateTime<Utc>) {
    let gateway = gateway_issuing("sealed-8");
    let mut record = MfaDeviceRecord::from(&enroll(&gateway, now));
    record.device_verified = true;
    record.device_name = None;

    assert!(matches!(
        MfaDevice::try_from(record),
        Err(crate::domain::RecordError::Inconsistent(_))
    ));
}

#[rstest]
fn record_with_device_confirmed_reports_intermediate_status(now: DateTime<Utc>) {
    let gateway = gateway_issuing("sealed-9");
    let mut record = MfaDeviceRecord::from(&enroll(&gateway, now));
    record.device_verified = true;

    let device = MfaDevice::try_from(record).expect("valid record");
    assert_eq!(device.status(), MfaStatus::DeviceConfirmed);
}
