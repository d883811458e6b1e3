//! Tests for the mail token aggregate.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockTokenGenerator;
use crate::domain::{ErrorCode, RecordError};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn generator() -> MockTokenGenerator {
    let mut generator = MockTokenGenerator::new();
    generator
        .expect_generate()
        .returning(|| Ok("Zm9vYmFy".to_owned()));
    generator
}

fn issue(
    generator: &MockTokenGenerator,
    ttl: TimeDelta,
    now: DateTime<Utc>,
) -> Result<MailToken, MailTokenError> {
    MailToken::issue(
        Email::new("ada@example.com").expect("valid email"),
        UserId::random(),
        MailTokenType::EmailConfirmation,
        ttl,
        generator,
        now,
    )
}

#[fixture]
fn token(generator: MockTokenGenerator, now: DateTime<Utc>) -> MailToken {
    issue(&generator, TimeDelta::hours(10), now).expect("token issued")
}

#[rstest]
fn issued_token_is_fresh(token: MailToken, now: DateTime<Utc>) {
    assert_eq!(token.token().expose(), "Zm9vYmFy");
    assert_eq!(token.expires_at(), now + TimeDelta::hours(10));
    assert_eq!(token.created_at(), now);
    assert!(!token.is_used());
    assert_eq!(token.used_at(), None);
    assert_eq!(token.version(), 0);
    assert!(!token.is_expired(now));
}

#[rstest]
#[case(TimeDelta::hours(10), false)]
#[case(TimeDelta::hours(10) + TimeDelta::seconds(1), true)]
#[case(TimeDelta::hours(11), true)]
fn expiry_is_strictly_after_deadline(
    token: MailToken,
    now: DateTime<Utc>,
    #[case] elapsed: TimeDelta,
    #[case] expired: bool,
) {
    assert_eq!(token.is_expired(now + elapsed), expired);
}

#[rstest]
#[case(TimeDelta::zero())]
#[case(TimeDelta::seconds(-5))]
fn non_positive_ttl_is_rejected(
    generator: MockTokenGenerator,
    now: DateTime<Utc>,
    #[case] ttl: TimeDelta,
) {
    let err = issue(&generator, ttl, now).expect_err("ttl must be positive");
    assert_eq!(
        err,
        MailTokenError::Validation(MailTokenValidationError::NonPositiveTtl)
    );
}

#[rstest]
fn ttl_past_the_calendar_is_rejected(generator: MockTokenGenerator, now: DateTime<Utc>) {
    let ttl = TimeDelta::hours(i64::from(u32::MAX));
    let err = issue(&generator, ttl, now).expect_err("expiry must be representable");
    assert_eq!(
        err,
        MailTokenError::Validation(MailTokenValidationError::TtlOutOfRange)
    );
    assert_eq!(Error::from(err).code(), ErrorCode::InvalidRequest);
}

#[rstest]
fn empty_generated_token_is_rejected(now: DateTime<Utc>) {
    let mut generator = MockTokenGenerator::new();
    generator.expect_generate().returning(|| Ok(String::new()));

    let err = issue(&generator, TimeDelta::hours(1), now).expect_err("empty token");
    assert_eq!(
        err,
        MailTokenError::Validation(MailTokenValidationError::EmptyToken)
    );
}

#[rstest]
fn generator_failure_is_a_capability_error(now: DateTime<Utc>) {
    let mut generator = MockTokenGenerator::new();
    generator
        .expect_generate()
        .returning(|| Err(CapabilityError::unavailable("rng")));

    let err = issue(&generator, TimeDelta::hours(1), now).expect_err("rng failure");
    assert!(matches!(err, MailTokenError::Capability(_)));
}

#[rstest]
fn redeeming_twice_reports_already_used(mut token: MailToken, now: DateTime<Utc>) {
    let redeemed_at = now + TimeDelta::minutes(3);
    token.redeem(redeemed_at).expect("first redemption");

    assert!(token.is_used());
    assert_eq!(token.used_at(), Some(redeemed_at));
    assert_eq!(
        token.redeem(redeemed_at + TimeDelta::seconds(1)),
        Err(MailTokenError::AlreadyUsed)
    );
    assert_eq!(token.used_at(), Some(redeemed_at));
}

#[rstest]
fn redeeming_after_expiry_reports_expired(mut token: MailToken, now: DateTime<Utc>) {
    let err = token
        .redeem(now + TimeDelta::hours(11))
        .expect_err("expired");

    assert_eq!(err, MailTokenError::Expired);
    assert!(!token.is_used());
}

#[rstest]
fn used_tokens_report_already_used_even_after_expiry(mut token: MailToken, now: DateTime<Utc>) {
    token.redeem(now).expect("redeem");
    assert_eq!(
        token.redeem(now + TimeDelta::days(2)),
        Err(MailTokenError::AlreadyUsed)
    );
}

#[rstest]
fn redeeming_exactly_at_deadline_succeeds(mut token: MailToken, now: DateTime<Utc>) {
    token
        .redeem(now + TimeDelta::hours(10))
        .expect("deadline is inclusive");
}

#[rstest]
#[case(MailTokenError::Expired, ErrorCode::InvalidRequest, "token_expired")]
#[case(MailTokenError::AlreadyUsed, ErrorCode::Conflict, "token_already_used")]
#[case(
    MailTokenError::Validation(MailTokenValidationError::EmptyToken),
    ErrorCode::InvalidRequest,
    "validation_error"
)]
fn errors_map_to_reason_codes(
    #[case] error: MailTokenError,
    #[case] code: ErrorCode,
    #[case] reason: &str,
) {
    let mapped = Error::from(error);
    assert_eq!(mapped.code(), code);
    assert_eq!(mapped.reason(), Some(reason));
}

#[rstest]
fn token_value_debug_is_redacted(token: MailToken) {
    assert!(!format!("{token:?}").contains("Zm9vYmFy"));
    assert!(!format!("{:?}", MailTokenRecord::from(&token)).contains("Zm9vYmFy"));
}

#[rstest]
fn token_type_serialises_in_screaming_case() {
    let value = serde_json::to_value(MailTokenType::PasswordReset).expect("serialise");
    assert_eq!(value, serde_json::json!("PASSWORD_RESET"));
}

#[rstest]
fn record_round_trip_preserves_every_field(mut token: MailToken, now: DateTime<Utc>) {
    token.redeem(now).expect("redeem");
    let mut record = MailTokenRecord::from(&token);
    record.version = 3;

    let restored = MailToken::try_from(record.clone()).expect("valid record");

    assert_eq!(restored.version(), 3);
    assert_eq!(MailTokenRecord::from(&restored), record);
    assert_eq!(restored.token(), token.token());
    assert_eq!(restored.used_at(), Some(now));
}

#[rstest]
fn record_used_without_timestamp_is_rejected(token: MailToken) {
    let mut record = MailTokenRecord::from(&token);
    record.is_used = true;

    assert!(matches!(
        MailToken::try_from(record),
        Err(RecordError::Inconsistent(_))
    ));
}
