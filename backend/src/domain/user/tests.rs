//! Tests for the user aggregate and its value objects.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockMfaGateway, MockPasswordHasher};
use crate::domain::{EncryptedSecret, ErrorCode, MfaStatus, RecordError};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 14, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().returning(|password| {
        PasswordHash::new(format!("hashed:{}", password.expose()))
            .map_err(|_| CapabilityError::failed("empty hash"))
    });
    hasher
}

fn new_user() -> NewUser {
    NewUser {
        customer_id: CustomerId::new("cust-42").expect("valid customer id"),
        name: PersonName::new("Ada", "Lovelace").expect("valid name"),
        email: Email::new("ada@example.com").expect("valid email"),
        password: Password::new("correct horse").expect("valid password"),
    }
}

#[fixture]
fn user(hasher: MockPasswordHasher, now: DateTime<Utc>) -> User {
    User::create(new_user(), [RoleId::random()], &hasher, now).expect("user is created")
}

fn gateway() -> MockMfaGateway {
    let mut gateway = MockMfaGateway::new();
    gateway
        .expect_generate_secret()
        .returning(|_| Ok(EncryptedSecret::new("sealed").expect("non-empty")));
    gateway
        .expect_accepts()
        .returning(|_, code, _| Ok(code == "123456"));
    gateway
}

fn device_name() -> DeviceName {
    DeviceName::new("Phone").expect("valid device name")
}

fn window() -> TimeDelta {
    TimeDelta::minutes(10)
}

#[rstest]
fn create_hashes_password_and_seeds_roles(hasher: MockPasswordHasher, now: DateTime<Utc>) {
    let defaults = [RoleId::random(), RoleId::random()];
    let user = User::create(new_user(), defaults.clone(), &hasher, now).expect("created");

    assert_eq!(user.password().as_str(), "hashed:correct horse");
    assert_eq!(user.role_ids().len(), 2);
    assert!(defaults.iter().all(|id| user.has_role(id)));
    assert!(!user.is_email_verified());
    assert!(!user.is_deleted());
    assert!(user.mfa().is_none());
    assert_eq!(user.version(), 0);
    assert_eq!(user.created_at(), now);
}

#[rstest]
fn create_propagates_hasher_failure(now: DateTime<Utc>) {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|_| Err(CapabilityError::unavailable("hasher offline")));

    let err = User::create(new_user(), Vec::<RoleId>::new(), &hasher, now)
        .expect_err("hash failure");
    assert!(matches!(err, UserError::Capability(_)));
}

#[rstest]
fn change_email_resets_verification(mut user: User, now: DateTime<Utc>) {
    user.confirm_email(now).expect("confirm");
    assert!(user.is_email_verified());

    let later = now + TimeDelta::minutes(1);
    user.change_email(Email::new("ada@lovelace.org").expect("valid"), later)
        .expect("change email");

    assert_eq!(user.email().as_ref(), "ada@lovelace.org");
    assert!(!user.is_email_verified());
    assert_eq!(user.updated_at(), later);
}

#[rstest]
fn change_email_to_same_address_still_resets_verification(mut user: User, now: DateTime<Utc>) {
    user.confirm_email(now).expect("confirm");
    let same = user.email().clone();

    user.change_email(same, now).expect("change email");
    assert!(!user.is_email_verified());
}

#[rstest]
fn change_password_rehashes(mut user: User, hasher: MockPasswordHasher, now: DateTime<Utc>) {
    let password = Password::new("battery staple").expect("valid");
    user.change_password(&password, &hasher, now)
        .expect("change password");
    assert_eq!(user.password().as_str(), "hashed:battery staple");
}

#[rstest]
fn role_membership_has_set_semantics(mut user: User, now: DateTime<Utc>) {
    let extra = RoleId::random();
    user.add_roles([extra.clone(), extra.clone()], now)
        .expect("add roles");
    assert_eq!(user.role_ids().len(), 2);

    user.add_roles([extra.clone()], now).expect("add again");
    assert_eq!(user.role_ids().len(), 2);

    user.remove_role(&extra, now).expect("remove");
    assert!(!user.has_role(&extra));
    user.remove_role(&extra, now).expect("removing absent role is fine");
    assert_eq!(user.role_ids().len(), 1);
}

#[rstest]
fn role_ids_collapse_across_spellings(mut user: User, now: DateTime<Utc>) {
    let lower = RoleId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
    let upper = RoleId::new("3FA85F64-5717-4562-B3FC-2C963F66AFA6").expect("valid id");
    let seeded = user.role_ids().len();

    user.add_roles([lower.clone(), upper.clone()], now)
        .expect("add roles");

    assert_eq!(user.role_ids().len(), seeded + 1);
    assert!(user.has_role(&upper));
    let restored = User::try_from(UserRecord::from(&user)).expect("valid record");
    assert_eq!(restored, user);
}

#[rstest]
fn deleted_user_rejects_every_mutator(
    mut user: User,
    hasher: MockPasswordHasher,
    now: DateTime<Utc>,
) {
    user.mark_as_deleted(now).expect("delete");
    let frozen = user.clone();
    let gateway = gateway();
    let role = RoleId::random();
    let password = Password::new("another secret").expect("valid");

    let results = [
        user.change_name(PersonName::new("A", "B").expect("valid"), now),
        user.change_email(Email::new("x@example.com").expect("valid"), now),
        user.confirm_email(now),
        user.change_password(&password, &hasher, now),
        user.add_roles([role.clone()], now),
        user.remove_role(&role, now),
        user.create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
            .map(|_| ()),
        user.confirm_mfa_device("123456", &gateway, now),
        user.disable_mfa(now),
        user.mark_as_deleted(now),
    ];

    for result in results {
        assert!(matches!(result, Err(UserError::Deleted { .. })));
    }
    assert_eq!(user, frozen);
}

#[rstest]
fn deleting_twice_maps_to_user_is_deleted(mut user: User, now: DateTime<Utc>) {
    user.mark_as_deleted(now).expect("delete");
    let err = user.mark_as_deleted(now).expect_err("second delete");

    let mapped = Error::from(err);
    assert_eq!(mapped.code(), ErrorCode::Conflict);
    assert_eq!(mapped.reason(), Some("user_is_deleted"));
}

#[rstest]
fn disable_without_device_fails(mut user: User, now: DateTime<Utc>) {
    let err = user.disable_mfa(now).expect_err("no device");
    assert_eq!(err, UserError::Mfa(MfaError::NoDeviceEnrolled));
}

#[rstest]
fn confirm_without_device_fails(mut user: User, now: DateTime<Utc>) {
    let err = user
        .confirm_mfa_device("123456", &gateway(), now)
        .expect_err("no device");
    assert_eq!(err, UserError::Mfa(MfaError::NoDeviceEnrolled));
}

#[rstest]
fn enroll_then_confirm_enables_mfa(mut user: User, now: DateTime<Utc>) {
    let gateway = gateway();
    let device = user
        .create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
        .expect("enroll");
    assert_eq!(device.status(), MfaStatus::PendingConfirmation);
    assert!(!user.is_mfa_enabled());

    user.confirm_mfa_device("123456", &gateway, now + TimeDelta::minutes(2))
        .expect("confirm");

    let device = user.mfa().expect("device present");
    assert!(device.is_enabled());
    assert!(device.is_verified());
    assert!(user.is_mfa_enabled());
}

#[rstest]
fn enrolling_twice_while_pending_replaces_device(mut user: User, now: DateTime<Utc>) {
    let gateway = gateway();
    let first = user
        .create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
        .expect("enroll")
        .id()
        .clone();

    let second = user
        .create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
        .expect("re-enroll")
        .id()
        .clone();

    assert_ne!(first, second);
}

#[rstest]
fn enrolling_while_enabled_fails(mut user: User, now: DateTime<Utc>) {
    let gateway = gateway();
    user.create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
        .expect("enroll");
    user.confirm_mfa_device("123456", &gateway, now)
        .expect("confirm");

    let err = user
        .create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
        .expect_err("already enabled");
    assert_eq!(err, UserError::Mfa(MfaError::AlreadyEnabled));
}

#[rstest]
fn disable_discards_device(mut user: User, now: DateTime<Utc>) {
    let gateway = gateway();
    user.create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
        .expect("enroll");
    user.confirm_mfa_device("123456", &gateway, now)
        .expect("confirm");

    user.disable_mfa(now).expect("disable");

    assert!(user.mfa().is_none());
    assert!(!user.is_mfa_enabled());
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("   ", UserValidationError::EmptyEmail)]
#[case("ada", UserValidationError::InvalidEmail)]
#[case("ada@example", UserValidationError::InvalidEmail)]
#[case("ada lovelace@example.com", UserValidationError::InvalidEmail)]
#[case("a@b@example.com", UserValidationError::InvalidEmail)]
fn malformed_emails_are_rejected(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Email::new(raw), Err(expected));
}

#[rstest]
fn overlong_email_is_rejected() {
    let raw = format!("{}@example.com", "a".repeat(EMAIL_MAX));
    assert_eq!(
        Email::new(raw),
        Err(UserValidationError::EmailTooLong { max: EMAIL_MAX })
    );
}

#[rstest]
fn emails_are_normalised() {
    let email = Email::new(" Ada@Example.COM ").expect("valid");
    assert_eq!(email, Email::new("ada@example.com").expect("valid"));
}

#[rstest]
#[case("", "Lovelace", UserValidationError::EmptyFirstName)]
#[case("Ada", "  ", UserValidationError::EmptyLastName)]
fn blank_name_parts_are_rejected(
    #[case] first: &str,
    #[case] last: &str,
    #[case] expected: UserValidationError,
) {
    assert_eq!(PersonName::new(first, last), Err(expected));
}

#[rstest]
fn person_name_rejects_overlong_parts() {
    let long = "n".repeat(NAME_PART_MAX + 1);
    assert_eq!(
        PersonName::new(long.as_str(), "Lovelace"),
        Err(UserValidationError::FirstNameTooLong { max: NAME_PART_MAX })
    );
    assert_eq!(
        PersonName::new("Ada", long.as_str()),
        Err(UserValidationError::LastNameTooLong { max: NAME_PART_MAX })
    );
}

#[rstest]
#[case(PASSWORD_MIN - 1, Some(UserValidationError::PasswordTooShort { min: PASSWORD_MIN }))]
#[case(PASSWORD_MIN, None)]
#[case(PASSWORD_MAX, None)]
#[case(PASSWORD_MAX + 1, Some(UserValidationError::PasswordTooLong { max: PASSWORD_MAX }))]
fn password_length_is_bounded(
    #[case] length: usize,
    #[case] expected: Option<UserValidationError>,
) {
    let result = Password::new("p".repeat(length));
    assert_eq!(result.err(), expected);
}

#[rstest]
fn secrets_are_redacted_in_debug_output(user: User) {
    let password = Password::new("super secret value").expect("valid");
    assert!(!format!("{password:?}").contains("super secret value"));
    assert!(!format!("{user:?}").contains("hashed:"));
    assert!(!format!("{:?}", UserRecord::from(&user)).contains("hashed:"));
}

#[rstest]
fn record_round_trip_preserves_every_field(mut user: User, now: DateTime<Utc>) {
    let gateway = gateway();
    user.create_mfa(MfaType::Totp, device_name(), &gateway, now, window())
        .expect("enroll");
    user.add_roles([RoleId::random(), RoleId::random()], now)
        .expect("add roles");
    let mut record = UserRecord::from(&user);
    record.version = 12;

    let restored = User::try_from(record.clone()).expect("valid record");

    assert_eq!(restored.version(), 12);
    assert_eq!(UserRecord::from(&restored), record);
    assert_eq!(restored.mfa(), user.mfa());
    assert_eq!(restored.role_ids(), user.role_ids());
}

#[rstest]
fn record_with_invalid_email_is_rejected(user: User) {
    let mut record = UserRecord::from(&user);
    record.email = "broken".to_owned();

    let err = User::try_from(record).expect_err("corrupt record");
    assert!(matches!(err, RecordError::InvalidField { field: "email", .. }));
}

#[rstest]
fn record_with_inconsistent_deletion_is_rejected(user: User, now: DateTime<Utc>) {
    let mut record = UserRecord::from(&user);
    record.deleted_at = Some(now);

    assert!(matches!(
        User::try_from(record),
        Err(RecordError::Inconsistent(_))
    ));
}
