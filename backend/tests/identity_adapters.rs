//! End-to-end flows over the in-memory repositories and the reference
//! capability adapters (Argon2, envelope-sealed TOTP, OS-random tokens).

use std::sync::Arc;

use argon2::Params;
use chrono::{DateTime, TimeZone, Utc};
use identity_backend::domain::ports::PasswordHasher;
use identity_backend::domain::{
    AccountService, IdentityPolicy, MfaService, MfaStatus, MfaType, Password, RegisterUserRequest,
    RoleDetails, RoleService, User, VerificationService,
};
use identity_backend::outbound::persistence::{
    InMemoryMailTokenRepository, InMemoryRoleRepository, InMemoryUserRepository,
};
use identity_backend::outbound::security::{
    Argon2PasswordHasher, EnvelopeCipher, RandomTokenGenerator, TotpMfaGateway,
};
use identity_backend::test_support::MutableClock;
use mockable::Clock;
use rstest::{fixture, rstest};
use totp_rs::{Algorithm, TOTP};

type Accounts =
    AccountService<InMemoryUserRepository, InMemoryRoleRepository, InMemoryMailTokenRepository>;
type Verification = VerificationService<InMemoryUserRepository, InMemoryMailTokenRepository>;

struct Stack {
    clock: Arc<MutableClock>,
    cipher: EnvelopeCipher,
    hasher: Arc<Argon2PasswordHasher>,
    roles: RoleService<InMemoryRoleRepository>,
    accounts: Accounts,
    verification: Verification,
    mfa: MfaService<InMemoryUserRepository>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 5, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn stack() -> Stack {
    let clock = Arc::new(MutableClock::new(start()));
    let cipher = EnvelopeCipher::generate(1024).expect("keygen");
    let hasher = Arc::new(Argon2PasswordHasher::with_params(
        Params::new(1024, 1, 1, None).expect("valid params"),
    ));
    let generator = Arc::new(RandomTokenGenerator);
    let users = Arc::new(InMemoryUserRepository::new());
    let roles = Arc::new(InMemoryRoleRepository::new());
    let tokens = Arc::new(InMemoryMailTokenRepository::new());
    let policy = IdentityPolicy::default();

    Stack {
        roles: RoleService::new(roles.clone(), clock.clone()),
        accounts: AccountService::new(
            users.clone(),
            roles,
            tokens.clone(),
            hasher.clone(),
            generator.clone(),
            clock.clone(),
            policy.clone(),
        ),
        verification: VerificationService::new(
            users.clone(),
            tokens,
            hasher.clone(),
            generator,
            clock.clone(),
            policy.clone(),
        ),
        mfa: MfaService::new(
            users,
            Arc::new(TotpMfaGateway::new(cipher.clone(), clock.clone())),
            clock.clone(),
            policy,
        ),
        clock,
        cipher,
        hasher,
    }
}

fn request(email: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        customer_id: "cust-500".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        email: email.to_owned(),
        password: "analytical-engine".to_owned(),
    }
}

fn password_matches(stack: &Stack, user: &User, raw: &str) -> bool {
    let password = Password::new(raw).expect("valid password");
    stack
        .hasher
        .verify(&password, user.password())
        .expect("verify")
}

#[rstest]
#[tokio::test]
async fn registration_seeds_default_roles_and_hashes_password(stack: Stack) {
    let customer = stack
        .roles
        .create(RoleDetails::try_new("CUSTOMER", None, true).expect("valid"))
        .await
        .expect("role created");

    let user = stack
        .accounts
        .register(request("ada@example.com"))
        .await
        .expect("registered");

    assert!(user.has_role(customer.id()));
    assert!(user.password().as_str().starts_with("$argon2id$"));
    assert!(password_matches(&stack, &user, "analytical-engine"));
}

#[rstest]
#[tokio::test]
async fn password_reset_round_trip(stack: Stack) {
    stack
        .accounts
        .register(request("ada@example.com"))
        .await
        .expect("registered");

    let token = stack
        .verification
        .request_password_reset("ADA@example.com")
        .await
        .expect("token issued");
    assert_eq!(token.token().expose().len(), 43);

    let user = stack
        .verification
        .reset_password(token.token().expose(), "difference-engine".to_owned())
        .await
        .expect("password reset");

    assert!(password_matches(&stack, &user, "difference-engine"));
    assert!(!password_matches(&stack, &user, "analytical-engine"));
}

#[rstest]
#[tokio::test]
async fn changing_email_issues_a_redeemable_confirmation(stack: Stack) {
    let user = stack
        .accounts
        .register(request("ada@example.com"))
        .await
        .expect("registered");

    let (changed, token) = stack
        .accounts
        .change_email(user.id(), "countess@example.com")
        .await
        .expect("email changed");
    assert!(!changed.is_email_verified());

    let confirmed = stack
        .verification
        .confirm_email(token.token().expose())
        .await
        .expect("confirmed");

    assert!(confirmed.is_email_verified());
    assert_eq!(confirmed.email().as_ref(), "countess@example.com");
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_token_is_redeemed_at_most_once_under_contention(stack: Stack) {
    let user = stack
        .accounts
        .register(request("ada@example.com"))
        .await
        .expect("registered");
    let token = stack
        .verification
        .request_email_confirmation(user.id())
        .await
        .expect("token issued");
    let raw = token.token().expose();

    let (first, second) = tokio::join!(
        stack.verification.confirm_email(raw),
        stack.verification.confirm_email(raw),
    );

    let successes = [first.is_ok(), second.is_ok()]
        .into_iter()
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);
}

#[rstest]
#[tokio::test]
async fn totp_enrollment_confirms_with_a_live_code(stack: Stack) {
    let user = stack
        .accounts
        .register(request("ada@example.com"))
        .await
        .expect("registered");

    let enrollment = stack
        .mfa
        .enroll(user.id(), MfaType::Totp, "Phone")
        .await
        .expect("enrolled");
    let svg = String::from_utf8(enrollment.qr_code.data().to_vec()).expect("utf-8");
    assert!(svg.contains("<svg"));

    let device = enrollment.user.mfa().expect("device");
    let seed = stack
        .cipher
        .open(device.secret().ciphertext())
        .expect("seed opens");
    let now = u64::try_from(stack.clock.utc().timestamp()).expect("positive");
    let code = TOTP::new(Algorithm::SHA1, 6, 1, 30, seed.to_vec(), None, String::new())
        .expect("authenticator")
        .generate(now);

    let rejected = stack.mfa.confirm(user.id(), "000000").await;
    if code != "000000" {
        assert!(rejected.is_err());
    }
    let confirmed = stack
        .mfa
        .confirm(user.id(), &code)
        .await
        .expect("confirmed");

    assert_eq!(
        confirmed.mfa().map(|device| device.status()),
        Some(MfaStatus::Enabled)
    );
}
