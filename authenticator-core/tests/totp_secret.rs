//! Falling back to the stored account secret, and log routing.
//!
//! Every test in this binary runs with `AUTHENTICATOR_TOTP_SECRET` unset.

mod common;

use std::io;
use std::sync::{Arc, Once};

use authenticator_core::{
    Account, AccountSecretProvider, FixedClock, GenerateTotpOptions, SecretChain, TOTP_SECRET_ENV,
    TotpError, TotpSecretGetter,
};
use chrono::{TimeZone, Utc};
use common::{Op, test_authenticator};
use parking_lot::Mutex;
use tracing::Level;

static ENV: Once = Once::new();

fn clear_env() {
    ENV.call_once(|| {
        unsafe { std::env::remove_var(TOTP_SECRET_ENV) };
    });
}

fn options() -> GenerateTotpOptions {
    GenerateTotpOptions {
        clock: Some(Arc::new(FixedClock(Utc.timestamp_opt(59, 0).unwrap()))),
        ..Default::default()
    }
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capturing_dispatch() -> (tracing::Dispatch, Captured) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .finish();
    (tracing::Dispatch::new(subscriber), captured)
}

#[test]
fn test_falls_back_to_stored_account() {
    clear_env();
    let (authenticator, _store, _temp) = test_authenticator();
    authenticator.create_namespace("team1", "Team One").unwrap();
    authenticator
        .set_account(
            "team1",
            Account::new("alice").with_secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
        )
        .unwrap();

    let code = authenticator
        .generate_totp("team1", "alice", options())
        .unwrap();

    assert_eq!(code, "287082");
}

#[test]
fn test_no_secret_anywhere() {
    clear_env();
    let (authenticator, _store, _temp) = test_authenticator();

    let result = authenticator.generate_totp("team1", "alice", options());

    assert!(matches!(result, Err(TotpError::NoSecret)));
}

#[test]
fn test_storage_failure_reads_as_no_secret() {
    clear_env();
    let (authenticator, store, _temp) = test_authenticator();
    authenticator.create_namespace("team1", "Team One").unwrap();
    authenticator
        .set_account("team1", Account::new("alice").with_secret("JBSWY3DP"))
        .unwrap();
    store.fail(Op::Get, "team1/alice");

    let result = authenticator.generate_totp("team1", "alice", options());

    assert!(matches!(result, Err(TotpError::NoSecret)));
}

#[test]
fn test_provider_in_chain_reads_storage_once() {
    clear_env();
    let (authenticator, store, _temp) = test_authenticator();
    authenticator.create_namespace("team1", "Team One").unwrap();
    authenticator
        .set_account("team1", Account::new("alice").with_secret("JBSWY3DP"))
        .unwrap();

    let provider = Arc::new(AccountSecretProvider::new(
        authenticator.clone(),
        "team1",
        "alice",
    ));
    let mut chain = SecretChain::default();
    chain.push(provider.clone());

    let gets_before = store.gets();
    for _ in 0..5 {
        assert!(chain.totp_secret().is_some());
    }
    assert_eq!(store.gets(), gets_before + 1);

    let shared: Arc<dyn TotpSecretGetter> = Arc::new(chain);
    for _ in 0..3 {
        let code = authenticator
            .generate_totp(
                "team1",
                "alice",
                GenerateTotpOptions {
                    secret_getter: Some(Arc::clone(&shared)),
                    ..options()
                },
            )
            .unwrap();
        assert_eq!(code.len(), 6);
    }
    assert_eq!(store.gets(), gets_before + 1);
}

#[test]
fn test_logger_receives_lookup_failures() {
    clear_env();
    let (authenticator, _store, _temp) = test_authenticator();
    let (dispatch, captured) = capturing_dispatch();

    let result = authenticator.generate_totp(
        "team1",
        "alice",
        GenerateTotpOptions {
            logger: Some(dispatch),
            ..options()
        },
    );

    assert!(matches!(result, Err(TotpError::NoSecret)));

    let output = captured.contents();
    assert!(output.contains("could not get totp secret"));
    assert!(output.contains("DEBUG"));
    assert!(output.contains("account alice not found in namespace team1"));
}

#[test]
fn test_logger_sees_storage_errors_at_error_level() {
    clear_env();
    let (authenticator, store, _temp) = test_authenticator();
    store.fail(Op::Get, "team1/alice");
    let (dispatch, captured) = capturing_dispatch();

    let result = authenticator.generate_totp(
        "team1",
        "alice",
        GenerateTotpOptions {
            logger: Some(dispatch),
            ..options()
        },
    );

    assert!(matches!(result, Err(TotpError::NoSecret)));

    let output = captured.contents();
    assert!(output.contains("ERROR"));
    assert!(output.contains("injected Get failure for team1/alice"));
}

#[test]
fn test_default_logger_drops_events() {
    clear_env();
    let (authenticator, _store, _temp) = test_authenticator();
    let (dispatch, captured) = capturing_dispatch();

    let result = tracing::dispatcher::with_default(&dispatch, || {
        tracing::debug!("outside generation");
        authenticator.generate_totp("team1", "alice", options())
    });

    assert!(matches!(result, Err(TotpError::NoSecret)));

    let output = captured.contents();
    assert!(output.contains("outside generation"));
    assert!(!output.contains("could not get totp secret"));
}

#[test]
fn test_missing_namespace_is_logged() {
    clear_env();
    let (authenticator, _store, _temp) = test_authenticator();
    let (dispatch, captured) = capturing_dispatch();

    let result = authenticator.generate_totp(
        "",
        "alice",
        GenerateTotpOptions {
            logger: Some(dispatch),
            ..options()
        },
    );

    assert!(matches!(result, Err(TotpError::NoSecret)));
    assert!(
        captured
            .contents()
            .contains("failed to fetch totp secret due to missing namespace")
    );
}
