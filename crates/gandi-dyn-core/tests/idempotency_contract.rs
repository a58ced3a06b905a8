//! Contract Test: Idempotency Across Runs
//!
//! Constraints verified:
//! - Running twice without an IP change creates no version on the second run
//! - After an update, a second run with the same IP is a no-op
//! - The previously-active version is kept after a successful swap

mod common;

use common::*;
use gandi_dyn_core::Outcome;
use gandi_dyn_core::traits::ZoneVersion;
use std::net::Ipv4Addr;

#[tokio::test]
async fn two_runs_without_ip_change_are_both_unchanged() {
    let ip = Ipv4Addr::new(1, 2, 3, 4);
    let registrar = ScriptedRegistrar::with_records(vec![record("1001", "A", "@", "1.2.3.4")]);
    let updater = updater(ip, &registrar);

    assert_eq!(updater.run(DOMAIN).await.unwrap(), Outcome::Unchanged { ip });
    assert_eq!(updater.run(DOMAIN).await.unwrap(), Outcome::Unchanged { ip });

    assert!(registrar.mutating_calls().is_empty());
    assert_eq!(registrar.version_count(), 1);
}

#[tokio::test]
async fn second_run_after_update_is_a_no_op() {
    let ip = Ipv4Addr::new(5, 6, 7, 8);
    let registrar = ScriptedRegistrar::with_records(vec![record("1001", "A", "@", "1.2.3.4")]);
    let updater = updater(ip, &registrar);

    let first = updater.run(DOMAIN).await.unwrap();
    assert!(matches!(first, Outcome::Changed { version: ZoneVersion(7), .. }));
    let calls_after_first = registrar.mutating_calls().len();

    let second = updater.run(DOMAIN).await.unwrap();
    assert_eq!(second, Outcome::Unchanged { ip });
    assert_eq!(registrar.mutating_calls().len(), calls_after_first);

    let clones = registrar
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::CloneVersion))
        .count();
    assert_eq!(clones, 1);
}

#[tokio::test]
async fn previous_version_is_kept_after_swap() {
    let registrar = ScriptedRegistrar::with_records(vec![record("1001", "A", "@", "1.2.3.4")]);

    updater(Ipv4Addr::new(5, 6, 7, 8), &registrar)
        .run(DOMAIN)
        .await
        .unwrap();

    assert_eq!(registrar.active_version(), ZoneVersion(7));
    assert_eq!(registrar.version_count(), 2);
    assert!(
        !registrar
            .calls()
            .iter()
            .any(|c| matches!(c, Call::DeleteVersion(_)))
    );
}
