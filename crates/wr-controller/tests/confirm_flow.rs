mod common;

use common::{Harness, SCENARIO_ADDRESS, ScriptedWallet};
use std::time::Duration;
use tokio::time::Instant;
use wr_api_types::{ConnectionState, PayloadSchema};
use wr_controller::{ConfirmOutcome, ControllerConfig};
use wr_host_bridge::HostBridge;
use wr_host_bridge::testing::{BridgeEvent, RecordingBridge};
use wr_wallet_client::{WalletClient, WalletError};

fn harness_with_schema(schema: PayloadSchema) -> Harness {
    let harness = Harness::new(
        RecordingBridge::new(),
        ScriptedWallet::connected(SCENARIO_ADDRESS, 1),
        ControllerConfig::default().with_schema(schema),
    );
    harness.controller.init();
    harness
}

#[tokio::test(start_paused = true)]
async fn tap_sends_signed_payload_then_closes() -> anyhow::Result<()> {
    let harness = Harness::connected();

    harness.bridge().main_button().click();
    assert_eq!(harness.runtime.pending(), 1);

    let started = Instant::now();
    harness.runtime.run_all().await;
    let elapsed = started.elapsed();

    assert_eq!(
        harness.bridge().sent(),
        vec![format!(
            r#"{{"address":"{SCENARIO_ADDRESS}","chainId":"1","signature":"0xsig..."}}"#
        )]
    );
    assert_eq!(
        harness.bridge().events(),
        vec![
            BridgeEvent::Ready,
            BridgeEvent::Expand,
            BridgeEvent::SendData(harness.bridge().sent()[0].clone()),
            BridgeEvent::Close,
        ]
    );
    assert!(elapsed >= Duration::from_millis(1000), "closed after {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(1500), "closed after {elapsed:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn captions_follow_the_success_order() -> anyhow::Result<()> {
    let harness = Harness::connected();

    let outcome = harness.controller.confirm().await;

    assert_eq!(outcome, ConfirmOutcome::Completed);
    assert_eq!(
        harness.bridge().main_button().captions(),
        vec!["CONFIRM WALLET", "PROCESSING...", "SENDING...", "COMPLETED ✓"]
    );
    assert!(!harness.bridge().main_button().is_active());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn attestation_names_address_and_chain() -> anyhow::Result<()> {
    let harness = Harness::connected();

    harness.controller.confirm().await;

    let messages = harness.wallet.signed_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains(SCENARIO_ADDRESS));
    assert!(messages[0].contains("Chain ID: 1"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn double_tap_submits_once() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.set_sign_latency(Duration::from_millis(300));

    harness.bridge().main_button().click();
    harness.bridge().main_button().click();

    let mut tasks = harness.runtime.take();
    assert_eq!(tasks.len(), 2);
    let second = tasks.pop().expect("second tap");
    let first = tasks.pop().expect("first tap");
    tokio::join!(first, second);

    assert_eq!(harness.wallet.signed_messages().len(), 1);
    assert_eq!(harness.bridge().sent().len(), 1);
    assert_eq!(harness.bridge().close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn confirm_is_skipped_while_in_flight() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.set_sign_latency(Duration::from_millis(300));

    let (first, second) = tokio::join!(harness.controller.confirm(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(harness.controller.is_processing());
        harness.controller.confirm().await
    });

    assert_eq!(first, ConfirmOutcome::Completed);
    assert_eq!(second, ConfirmOutcome::Skipped);
    assert_eq!(harness.bridge().sent().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn signature_failure_restores_confirm_caption() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.push_signature(Err(WalletError::Rejected));

    let started = Instant::now();
    let outcome = harness.controller.confirm().await;

    assert_eq!(outcome, ConfirmOutcome::SignatureFailed);
    assert!(started.elapsed() >= harness.controller.config().restore_delay);
    assert_eq!(
        harness.bridge().main_button().captions(),
        vec!["CONFIRM WALLET", "PROCESSING...", "SIGNATURE FAILED", "CONFIRM WALLET"]
    );
    assert!(!harness.controller.is_processing());
    assert!(harness.bridge().main_button().is_active());
    assert!(harness.controller.snapshot().is_connected);
    assert!(harness.wallet.state().is_connected);
    assert!(harness.bridge().sent().is_empty());
    assert_eq!(harness.bridge().close_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retry_after_signature_failure_completes() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness
        .wallet
        .push_signature(Err(WalletError::Provider {
            code: -32603,
            message: "internal".to_owned(),
        }));

    assert_eq!(harness.controller.confirm().await, ConfirmOutcome::SignatureFailed);

    harness.bridge().main_button().click();
    harness.runtime.run_all().await;

    assert_eq!(harness.bridge().sent().len(), 1);
    assert_eq!(harness.bridge().close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn send_failure_keeps_view_open_for_retry() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.bridge().fail("sendData");

    let outcome = harness.controller.confirm().await;

    assert_eq!(outcome, ConfirmOutcome::SendFailed);
    assert!(!harness.controller.is_processing());
    assert!(harness.bridge().main_button().is_active());
    assert_eq!(harness.bridge().main_button().text(), "ERROR SENDING");
    assert_eq!(harness.bridge().close_count(), 0);

    harness.bridge().recover("sendData");
    assert_eq!(harness.controller.confirm().await, ConfirmOutcome::Completed);
    assert_eq!(harness.bridge().sent().len(), 1);
    assert_eq!(harness.bridge().close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unsigned_schema_skips_signing() -> anyhow::Result<()> {
    let harness = harness_with_schema(PayloadSchema::Unsigned);

    assert_eq!(harness.controller.confirm().await, ConfirmOutcome::Completed);

    assert!(harness.wallet.signed_messages().is_empty());
    assert_eq!(
        harness.bridge().sent(),
        vec![format!(r#"{{"address":"{SCENARIO_ADDRESS}","chainId":"1"}}"#)]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn legacy_schema_sends_type_tag() -> anyhow::Result<()> {
    let harness = harness_with_schema(PayloadSchema::Legacy);

    assert_eq!(harness.controller.confirm().await, ConfirmOutcome::Completed);

    assert!(harness.wallet.signed_messages().is_empty());
    assert_eq!(
        harness.bridge().sent(),
        vec![format!(r#"{{"type":"wallet_connected","address":"{SCENARIO_ADDRESS}"}}"#)]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn confirm_without_connection_does_nothing() -> anyhow::Result<()> {
    let harness = Harness::new(
        RecordingBridge::new(),
        ScriptedWallet::default(),
        ControllerConfig::default(),
    );
    harness.controller.init();
    let before = harness.bridge().button_events();

    assert_eq!(harness.controller.confirm().await, ConfirmOutcome::NotConnected);

    assert_eq!(harness.bridge().button_events(), before);
    assert!(!harness.controller.is_processing());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn state_change_mid_flight_keeps_button_locked() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.set_sign_latency(Duration::from_millis(300));
    let bound = harness.bridge().main_button().bound_handlers();

    tokio::join!(harness.controller.confirm(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        harness
            .controller
            .sync(ConnectionState::connected(SCENARIO_ADDRESS, 11_155_111));

        let button = harness.bridge().main_button();
        assert!(!button.is_active());
        assert_eq!(button.text(), "PROCESSING...");
        assert_eq!(button.bound_handlers(), bound);
    });

    assert_eq!(harness.bridge().sent().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn disconnect_mid_flight_hides_button() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.set_sign_latency(Duration::from_millis(300));
    harness.wallet.push_signature(Err(WalletError::Rejected));

    let (outcome, _) = tokio::join!(harness.controller.confirm(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        harness.controller.disconnect().await;
    });

    assert_eq!(outcome, ConfirmOutcome::SignatureFailed);
    let button = harness.bridge().main_button();
    assert!(!button.is_visible());
    assert!(button.bound_handlers().is_empty());
    assert_eq!(button.text(), "SIGNATURE FAILED");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reconnect_mid_flight_rebinds_after_signature_failure() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.set_sign_latency(Duration::from_millis(300));
    harness.wallet.push_signature(Err(WalletError::Rejected));

    let (outcome, _) = tokio::join!(harness.controller.confirm(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        harness.controller.sync(ConnectionState::disconnected());
        tokio::time::sleep(Duration::from_millis(10)).await;
        harness
            .controller
            .sync(ConnectionState::connected(SCENARIO_ADDRESS, 1));
    });

    assert_eq!(outcome, ConfirmOutcome::SignatureFailed);
    assert!(!harness.controller.is_processing());
    let button = harness.bridge().main_button();
    assert!(button.is_visible());
    assert!(button.is_active());
    assert_eq!(button.bound_handlers().len(), 1);
    assert_eq!(button.text(), "CONFIRM WALLET");

    button.click();
    harness.runtime.run_all().await;
    assert_eq!(harness.bridge().sent().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reconnect_mid_flight_rebinds_after_send_failure() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.set_sign_latency(Duration::from_millis(300));
    harness.bridge().fail("sendData");

    let (outcome, _) = tokio::join!(harness.controller.confirm(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        harness.controller.sync(ConnectionState::disconnected());
        tokio::time::sleep(Duration::from_millis(10)).await;
        harness
            .controller
            .sync(ConnectionState::connected(SCENARIO_ADDRESS, 1));
    });

    assert_eq!(outcome, ConfirmOutcome::SendFailed);
    let button = harness.bridge().main_button();
    assert!(button.is_visible());
    assert!(button.is_active());
    assert_eq!(button.bound_handlers().len(), 1);
    assert_eq!(button.text(), "ERROR SENDING");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn earlier_restore_timer_leaves_newer_failure_caption() -> anyhow::Result<()> {
    let harness = Harness::connected();
    harness.wallet.push_signature(Err(WalletError::Rejected));
    harness.wallet.push_signature(Err(WalletError::Rejected));

    let (first, second, _) = tokio::join!(
        harness.controller.confirm(),
        async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            harness.controller.confirm().await
        },
        async {
            // The first attempt's timer has fired; the second one's has not.
            tokio::time::sleep(Duration::from_millis(2100)).await;
            assert_eq!(harness.bridge().main_button().text(), "SIGNATURE FAILED");
        }
    );

    assert_eq!(first, ConfirmOutcome::SignatureFailed);
    assert_eq!(second, ConfirmOutcome::SignatureFailed);
    assert_eq!(
        harness.bridge().main_button().captions(),
        vec![
            "CONFIRM WALLET",
            "PROCESSING...",
            "SIGNATURE FAILED",
            "PROCESSING...",
            "SIGNATURE FAILED",
            "CONFIRM WALLET",
        ]
    );
    Ok(())
}
