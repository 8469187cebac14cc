//! `lumen run` - connect and keep the presence alive
//!
//! Loads the saved config, connects a session, and waits for Ctrl-C or for
//! the session to drop. The config is saved on the way out either way.

use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::warn;

use lumen_core::{
    AssetStore, Config, ConfigStore, PresenceDocument, SessionController, SessionState,
    SharedDocument,
};

use crate::log_transport::LogTransport;

/// Why the run loop stopped waiting
#[derive(Debug)]
enum StopReason {
    Interrupted,
    SessionEnded,
    SignalUnavailable(io::Error),
}

/// Run the presence session until interrupted.
pub async fn run(app_id: Option<String>) -> Result<()> {
    let store = ConfigStore::default_location();
    let mut config = store.load().context("failed to load config")?;
    if let Some(app_id) = app_id {
        config.application_id = app_id;
    }

    warn_unknown_images(&config.presence);

    let document = config.presence.clone().shared();
    let mut session = SessionController::new(Arc::new(LogTransport));

    if let Err(e) = session
        .connect(&config.application_id, document.clone())
        .await
    {
        save_config(&store, &config);
        return Err(e).context("failed to start presence session");
    }

    print_banner(&session, &config);

    let mut states = session.subscribe();
    match wait_for_stop(tokio::signal::ctrl_c(), &mut states).await {
        StopReason::Interrupted => println!("\n  Shutting down..."),
        StopReason::SessionEnded => {
            println!("\n  Presence session ended: {}", session.current_state())
        }
        StopReason::SignalUnavailable(e) => {
            warn!(error = %e, "Failed to listen for ctrl+c");
            eprintln!("\n  Failed to listen for ctrl+c: {}, shutting down", e);
        }
    }

    shutdown(&mut session, &store, &mut config, &document).await;
    Ok(())
}

/// Wait for the shutdown signal or for the session to leave `Connected`
async fn wait_for_stop(
    signal: impl Future<Output = io::Result<()>>,
    states: &mut watch::Receiver<SessionState>,
) -> StopReason {
    tokio::select! {
        result = signal => match result {
            Ok(()) => StopReason::Interrupted,
            Err(e) => StopReason::SignalUnavailable(e),
        },
        _ = states.wait_for(|s| *s != SessionState::Connected) => StopReason::SessionEnded,
    }
}

/// Disconnect, then save the config with the live document written back
async fn shutdown(
    session: &mut SessionController,
    store: &ConfigStore,
    config: &mut Config,
    document: &SharedDocument,
) {
    session.disconnect().await;
    config.presence = document.read().clone();
    save_config(store, config);
}

fn save_config(store: &ConfigStore, config: &Config) {
    if let Err(e) = store.save(config) {
        warn!(error = %e, "Failed to save config");
        eprintln!("  Failed to save config: {}", e);
    }
}

/// Image keys are asset names; point out ones the local catalog doesn't know
fn warn_unknown_images(presence: &PresenceDocument) {
    let assets = match AssetStore::open_default() {
        Ok(assets) => assets,
        Err(e) => {
            warn!(error = %e, "Could not read asset catalog");
            return;
        }
    };

    for key in presence.image_keys() {
        if assets.find(&key).is_none() {
            warn!(key = %key, "Presence image has no local asset");
            println!("  Note: no local asset named '{}'", key);
        }
    }
}

fn print_banner(session: &SessionController, config: &Config) {
    println!();
    println!("  \x1b[1;36mLumen\x1b[0m presence running");
    println!("  ─────────────────────────────────────");
    println!("  Application: {}", session.application_id().unwrap_or("-"));
    if !config.display_name.trim().is_empty() {
        println!("  Profile:     {}", config.display_name.trim());
    }
    println!("  Press Ctrl-C to stop.\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_signal_failure_still_shuts_down_and_saves() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let mut config = Config {
            application_id: "42".to_string(),
            ..Default::default()
        };
        let document = config.presence.clone().shared();
        let mut session = SessionController::new(Arc::new(LogTransport));
        session.connect("42", document.clone()).await.unwrap();
        assert_eq!(session.application_id(), Some("42"));

        document.write().details = Some("Edited while running".to_string());

        let mut states = session.subscribe();
        let failing = async { Err(io::Error::other("no signal handler")) };
        let reason = wait_for_stop(failing, &mut states).await;
        assert!(matches!(reason, StopReason::SignalUnavailable(_)));

        shutdown(&mut session, &store, &mut config, &document).await;
        assert_eq!(session.current_state(), SessionState::Disconnected);

        let saved = store.load().unwrap();
        assert_eq!(saved.application_id, "42");
        assert_eq!(
            saved.presence.details.as_deref(),
            Some("Edited while running")
        );
    }

    #[tokio::test]
    async fn test_interrupt_signal_stops_waiting() {
        let (_tx, mut states) = watch::channel(SessionState::Connected);
        let reason = wait_for_stop(async { Ok(()) }, &mut states).await;
        assert!(matches!(reason, StopReason::Interrupted));
    }

    #[tokio::test]
    async fn test_session_drop_stops_waiting() {
        let (tx, mut states) = watch::channel(SessionState::Connected);
        tx.send_replace(SessionState::Disconnected);
        let reason = wait_for_stop(std::future::pending::<io::Result<()>>(), &mut states).await;
        assert!(matches!(reason, StopReason::SessionEnded));
    }
}
