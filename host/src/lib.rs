use anyhow::Context;
use tether_bridge::{Bridge, Options};
use tether_core::names::{app, power};
use tether_dispatch::{Listenable, Retain};

pub mod args;

pub use crate::args::{Args, BindAddress};

/// Process-scoped events worth a line in the log.
const NOTABLE_EVENTS: &[&str] = &[
    app::CLOSE,
    app::CRASH,
    app::ERROR_ACCEPT,
    app::ERROR_READ,
    app::EVENT_SECOND_INSTANCE,
    app::NO_ACCEPT,
    app::TOO_MANY_ACCEPT,
    power::SUSPEND,
    power::RESUME,
    power::ON_AC,
    power::ON_BATTERY,
    power::SHUTDOWN,
    power::LOCK_SCREEN,
    power::UNLOCK_SCREEN,
    power::USER_DID_BECOME_ACTIVE,
    power::USER_DID_RESIGN_ACTIVE,
];

/// Run a bridge until the GUI process goes away or we are interrupted.
///
/// The listen address is printed on stdout, one line, for whoever spawns the
/// GUI process.
pub async fn run(options: Options) -> anyhow::Result<()> {
    let bridge = Bridge::new(options);
    log_events(&bridge);

    let addr = bridge.start().await.context("failed to start bridge")?;
    println!("{addr}");

    tokio::select! {
        ready = bridge.wait_ready() => match ready {
            Ok(supported) => tracing::info!("GUI process ready, supported: {supported:?}"),
            Err(error) => tracing::warn!("GUI process never became ready: {error}"),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted before the GUI process was ready");
            bridge.close().await;
            return Ok(());
        }
    }

    tokio::select! {
        _ = bridge.wait() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, asking the GUI process to quit");
            if let Err(error) = bridge.quit().await {
                tracing::warn!("{error}");
            }
        }
    }

    bridge.close().await;
    Ok(())
}

fn log_events(bridge: &Bridge) {
    for &name in NOTABLE_EVENTS {
        bridge.on(name, |event| {
            match &event.message {
                Some(message) => tracing::info!("{}: {message}", event.name),
                None => tracing::info!("{}", event.name),
            }
            Retain::Keep
        });
    }
}
