//! Registering the application as the OS handler for a URL scheme.

use tether_core::{Event, names::app};

use crate::{
    Bridge, BridgeError,
    call::{synchronous_event, with_timeout},
};

impl Bridge {
    /// Returns whether the OS accepted the change.
    pub async fn set_as_default_protocol_client(
        &self,
        protocol: &str,
        path: Option<&str>,
        args: &[String],
    ) -> Result<bool, BridgeError> {
        self.protocol_client(
            protocol_event(app::CMD_SET_AS_DEFAULT_PROTOCOL_CLIENT, protocol, path, args),
            app::EVENT_SET_AS_DEFAULT_PROTOCOL_CLIENT,
        )
        .await
    }

    pub async fn remove_as_default_protocol_client(
        &self,
        protocol: &str,
        path: Option<&str>,
        args: &[String],
    ) -> Result<bool, BridgeError> {
        self.protocol_client(
            protocol_event(app::CMD_REMOVE_AS_DEFAULT_PROTOCOL_CLIENT, protocol, path, args),
            app::EVENT_REMOVE_AS_DEFAULT_PROTOCOL_CLIENT,
        )
        .await
    }

    pub async fn is_default_protocol_client(
        &self,
        protocol: &str,
        path: Option<&str>,
        args: &[String],
    ) -> Result<bool, BridgeError> {
        self.protocol_client(
            protocol_event(app::CMD_IS_DEFAULT_PROTOCOL_CLIENT, protocol, path, args),
            app::EVENT_IS_DEFAULT_PROTOCOL_CLIENT,
        )
        .await
    }

    async fn protocol_client(&self, event: Event, done_event: &str) -> Result<bool, BridgeError> {
        if self.is_stopped() {
            return Err(BridgeError::Stopped);
        }

        let call = synchronous_event(self.scope(), self, self.writer(), &event, done_event);
        let reply = with_timeout(self.options().call_timeout, done_event, call).await?;
        Ok(reply.success.unwrap_or(false))
    }
}

fn protocol_event(name: &str, protocol: &str, path: Option<&str>, args: &[String]) -> Event {
    let mut event = Event::new(name);
    event.protocol = Some(protocol.to_owned());
    event.path = path.filter(|path| !path.is_empty()).map(str::to_owned);
    if !args.is_empty() {
        event.args = Some(args.to_vec());
    }
    event
}
