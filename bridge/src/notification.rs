use tether_core::{NotificationOptions, names::notification};
use tether_dispatch::{Listenable, Listener, ListenerId};

use crate::{BridgeError, object::Object};

/// A desktop notification shown by the GUI process.
///
/// When the GUI process did not report notifications as supported,
/// [`Notification::create`] and [`Notification::show`] do nothing.
pub struct Notification {
    object: Object,
    options: NotificationOptions,
    supported: bool,
}

impl Notification {
    pub(crate) fn new(object: Object, options: NotificationOptions, supported: bool) -> Self {
        Self {
            object,
            options,
            supported,
        }
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn options(&self) -> &NotificationOptions {
        &self.options
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Create the notification in the GUI process without showing it.
    pub async fn create(&self) -> Result<(), BridgeError> {
        if !self.supported {
            tracing::debug!("notifications are not supported, skipping create");
            return Ok(());
        }

        let mut event = self.object.event(notification::CMD_CREATE);
        event.notification_options = Some(self.options.clone());
        self.object.call(event, notification::EVENT_CREATED).await?;
        Ok(())
    }

    pub async fn show(&self) -> Result<(), BridgeError> {
        if !self.supported {
            tracing::debug!("notifications are not supported, skipping show");
            return Ok(());
        }

        let event = self.object.event(notification::CMD_SHOW);
        self.object.call(event, notification::EVENT_SHOWN).await?;
        Ok(())
    }
}

impl Listenable for Notification {
    fn on_listener(&self, event_name: &str, listener: Listener) -> ListenerId {
        self.object.on_listener(event_name, listener)
    }

    fn off(&self, event_name: &str, id: ListenerId) -> bool {
        self.object.off(event_name, id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tether_dispatch::Retain;
    use tokio::sync::mpsc;

    use super::*;
    use crate::testing::connected;

    fn options() -> NotificationOptions {
        NotificationOptions {
            body: "body".into(),
            has_reply: Some(true),
            icon: "/path/to/icon".into(),
            reply_placeholder: "placeholder".into(),
            silent: Some(true),
            sound: "sound".into(),
            subtitle: "subtitle".into(),
            title: "title".into(),
        }
    }

    #[tokio::test]
    async fn test_create_then_show() {
        let (link, mut peer) = connected(None).await;
        let notification = Notification::new(Object::new(&link), options(), true);

        let (result, command) = tokio::join!(
            notification.create(),
            peer.reply(notification::EVENT_CREATED),
        );
        result.unwrap();
        assert_eq!(command.name, notification::CMD_CREATE);
        assert_eq!(command.target_id, *notification.object().id());
        assert_eq!(command.notification_options, Some(options()));

        let (result, command) =
            tokio::join!(notification.show(), peer.reply(notification::EVENT_SHOWN));
        result.unwrap();
        assert_eq!(command.name, notification::CMD_SHOW);
        assert!(command.notification_options.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_sends_nothing() {
        let (link, mut peer) = connected(None).await;
        let notification = Notification::new(Object::new(&link), options(), false);

        notification.create().await.unwrap();
        notification.show().await.unwrap();
        assert!(peer.try_recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reply_reaches_listener() {
        let (link, mut peer) = connected(None).await;
        let notification = Notification::new(Object::new(&link), options(), true);
        let (tx, mut rx) = mpsc::unbounded_channel();
        notification.on(notification::EVENT_REPLIED, move |event| {
            let _ = tx.send(event.reply.clone());
            Retain::Keep
        });

        let mut replied = notification.object().event(notification::EVENT_REPLIED);
        replied.reply = Some("on my way".into());
        peer.send(&replied).await;

        let reply = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.as_deref(), Some("on my way"));
    }
}
