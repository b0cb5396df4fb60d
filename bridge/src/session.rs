use tether_core::names;
use tether_dispatch::{Listenable, Listener, ListenerId};

use crate::{BridgeError, object::Object};

/// A browser session living in the GUI process.
pub struct Session {
    object: Object,
}

impl Session {
    pub(crate) fn new(object: Object) -> Self {
        Self { object }
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Clear the session's HTTP cache.
    pub async fn clear_cache(&self) -> Result<(), BridgeError> {
        let event = self.object.event(names::session::CMD_CLEAR_CACHE);
        self.object
            .call(event, names::session::EVENT_CLEARED_CACHE)
            .await?;
        Ok(())
    }
}

impl Listenable for Session {
    fn on_listener(&self, event_name: &str, listener: Listener) -> ListenerId {
        self.object.on_listener(event_name, listener)
    }

    fn off(&self, event_name: &str, id: ListenerId) -> bool {
        self.object.off(event_name, id)
    }
}
