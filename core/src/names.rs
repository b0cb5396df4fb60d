//! Event names understood by the bridge.
//!
//! Commands sent to the GUI process follow `<domain>.cmd.<action>`; replies
//! and notifications coming back follow `<domain>.event.<outcome>`.

pub mod app {
    pub const CLOSE: &str = "app.close";
    pub const CMD_QUIT: &str = "app.cmd.quit";
    pub const CMD_STOP: &str = "app.cmd.stop";
    pub const CRASH: &str = "app.crash";
    pub const ERROR_ACCEPT: &str = "app.error.accept";
    pub const ERROR_READ: &str = "app.error.read";
    pub const EVENT_READY: &str = "app.event.ready";
    pub const EVENT_SECOND_INSTANCE: &str = "app.event.second.instance";
    pub const NO_ACCEPT: &str = "app.no.accept";
    pub const TOO_MANY_ACCEPT: &str = "app.too.many.accept";

    pub const CMD_SET_AS_DEFAULT_PROTOCOL_CLIENT: &str = "app.cmd.setas.default.protocol.client";
    pub const EVENT_SET_AS_DEFAULT_PROTOCOL_CLIENT: &str =
        "app.event.setas.default.protocol.client";
    pub const CMD_REMOVE_AS_DEFAULT_PROTOCOL_CLIENT: &str =
        "app.cmd.removeas.default.protocol.client";
    pub const EVENT_REMOVE_AS_DEFAULT_PROTOCOL_CLIENT: &str =
        "app.event.removeas.default.protocol.client";
    pub const CMD_IS_DEFAULT_PROTOCOL_CLIENT: &str = "app.cmd.is.default.protocol.client";
    pub const EVENT_IS_DEFAULT_PROTOCOL_CLIENT: &str = "app.event.is.default.protocol.client";
}

pub mod session {
    pub const CMD_CLEAR_CACHE: &str = "session.cmd.clear.cache";
    pub const EVENT_CLEARED_CACHE: &str = "session.event.cleared.cache";
    pub const EVENT_WILL_DOWNLOAD: &str = "session.event.will.download";
}

pub mod global_shortcuts {
    pub const CMD_REGISTER: &str = "global.shortcuts.cmd.register";
    pub const CMD_IS_REGISTERED: &str = "global.shortcuts.cmd.is.register";
    pub const CMD_UNREGISTER: &str = "global.shortcuts.cmd.unregister";
    pub const CMD_UNREGISTER_ALL: &str = "global.shortcuts.cmd.unregister.all";
    pub const EVENT_REGISTERED: &str = "global.shortcuts.event.registered";
    pub const EVENT_IS_REGISTERED: &str = "global.shortcuts.event.is.registered";
    pub const EVENT_UNREGISTERED: &str = "global.shortcuts.event.unregistered";
    pub const EVENT_UNREGISTERED_ALL: &str = "global.shortcuts.event.unregistered.all";
    pub const EVENT_TRIGGERED: &str = "global.shortcuts.event.triggered";
}

pub mod display {
    pub const EVENT_ADDED: &str = "display.event.added";
    pub const EVENT_METRICS_CHANGED: &str = "display.event.metrics.changed";
    pub const EVENT_REMOVED: &str = "display.event.removed";
}

pub mod notification {
    pub const CMD_CREATE: &str = "notification.cmd.create";
    pub const CMD_SHOW: &str = "notification.cmd.show";
    pub const EVENT_CLICKED: &str = "notification.event.clicked";
    pub const EVENT_CLOSED: &str = "notification.event.closed";
    pub const EVENT_CREATED: &str = "notification.event.created";
    pub const EVENT_REPLIED: &str = "notification.event.replied";
    pub const EVENT_SHOWN: &str = "notification.event.shown";
}

pub mod power {
    pub const SUSPEND: &str = "power.event.suspend";
    pub const RESUME: &str = "power.event.resume";
    pub const ON_AC: &str = "power.event.on.ac";
    pub const ON_BATTERY: &str = "power.event.on.battery";
    pub const SHUTDOWN: &str = "power.event.shutdown";
    pub const LOCK_SCREEN: &str = "power.event.lock.screen";
    pub const UNLOCK_SCREEN: &str = "power.event.unlock.screen";
    pub const USER_DID_BECOME_ACTIVE: &str = "power.event.user.did.become.active";
    pub const USER_DID_RESIGN_ACTIVE: &str = "power.event.user.did.resign.active";
}
