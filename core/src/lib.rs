pub mod event;
pub mod id;
pub mod names;

pub use event::{
    DisplayOptions, Event, EventDisplays, GlobalShortcutsPayload, NotificationOptions,
    RectangleOptions, SizeOptions, Supported,
};
pub use id::{Identifier, ObjectId};
