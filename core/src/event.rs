use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::ObjectId;

/// A single message exchanged with the GUI process.
///
/// Only `name` is mandatory. Every other field is populated for the event
/// families that use it and left absent on the wire otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    #[serde(
        default,
        rename = "targetID",
        alias = "targetId",
        skip_serializing_if = "ObjectId::is_app"
    )]
    pub target_id: ObjectId,

    #[serde(
        default,
        rename = "callbackID",
        alias = "callbackId",
        skip_serializing_if = "Option::is_none"
    )]
    pub callback_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_shortcuts: Option<GlobalShortcutsPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported: Option<Supported>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displays: Option<EventDisplays>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_options: Option<NotificationOptions>,
    /// What the user typed into a notification's reply box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,

    /// Payload fields this crate does not model (window options, menus,
    /// trays, ...). They are kept verbatim so collaborators can read and
    /// send them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// A process-scoped event.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An event addressed to a remote object.
    pub fn for_target(name: impl Into<String>, target_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            target_id,
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Serialize) -> Result<Self, serde_json::Error> {
        self.message = Some(serde_json::to_value(message)?);
        Ok(self)
    }

    /// Decode the `message` payload, if any, into `T`.
    pub fn message_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.message
            .as_ref()
            .map(|message| T::deserialize(message))
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalShortcutsPayload {
    pub accelerator: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_registered: bool,
}

impl GlobalShortcutsPayload {
    pub fn new(accelerator: impl Into<String>) -> Self {
        Self {
            accelerator: accelerator.into(),
            is_registered: false,
        }
    }
}

/// Features the GUI process reports as available when it becomes ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supported {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<bool>,
}

/// Every display the GUI process knows about, sent with the ready event and
/// whenever a display is added, removed or changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDisplays {
    #[serde(default)]
    pub all: Vec<DisplayOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<DisplayOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<RectangleOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeOptions>,
    /// `available`, `unavailable` or `unknown`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touch_support: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_area: Option<RectangleOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_area_size: Option<SizeOptions>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectangleOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
}

/// How a desktop notification looks and behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_reply: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reply_placeholder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sound: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}
