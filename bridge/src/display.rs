use std::sync::{Mutex, MutexGuard, PoisonError};

use tether_core::{DisplayOptions, EventDisplays, RectangleOptions, SizeOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl From<SizeOptions> for Size {
    fn from(options: SizeOptions) -> Self {
        Self {
            width: options.width.unwrap_or_default(),
            height: options.height.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub size: Size,
}

impl From<RectangleOptions> for Rectangle {
    fn from(options: RectangleOptions) -> Self {
        Self {
            x: options.x.unwrap_or_default(),
            y: options.y.unwrap_or_default(),
            size: Size {
                width: options.width.unwrap_or_default(),
                height: options.height.unwrap_or_default(),
            },
        }
    }
}

/// A screen attached to the machine the GUI process runs on, as last
/// reported by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    options: DisplayOptions,
    primary: bool,
}

impl Display {
    pub fn new(options: DisplayOptions, primary: bool) -> Self {
        Self { options, primary }
    }

    pub fn id(&self) -> i64 {
        self.options.id.unwrap_or_default()
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn bounds(&self) -> Rectangle {
        self.options.bounds.map(Rectangle::from).unwrap_or_default()
    }

    pub fn work_area(&self) -> Rectangle {
        self.options.work_area.map(Rectangle::from).unwrap_or_default()
    }

    pub fn size(&self) -> Size {
        self.options.size.map(Size::from).unwrap_or_default()
    }

    pub fn work_area_size(&self) -> Size {
        self.options.work_area_size.map(Size::from).unwrap_or_default()
    }

    /// Clockwise rotation in degrees: 0, 90, 180 or 270.
    pub fn rotation(&self) -> i32 {
        self.options.rotation.unwrap_or_default()
    }

    pub fn scale_factor(&self) -> f64 {
        self.options.scale_factor.unwrap_or(1.0)
    }

    pub fn is_touch_available(&self) -> bool {
        self.options.touch_support.as_deref() == Some("available")
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }
}

/// The current set of displays, replaced wholesale by every display event.
#[derive(Default)]
pub(crate) struct DisplayPool(Mutex<Vec<Display>>);

impl DisplayPool {
    fn lock(&self) -> MutexGuard<'_, Vec<Display>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Displays missing from `displays` are dropped, new ones are added and
    /// the rest take the reported options.
    pub(crate) fn update(&self, displays: &EventDisplays) {
        let primary = displays.primary.as_ref().and_then(|primary| primary.id);
        let updated: Vec<_> = displays
            .all
            .iter()
            .map(|options| {
                let is_primary = primary.is_some() && options.id == primary;
                Display::new(options.clone(), is_primary)
            })
            .collect();

        tracing::debug!("{} display(s), primary {primary:?}", updated.len());
        *self.lock() = updated;
    }

    pub(crate) fn all(&self) -> Vec<Display> {
        self.lock().clone()
    }

    pub(crate) fn primary(&self) -> Option<Display> {
        self.lock().iter().find(|display| display.is_primary()).cloned()
    }
}
