use crate::core::geo::{LatLng, Point};
use crate::core::state::ChartState;

/// A point of interest with an optional popup text
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: String,
    position: LatLng,
    popup_text: Option<String>,
}

impl Marker {
    pub fn new(id: impl Into<String>, position: LatLng) -> Self {
        Self {
            id: id.into(),
            position,
            popup_text: None,
        }
    }

    pub fn with_popup(mut self, text: impl Into<String>) -> Self {
        self.popup_text = Some(text.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.position = position;
    }

    pub fn popup_text(&self) -> Option<&str> {
        self.popup_text.as_deref()
    }
}

/// An item drawn at a viewport pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedMarker<'a, T> {
    pub item: &'a T,
    /// Viewport pixel of the item's anchor
    pub position: Point,
}

/// Places `items` in viewport space for the current chart state.
///
/// The world repeats horizontally, so a single item shows up once per world
/// copy that crosses the viewport. Items whose anchor lies outside the
/// viewport are left out.
pub fn place_markers<'a, T, F>(
    state: &ChartState,
    items: &'a [T],
    position_of: F,
) -> Vec<PlacedMarker<'a, T>>
where
    F: Fn(&T) -> LatLng,
{
    let frame = state.frame();
    let width = frame.inputs.viewport_size.width as f64;
    let height = frame.inputs.viewport_size.height as f64;
    let map_width = frame.map_size.0 as f64;

    let mut placed = Vec::new();
    for item in items {
        let anchor = frame.world_to_viewport(state.pixel_coords(position_of(item)));
        if anchor.y < 0.0 || anchor.y >= height {
            continue;
        }

        let mut x = anchor.x;
        while x < width {
            placed.push(PlacedMarker {
                item,
                position: Point::new(x, anchor.y),
            });
            x += map_width;
        }
    }
    placed
}

/// [`place_markers`] for [`Marker`]s
pub fn place<'a>(state: &ChartState, markers: &'a [Marker]) -> Vec<PlacedMarker<'a, Marker>> {
    place_markers(state, markers, Marker::position)
}
