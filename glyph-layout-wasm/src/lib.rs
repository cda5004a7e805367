//! Browser bindings. A page parses a session, hands over boundary records
//! (fetched however it likes), then calls [`LayoutHandle::frame`] from
//! `requestAnimationFrame` and the pointer methods from mouse events.

use std::str::FromStr;

use glyph_layout::{
    Config, Controller, Point, StepStatus,
    textual::{InMemory, Session, Setting, parse_polygon},
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(s: &str);
}

/// A session being laid out.
#[wasm_bindgen]
pub struct LayoutHandle {
    session: Session,
    source: InMemory,
    controller: Option<Controller>,
}

#[wasm_bindgen]
impl LayoutHandle {
    /// Parse a session file. Boundaries must be added before [`LayoutHandle::start`].
    #[wasm_bindgen(constructor)]
    pub fn new(session_text: &str) -> Result<LayoutHandle, JsError> {
        Ok(Self {
            session: Session::from_str(session_text)?,
            source: InMemory::default(),
            controller: None,
        })
    }

    /// Add the boundary record for the ordered glyph pair `first`, `second`.
    pub fn add_pair(&mut self, first: &str, second: &str, record: &str) -> Result<(), JsError> {
        self.source.insert_pair(first, second, parse_polygon(record)?);
        Ok(())
    }

    /// Add the record keeping `glyph` inside the session's container.
    pub fn add_container(&mut self, glyph: &str, record: &str) -> Result<(), JsError> {
        let container = self
            .session
            .settings
            .iter()
            .rev()
            .find_map(|s| match s {
                Setting::Container(label) => Some(label.as_str().to_owned()),
                _ => None,
            })
            .ok_or_else(|| JsError::new("this session has no container"))?;
        self.source
            .insert_container(&container, glyph, parse_polygon(record)?);
        Ok(())
    }

    /// Build the energy from the added boundaries and start laying out.
    pub fn start(&mut self) -> Result<(), JsError> {
        let loaded = self.session.load(&mut self.source)?;
        self.controller = Some(loaded.into_controller(Config::default())?);
        Ok(())
    }

    /// Grab the shape nearest to this point. Returns its index, or -1.
    pub fn select(&mut self, x: f64, y: f64) -> i32 {
        self.controller
            .as_mut()
            .and_then(|c| c.select(Point::new(x, y)))
            .map_or(-1, |id| id as i32)
    }

    /// Move the grabbed shape here.
    pub fn drag(&mut self, x: f64, y: f64) {
        if let Some(c) = self.controller.as_mut() {
            c.drag(Point::new(x, y));
        }
    }

    /// Let go of the grabbed shape.
    pub fn release(&mut self) {
        if let Some(c) = self.controller.as_mut() {
            c.release();
        }
    }

    /// Run one frame's worth of optimizer steps.
    /// Returns `"stepped"`, `"converged"`, `"failed"` or `"not started"`.
    pub fn frame(&mut self) -> String {
        let Some(controller) = self.controller.as_mut() else {
            return "not started".to_owned();
        };
        match controller.frame().status() {
            StepStatus::Stepped => "stepped".to_owned(),
            StepStatus::Converged => "converged".to_owned(),
            StepStatus::Failed(reason) => {
                console_error(&format!("layout failed: {reason}"));
                // Start afresh on the next frame, so a stuck line search doesn't freeze the page.
                controller.invalidate();
                "failed".to_owned()
            }
            _ => "stepped".to_owned(),
        }
    }

    /// Flat `[x0, y0, x1, y1, ...]` positions, in shape order.
    pub fn positions(&self) -> Vec<f64> {
        self.controller
            .as_ref()
            .map(|c| c.placement().coords().to_vec())
            .unwrap_or_default()
    }

    /// Current energy, or NaN before [`LayoutHandle::start`].
    pub fn energy(&self) -> f64 {
        self.controller.as_ref().map_or(f64::NAN, Controller::energy)
    }
}
