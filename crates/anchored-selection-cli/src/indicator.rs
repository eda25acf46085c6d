use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anchored_selection_config::IndicatorConfig;
use anchored_selection_engine::{AnchorObserver, ViewId};

/// Status line indicator fed by anchored-state notifications
///
/// Only the last reported state per view is kept; views never reported are
/// shown as not anchored.
#[derive(Clone)]
pub struct StatusIndicator {
    config: IndicatorConfig,
    states: Rc<RefCell<HashMap<ViewId, bool>>>,
}

impl StatusIndicator {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            config,
            states: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Observer to register with the anchor controller
    pub fn observer(&self) -> Box<dyn AnchorObserver<ViewId>> {
        let states = Rc::clone(&self.states);
        Box::new(move |view: ViewId, anchored: bool| {
            states.borrow_mut().insert(view, anchored);
        })
    }

    pub fn is_anchored(&self, view: ViewId) -> bool {
        self.states.borrow().get(&view).copied().unwrap_or(false)
    }

    /// Text of the indicator; with the glyph both states share one label
    /// and differ in style only
    pub fn label(&self, anchored: bool) -> &str {
        if self.config.use_glyph {
            &self.config.glyph
        } else if anchored {
            &self.config.anchored_label
        } else {
            &self.config.unanchored_label
        }
    }

    pub fn tooltip(&self) -> &str {
        &self.config.tooltip
    }
}
