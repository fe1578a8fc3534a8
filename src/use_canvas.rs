use leptos::html::Canvas as CanvasNode;
use leptos::{create_memo, create_node_ref, NodeRef, Signal, SignalGet};
use leptos_use::{use_device_pixel_ratio, use_element_size, UseElementSizeReturn};

/// Size of a canvas in CSS pixels, along with the device pixel ratio needed to draw it
/// sharply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl CanvasSize {
    /// Width of the drawing buffer, in device pixels.
    pub fn buffer_width(&self) -> f64 {
        (self.width * self.dpr).round()
    }

    /// Height of the drawing buffer, in device pixels.
    pub fn buffer_height(&self) -> f64 {
        (self.height * self.dpr).round()
    }

    pub fn is_empty(&self) -> bool {
        self.width < f64::EPSILON || self.height < f64::EPSILON
    }
}

pub struct UseCanvasReturn {
    pub node_ref: NodeRef<CanvasNode>,
    pub size: Signal<CanvasSize>,
}

pub fn use_canvas() -> UseCanvasReturn {
    let node_ref = create_node_ref::<CanvasNode>();
    let dpr = use_device_pixel_ratio();
    let UseElementSizeReturn { width, height } = use_element_size(node_ref);

    let size = create_memo(move |_| CanvasSize {
        width: width.get(),
        height: height.get(),
        dpr: dpr.get(),
    });

    UseCanvasReturn {
        node_ref,
        size: size.into(),
    }
}
