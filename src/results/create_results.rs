use std::{cell::RefCell, rc::Rc};

use leptos::{
    create_effect, create_memo, create_signal, expect_context, html::Canvas, NodeRef, Signal,
    SignalGet, SignalSet, SignalWith, WriteSignal,
};
use leptos_use::{use_window_size, UseWindowSizeReturn};
use tracing::error;

use crate::{
    error::StoreError,
    store::ResultStore,
    types::MeasurementPair,
    use_canvas::{use_canvas, CanvasSize, UseCanvasReturn},
};

use super::{
    canvas::{ChartLayout, ComparisonCanvas},
    types::{group_by_url, project, Series},
};

pub struct CreateResultsReturn {
    pub canvas_node_ref: NodeRef<Canvas>,

    pub set_selection: WriteSignal<Option<String>>,
    pub set_mouse_x: WriteSignal<f64>,
    pub set_mouse_y: WriteSignal<f64>,
    pub set_canvas_has_focus: WriteSignal<bool>,

    pub keys: Signal<Result<Vec<String>, StoreError>>,
    pub selected_key: Signal<Option<String>>,
    pub pairs: Signal<Result<Vec<MeasurementPair>, StoreError>>,
    pub series: Signal<Vec<Series>>,
    pub hovered: Signal<Option<(usize, usize)>>,
    pub mouse_x: Signal<f64>,
    pub mouse_y: Signal<f64>,
    pub window_width: Signal<f64>,
    pub canvas_size: Signal<CanvasSize>,
    pub canvas_has_focus: Signal<bool>,
}

pub fn create_results() -> CreateResultsReturn {
    let store = expect_context::<ResultStore>();

    let UseWindowSizeReturn {
        width: window_width,
        ..
    } = use_window_size();

    let UseCanvasReturn {
        node_ref: canvas_node_ref,
        size: canvas_size,
    } = use_canvas();

    let (canvas, set_canvas) = create_signal::<Option<Rc<RefCell<ComparisonCanvas>>>>(None);
    let (selection, set_selection) = create_signal::<Option<String>>(None);
    let (mouse_x, set_mouse_x) = create_signal(0.0);
    let (mouse_y, set_mouse_y) = create_signal(0.0);
    let (canvas_has_focus, set_canvas_has_focus) = create_signal(false);

    let keys = {
        let store = store.clone();
        create_memo(move |_| {
            store.list_keys().inspect_err(|err| {
                error!("keys couldn't be listed: {err}");
            })
        })
    };

    // Until the user picks one, the first known key is shown
    let selected_key = create_memo(move |_| {
        selection.get().or_else(|| {
            keys.with(|keys| keys.as_ref().ok().and_then(|keys| keys.first().cloned()))
        })
    });

    let pairs = create_memo(move |_| {
        let Some(key) = selected_key.get() else {
            return Ok(Vec::new());
        };

        store.fetch_by_key(&key).inspect_err(|err| {
            error!(key, "measurement pairs couldn't be fetched: {err}");
        })
    });

    let series = create_memo(move |_| {
        pairs.with(|pairs| {
            pairs
                .as_ref()
                .map(|pairs| group_by_url(&project(pairs)))
                .unwrap_or_default()
        })
    });

    let hovered = create_memo(move |_| {
        if !canvas_has_focus.get() {
            return None;
        }

        let size = canvas_size.get();
        series.with(|series| {
            let layout = ChartLayout::new(series, size.width, size.height);
            layout.hit(series, mouse_x.get(), mouse_y.get())
        })
    });

    create_effect(move |_| {
        let Some(node) = canvas_node_ref.get() else {
            return;
        };

        let comparison_canvas = match ComparisonCanvas::try_new(&node) {
            Ok(comparison_canvas) => comparison_canvas,
            Err(err) => {
                error!("comparison canvas failed to initialize: {err}");
                return;
            }
        };

        set_canvas.set(Some(Rc::new(RefCell::new(comparison_canvas))));
    });

    create_effect(move |_| {
        let size = canvas_size.get();

        let Some(canvas) = canvas.get() else {
            return;
        };

        series.with(|series| canvas.borrow_mut().render(series, size, hovered.get()));
    });

    CreateResultsReturn {
        canvas_node_ref,

        set_selection,
        set_mouse_x,
        set_mouse_y,
        set_canvas_has_focus,

        keys: keys.into(),
        selected_key: selected_key.into(),
        pairs: pairs.into(),
        series: series.into(),
        hovered: hovered.into(),
        mouse_x: mouse_x.into(),
        mouse_y: mouse_y.into(),
        window_width,
        canvas_size,
        canvas_has_focus: canvas_has_focus.into(),
    }
}
