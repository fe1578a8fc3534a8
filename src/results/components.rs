use ev::MouseEvent;
use leptos::html::Article;
use leptos::html::Canvas as CanvasNode;
use leptos::{
    component, create_node_ref, ev, event_target_value, view, For, IntoView, NodeRef, Signal,
    SignalGet, SignalSet, SignalWith, WriteSignal,
};

use crate::datetime::display_datetime;
use crate::error::StoreError;
use crate::types::MeasurementPair;
use crate::use_canvas::CanvasSize;

use super::canvas::get_color;
use super::create_results::{create_results, CreateResultsReturn};
use super::types::Series;

#[component]
pub fn Results() -> impl IntoView {
    let CreateResultsReturn {
        canvas_node_ref,

        set_selection,
        set_mouse_x,
        set_mouse_y,
        set_canvas_has_focus,

        keys,
        selected_key,
        pairs,
        series,
        hovered,
        mouse_x,
        mouse_y,
        window_width,
        canvas_size,
        canvas_has_focus,
    } = create_results();

    let handle_mousemove = move |evt: MouseEvent| {
        let Some(canvas_node) = canvas_node_ref.get() else {
            return;
        };

        let dom_rect = canvas_node.get_bounding_client_rect();

        set_mouse_x.set(f64::from(evt.client_x()) - dom_rect.left());
        set_mouse_y.set(f64::from(evt.client_y()) - dom_rect.top());
    };

    view! {
        <div class="w-full h-full flex flex-col">
            <KeySelector keys selected_key set_selection></KeySelector>

            <div
                class="w-full relative"
                on:mousemove=handle_mousemove
                on:mouseenter=move |_| set_canvas_has_focus.set(true)
                on:mouseleave=move |_| set_canvas_has_focus.set(false)
            >
                <Tooltip
                    mouse_x
                    mouse_y
                    window_width
                    canvas_size
                    canvas_has_focus
                    series
                    hovered
                ></Tooltip>

                <Canvas canvas_node_ref canvas_size></Canvas>
            </div>

            <Runs pairs></Runs>
        </div>
    }
}

#[component]
fn KeySelector(
    keys: Signal<Result<Vec<String>, StoreError>>,
    selected_key: Signal<Option<String>>,
    set_selection: WriteSignal<Option<String>>,
) -> impl IntoView {
    move || match keys.get() {
        Err(err) => view! { <StoreErrorMessage err /> }.into_view(),
        Ok(keys) if keys.is_empty() => {
            view! { <p>"No measurements yet, run a test first."</p> }.into_view()
        }
        Ok(keys) => view! {
            <label>
                "URL"
                <select on:change=move |evt| set_selection.set(Some(event_target_value(&evt)))>
                    <For
                        each=move || keys.clone()
                        key=|key| key.clone()
                        children=move |key: String| {
                            let is_selected = {
                                let key = key.clone();
                                move || {
                                    selected_key.with(|selected| selected.as_ref() == Some(&key))
                                }
                            };
                            view! {
                                <option value=key.clone() prop:selected=is_selected>
                                    {key}
                                </option>
                            }
                        }
                    />
                </select>
            </label>
        }
        .into_view(),
    }
}

#[component]
fn Canvas(
    canvas_node_ref: NodeRef<CanvasNode>,
    canvas_size: Signal<CanvasSize>,
) -> impl IntoView {
    view! {
        <canvas
            class="border border-black w-full h-full"
            node_ref=canvas_node_ref
            width=move || canvas_size.get().buffer_width()
            height=move || canvas_size.get().buffer_height()
            style:width="100%"
            style:height="600px"
        />
    }
}

#[component]
fn Tooltip(
    mouse_x: Signal<f64>,
    mouse_y: Signal<f64>,
    window_width: Signal<f64>,
    canvas_size: Signal<CanvasSize>,
    canvas_has_focus: Signal<bool>,
    series: Signal<Vec<Series>>,
    hovered: Signal<Option<(usize, usize)>>,
) -> impl IntoView {
    let tooltip_node_ref = create_node_ref::<Article>();

    let tooltip_x_position = move || {
        let mouse_x = mouse_x.get();

        let Some(tooltip) = tooltip_node_ref.get() else {
            return mouse_x + 8.0;
        };

        (window_width.get() - f64::from(tooltip.client_width()) - 64.0).min(mouse_x + 8.0)
    };

    let tooltip_y_position = move || {
        let mouse_y = mouse_y.get();

        let Some(tooltip) = tooltip_node_ref.get() else {
            return mouse_y + 8.0;
        };

        if mouse_y > canvas_size.get().height * 0.7 {
            mouse_y - f64::from(tooltip.client_height()) - 8.0
        } else {
            mouse_y + 8.0
        }
    };

    let point = move || {
        let (panel, index) = hovered.get()?;
        series.with(|series| {
            let series = series.get(panel)?;
            let (timestamp, value) = series.points.get(index)?;
            Some((panel, series.url.clone(), timestamp.clone(), *value))
        })
    };

    view! {
        <article
            node_ref=tooltip_node_ref
            class="absolute flex flex-col"
            class:hidden=move || !canvas_has_focus.get() || hovered.get().is_none()
            style:left=move || format!("{}px", tooltip_x_position())
            style:top=move || format!("{}px", tooltip_y_position())
        >
            {move || {
                point()
                    .map(|(panel, url, timestamp, value)| {
                        view! {
                            <div style:color=get_color(panel)>{url}</div>
                            <div>{timestamp}</div>
                            <div>"Time to interactive: " {format!("{value:.3} s")}</div>
                        }
                            .into_view()
                    })
                    .unwrap_or_default()
            }}
        </article>
    }
}

#[component]
fn Runs(pairs: Signal<Result<Vec<MeasurementPair>, StoreError>>) -> impl IntoView {
    move || match pairs.get() {
        Err(err) => view! { <StoreErrorMessage err /> }.into_view(),
        Ok(pairs) => view! {
            <div class="overflow-auto">
                <table class="striped">
                    <thead>
                        <tr>
                            <th scope="col">"Recorded"</th>
                            <th scope="col">"URL"</th>
                            <th scope="col">"Time to interactive"</th>
                            <th scope="col">"First contentful paint"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || pairs.clone()
                            key=|pair| pair.id.clone()
                            let:pair
                        >
                            <Run pair></Run>
                        </For>
                    </tbody>
                </table>
            </div>
        }
        .into_view(),
    }
}

#[component]
fn Run(pair: MeasurementPair) -> impl IntoView {
    let recorded = display_datetime(pair.timestamp);

    pair.data
        .into_iter()
        .map(|result| {
            let time_to_interactive = format_seconds(Some(result.time_to_interactive_ms()));
            let first_contentful_paint = format_seconds(result.first_contentful_paint_ms());

            view! {
                <tr>
                    <td>{recorded.clone()}</td>
                    <td>{result.requested_url}</td>
                    <td>{time_to_interactive}</td>
                    <td>{first_contentful_paint}</td>
                </tr>
            }
        })
        .collect::<Vec<_>>()
}

#[component]
pub fn StoreErrorMessage(err: StoreError) -> impl IntoView {
    view! {
        <article class="pico-background-red-500">
            <strong>"The results store is unavailable"</strong>
            <p>{err.to_string()}</p>
        </article>
    }
}

fn format_seconds(milliseconds: Option<f64>) -> String {
    milliseconds.map_or_else(|| "-".to_string(), |ms| format!("{:.3} s", ms / 1000.0))
}
