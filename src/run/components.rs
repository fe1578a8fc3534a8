use leptos::leptos_dom::helpers::TimeoutHandle;
use leptos::{
    component, create_action, create_effect, create_signal, event_target_value, expect_context,
    on_cleanup, set_timeout_with_handle, store_value, view, IntoView, SignalGet, SignalSet,
    SignalWith,
};
use tracing::error;

use crate::components::Spinner;
use crate::config::Settings;
use crate::dashboard::{run_test, RunOutcome};
use crate::error::RunError;
use crate::request::MeasurementClient;
use crate::results::StoreErrorMessage;
use crate::store::ResultStore;

#[component]
pub fn RunTest() -> impl IntoView {
    let settings = expect_context::<Settings>();
    let store = expect_context::<ResultStore>();
    let client = expect_context::<MeasurementClient>();

    let [default_url_1, default_url_2] = settings.default_urls;
    let (url1, set_url1) = create_signal(default_url_1);
    let (url2, set_url2) = create_signal(default_url_2);
    let (acknowledged, set_acknowledged) = create_signal(false);

    let run = create_action(move |(url1, url2): &(String, String)| {
        let store = store.clone();
        let client = client.clone();
        let (url1, url2) = (url1.clone(), url2.clone());
        async move { run_test(&client, &store, &url1, &url2).await }
    });

    let pending = run.pending();
    let outcome = run.value();
    let success_display = settings.success_display;
    let dismissal = store_value::<Option<TimeoutHandle>>(None);

    create_effect(move |_| {
        if outcome.with(|outcome| matches!(outcome, Some(Ok(_)))) {
            set_acknowledged.set(true);
            dismissal.update_value(|scheduled| {
                reschedule(scheduled, |handle| handle.clear(), || {
                    set_timeout_with_handle(move || set_acknowledged.set(false), success_display)
                        .inspect_err(|err| error!("dismissal couldn't be scheduled: {err:?}"))
                        .ok()
                });
            });
        }
    });

    on_cleanup(move || {
        if let Some(Some(handle)) = dismissal.try_get_value() {
            handle.clear();
        }
    });

    view! {
        <div class="grid">
            <label>
                "URL 1"
                <input
                    type="text"
                    prop:value=url1
                    on:input=move |evt| set_url1.set(event_target_value(&evt))
                />
            </label>
            <label>
                "URL 2"
                <input
                    type="text"
                    prop:value=url2
                    on:input=move |evt| set_url2.set(event_target_value(&evt))
                />
            </label>
        </div>

        <button
            prop:disabled=move || pending.get()
            on:click=move |_| {
                set_acknowledged.set(false);
                run.dispatch((url1.get(), url2.get()));
            }
        >
            "Run test"
        </button>

        {move || {
            if pending.get() {
                view! { <Spinner label="Taking measurements..." /> }.into_view()
            } else {
                match outcome.get() {
                    Some(Ok(outcome)) if acknowledged.get() => {
                        view! { <RunDone outcome /> }.into_view()
                    }
                    Some(Err(err)) => view! { <RunFailed err /> }.into_view(),
                    _ => ().into_view(),
                }
            }
        }}
    }
}

/// Only the latest dismissal stays scheduled, an earlier one would hide a newer "Done!".
fn reschedule<H>(
    pending: &mut Option<H>,
    clear: impl FnOnce(H),
    schedule: impl FnOnce() -> Option<H>,
) {
    if let Some(handle) = pending.take() {
        clear(handle);
    }
    *pending = schedule();
}

#[component]
fn RunDone(outcome: RunOutcome) -> impl IntoView {
    let elapsed = outcome
        .elapsed
        .to_std()
        .map(|elapsed| humantime::format_duration(elapsed).to_string())
        .unwrap_or_default();

    view! {
        <article class="pico-background-green-500">
            <strong>"Done!"</strong>
            <p>{outcome.key} " measured in " {elapsed}</p>
        </article>
    }
}

#[component]
fn RunFailed(err: RunError) -> impl IntoView {
    match err {
        RunError::Partial { url, source } => view! {
            <article class="pico-background-amber-500">
                <strong>"Measurement failed for " {url}</strong>
                <p>"The other URL was measured but nothing was stored: " {source.to_string()}</p>
            </article>
        }
        .into_view(),
        RunError::Total { first, second } => view! {
            <article class="pico-background-red-500">
                <strong>"Both measurements failed"</strong>
                <p>{first.to_string()}</p>
                <p>{second.to_string()}</p>
            </article>
        }
        .into_view(),
        RunError::Storage(err) => view! { <StoreErrorMessage err /> }.into_view(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn test_reschedule_clears_the_previous_dismissal() {
        let cleared = RefCell::new(Vec::new());
        let mut pending = None;

        reschedule(&mut pending, |handle| cleared.borrow_mut().push(handle), || Some(1));
        assert_eq!(pending, Some(1));
        assert!(cleared.borrow().is_empty());

        reschedule(&mut pending, |handle| cleared.borrow_mut().push(handle), || Some(2));
        assert_eq!(pending, Some(2));
        assert_eq!(*cleared.borrow(), vec![1]);
    }

    #[test]
    fn test_failed_schedule_leaves_nothing_pending() {
        let mut pending = Some(1);

        reschedule(&mut pending, |_| {}, || None);

        assert_eq!(pending, None);
    }
}
