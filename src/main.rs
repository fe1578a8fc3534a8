#![deny(clippy::all, clippy::pedantic)]
#![allow(non_snake_case, clippy::module_name_repetitions)]

use std::rc::Rc;

use leptos::{component, provide_context, view, IntoView};
use leptos_router::{Route, Router, Routes, A};
use tracing::{warn, Level};
use wasm_tracing::WASMLayerConfigBuilder;

use crate::config::Settings;
use crate::request::MeasurementClient;
use crate::results::Results;
use crate::run::RunTest;
use crate::store::{DocumentStore, LocalStorageStore, MemoryStore, ResultStore};

mod components;
mod config;
mod dashboard;
mod datetime;
mod error;
mod request;
mod results;
mod run;
mod store;
mod types;
mod use_canvas;

fn main() {
    console_error_panic_hook::set_once();
    wasm_tracing::set_as_global_default_with_config(
        WASMLayerConfigBuilder::new()
            .set_max_level(Level::INFO)
            .build(),
    );
    leptos::mount_to_body(|| view! { <App /> });
}

fn open_store(settings: &Settings) -> ResultStore {
    let documents: Rc<dyn DocumentStore> = match LocalStorageStore::try_new(settings.namespace())
    {
        Ok(store) => Rc::new(store),
        Err(err) => {
            warn!("results won't survive a reload, localStorage is unusable: {err:#}");
            Rc::new(MemoryStore::new())
        }
    };

    ResultStore::new(documents)
}

#[component]
fn App() -> impl IntoView {
    let settings = Settings::default();

    provide_context(open_store(&settings));
    provide_context(MeasurementClient::new(&settings));
    provide_context(settings);

    view! {
        <main class="container">
            <Router>
                <nav>
                    <ul>
                        <li>
                            <strong>
                                <A href="/">"⏱️ TimeIt"</A>
                            </strong>
                        </li>
                    </ul>
                    <ul>
                        <li>
                            <A href="/">"Run test"</A>
                        </li>
                        <li>
                            <A href="/results">"Results"</A>
                        </li>
                    </ul>
                </nav>
                <div class="h-full w-full overflow-auto">
                    <Routes>
                        <Route path="/" view=RunTest />
                        <Route path="/results" view=Results />
                        <Route path="/*any" view=|| view! { <h1>"Not Found"</h1> } />
                    </Routes>
                </div>
            </Router>
        </main>
    }
}
