use leptos::{component, view, IntoView};

#[component]
pub fn Spinner(#[prop(optional, into)] label: Option<String>) -> impl IntoView {
    view! { <span aria-busy="true">{label}</span> }
}
