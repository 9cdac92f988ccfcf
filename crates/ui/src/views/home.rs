use dioxus::prelude::*;
use dioxus_router::use_navigator;

use crate::context::AppContext;
use crate::routes::Route;

const MODULES: [(&str, &str, &str); 3] = [
    (
        "reading",
        "Reading",
        "One passage, 60 minutes, answers across five question types.",
    ),
    (
        "listening",
        "Listening",
        "Four recorded sections, 30 minutes, each recording plays once.",
    ),
    (
        "writing",
        "Writing",
        "Two tasks with independent budgets: 20 and 40 minutes.",
    ),
];

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut test_id = use_signal(|| String::from("1"));
    let mode = ctx.mode();

    let cards = MODULES
        .map(|(key, label, blurb)| {
            let parsed = test_id().trim().parse::<u64>().ok();
            rsx! {
                section { class: "card module-card",
                    h3 { "{label}" }
                    p { class: "module-blurb", "{blurb}" }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: parsed.is_none(),
                        onclick: move |_| {
                            if let Some(id) = parsed {
                                navigator.push(Route::Attempt {
                                    module: key.to_string(),
                                    test_id: id,
                                });
                            }
                        },
                        "Start {label}"
                    }
                }
            }
        })
        .into_iter()
        .collect::<Vec<_>>();

    rsx! {
        div { class: "page home-page",
            header { class: "view-header",
                h2 { class: "view-title", "Practice tests" }
                p { class: "view-subtitle", "Timed modules scored in {mode} mode." }
            }
            div { class: "home-controls",
                label { r#for: "test-id", "Test number" }
                input {
                    id: "test-id",
                    class: "answer-input test-id-input",
                    r#type: "number",
                    min: "1",
                    inputmode: "numeric",
                    value: "{test_id()}",
                    oninput: move |evt| test_id.set(evt.value()),
                }
            }
            div { class: "module-cards", {cards.into_iter()} }
        }
    }
}
