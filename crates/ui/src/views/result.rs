use dioxus::prelude::*;
use dioxus_router::use_navigator;

use exam_core::model::{ModuleKind, ResultId};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ResultVm, map_result};

fn parse_module(raw: &str) -> Option<ModuleKind> {
    match raw {
        "reading" => Some(ModuleKind::Reading),
        "listening" => Some(ModuleKind::Listening),
        "writing" => Some(ModuleKind::Writing),
        _ => None,
    }
}

#[component]
pub fn ResultView(module: String, result_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let results = ctx.results();
    let module_kind = parse_module(&module);

    let resource = use_resource(move || {
        let results = results.clone();
        async move {
            let Some(module_kind) = module_kind else {
                return Err(ViewError::Unknown);
            };
            let summary = results
                .get_result(module_kind, ResultId::new(result_id))
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(map_result(&summary))
        }
    });

    let state = view_state_from_resource(resource);

    rsx! {
        div { class: "page result-page",
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    div { class: "loading-panel", p { "Loading result..." } }
                },
                ViewState::Error(err) => rsx! {
                    div { class: "error-panel",
                        p { "{err.message()}" }
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| {
                                let mut resource = resource;
                                resource.restart();
                            },
                            "Retry"
                        }
                        button {
                            class: "btn btn-ghost",
                            r#type: "button",
                            onclick: move |_| {
                                navigator.push(Route::Home {});
                            },
                            "Back to tests"
                        }
                    }
                },
                ViewState::Ready(result) => rsx! {
                    {result_body(&result)}
                },
            }
        }
    }
}

fn result_body(result: &ResultVm) -> Element {
    let rows = result
        .rows
        .iter()
        .map(|row| {
            let verdict_class = if row.is_correct {
                "verdict correct"
            } else {
                "verdict incorrect"
            };
            let verdict = if row.is_correct { "Correct" } else { "Incorrect" };
            rsx! {
                tr {
                    td { "{row.number}" }
                    td { class: "review-prompt", "{row.prompt}" }
                    td { "{row.given}" }
                    td { "{row.expected}" }
                    td { span { class: verdict_class, "{verdict}" } }
                }
            }
        })
        .collect::<Vec<_>>();

    let tasks = result
        .tasks
        .iter()
        .map(|task| {
            rsx! {
                section { class: "card task-feedback-card",
                    h4 { "{task.label}" }
                    p { class: "task-band", "Band {task.band}" }
                    p { class: "task-words", "{task.word_count} words" }
                    p { class: "task-feedback", "{task.feedback}" }
                }
            }
        })
        .collect::<Vec<_>>();
    let has_rows = !result.rows.is_empty();
    let has_tasks = !result.tasks.is_empty();

    rsx! {
        header { class: "view-header",
            h2 { class: "view-title", "{result.module_label} result" }
            p { class: "view-subtitle", "{result.mode_label} · completed {result.completed_at}" }
        }
        div { class: "result-summary",
            div { class: "stat-tile",
                span { class: "stat-label", "Band score" }
                span { class: "stat-value", "{result.band}" }
            }
            div { class: "stat-tile",
                span { class: "stat-label", "Score" }
                span { class: "stat-value", "{result.score_line}" }
            }
            div { class: "stat-tile",
                span { class: "stat-label", "Time taken" }
                span { class: "stat-value", "{result.duration}" }
            }
        }
        if has_tasks {
            div { class: "task-feedback-grid", {tasks.into_iter()} }
        }
        if has_rows {
            section { class: "card",
                h3 { "Answers" }
                table { class: "review-table",
                    thead {
                        tr {
                            th { "#" }
                            th { "Question" }
                            th { "Your answer" }
                            th { "Correct answer" }
                            th { "Verdict" }
                        }
                    }
                    tbody { {rows.into_iter()} }
                }
            }
        }
    }
}
