mod scripts;

use std::sync::Arc;

use dioxus::document::eval;
use dioxus::prelude::*;
use dioxus_router::{Navigator, use_navigator};

use exam_core::model::{AnswerValue, ModuleKind, Question, QuestionType, TestId};
use services::attempts::{
    AttemptLoopService, SubmitTrigger, TickEvent, TransportCommand,
};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{AttemptIntent, AttemptOutcome, AttemptVm, format_clock, start_attempt};
use self::scripts::{AUDIO_BRIDGE_SCRIPT, pause_script, play_script, seek_script};

fn parse_module(raw: &str) -> Option<ModuleKind> {
    match raw {
        "reading" => Some(ModuleKind::Reading),
        "listening" => Some(ModuleKind::Listening),
        "writing" => Some(ModuleKind::Writing),
        _ => None,
    }
}

/// Run the shared submission routine and navigate on completion. Manual
/// submit and clock expiry both land here; the engine's guard makes the
/// two mutually exclusive.
async fn submit_current(
    mut vm: Signal<Option<AttemptVm>>,
    attempts: Arc<AttemptLoopService>,
    mut submit_error: Signal<Option<ViewError>>,
    navigator: Navigator,
    trigger: SubmitTrigger,
) {
    // Take the attempt out of the signal for the await so no handler can
    // mutate it mid-request.
    let taken = { vm.write().take() };
    let Some(mut vm_value) = taken else {
        return;
    };

    let result = vm_value.submit(&attempts, trigger).await;
    let module = vm_value.module();

    {
        let mut guard = vm.write();
        *guard = Some(vm_value);
    }

    match result {
        Ok(AttemptOutcome::Completed { result_id }) => {
            navigator.push(Route::Result {
                module: module.to_string(),
                result_id: result_id.value(),
            });
        }
        Ok(AttemptOutcome::Continue) => {}
        Err(err) => submit_error.set(Some(err)),
    }
}

#[component]
pub fn AttemptView(module: String, test_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let attempts = ctx.attempt_loop();
    let mode = ctx.mode();
    let module_kind = parse_module(&module);

    let vm = use_signal(|| None::<AttemptVm>);
    let submit_error = use_signal(|| None::<ViewError>);
    let mut confirm_submit = use_signal(|| false);
    let mut remaining = use_signal(|| 0_u32);
    let audio_position = use_signal(|| 0.0_f64);
    let audio_duration = use_signal(|| 0.0_f64);

    let attempts_for_resource = attempts.clone();
    let resource = use_resource(move || {
        let attempts = attempts_for_resource.clone();
        let mut vm = vm;
        let mut remaining = remaining;
        async move {
            let Some(module_kind) = module_kind else {
                return Err(ViewError::LoadFailed);
            };
            let fresh = start_attempt(&attempts, module_kind, TestId::new(test_id), mode).await?;
            remaining.set(fresh.display_remaining());
            vm.set(Some(fresh));
            Ok::<_, ViewError>(())
        }
    });

    // The attempt's clock: one engine tick per second while mounted.
    // Expiry funnels into the same submission routine as the button.
    {
        let attempts = attempts.clone();
        use_future(move || {
            let attempts = attempts.clone();
            async move {
                let mut vm = vm;
                let mut remaining = remaining;
                loop {
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    let expired = {
                        let mut guard = vm.write();
                        match guard.as_mut() {
                            Some(attempt) => {
                                let event = attempt.tick();
                                matches!(event, TickEvent::Expired)
                            }
                            None => false,
                        }
                    };
                    if let Some(attempt) = vm.read().as_ref() {
                        remaining.set(attempt.display_remaining());
                    }
                    if expired {
                        submit_current(
                            vm,
                            attempts.clone(),
                            submit_error,
                            navigator,
                            SubmitTrigger::Expiry,
                        )
                        .await;
                    }
                }
            }
        });
    }

    // Audio bridge: stream playback events from the DOM element into the
    // engine's per-section gates.
    if module_kind == Some(ModuleKind::Listening) {
        use_future(move || async move {
            let mut vm = vm;
            let mut audio_position = audio_position;
            let mut audio_duration = audio_duration;
            let mut bridge = eval(AUDIO_BRIDGE_SCRIPT);
            loop {
                let Ok(message) = bridge.recv::<String>().await else {
                    break;
                };
                let mut guard = vm.write();
                let Some(attempt) = guard.as_mut() else {
                    continue;
                };
                if let Some(raw) = message.strip_prefix("position:") {
                    if let Ok(seconds) = raw.parse::<f64>() {
                        attempt.audio_position(seconds);
                        audio_position.set(seconds);
                    }
                } else if let Some(raw) = message.strip_prefix("duration:") {
                    if let Ok(seconds) = raw.parse::<f64>() {
                        attempt.audio_duration(seconds);
                        audio_duration.set(seconds);
                    }
                } else if message == "ended" {
                    attempt.audio_ended();
                } else if message == "failed" {
                    attempt.audio_failed("audio failed to load or play");
                }
            }
        });
    }

    // Leaving the view abandons the attempt: clock stopped, nothing sent.
    use_drop(move || {
        let mut vm = vm;
        if let Some(attempt) = vm.write().as_mut() {
            attempt.abandon();
        }
    });

    let state = view_state_from_resource(resource);

    rsx! {
        div { class: "page attempt-page",
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    div { class: "loading-panel", p { "Loading test..." } }
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
                            "Go back"
                        }
                    }
                },
                ViewState::Ready(()) => rsx! {
                    {attempt_body(
                        vm,
                        attempts.clone(),
                        submit_error,
                        confirm_submit,
                        remaining,
                        audio_position,
                        audio_duration,
                        navigator,
                    )}
                },
            }

            if confirm_submit() {
                {confirm_dialog(vm, attempts.clone(), submit_error, confirm_submit, navigator)}
            }
        }
    }
}

//
// ─── BODY ──────────────────────────────────────────────────────────────────────
//

#[allow(clippy::too_many_arguments)]
fn attempt_body(
    vm: Signal<Option<AttemptVm>>,
    attempts: Arc<AttemptLoopService>,
    submit_error: Signal<Option<ViewError>>,
    mut confirm_submit: Signal<bool>,
    remaining: Signal<u32>,
    audio_position: Signal<f64>,
    audio_duration: Signal<f64>,
    navigator: Navigator,
) -> Element {
    let guard = vm.read();
    let Some(attempt) = guard.as_ref() else {
        return rsx! {
            div { class: "loading-panel", p { "Submitting..." } }
        };
    };

    let title = attempt.title().to_string();
    let module = attempt.module();
    let submitting = attempt.is_submitting();
    let low_time = attempt.low_time();
    let clock_class = if low_time {
        "attempt-clock low-time"
    } else {
        "attempt-clock"
    };
    let clock_label = format_clock(remaining());
    let module_label = match module {
        ModuleKind::Reading => "Reading",
        ModuleKind::Listening => "Listening",
        ModuleKind::Writing => "Writing",
    };

    let body = match module {
        ModuleKind::Reading => reading_body(vm, attempt, submitting),
        ModuleKind::Listening => listening_body(
            vm,
            attempt,
            attempts.clone(),
            submit_error,
            navigator,
            audio_position,
            audio_duration,
            submitting,
        ),
        ModuleKind::Writing => writing_body(
            vm,
            attempt,
            attempts.clone(),
            submit_error,
            navigator,
            submitting,
        ),
    };

    // Both failure kinds keep the answers; the banner always offers a
    // manual retry, which is the only path out of a failed attempt.
    let error_banner = submit_error().map(|err| {
        let attempts = attempts.clone();
        let mut submit_error = submit_error;
        rsx! {
            div { class: "error-banner",
                p { "{err.message()}" }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| {
                        submit_error.set(None);
                        let attempts = attempts.clone();
                        spawn(async move {
                            submit_current(
                                vm,
                                attempts,
                                submit_error,
                                navigator,
                                SubmitTrigger::Manual,
                            )
                            .await;
                        });
                    },
                    "Try again"
                }
            }
        }
    });

    rsx! {
        header { class: "attempt-header",
            div {
                h2 { class: "attempt-title", "{title}" }
                p { class: "attempt-subtitle", "{module_label} module" }
            }
            div { class: "attempt-header-right",
                span { class: clock_class, "{clock_label}" }
                if module == ModuleKind::Reading {
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: submitting,
                        onclick: move |_| confirm_submit.set(true),
                        if submitting { "Submitting..." } else { "Submit Test" }
                    }
                }
            }
        }
        {error_banner}
        {body}
    }
}

fn confirm_dialog(
    vm: Signal<Option<AttemptVm>>,
    attempts: Arc<AttemptLoopService>,
    submit_error: Signal<Option<ViewError>>,
    mut confirm_submit: Signal<bool>,
    navigator: Navigator,
) -> Element {
    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal",
                h3 { "Confirm Submission" }
                p { "Submit your test now? Answers cannot be changed afterwards." }
                div { class: "modal-actions",
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| confirm_submit.set(false),
                        "Cancel"
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| {
                            confirm_submit.set(false);
                            let attempts = attempts.clone();
                            spawn(async move {
                                submit_current(
                                    vm,
                                    attempts,
                                    submit_error,
                                    navigator,
                                    SubmitTrigger::Manual,
                                )
                                .await;
                            });
                        },
                        "Submit"
                    }
                }
            }
        }
    }
}

//
// ─── QUESTION RENDERING ────────────────────────────────────────────────────────
//

fn question_input(mut vm: Signal<Option<AttemptVm>>, attempt: &AttemptVm, question: &Question) -> Element {
    let id = question.id();
    let answer_text = attempt.answer_text(id);

    match question.question_type() {
        QuestionType::SingleChoice | QuestionType::TrueFalseNotGiven => {
            let choices: Vec<String> = if question.choices().is_empty() {
                vec!["True".into(), "False".into(), "Not Given".into()]
            } else {
                question.choices().to_vec()
            };
            let rows = choices
                .into_iter()
                .map(|choice| {
                    let checked = answer_text == choice;
                    let value = choice.clone();
                    rsx! {
                        label { class: "choice-row",
                            input {
                                r#type: "radio",
                                name: "question-{id}",
                                value: "{choice}",
                                checked: checked,
                                onchange: move |_| {
                                    if let Some(attempt) = vm.write().as_mut() {
                                        attempt.apply(AttemptIntent::Answer(
                                            id,
                                            AnswerValue::Choice(value.clone()),
                                        ));
                                    }
                                },
                            }
                            span { "{choice}" }
                        }
                    }
                })
                .collect::<Vec<_>>();
            rsx! {
                div { class: "choices", {rows.into_iter()} }
            }
        }
        QuestionType::MultiChoice => {
            let rows = question
                .choices()
                .iter()
                .map(|choice| {
                    let checked = attempt.is_choice_selected(id, choice);
                    let choice = choice.clone();
                    let value = choice.clone();
                    rsx! {
                        label { class: "choice-row",
                            input {
                                r#type: "checkbox",
                                checked: checked,
                                onchange: move |_| {
                                    if let Some(attempt) = vm.write().as_mut() {
                                        attempt.toggle_choice(id, &value);
                                    }
                                },
                            }
                            span { "{choice}" }
                        }
                    }
                })
                .collect::<Vec<_>>();
            rsx! {
                div { class: "choices", {rows.into_iter()} }
            }
        }
        QuestionType::Dropdown => {
            let options = question
                .choices()
                .iter()
                .map(|choice| {
                    let selected = answer_text == *choice;
                    rsx! {
                        option { value: "{choice}", selected: selected, "{choice}" }
                    }
                })
                .collect::<Vec<_>>();
            rsx! {
                select {
                    class: "answer-select",
                    onchange: move |evt| {
                        if let Some(attempt) = vm.write().as_mut() {
                            attempt.apply(AttemptIntent::Answer(
                                id,
                                AnswerValue::Choice(evt.value()),
                            ));
                        }
                    },
                    option { value: "", selected: answer_text.is_empty(), "Select an answer" }
                    {options.into_iter()}
                }
            }
        }
        QuestionType::FreeText => rsx! {
            input {
                class: "answer-input",
                r#type: "text",
                placeholder: "Enter your answer",
                value: "{answer_text}",
                oninput: move |evt| {
                    if let Some(attempt) = vm.write().as_mut() {
                        attempt.apply(AttemptIntent::Answer(
                            id,
                            AnswerValue::Text(evt.value()),
                        ));
                    }
                },
            }
        },
    }
}

fn nav_buttons(mut vm: Signal<Option<AttemptVm>>, attempt: &AttemptVm) -> Element {
    let at_first = attempt.at_first_question();
    let at_final = attempt.at_final_question();
    rsx! {
        div { class: "nav-buttons",
            button {
                class: "btn btn-secondary",
                r#type: "button",
                disabled: at_first,
                onclick: move |_| {
                    if let Some(attempt) = vm.write().as_mut() {
                        attempt.apply(AttemptIntent::Previous);
                    }
                },
                "Previous"
            }
            button {
                class: "btn btn-secondary",
                r#type: "button",
                disabled: at_final,
                onclick: move |_| {
                    if let Some(attempt) = vm.write().as_mut() {
                        attempt.apply(AttemptIntent::Next);
                    }
                },
                "Next"
            }
        }
    }
}

//
// ─── READING ───────────────────────────────────────────────────────────────────
//

fn reading_body(mut vm: Signal<Option<AttemptVm>>, attempt: &AttemptVm, _submitting: bool) -> Element {
    let exam_core::model::TestDefinition::Reading { passage, questions, .. } =
        attempt.engine().definition()
    else {
        return rsx! {};
    };
    let passage = passage.clone();
    let position = attempt.position();
    let Some(question) = questions.get(position.question) else {
        return rsx! {};
    };
    let number = position.question + 1;
    let total = questions.len();
    let prompt = question.prompt().to_string();
    let type_tag = format!("{:?}", question.question_type());

    let grid = attempt
        .question_statuses()
        .into_iter()
        .enumerate()
        .map(|(index, status)| {
            let class = if status.active {
                "question-nav active"
            } else if status.answered {
                "question-nav answered"
            } else {
                "question-nav"
            };
            let label = index + 1;
            rsx! {
                button {
                    class: class,
                    r#type: "button",
                    onclick: move |_| {
                        if let Some(attempt) = vm.write().as_mut() {
                            attempt.apply(AttemptIntent::Jump { section: 0, question: index });
                        }
                    },
                    "{label}"
                }
            }
        })
        .collect::<Vec<_>>();

    rsx! {
        div { class: "attempt-grid reading-grid",
            section { class: "card passage-card",
                h3 { "Reading Passage" }
                div { class: "passage-text", "{passage}" }
            }
            aside { class: "attempt-sidebar",
                section { class: "card",
                    h3 { "Questions" }
                    div { class: "question-grid", {grid.into_iter()} }
                }
                section { class: "card",
                    div { class: "question-card-header",
                        h3 { "Question {number} of {total}" }
                        {nav_buttons(vm, attempt)}
                    }
                    p { class: "question-prompt", "{prompt}" }
                    {question_input(vm, attempt, question)}
                    div { class: "question-type-tag", "{type_tag}" }
                }
            }
        }
    }
}

//
// ─── LISTENING ─────────────────────────────────────────────────────────────────
//

#[allow(clippy::too_many_arguments)]
fn listening_body(
    mut vm: Signal<Option<AttemptVm>>,
    attempt: &AttemptVm,
    attempts: Arc<AttemptLoopService>,
    submit_error: Signal<Option<ViewError>>,
    navigator: Navigator,
    audio_position: Signal<f64>,
    audio_duration: Signal<f64>,
    submitting: bool,
) -> Element {
    let exam_core::model::TestDefinition::Listening { sections, .. } =
        attempt.engine().definition()
    else {
        return rsx! {};
    };
    let position = attempt.position();
    let Some(section) = sections.get(position.section) else {
        return rsx! {};
    };
    let Some(question) = section.questions().get(position.question) else {
        return rsx! {};
    };

    let section_number = position.section + 1;
    let section_total = sections.len();
    let section_title = section.title().to_string();
    let instructions = section.instructions().to_string();
    let audio_src = section.audio().as_str().to_string();
    let number = position.question + 1;
    let total = section.questions().len();
    let prompt = question.prompt().to_string();
    let at_final = attempt.at_final_question();

    let gate = attempt.active_gate();
    let has_ended = gate.is_some_and(|g| g.has_ended());
    let is_playing = gate.is_some_and(|g| g.is_playing());
    let warning_note = gate.and_then(|g| g.warning().map(str::to_string)).map(|warning| {
        rsx! {
            p { class: "audio-warning",
                "Audio problem: {warning}. You can still answer this section."
            }
        }
    });

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let position_label = format_clock(audio_position().max(0.0) as u32);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let duration_label = format_clock(audio_duration().max(0.0) as u32);
    let duration_attr = format!("{}", audio_duration().max(0.0));
    let position_attr = format!("{}", audio_position().max(0.0));

    rsx! {
        div { class: "attempt-grid listening-grid",
            aside { class: "card audio-card",
                div { class: "audio-card-header",
                    h3 { "Section {section_number}: Listening" }
                    span { class: "one-play-badge", "One Play Only" }
                }
                p { class: "section-title", "{section_title}" }
                div { class: "section-instructions", "{instructions}" }

                audio {
                    id: "attempt-audio",
                    class: "hidden-audio",
                    src: "{audio_src}",
                    preload: "metadata",
                }

                div { class: "audio-transport",
                    div { class: "audio-times",
                        span { "Playback" }
                        span { "{position_label} / {duration_label}" }
                    }
                    input {
                        class: "audio-progress",
                        r#type: "range",
                        min: "0",
                        max: "{duration_attr}",
                        step: "any",
                        value: "{position_attr}",
                        disabled: has_ended,
                        oninput: move |evt| {
                            let Ok(target) = evt.value().parse::<f64>() else {
                                return;
                            };
                            let accepted = vm
                                .write()
                                .as_mut()
                                .and_then(|attempt| attempt.seek_audio(target));
                            if let Some(seconds) = accepted {
                                let mut audio_position = audio_position;
                                audio_position.set(seconds);
                                let _ = eval(&seek_script(seconds));
                            }
                        },
                    }
                    if has_ended {
                        p { class: "audio-finished",
                            "Audio finished. You cannot replay this section."
                        }
                    } else {
                        button {
                            class: "btn btn-primary audio-toggle",
                            r#type: "button",
                            onclick: move |_| {
                                let command = vm
                                    .write()
                                    .as_mut()
                                    .and_then(|attempt| attempt.apply(AttemptIntent::ToggleAudio));
                                match command {
                                    Some(TransportCommand::Play) => {
                                        let _ = eval(&play_script());
                                    }
                                    Some(TransportCommand::Pause) => {
                                        let _ = eval(&pause_script());
                                    }
                                    None => {}
                                }
                            },
                            if is_playing { "Pause" } else { "Play" }
                        }
                    }
                    {warning_note}
                }
                p { class: "section-progress", "Section {section_number} of {section_total}" }
            }

            section { class: "card question-area",
                div { class: "question-card-header",
                    h3 { "Question {number} of {total}" }
                    {nav_buttons(vm, attempt)}
                }
                p { class: "question-prompt", "{prompt}" }
                {question_input(vm, attempt, question)}

                if at_final {
                    div { class: "submit-row",
                        button {
                            class: "btn btn-primary",
                            r#type: "button",
                            disabled: submitting,
                            onclick: move |_| {
                                let attempts = attempts.clone();
                                spawn(async move {
                                    submit_current(
                                        vm,
                                        attempts,
                                        submit_error,
                                        navigator,
                                        SubmitTrigger::Manual,
                                    )
                                    .await;
                                });
                            },
                            if submitting { "Submitting..." } else { "Submit Test" }
                        }
                    }
                }
            }
        }
    }
}

//
// ─── WRITING ───────────────────────────────────────────────────────────────────
//

fn writing_body(
    mut vm: Signal<Option<AttemptVm>>,
    attempt: &AttemptVm,
    attempts: Arc<AttemptLoopService>,
    submit_error: Signal<Option<ViewError>>,
    navigator: Navigator,
    submitting: bool,
) -> Element {
    let exam_core::model::TestDefinition::Writing { tasks, .. } = attempt.engine().definition()
    else {
        return rsx! {};
    };
    let position = attempt.position();
    let Some(task) = tasks.get(position.section) else {
        return rsx! {};
    };

    let task_label = task.number().label();
    let task_index = position.section;
    let prompt = task.prompt().to_string();
    let chart_img = task.chart().map(|asset| {
        let src = asset.as_str().to_string();
        rsx! {
            img { class: "task-chart", src: "{src}", alt: "Task 1 visual" }
        }
    });
    let min_words = task.min_words();
    let word_count = attempt.task_word_count(task);
    let answer = attempt.answer_text(task.id());
    let task_id = task.id();
    let on_first_task = task_index == 0;

    let tabs = (0..tasks.len())
        .map(|index| {
            let class = if index == task_index {
                "task-tab active"
            } else {
                "task-tab"
            };
            let label = if index == 0 { "Task 1" } else { "Task 2" };
            rsx! {
                button {
                    class: class,
                    r#type: "button",
                    onclick: move |_| {
                        if let Some(attempt) = vm.write().as_mut() {
                            attempt.apply(AttemptIntent::Jump { section: index, question: 0 });
                        }
                    },
                    "{label}"
                }
            }
        })
        .collect::<Vec<_>>();

    rsx! {
        div { class: "writing-page",
            div { class: "task-tabs", {tabs.into_iter()} }

            section { class: "card task-card",
                h3 { "{task_label}" }
                {chart_img}
                div { class: "task-prompt", "{prompt}" }
                p { class: "task-instructions",
                    "Write at least {min_words} words. The word count is advisory and never blocks submission."
                }
                textarea {
                    class: "task-editor",
                    placeholder: "Write your response here...",
                    value: "{answer}",
                    oninput: move |evt| {
                        if let Some(attempt) = vm.write().as_mut() {
                            attempt.apply(AttemptIntent::Answer(
                                task_id,
                                AnswerValue::Text(evt.value()),
                            ));
                        }
                    },
                }
                p { class: "word-count", "Word count: {word_count}" }
            }

            div { class: "writing-actions",
                if on_first_task {
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| {
                            if let Some(attempt) = vm.write().as_mut() {
                                attempt.apply(AttemptIntent::Next);
                            }
                        },
                        "Next: Task 2"
                    }
                } else {
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: submitting,
                        onclick: move |_| {
                            let attempts = attempts.clone();
                            spawn(async move {
                                submit_current(
                                    vm,
                                    attempts,
                                    submit_error,
                                    navigator,
                                    SubmitTrigger::Manual,
                                )
                                .await;
                            });
                        },
                        if submitting { "Submitting..." } else { "Submit Test" }
                    }
                }
            }
        }
    }
}
