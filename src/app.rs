//! Main application component for ScrumBot

use crate::api::ScrumApi;
use crate::audio::{AudioCapture, AudioSink, MutedSink, PipeWireSink, SpeechSequencer};
use crate::models::{ApiResponse, Epic, Message, ProjectSummary, RecordedAudio, Story, TodoTask};
use crate::settings::ClientSettings;
use crate::state::{
    format_timestamp, AppState, Route, StatusColor, SummaryViewState, VoiceInput, MAX_RECORDING,
};
use crate::tokio_runtime;
use gpui::prelude::*;
use gpui::*;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The root application view
pub struct ScrumBot {
    state: AppState,
    settings: ClientSettings,
    api: Arc<dyn ScrumApi>,
    sequencer: SpeechSequencer,
    voice: VoiceInput,
    focus_handle: FocusHandle,
    scroll_handle: ScrollHandle,
    _recording_refresh_task: Option<Task<()>>,
}

impl ScrumBot {
    pub fn new(
        settings: ClientSettings,
        api: Arc<dyn ScrumApi>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let sink: Arc<dyn AudioSink> = if settings.mute {
            Arc::new(MutedSink)
        } else {
            Arc::new(PipeWireSink::new())
        };
        let sequencer = SpeechSequencer::new(api.clone(), sink, settings.segment_pause);

        let focus_handle = cx.focus_handle();
        window.focus(&focus_handle);

        Self {
            state: AppState::new(),
            settings,
            api,
            sequencer,
            voice: VoiceInput::new(Box::new(AudioCapture::new())),
            focus_handle,
            scroll_handle: ScrollHandle::new(),
            _recording_refresh_task: None,
        }
    }

    /// Show the chat; the first visit fetches the greeting and task list
    fn open_chat(&mut self, cx: &mut Context<Self>) {
        if self.state.navigate_to(Route::Chat) {
            self.start_conversation(cx);
            self.load_todo_tasks(cx);
        }
        cx.notify();
    }

    /// Back to the landing page; an open recording is discarded
    fn leave_chat(&mut self, cx: &mut Context<Self>) {
        self.voice.cancel_recording();
        self._recording_refresh_task = None;
        self.state.navigate_to(Route::Landing);
        cx.notify();
    }

    fn start_conversation(&mut self, cx: &mut Context<Self>) {
        let api = self.api.clone();
        let request = tokio_runtime::spawn(cx, async move { api.start_conversation().await });

        cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            let response = request.await.unwrap_or_else(|e| {
                warn!("Greeting request aborted: {}", e);
                ApiResponse::failure("Failed to start conversation")
            });
            let _ = this.update(cx, |this, cx| {
                let segments = this.state.session.apply_greeting(response);
                this.speak(segments, cx);
                this.scroll_handle.scroll_to_bottom();
                cx.notify();
            });
        })
        .detach();
    }

    fn load_todo_tasks(&mut self, cx: &mut Context<Self>) {
        let api = self.api.clone();
        let request = tokio_runtime::spawn(cx, async move { api.todo_tasks().await });

        cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            let tasks = request.await.unwrap_or_default();
            let _ = this.update(cx, |this, cx| {
                this.state.todo_tasks = tasks;
                cx.notify();
            });
        })
        .detach();
    }

    /// Send the composer text, if there is any and nothing is in flight
    fn submit_text(&mut self, cx: &mut Context<Self>) {
        let is_processing = self.state.session.is_processing();
        let Some(text) = self.voice.take_text(is_processing) else {
            return;
        };
        let Some(pending) = self.state.session.begin_text(&text) else {
            return;
        };
        self.scroll_handle.scroll_to_bottom();
        cx.notify();

        let api = self.api.clone();
        let request = tokio_runtime::spawn(cx, async move {
            api.send_message(&pending.text, &pending.stage).await
        });

        cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            let response = request.await.unwrap_or_else(|e| {
                warn!("Chat request aborted: {}", e);
                ApiResponse::failure("Failed to send message")
            });
            let _ = this.update(cx, |this, cx| {
                if let Some(reply) = this.state.session.finish_text(response) {
                    this.speak(vec![reply], cx);
                }
                this.scroll_handle.scroll_to_bottom();
                cx.notify();
            });
        })
        .detach();
    }

    fn submit_audio(&mut self, audio: RecordedAudio, cx: &mut Context<Self>) {
        let Some(stage) = self.state.session.begin_audio() else {
            return;
        };
        cx.notify();

        let api = self.api.clone();
        let request =
            tokio_runtime::spawn(cx, async move { api.process_audio(&audio, &stage).await });

        cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            let response = request.await.unwrap_or_else(|e| {
                warn!("Audio request aborted: {}", e);
                ApiResponse::failure("Failed to process audio")
            });
            let _ = this.update(cx, |this, cx| {
                if let Some(reply) = this.state.session.finish_audio(response) {
                    this.speak(vec![reply], cx);
                }
                this.scroll_handle.scroll_to_bottom();
                cx.notify();
            });
        })
        .detach();
    }

    /// Play segments through the sequencer, replacing any current speech
    fn speak(&mut self, segments: Vec<String>, cx: &mut Context<Self>) {
        if segments.is_empty() {
            return;
        }
        let sequencer = self.sequencer.clone();
        let playback =
            tokio_runtime::spawn(cx, async move { sequencer.play_segments(&segments).await });

        cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            let _ = playback.await;
            let _ = this.update(cx, |_, cx| cx.notify());
        })
        .detach();
        cx.notify();
    }

    fn stop_speaking(&mut self, cx: &mut Context<Self>) {
        self.sequencer.stop();
        cx.notify();
    }

    fn toggle_recording(&mut self, cx: &mut Context<Self>) {
        if self.voice.is_recording() {
            if let Some(audio) = self.voice.stop_recording() {
                self.submit_audio(audio, cx);
            }
            cx.notify();
            return;
        }

        let is_processing = self.state.session.is_processing();
        if self.voice.start_recording(Instant::now(), is_processing).is_ok()
            && self.voice.is_recording()
        {
            self.start_recording_refresh(cx);
        }
        cx.notify();
    }

    /// Poll level, duration and the cap once per frame while recording
    fn start_recording_refresh(&mut self, cx: &mut Context<Self>) {
        self._recording_refresh_task = Some(cx.spawn({
            async move |this: WeakEntity<Self>, cx: &mut AsyncApp| loop {
                // Wait ~60fps refresh rate
                cx.background_executor()
                    .timer(Duration::from_millis(16))
                    .await;

                let still_recording = this.update(cx, |this, cx| {
                    if let Some(audio) = this.voice.tick(Instant::now()) {
                        this.submit_audio(audio, cx);
                    }
                    cx.notify();
                    this.voice.is_recording()
                });
                if !matches!(still_recording, Ok(true)) {
                    break;
                }
            }
        }));
    }

    fn refresh_summary(&mut self, cx: &mut Context<Self>) {
        if self.state.is_refreshing_summary {
            return;
        }
        self.state.is_refreshing_summary = true;
        cx.notify();

        let api = self.api.clone();
        let project_key = self.settings.project_key.clone();
        let request =
            tokio_runtime::spawn(cx, async move { api.project_summary(&project_key).await });

        cx.spawn(async move |this: WeakEntity<Self>, cx: &mut AsyncApp| {
            let response = request.await.unwrap_or_else(|e| {
                warn!("Summary request aborted: {}", e);
                ApiResponse::failure("Failed to fetch project summary")
            });
            let _ = this.update(cx, |this, cx| {
                this.state.is_refreshing_summary = false;
                match response.project_summary() {
                    Some(summary) => {
                        info!("Project summary refreshed for {}", summary.project_key);
                        this.state.session.set_project_summary(summary);
                    }
                    None => warn!(
                        "No project summary available: {}",
                        response.message.as_deref().unwrap_or("empty response")
                    ),
                }
                cx.notify();
            });
        })
        .detach();
    }

    fn handle_key(&mut self, event: &KeyDownEvent, window: &mut Window, cx: &mut Context<Self>) {
        let keystroke = &event.keystroke;
        let control = keystroke.modifiers.control || keystroke.modifiers.platform;
        let is_processing = self.state.session.is_processing();

        match keystroke.key.as_str() {
            "f1" => self.state.toggle_help(),
            "escape" => {
                if self.state.show_help {
                    self.state.toggle_help();
                } else if self.sequencer.is_speaking() {
                    self.stop_speaking(cx);
                }
            }
            "q" if control => {
                self.voice.cancel_recording();
                self.sequencer.stop();
                window.remove_window();
            }
            _ if self.state.route == Route::Landing => {
                if keystroke.key == "enter" {
                    self.open_chat(cx);
                }
            }
            "r" if control => self.toggle_recording(cx),
            "enter" => self.submit_text(cx),
            "backspace" => self.voice.backspace(is_processing),
            _ if !control && !keystroke.modifiers.alt => {
                if let Some(input) = keystroke.key_char.as_deref() {
                    if !input.chars().any(char::is_control) {
                        self.voice.push_str(input, is_processing);
                    }
                }
            }
            _ => {}
        }
        cx.notify();
    }
}

impl Render for ScrumBot {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let show_help = self.state.show_help;

        div()
            .size_full()
            .relative()
            .flex()
            .flex_col()
            .bg(rgb(0x0f0f1a))
            .track_focus(&self.focus_handle)
            .key_context("ScrumBot")
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                this.handle_key(event, window, cx);
            }))
            .child(match self.state.route {
                Route::Landing => self.render_landing(cx).into_any_element(),
                Route::Chat => self.render_chat(cx).into_any_element(),
            })
            .when(show_help, |el| el.child(render_help_overlay()))
    }
}

impl ScrumBot {
    fn render_landing(&self, cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .flex()
            .flex_col()
            .items_center()
            .justify_center()
            .size_full()
            .gap_8()
            .bg(rgb(0x16213e))
            .child(
                div()
                    .flex()
                    .flex_col()
                    .items_center()
                    .gap_2()
                    .child(
                        div()
                            .text_3xl()
                            .font_weight(FontWeight::BOLD)
                            .text_color(rgb(0x60a5fa))
                            .child("ScrumBot"),
                    )
                    .child(
                        div()
                            .text_lg()
                            .text_color(rgb(0xcccccc))
                            .child("Your daily stand-up, spoken or typed"),
                    ),
            )
            .child(
                div()
                    .flex()
                    .gap_4()
                    .child(feature_card(
                        "Talk it through",
                        "Answer the stand-up questions with your voice",
                    ))
                    .child(feature_card(
                        "Hear the replies",
                        "Every answer is read back to you",
                    ))
                    .child(feature_card(
                        "See the project",
                        "Epics and stories at a glance",
                    )),
            )
            .child(
                pill_button("btn-start", "Start stand-up", 0x3b82f6, true)
                    .px_8()
                    .py_3()
                    .on_click(cx.listener(|this, _, _w, cx| {
                        this.open_chat(cx);
                    })),
            )
            .child(
                div()
                    .text_sm()
                    .text_color(rgb(0x888888))
                    .child("Press Enter to start, F1 for help"),
            )
    }

    fn render_chat(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let session = &self.state.session;
        let is_processing = session.is_processing();
        let is_speaking = self.sequencer.is_speaking();

        div()
            .flex()
            .size_full()
            .child(
                div()
                    .flex()
                    .flex_col()
                    .flex_grow()
                    .h_full()
                    .child(self.render_chat_header(is_speaking, cx))
                    .child(
                        div()
                            .id("chat-messages")
                            .flex()
                            .flex_col()
                            .flex_grow()
                            .gap_3()
                            .p_4()
                            .overflow_y_scroll()
                            .track_scroll(&self.scroll_handle)
                            .children(session.messages().iter().map(render_message))
                            .when_some(session.project_summary(), |el, summary| {
                                el.child(render_summary(summary, &self.state.summary_view, cx))
                            })
                            .when(is_processing, |el| el.child(render_typing_indicator())),
                    )
                    .child(self.render_composer(is_processing, cx)),
            )
            .child(render_todo_panel(&self.state.todo_tasks))
    }

    fn render_chat_header(&self, is_speaking: bool, cx: &mut Context<Self>) -> impl IntoElement {
        let refreshing = self.state.is_refreshing_summary;

        div()
            .flex()
            .items_center()
            .justify_between()
            .px_4()
            .h(px(48.0))
            .bg(rgb(0x12121f))
            .border_b_1()
            .border_color(rgb(0x2d2d44))
            .child(
                div()
                    .flex()
                    .items_center()
                    .gap_3()
                    .child(
                        pill_button("btn-home", "Home", 0x2d2d44, true).on_click(cx.listener(
                            |this, _, _w, cx| {
                                this.leave_chat(cx);
                            },
                        )),
                    )
                    .child(
                        div()
                            .font_weight(FontWeight::SEMIBOLD)
                            .text_color(rgb(0xffffff))
                            .child("ScrumBot"),
                    )
                    .child(
                        div()
                            .text_xs()
                            .text_color(rgb(0x888888))
                            .child(format!("stage: {}", self.state.session.stage())),
                    ),
            )
            .child(
                div()
                    .flex()
                    .items_center()
                    .gap_2()
                    .when(is_speaking, |el| {
                        el.child(
                            pill_button("btn-stop-speech", "Stop speaking", 0xe94560, true)
                                .on_click(cx.listener(|this, _, _w, cx| {
                                    this.stop_speaking(cx);
                                })),
                        )
                    })
                    .child(
                        pill_button(
                            "btn-refresh",
                            if refreshing { "Refreshing..." } else { "Project status" },
                            0x3b82f6,
                            !refreshing,
                        )
                        .on_click(cx.listener(|this, _, _w, cx| {
                            this.refresh_summary(cx);
                        })),
                    ),
            )
    }

    fn render_composer(&self, is_processing: bool, cx: &mut Context<Self>) -> impl IntoElement {
        let voice = &self.voice;
        let is_recording = voice.is_recording();
        let can_edit = voice.can_edit_text(is_processing);
        let can_send = voice.can_submit_text(is_processing);
        let can_record = voice.can_toggle_recording(is_processing);
        let text = voice.text().to_string();
        let level = voice.level();
        let duration = voice.duration().as_secs_f64();

        div()
            .flex()
            .flex_col()
            .gap_2()
            .p_4()
            .bg(rgb(0x12121f))
            .border_t_1()
            .border_color(rgb(0x2d2d44))
            .child(
                div()
                    .flex()
                    .items_center()
                    .gap_2()
                    .child(
                        div()
                            .flex_grow()
                            .px_4()
                            .py_2()
                            .rounded_lg()
                            .bg(rgb(0x1f2937))
                            .border_1()
                            .border_color(rgb(0x2d2d44))
                            .when(!can_edit, |el| el.opacity(0.5))
                            .text_color(if text.is_empty() {
                                rgb(0x666666)
                            } else {
                                rgb(0xffffff)
                            })
                            .child(if text.is_empty() {
                                "Type your message...".to_string()
                            } else if can_edit {
                                format!("{}|", text)
                            } else {
                                text
                            }),
                    )
                    .child(
                        pill_button(
                            "btn-mic",
                            if is_recording { "Stop" } else { "Mic" },
                            if is_recording { 0xdc2626 } else { 0x2563eb },
                            can_record,
                        )
                        .on_click(cx.listener(|this, _, _w, cx| {
                            this.toggle_recording(cx);
                        })),
                    )
                    .child(
                        pill_button("btn-send", "Send", 0x2563eb, can_send).on_click(
                            cx.listener(|this, _, _w, cx| {
                                this.submit_text(cx);
                            }),
                        ),
                    ),
            )
            .when(is_recording, |el| {
                el.child(
                    div()
                        .flex()
                        .items_center()
                        .gap_2()
                        .child(
                            div()
                                .flex_grow()
                                .h(px(8.0))
                                .rounded_full()
                                .bg(rgb(0x374151))
                                .child(
                                    div()
                                        .h_full()
                                        .w(relative(level))
                                        .rounded_full()
                                        .bg(rgb(0xef4444)),
                                ),
                        )
                        .child(
                            div()
                                .text_sm()
                                .text_color(rgb(0x9ca3af))
                                .child(format!(
                                    "{:.1}s / {}s",
                                    duration,
                                    MAX_RECORDING.as_secs()
                                )),
                        ),
                )
            })
            .when_some(voice.notice(), |el, notice| {
                el.child(div().text_sm().text_color(rgb(0xf87171)).child(notice))
            })
            .when(is_processing, |el| {
                el.child(
                    div()
                        .text_sm()
                        .text_color(rgb(0x9ca3af))
                        .child("Processing..."),
                )
            })
    }
}

/// Clickable rounded label; disabled buttons are dimmed
fn pill_button(
    id: impl Into<ElementId>,
    label: impl Into<SharedString>,
    color: u32,
    enabled: bool,
) -> Stateful<Div> {
    div()
        .id(id)
        .px_4()
        .py_2()
        .rounded_lg()
        .bg(rgb(color))
        .text_color(rgb(0xffffff))
        .font_weight(FontWeight::SEMIBOLD)
        .when(enabled, |el| {
            el.cursor_pointer().hover(|style| style.opacity(0.9))
        })
        .when(!enabled, |el| el.opacity(0.5))
        .child(label.into())
}

fn feature_card(title: &str, body: &str) -> impl IntoElement {
    div()
        .w(px(220.0))
        .p_4()
        .rounded_lg()
        .bg(rgb(0x1a1a2e))
        .border_1()
        .border_color(rgb(0x2d2d44))
        .flex()
        .flex_col()
        .gap_1()
        .child(
            div()
                .font_weight(FontWeight::SEMIBOLD)
                .text_color(rgb(0xffffff))
                .child(title.to_string()),
        )
        .child(
            div()
                .text_sm()
                .text_color(rgb(0xaaaaaa))
                .child(body.to_string()),
        )
}

fn render_message(message: &Message) -> impl IntoElement {
    let is_user = message.is_user;

    div()
        .flex()
        .w_full()
        .when(is_user, |el| el.justify_end())
        .when(!is_user, |el| el.justify_start())
        .child(
            div()
                .max_w(px(560.0))
                .px_4()
                .py_3()
                .rounded_xl()
                .bg(if is_user { rgb(0x4338ca) } else { rgb(0x1f2937) })
                .flex()
                .flex_col()
                .gap_1()
                .child(
                    div()
                        .text_xs()
                        .font_weight(FontWeight::SEMIBOLD)
                        .text_color(if is_user { rgb(0xa5b4fc) } else { rgb(0x60a5fa) })
                        .child(if is_user { "You" } else { "AI Assistant" }),
                )
                .when(message.transcript.is_some(), |el| {
                    el.child(
                        div()
                            .text_xs()
                            .text_color(rgb(0xd1d5db))
                            .child("Transcript"),
                    )
                })
                .child(
                    div()
                        .text_color(rgb(0xffffff))
                        .child(message.text.clone()),
                )
                .child(
                    div()
                        .text_xs()
                        .text_color(rgb(0x9ca3af))
                        .child(message.time_label()),
                ),
        )
}

fn render_typing_indicator() -> impl IntoElement {
    div().flex().gap_1().px_4().py_3().children((0..3).map(|_| {
        div()
            .w(px(8.0))
            .h(px(8.0))
            .rounded_full()
            .bg(rgb(0x60a5fa))
    }))
}

fn render_summary(
    summary: &ProjectSummary,
    view: &SummaryViewState,
    cx: &mut Context<ScrumBot>,
) -> impl IntoElement {
    div()
        .mt_8()
        .p_6()
        .rounded_lg()
        .bg(rgb(0x111827))
        .flex()
        .flex_col()
        .gap_4()
        .child(
            div()
                .text_xl()
                .font_weight(FontWeight::SEMIBOLD)
                .text_color(rgb(0x60a5fa))
                .child("Project Status Report"),
        )
        .child(
            div()
                .flex()
                .flex_col()
                .gap_1()
                .pb_4()
                .border_b_1()
                .border_color(rgb(0x374151))
                .child(
                    div()
                        .text_2xl()
                        .font_weight(FontWeight::BOLD)
                        .text_color(rgb(0x60a5fa))
                        .child(format!("{} ({})", summary.project_name, summary.project_key)),
                )
                .child(
                    div()
                        .text_sm()
                        .text_color(rgb(0x9ca3af))
                        .child(format!(
                            "Last Updated: {}",
                            format_timestamp(&summary.last_updated)
                        )),
                ),
        )
        .children(
            summary
                .epics
                .iter()
                .map(|epic| render_epic(epic, view.is_expanded(&epic.key), cx)),
        )
}

fn render_epic(epic: &Epic, expanded: bool, cx: &mut Context<ScrumBot>) -> impl IntoElement {
    let key = epic.key.clone();
    let status = StatusColor::for_status(&epic.status);

    div()
        .flex()
        .flex_col()
        .rounded_lg()
        .bg(rgb(0x1f2937))
        .overflow_hidden()
        .child(
            div()
                .id(SharedString::from(format!("epic-{}", epic.key)))
                .flex()
                .items_center()
                .justify_between()
                .px_4()
                .py_3()
                .cursor_pointer()
                .hover(|style| style.bg(rgb(0x374151)))
                .on_click(cx.listener(move |this, _, _w, cx| {
                    this.state.summary_view.toggle(&key);
                    cx.notify();
                }))
                .child(
                    div()
                        .flex()
                        .items_center()
                        .gap_3()
                        .child(
                            div()
                                .text_color(rgb(0x60a5fa))
                                .child(if expanded { "v" } else { ">" }),
                        )
                        .child(
                            div()
                                .flex()
                                .flex_col()
                                .gap_1()
                                .child(
                                    div()
                                        .flex()
                                        .gap_2()
                                        .child(
                                            div()
                                                .font_weight(FontWeight::MEDIUM)
                                                .text_color(rgb(0xf3f4f6))
                                                .child(epic.summary.clone()),
                                        )
                                        .child(
                                            div()
                                                .text_sm()
                                                .text_color(rgb(0x9ca3af))
                                                .child(epic.key.clone()),
                                        ),
                                )
                                .child(
                                    div()
                                        .flex()
                                        .items_center()
                                        .gap_3()
                                        .text_sm()
                                        .text_color(rgb(0x9ca3af))
                                        .child(epic.assignee.clone())
                                        .child(status_badge(&epic.status, status)),
                                ),
                        ),
                )
                .child(
                    div()
                        .flex()
                        .flex_col()
                        .items_end()
                        .gap_1()
                        .child(
                            div()
                                .text_sm()
                                .text_color(rgb(0x9ca3af))
                                .child(format!(
                                    "Progress: {}/{}",
                                    epic.progress.completed, epic.progress.total
                                )),
                        )
                        .child(
                            div()
                                .w(px(128.0))
                                .h(px(8.0))
                                .rounded_full()
                                .bg(rgb(0x374151))
                                .child(
                                    div()
                                        .h_full()
                                        .w(relative(epic.progress_fraction()))
                                        .rounded_full()
                                        .bg(rgb(0x3b82f6)),
                                ),
                        ),
                ),
        )
        .when(expanded, |el| {
            el.child(
                div()
                    .flex()
                    .flex_col()
                    .gap_3()
                    .p_4()
                    .border_t_1()
                    .border_color(rgb(0x374151))
                    .children(epic.stories.iter().map(render_story)),
            )
        })
}

fn render_story(story: &Story) -> impl IntoElement {
    let status = StatusColor::for_status(&story.status);

    div()
        .flex()
        .justify_between()
        .p_3()
        .rounded_md()
        .bg(rgb(0x111827))
        .child(
            div()
                .flex()
                .flex_col()
                .gap_1()
                .child(
                    div()
                        .flex()
                        .gap_2()
                        .child(
                            div()
                                .text_color(rgb(0xf3f4f6))
                                .child(story.summary.clone()),
                        )
                        .child(
                            div()
                                .text_sm()
                                .text_color(rgb(0x9ca3af))
                                .child(story.key.clone()),
                        ),
                )
                .child(
                    div()
                        .flex()
                        .gap_3()
                        .text_xs()
                        .text_color(rgb(0x9ca3af))
                        .child(story.assignee.clone())
                        .child(format!("Priority: {}", story.priority))
                        .child(format!("Updated: {}", format_timestamp(&story.updated))),
                ),
        )
        .child(status_badge(&story.status, status))
}

fn status_badge(label: &str, status: StatusColor) -> impl IntoElement {
    div()
        .px_2()
        .rounded_full()
        .text_xs()
        .text_color(rgb(0xffffff))
        .bg(rgb(status.rgb()))
        .child(label.to_string())
}

fn render_todo_panel(tasks: &[TodoTask]) -> impl IntoElement {
    div()
        .w(px(260.0))
        .h_full()
        .flex()
        .flex_col()
        .gap_2()
        .p_4()
        .bg(rgb(0x12121f))
        .border_l_1()
        .border_color(rgb(0x2d2d44))
        .child(
            div()
                .text_base()
                .font_weight(FontWeight::SEMIBOLD)
                .text_color(rgb(0xe94560))
                .child("Your to-do"),
        )
        .when(tasks.is_empty(), |el| {
            el.child(
                div()
                    .text_sm()
                    .text_color(rgb(0x666666))
                    .child("No open tasks"),
            )
        })
        .children(tasks.iter().map(|task| {
            div()
                .flex()
                .flex_col()
                .p_2()
                .rounded_md()
                .bg(rgb(0x1a1a2e))
                .child(
                    div()
                        .text_xs()
                        .text_color(rgb(0x9ca3af))
                        .child(format!("{} - {}", task.key, task.status)),
                )
                .child(
                    div()
                        .text_sm()
                        .text_color(rgb(0xcccccc))
                        .child(task.summary.clone()),
                )
        }))
}

fn render_help_overlay() -> impl IntoElement {
    div()
        .absolute()
        .inset_0()
        .bg(rgba(0x000000aa))
        .flex()
        .items_center()
        .justify_center()
        .child(
            div()
                .w(px(520.0))
                .bg(rgb(0x1a1a2e))
                .rounded_xl()
                .border_1()
                .border_color(rgb(0x2d2d44))
                .overflow_hidden()
                .flex()
                .flex_col()
                .child(
                    div()
                        .px_6()
                        .py_4()
                        .border_b_1()
                        .border_color(rgb(0x2d2d44))
                        .flex()
                        .justify_between()
                        .items_center()
                        .child(
                            div()
                                .text_xl()
                                .font_weight(FontWeight::BOLD)
                                .text_color(rgb(0xffffff))
                                .child("ScrumBot Help"),
                        )
                        .child(
                            div()
                                .text_sm()
                                .text_color(rgb(0x888888))
                                .child("Press ESC or F1 to close"),
                        ),
                )
                .child(
                    div().p_6().flex().flex_col().gap_4().child(help_section(
                        "Keyboard Shortcuts",
                        vec![
                            ("F1", "Toggle this help"),
                            ("Enter", "Start / send message"),
                            ("Ctrl+R", "Start/stop recording"),
                            ("Escape", "Stop speaking / close"),
                            ("Ctrl+Q", "Quit"),
                        ],
                    )),
                ),
        )
}

fn help_section(title: &str, items: Vec<(&str, &str)>) -> impl IntoElement {
    div()
        .flex()
        .flex_col()
        .gap_2()
        .child(
            div()
                .text_base()
                .font_weight(FontWeight::SEMIBOLD)
                .text_color(rgb(0xe94560))
                .child(title.to_string()),
        )
        .child(
            div()
                .flex()
                .flex_col()
                .gap_1()
                .children(items.into_iter().map(|(key, desc)| {
                    div()
                        .flex()
                        .gap_4()
                        .child(
                            div()
                                .w(px(80.0))
                                .px_2()
                                .py_1()
                                .rounded_sm()
                                .bg(rgb(0x2d2d44))
                                .text_sm()
                                .text_color(rgb(0xe94560))
                                .child(key.to_string()),
                        )
                        .child(
                            div()
                                .text_sm()
                                .text_color(rgb(0xcccccc))
                                .child(desc.to_string()),
                        )
                })),
        )
}
