use std::sync::Arc;

use campus_nav::{
    ChatMessage, ChatPresentationAdapter, ChatRole, ChatSessionDriver, Destination,
    FinishedSession, LocationSample, LocationStatus, LocationTracker, MapOverlay, Query,
    RecalculationConfig, RouteRecalculationLoop, RouteState, RouteUpdate, SessionHandlers,
    SessionId, SessionPhase, Transition, TravelMode, Urgency,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};
use crate::providers::Backend;

/// Line-oriented output sink.
pub trait Console: Send + Sync {
    fn line(&self, text: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&self, text: &str) {
        println!("{text}");
    }
}

/// Prints reasoning steps as they stream in.
struct ConsoleHandlers {
    console: Arc<dyn Console>,
}

impl SessionHandlers for ConsoleHandlers {
    fn on_reasoning(&mut self, _session_id: SessionId, step: &str) {
        self.console.line(&format!("  > {step}"));
    }
}

/// One chat context: a query session, the location watch, and the route
/// that follows it.
pub struct App {
    console: Arc<dyn Console>,
    driver: ChatSessionDriver,
    tracker: LocationTracker,
    samples: Option<UnboundedReceiver<LocationSample>>,
    route: RouteRecalculationLoop,
    transcript: ChatPresentationAdapter,
    mode: TravelMode,
    urgency: Urgency,
    position: Option<LocationSample>,
    shown_status: Option<LocationStatus>,
    should_exit: bool,
}

impl App {
    pub fn new(
        backend: Backend,
        recalculation: RecalculationConfig,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            console,
            driver: ChatSessionDriver::new(backend.transport),
            tracker: LocationTracker::new(backend.geolocation),
            samples: None,
            route: RouteRecalculationLoop::new(backend.updater, recalculation),
            transcript: ChatPresentationAdapter::new(),
            mode: recalculation.mode,
            urgency: Urgency::default(),
            position: None,
            shown_status: None,
            should_exit: false,
        }
    }

    /// Starts the location watch. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        self.samples = Some(self.tracker.start());
    }

    pub fn shutdown(&mut self) {
        self.driver.cancel();
        self.route.stop();
        self.tracker.stop();
        self.samples = None;
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn phase(&self) -> SessionPhase {
        self.driver.phase()
    }

    pub fn is_streaming(&self) -> bool {
        self.driver.is_streaming()
    }

    pub fn position(&self) -> Option<&LocationSample> {
        self.position.as_ref()
    }

    pub fn route_state(&self) -> &RouteState {
        self.route.state()
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn map_overlay(&self) -> MapOverlay {
        ChatPresentationAdapter::map_overlay(self.route.state(), self.position.as_ref())
    }

    /// Handles one line of user input: a slash command or a question.
    pub fn on_line(&mut self, line: &str) {
        let text = line.trim();
        if text.is_empty() {
            return;
        }

        match parse_slash_command(text) {
            Some(command) => self.on_command(command),
            None => self.submit(text),
        }
    }

    /// Waits for one session, location, or route event and applies it.
    ///
    /// Cancel-safe; pends while nothing is in flight.
    pub async fn step(&mut self) {
        tokio::select! {
            transition = self.driver.next_event() => self.on_transition(transition),
            sample = next_sample(&mut self.samples) => match sample {
                Some(sample) => self.on_sample(sample),
                None => {
                    debug!("location watch ended");
                    self.samples = None;
                }
            },
            update = self.route.next_update() => self.on_route_update(update),
        }
    }

    fn submit(&mut self, text: &str) {
        if self.driver.is_streaming() {
            self.console.line("(previous answer cancelled)");
        }

        let mut query = Query::new(text)
            .with_mode(self.mode)
            .with_urgency(self.urgency);
        if let Some(sample) = self.position {
            query = query.with_location(sample.coord());
        }

        self.transcript.push_user(&query);
        self.driver.submit(
            query,
            Box::new(ConsoleHandlers {
                console: Arc::clone(&self.console),
            }),
        );
    }

    fn on_command(&mut self, command: SlashCommand) {
        match command {
            SlashCommand::Help => self.console.line(HELP_TEXT),
            SlashCommand::Cancel => {
                if self.driver.cancel() {
                    self.console.line("Answer cancelled.");
                } else {
                    self.console.line("Nothing to cancel.");
                }
            }
            SlashCommand::Mode(mode) => {
                self.mode = mode;
                self.route.set_mode(mode);
                self.console.line(&format!("Travel mode: {}", mode.as_str()));
            }
            SlashCommand::Urgency(urgency) => {
                self.urgency = urgency;
                self.console.line(&format!("Urgency: {}", urgency.as_str()));
            }
            SlashCommand::Navigate { destination, name } => {
                let label = name
                    .clone()
                    .unwrap_or_else(|| format!("{:.5}, {:.5}", destination.lat, destination.lng));
                self.route.set_destination(Some(Destination {
                    coord: destination,
                    name,
                }));
                self.console.line(&format!("Navigating to {label}"));
                match self.position {
                    Some(sample) => {
                        self.route.on_sample(sample);
                    }
                    None => self.console.line("Waiting for a position fix."),
                }
            }
            SlashCommand::Stop => {
                self.route.set_destination(None);
                self.route.stop();
                self.console.line("Navigation stopped.");
            }
            SlashCommand::Where => {
                for line in render_overlay(&self.map_overlay(), self.position.as_ref()) {
                    self.console.line(&line);
                }
            }
            SlashCommand::Quit => self.should_exit = true,
            SlashCommand::Usage(usage) => self.console.line(&format!("Usage: {usage}")),
            SlashCommand::Unknown(command) => self
                .console
                .line(&format!("Unknown command {command}. Type /help for commands.")),
        }
    }

    fn on_transition(&mut self, transition: Transition) {
        let Transition::Finished(finished) = transition else {
            return;
        };

        let message = self.transcript.push_finished(&finished).clone();
        for line in render_message(&message) {
            self.console.line(&line);
        }
        if let Some(hint) = navigate_hint(&finished) {
            self.console.line(&hint);
        }
    }

    fn on_sample(&mut self, sample: LocationSample) {
        self.position = Some(sample);
        if self.shown_status != Some(sample.status) {
            self.shown_status = Some(sample.status);
            self.console.line(&format!(
                "location: {}",
                ChatPresentationAdapter::location_status_line(&sample)
            ));
        }
        self.route.on_sample(sample);
    }

    fn on_route_update(&mut self, update: RouteUpdate) {
        match update {
            RouteUpdate::Applied { .. } => {
                let state = self.route.state();
                let remaining = state.distance_remaining.as_deref().unwrap_or("unknown");
                self.console.line(&format!(
                    "route: {} points, {remaining} remaining",
                    state.coordinates.len()
                ));
            }
            RouteUpdate::Failed { error, .. } => {
                self.console.line(&format!("route update failed: {error}"));
            }
            RouteUpdate::Issued { .. } | RouteUpdate::Stale { .. } => {}
        }
    }
}

async fn next_sample(
    samples: &mut Option<UnboundedReceiver<LocationSample>>,
) -> Option<LocationSample> {
    match samples {
        Some(samples) => samples.recv().await,
        None => std::future::pending().await,
    }
}

pub fn render_message(message: &ChatMessage) -> Vec<String> {
    let mut lines = Vec::new();
    match message.role {
        ChatRole::User => lines.push(format!("you: {}", message.content)),
        ChatRole::Assistant => lines.push(format!("assistant: {}", message.content)),
        ChatRole::Error => lines.push(format!("error: {}", message.content)),
    }
    if let Some(distance) = &message.distance {
        lines.push(format!("  distance: {distance}"));
    }
    if let Some(route) = &message.route_coords {
        lines.push(format!("  route: {} points", route.len()));
    }
    if !message.sources.is_empty() {
        lines.push(format!("  sources: {}", message.sources.join(", ")));
    }
    lines
}

fn render_overlay(overlay: &MapOverlay, position: Option<&LocationSample>) -> Vec<String> {
    let mut lines = vec![match position {
        Some(sample) => format!(
            "location: {}",
            ChatPresentationAdapter::location_status_line(sample)
        ),
        None => "location: waiting for a fix".to_string(),
    }];

    match (overlay.destination, &overlay.destination_name) {
        (Some(_), Some(name)) => lines.push(format!("destination: {name}")),
        (Some(coord), None) => lines.push(format!("destination: {:.5}, {:.5}", coord.lat, coord.lng)),
        (None, _) => lines.push("destination: none".to_string()),
    }
    if !overlay.route.is_empty() {
        let remaining = overlay.distance_remaining.as_deref().unwrap_or("unknown");
        lines.push(format!(
            "route: {} points, {remaining} remaining",
            overlay.route.len()
        ));
    }
    lines
}

fn navigate_hint(finished: &FinishedSession) -> Option<String> {
    let end = finished.answer()?.route_coords.last()?;
    Some(format!(
        "  (type /navigate {:.5} {:.5} to follow this route)",
        end.lat, end.lng
    ))
}
