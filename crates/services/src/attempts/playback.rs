//
// ─── PLAYBACK GATE ─────────────────────────────────────────────────────────────
//

/// Transport state for one section's recording.
///
/// `Ended` is terminal: the exam allows one play per section, so no
/// transition leaves it for the rest of the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Idle,
    Playing,
    Paused,
    Ended,
}

/// Command for the platform media element, produced by [`PlaybackGate::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
}

/// Enforces the one-play rule for a single Listening section and tracks
/// transport state for the UI.
///
/// One gate exists per section and lives for the whole attempt; revisiting
/// a section never resets its gate, so a finished recording stays
/// finished. Progress here is purely observational — the exam clock never
/// consults playback position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackGate {
    transport: Transport,
    position_seconds: f64,
    duration_seconds: Option<f64>,
    warning: Option<String>,
}

impl Default for PlaybackGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: Transport::Idle,
            position_seconds: 0.0,
            duration_seconds: None,
            warning: None,
        }
    }

    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    #[must_use]
    pub fn has_started(&self) -> bool {
        self.transport != Transport::Idle
    }

    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.transport == Transport::Ended
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    #[must_use]
    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    #[must_use]
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }

    /// Non-fatal media problem for this section, if any.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Request play or pause. Returns the command the media element should
    /// execute, or `None` once the recording has ended (the one-play rule
    /// rejects replays).
    pub fn toggle(&mut self) -> Option<TransportCommand> {
        match self.transport {
            Transport::Idle | Transport::Paused => {
                self.transport = Transport::Playing;
                Some(TransportCommand::Play)
            }
            Transport::Playing => {
                self.transport = Transport::Paused;
                Some(TransportCommand::Pause)
            }
            Transport::Ended => None,
        }
    }

    /// The recording ran to its natural end. Forces `Ended` from any state.
    pub fn natural_end(&mut self) {
        self.transport = Transport::Ended;
        if let Some(duration) = self.duration_seconds {
            self.position_seconds = duration;
        }
    }

    /// Request a seek. Returns the clamped target for the media element,
    /// or `None` once ended.
    pub fn seek(&mut self, to_seconds: f64) -> Option<f64> {
        if self.has_ended() {
            return None;
        }
        let upper = self.duration_seconds.unwrap_or(to_seconds.max(0.0));
        let clamped = to_seconds.clamp(0.0, upper);
        self.position_seconds = clamped;
        Some(clamped)
    }

    /// Observational progress from the media element's time updates.
    pub fn position_changed(&mut self, seconds: f64) {
        if !self.has_ended() {
            self.position_seconds = seconds.max(0.0);
        }
    }

    /// Duration from the media element's metadata.
    pub fn duration_loaded(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.duration_seconds = Some(seconds);
        }
    }

    /// The user navigated away mid-play; keep the position, drop to
    /// `Paused` so the gate never claims a recording is playing while its
    /// media element is unmounted.
    pub fn interrupt(&mut self) {
        if self.transport == Transport::Playing {
            self.transport = Transport::Paused;
        }
    }

    /// The section became active again and its media element reloaded.
    /// A finished recording stays finished; anything else starts over
    /// from `Idle` (an unfinished play-through may be restarted).
    pub fn reactivate(&mut self) {
        if self.has_ended() {
            return;
        }
        self.transport = Transport::Idle;
        self.position_seconds = 0.0;
        self.duration_seconds = None;
        self.warning = None;
    }

    /// The media element failed to load or play. Non-fatal: the section's
    /// questions stay answerable, the gate just records the warning.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.warning = Some(reason.into());
        if self.transport == Transport::Playing {
            self.transport = Transport::Paused;
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
