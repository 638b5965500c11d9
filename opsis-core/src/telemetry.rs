//! Telemetry state model
//!
//! Four independently-updated fields driven by inbound broker messages.
//! Fields start at defined defaults and hold their last value between
//! updates; nothing expires and nothing is ever "missing".

use log::warn;

/// Maximum length of the printer state text
pub const MAX_STATE_LEN: usize = 32;

/// The four topic strings the panel subscribes to
#[derive(Debug, Clone)]
pub struct TopicSet {
    pub nozzle: String,
    pub bed: String,
    pub progress: String,
    pub state: String,
}

impl TopicSet {
    /// Iterate all topics, for subscription
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            self.nozzle.as_str(),
            self.bed.as_str(),
            self.progress.as_str(),
            self.state.as_str(),
        ]
        .into_iter()
    }
}

/// Which telemetry field a message updated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ToolTemp,
    BedTemp,
    Progress,
    State,
}

/// Last-known printer telemetry
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryState {
    /// Print progress in percent
    pub progress: f64,
    /// Nozzle temperature in °C
    pub tool_temp: f64,
    /// Bed temperature in °C
    pub bed_temp: f64,
    /// Printer run state as free text
    pub state: heapless::String<MAX_STATE_LEN>,
}

impl Default for TelemetryState {
    fn default() -> Self {
        let mut state = heapless::String::new();
        let _ = state.push_str("Idle");
        Self {
            progress: 0.0,
            tool_temp: 0.0,
            bed_temp: 0.0,
            state,
        }
    }
}

impl TelemetryState {
    /// Dispatch one inbound message.
    ///
    /// Classifies `topic` against the four known topics and updates exactly
    /// the matching field. Unrecognized topics return `None` and are
    /// silently ignored; the caller still redraws the panel either way.
    ///
    /// A payload that fails to parse (bad number, invalid UTF-8) leaves the
    /// field at its prior value (logged) rather than clearing it.
    pub fn apply(&mut self, topics: &TopicSet, topic: &str, payload: &[u8]) -> Option<Field> {
        if topic == topics.progress {
            update_number(&mut self.progress, topic, payload);
            Some(Field::Progress)
        } else if topic == topics.bed {
            update_number(&mut self.bed_temp, topic, payload);
            Some(Field::BedTemp)
        } else if topic == topics.nozzle {
            update_number(&mut self.tool_temp, topic, payload);
            Some(Field::ToolTemp)
        } else if topic == topics.state {
            match core::str::from_utf8(payload) {
                Ok(text) => {
                    self.state.clear();
                    for ch in text.chars() {
                        if self.state.push(ch).is_err() {
                            break;
                        }
                    }
                }
                Err(_) => warn!("invalid UTF-8 state payload on {topic}, keeping prior value"),
            }
            Some(Field::State)
        } else {
            None
        }
    }
}

fn update_number(field: &mut f64, topic: &str, payload: &[u8]) {
    match core::str::from_utf8(payload).ok().and_then(|s| s.trim().parse().ok()) {
        Some(value) => *field = value,
        None => warn!("unparseable numeric payload on {topic}, keeping prior value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> TopicSet {
        TopicSet {
            nozzle: "printer/temp/tool".into(),
            bed: "printer/temp/bed".into(),
            progress: "printer/progress".into(),
            state: "printer/state".into(),
        }
    }

    #[test]
    fn defaults_are_defined() {
        let state = TelemetryState::default();
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.tool_temp, 0.0);
        assert_eq!(state.bed_temp, 0.0);
        assert_eq!(state.state.as_str(), "Idle");
    }

    #[test]
    fn progress_message_updates_exactly_one_field() {
        let topics = topics();
        let mut state = TelemetryState::default();
        let before = state.clone();

        let field = state.apply(&topics, "printer/progress", b"42.5");
        assert_eq!(field, Some(Field::Progress));
        assert_eq!(state.progress, 42.5);
        assert_eq!(state.tool_temp, before.tool_temp);
        assert_eq!(state.bed_temp, before.bed_temp);
        assert_eq!(state.state, before.state);
    }

    #[test]
    fn each_topic_maps_to_its_field() {
        let topics = topics();
        let mut state = TelemetryState::default();

        assert_eq!(
            state.apply(&topics, "printer/temp/tool", b"215.3"),
            Some(Field::ToolTemp)
        );
        assert_eq!(state.tool_temp, 215.3);

        assert_eq!(
            state.apply(&topics, "printer/temp/bed", b"60.0"),
            Some(Field::BedTemp)
        );
        assert_eq!(state.bed_temp, 60.0);

        assert_eq!(
            state.apply(&topics, "printer/state", b"Printing"),
            Some(Field::State)
        );
        assert_eq!(state.state.as_str(), "Printing");
    }

    #[test]
    fn unknown_topic_changes_nothing() {
        let topics = topics();
        let mut state = TelemetryState::default();
        state.apply(&topics, "printer/progress", b"17");
        let before = state.clone();

        assert_eq!(state.apply(&topics, "printer/fan", b"255"), None);
        assert_eq!(state, before);
    }

    #[test]
    fn malformed_number_keeps_prior_value() {
        let topics = topics();
        let mut state = TelemetryState::default();
        state.apply(&topics, "printer/temp/bed", b"60.5");
        state.apply(&topics, "printer/temp/bed", b"not-a-number");
        assert_eq!(state.bed_temp, 60.5);
    }

    #[test]
    fn invalid_utf8_state_keeps_prior_value() {
        let topics = topics();
        let mut state = TelemetryState::default();
        state.apply(&topics, "printer/state", b"Printing");

        let field = state.apply(&topics, "printer/state", b"\xFF\xFE");
        assert_eq!(field, Some(Field::State));
        assert_eq!(state.state.as_str(), "Printing");
    }

    #[test]
    fn overlong_state_text_is_truncated() {
        let topics = topics();
        let mut state = TelemetryState::default();
        let long = "X".repeat(MAX_STATE_LEN + 10);
        state.apply(&topics, "printer/state", long.as_bytes());
        assert_eq!(state.state.len(), MAX_STATE_LEN);
    }

    #[test]
    fn values_persist_between_updates() {
        let topics = topics();
        let mut state = TelemetryState::default();
        state.apply(&topics, "printer/progress", b"80");
        state.apply(&topics, "printer/temp/tool", b"210");
        assert_eq!(state.progress, 80.0);
        assert_eq!(state.tool_temp, 210.0);
    }
}
