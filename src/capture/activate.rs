use super::event::{DomEvent, EventTarget};
use super::gate::RecordingGate;
use crate::command::Command;
use crate::dom::ACTIVATION_ATTRIBUTE;
use crate::recorder::buffer::CommandBuffer;
use crate::recorder::channel::{ChannelType, RecordingChannel};
use std::sync::Arc;

/// Records clicks and keyboard activations of tagged elements
///
/// Only elements carrying the activation attribute are replayable targets.
/// Anything else is ignored on purpose.
pub struct ActivateRecorder {
    gate: Arc<RecordingGate>,
    buffer: CommandBuffer,
}

impl ActivateRecorder {
    pub fn new(gate: Arc<RecordingGate>, buffer: CommandBuffer) -> Self {
        Self { gate, buffer }
    }

    fn record(&self, composed_path: &[EventTarget]) {
        match activation_id(composed_path) {
            Some(id) => self.buffer.push(Command::activate(super::now_ms(), id)),
            None => tracing::debug!("Activation target has no {}", ACTIVATION_ATTRIBUTE),
        }
    }
}

fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " " | "Spacebar")
}

/// Activation identifier of the nearest interactive element on the path
fn activation_id(composed_path: &[EventTarget]) -> Option<String> {
    composed_path
        .iter()
        .find(|target| target.is_interactive())
        .and_then(|target| target.attr(ACTIVATION_ATTRIBUTE))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

impl RecordingChannel for ActivateRecorder {
    fn id(&self) -> &str {
        "activate"
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Activate
    }

    fn handle_event(&self, event: &DomEvent) {
        match event {
            DomEvent::Click { composed_path } => {
                if self.gate.allows_recording() {
                    self.record(composed_path);
                }
            }
            DomEvent::KeyDown { key, composed_path } => {
                if !is_activation_key(key) {
                    return;
                }
                let target_interactive = composed_path
                    .first()
                    .is_some_and(EventTarget::is_interactive);
                if target_interactive && self.gate.allows_recording() {
                    self.record(composed_path);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::gate::ReplayFlag;
    use crate::codec::decode;
    use crate::recorder::buffer::tests::RecordingUploader;
    use crate::recorder::buffer::BufferConfig;

    fn recorder() -> (ActivateRecorder, CommandBuffer) {
        let gate = Arc::new(RecordingGate::new(true, ReplayFlag::new()));
        gate.set_user(Some("user-1".to_string()));
        let buffer = CommandBuffer::new(Arc::new(RecordingUploader::default()), BufferConfig::default());
        (ActivateRecorder::new(gate, buffer.clone()), buffer)
    }

    fn tagged_button(id: &str) -> EventTarget {
        EventTarget::new("button").with_attr(ACTIVATION_ATTRIBUTE, id)
    }

    fn recorded_selectors(buffer: &CommandBuffer) -> Vec<String> {
        buffer
            .pending()
            .iter()
            .map(|encoded| {
                let action = decode(encoded);
                action.data["selector"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_click_resolves_interactive_ancestor() {
        let (recorder, buffer) = recorder();
        let path = vec![
            EventTarget::new("svg"),
            EventTarget::new("span"),
            tagged_button("like-post"),
            EventTarget::new("article"),
            EventTarget::new("body"),
        ];

        recorder.handle_event(&DomEvent::Click { composed_path: path });

        assert_eq!(recorded_selectors(&buffer), vec!["like-post"]);
    }

    #[tokio::test]
    async fn test_untagged_interactive_element_is_not_recorded() {
        let (recorder, buffer) = recorder();
        // The tagged wrapper sits above an untagged button, which is the
        // element the user actually activated.
        let path = vec![
            EventTarget::new("button"),
            EventTarget::new("div").with_attr("role", "button").with_attr(ACTIVATION_ATTRIBUTE, "card"),
        ];

        recorder.handle_event(&DomEvent::Click { composed_path: path });
        recorder.handle_event(&DomEvent::Click {
            composed_path: vec![EventTarget::new("p")],
        });

        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_keyboard_activation_keys_only() {
        let (recorder, buffer) = recorder();
        for (key, id) in [("Enter", "enter"), (" ", "space"), ("a", "letter"), ("Escape", "escape")] {
            recorder.handle_event(&DomEvent::KeyDown {
                key: key.to_string(),
                composed_path: vec![tagged_button(id)],
            });
        }

        assert_eq!(recorded_selectors(&buffer), vec!["enter", "space"]);
    }

    #[tokio::test]
    async fn test_keyboard_needs_interactive_tagged_target() {
        let (recorder, buffer) = recorder();

        recorder.handle_event(&DomEvent::KeyDown {
            key: "Enter".to_string(),
            composed_path: vec![EventTarget::new("input").with_attr("type", "text"), tagged_button("form")],
        });
        recorder.handle_event(&DomEvent::KeyDown {
            key: "Enter".to_string(),
            composed_path: vec![EventTarget::new("div"), tagged_button("outer")],
        });

        assert!(buffer.is_empty());
    }
}
