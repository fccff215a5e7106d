use serde::Serialize;
use util::ws::envelope_json;

/// An event knows its stable name and the topic it belongs to.
pub trait Event: Serialize {
    const NAME: &'static str;
    /// Return the canonical topic path (e.g., "attendance:class:7").
    fn topic_path(&self) -> String;

    /// The event wrapped in the standard envelope, ready to send as a text frame.
    fn to_frame(&self) -> Option<String>
    where
        Self: Sized,
    {
        envelope_json(&self.topic_path(), Self::NAME, self)
    }
}
