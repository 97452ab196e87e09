//! Event tagging.

use crate::isolate::CheckOutcome;
use beacond_core::{Event, Grains};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct EventTagger {
    prefix: String,
    host_id: String,
}

impl EventTagger {
    pub fn new(prefix: impl Into<String>, host_id: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            host_id: host_id.into(),
        }
    }

    /// Host id from the grains' `id`, falling back to the agent id.
    pub fn for_pass(prefix: &str, agent_id: &str, grains: &Grains) -> Self {
        let host_id = grains
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(agent_id);
        Self::new(prefix, host_id)
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// `<prefix>/<host id>/<beacon name>/`
    pub fn base_tag(&self, beacon_name: &str) -> String {
        format!("{}/{}/{}/", self.prefix, self.host_id, beacon_name)
    }

    pub fn tag(&self, beacon_name: &str, module_id: &str, outcome: CheckOutcome) -> Vec<Event> {
        let base = self.base_tag(beacon_name);
        match outcome {
            CheckOutcome::Failure(message) => vec![Event::failure(base, module_id, message)],
            CheckOutcome::Success(Value::Array(items)) => items
                .into_iter()
                .map(|item| self.finish(&base, module_id, item))
                .collect(),
            CheckOutcome::Success(Value::Null) => Vec::new(),
            CheckOutcome::Success(item) => vec![self.finish(&base, module_id, item)],
        }
    }

    fn finish(&self, base: &str, module_id: &str, mut data: Value) -> Event {
        let mut tag = base.to_string();
        if let Value::Object(map) = &mut data {
            if let Some(Value::String(sub)) = map.get("tag") {
                tag.push_str(sub);
                map.shift_remove("tag");
            }
            if !map.contains_key("id") {
                map.insert("id".into(), Value::String(self.host_id.clone()));
            }
        }
        Event::success(tag, data, module_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagger() -> EventTagger {
        EventTagger::new("salt/beacon", "minion")
    }

    #[test]
    fn canonical_tag_has_trailing_slash() {
        assert_eq!(tagger().base_tag("watch_apache"), "salt/beacon/minion/watch_apache/");
        let t = EventTagger::new("salt/beacon/", "minion");
        assert_eq!(t.base_tag("x"), "salt/beacon/minion/x/");
    }

    #[test]
    fn host_id_prefers_grains() {
        let mut grains = Grains::new();
        grains.insert("id".into(), json!("from-grains"));
        assert_eq!(EventTagger::for_pass("p", "agent", &grains).host_id(), "from-grains");
        assert_eq!(EventTagger::for_pass("p", "agent", &Grains::new()).host_id(), "agent");
    }

    #[test]
    fn failure_is_one_event_with_empty_data() {
        let events = tagger().tag("watch_apache", "ps", CheckOutcome::Failure("boom".into()));
        assert_eq!(
            events,
            vec![Event::failure("salt/beacon/minion/watch_apache/", "ps", "boom")]
        );
    }

    #[test]
    fn one_event_per_item_with_id_injected() {
        let events = tagger().tag(
            "load",
            "status",
            CheckOutcome::Success(json!([{"a": 1}, {"id": "other", "b": 2}])),
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, json!({"a": 1, "id": "minion"}));
        assert_eq!(events[1].data, json!({"id": "other", "b": 2}));
        assert!(events.iter().all(|e| e.beacon_name == "status" && e.error.is_none()));
    }

    #[test]
    fn single_result_and_sub_tag() {
        let events = tagger().tag(
            "inotify",
            "inotify",
            CheckOutcome::Success(json!({"tag": "etc/hosts", "change": "IN_MODIFY"})),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tag, "salt/beacon/minion/inotify/etc/hosts");
        assert_eq!(events[0].data, json!({"change": "IN_MODIFY", "id": "minion"}));
    }

    #[test]
    fn null_and_empty_produce_nothing() {
        assert!(tagger().tag("x", "x", CheckOutcome::Success(Value::Null)).is_empty());
        assert!(tagger().tag("x", "x", CheckOutcome::Success(json!([]))).is_empty());
    }
}
