//! Context assembly — builds the bounded prompt for one LLM call.
//!
//! The assembled context has three parts, in order:
//!
//! 1. **System** — the agent's business info plus a bounded preview of each
//!    of the owner's datasets
//! 2. **History** — the most recent N turns for this sender, oldest-first,
//!    reconstructed as alternating user/assistant messages
//! 3. **Inbound** — the new customer message as the final user turn
//!
//! # Determinism
//!
//! Assembly is a pure function over already-fetched rows: identical inputs
//! always produce identical output. Dataset preview field order follows
//! serde_json's sorted object keys.

use deskhand_core::dataset::Dataset;
use deskhand_core::message::ChatMessage;
use deskhand_core::turn::ConversationTurn;
use serde_json::Value;

/// Shown when the agent has no stored business info.
pub const NO_BUSINESS_CONTEXT: &str = "No specific business context provided.";

/// How many sample records each dataset preview includes.
const PREVIEW_RECORDS: usize = 3;
/// How many fields each sample record renders.
const PREVIEW_FIELDS: usize = 3;

/// Build the leading system message from business info and dataset previews.
pub fn build_system_message(business_info: &str, datasets: &[Dataset]) -> String {
    let mut out = String::from(
        "You are an AI assistant representing a business. Answer customer questions \
         using the business information and data below. Be helpful and concise.",
    );

    out.push_str("\n\nBusiness Information:\n");
    if business_info.trim().is_empty() {
        out.push_str(NO_BUSINESS_CONTEXT);
    } else {
        out.push_str(business_info.trim());
    }

    for dataset in datasets {
        out.push_str(&format!(
            "\n\nBusiness Data - {} ({} records):\n",
            dataset.name, dataset.record_count
        ));
        for record in dataset.records.iter().take(PREVIEW_RECORDS) {
            out.push_str("- ");
            out.push_str(&render_record(record));
            out.push('\n');
        }
        if dataset.record_count > PREVIEW_RECORDS {
            out.push_str(&format!(
                "... and {} more records\n",
                dataset.record_count - PREVIEW_RECORDS
            ));
        }
    }

    out
}

/// Render one record as "key: value" pairs, truncated to the first fields.
fn render_record(record: &Value) -> String {
    match record {
        Value::Object(map) => map
            .iter()
            .take(PREVIEW_FIELDS)
            .map(|(key, value)| format!("{key}: {}", render_scalar(value)))
            .collect::<Vec<_>>()
            .join(", "),
        other => render_scalar(other),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Assemble the full message list for one LLM call.
///
/// `recent_turns` arrives most-recent-first (the store's natural order) and
/// is replayed oldest-first. Reconstruction reads the turn's text columns;
/// the stored direction field is informational only.
pub fn assemble(
    business_info: &str,
    datasets: &[Dataset],
    recent_turns: &[ConversationTurn],
    inbound_text: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + recent_turns.len() * 2);
    messages.push(ChatMessage::system(build_system_message(
        business_info,
        datasets,
    )));

    for turn in recent_turns.iter().rev() {
        if !turn.inbound_text.is_empty() {
            messages.push(ChatMessage::user(&turn.inbound_text));
        }
        if !turn.outbound_text.is_empty() {
            messages.push(ChatMessage::assistant(&turn.outbound_text));
        }
    }

    messages.push(ChatMessage::user(inbound_text));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskhand_core::turn::Direction;
    use deskhand_core::ChannelKind;
    use serde_json::json;

    fn dataset(name: &str, records: Vec<Value>) -> Dataset {
        Dataset {
            id: "d1".into(),
            owner_id: "u1".into(),
            name: name.into(),
            description: String::new(),
            source_filename: "data.csv".into(),
            source_type: "csv".into(),
            record_count: records.len(),
            records,
            created_at: Utc::now(),
        }
    }

    fn turn(n: usize) -> ConversationTurn {
        ConversationTurn {
            id: format!("t{n}"),
            owner_id: "u1".into(),
            agent_id: "a1".into(),
            channel: ChannelKind::Telegram,
            sender_id: "555".into(),
            direction: Direction::Incoming,
            inbound_text: format!("question {n}"),
            outbound_text: format!("answer {n}"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn blank_business_info_gets_placeholder() {
        let msg = build_system_message("  ", &[]);
        assert!(msg.contains(NO_BUSINESS_CONTEXT));
    }

    #[test]
    fn business_info_included_verbatim() {
        let msg = build_system_message("We sell sourdough. Open 7-3.", &[]);
        assert!(msg.contains("We sell sourdough. Open 7-3."));
        assert!(!msg.contains(NO_BUSINESS_CONTEXT));
    }

    #[test]
    fn preview_caps_records_at_three() {
        let records: Vec<Value> = (0..10).map(|i| json!({"sku": format!("sku-{i}")})).collect();
        let msg = build_system_message("info", &[dataset("Inventory", records)]);

        assert!(msg.contains("Business Data - Inventory (10 records)"));
        assert!(msg.contains("sku: sku-0"));
        assert!(msg.contains("sku: sku-2"));
        assert!(!msg.contains("sku-3"));
        assert!(msg.contains("... and 7 more records"));
    }

    #[test]
    fn small_dataset_has_no_omission_note() {
        let msg = build_system_message(
            "info",
            &[dataset("Menu", vec![json!({"item": "espresso"}), json!({"item": "latte"})])],
        );
        assert!(msg.contains("(2 records)"));
        assert!(!msg.contains("more records"));
    }

    #[test]
    fn record_fields_truncated_to_three() {
        let record = json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5});
        let msg = build_system_message("info", &[dataset("Wide", vec![record])]);
        // serde_json object keys iterate sorted: a, b, c kept
        assert!(msg.contains("a: 1, b: 2, c: 3"));
        assert!(!msg.contains("d: 4"));
    }

    #[test]
    fn non_object_records_render_as_scalars() {
        let msg = build_system_message("info", &[dataset("List", vec![json!("just a line")])]);
        assert!(msg.contains("- just a line"));
    }

    #[test]
    fn empty_inputs_never_panic() {
        let messages = assemble("", &[], &[], "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, deskhand_core::Role::System);
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn history_replayed_oldest_first() {
        // Store order is most-recent-first: 4, 3, 2
        let turns = vec![turn(4), turn(3), turn(2)];
        let messages = assemble("info", &[], &turns, "new question");

        // system + 3 turns × 2 + inbound
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[1].content, "question 2");
        assert_eq!(messages[2].content, "answer 2");
        assert_eq!(messages[5].content, "question 4");
        assert_eq!(messages[6].content, "answer 4");
        assert_eq!(messages[7].content, "new question");
    }

    #[test]
    fn exactly_k_turns_appear() {
        let turns: Vec<_> = (0..5).rev().map(turn).collect();
        let messages = assemble("info", &[], &turns, "x");
        let user_history: Vec<_> = messages
            .iter()
            .filter(|m| m.role == deskhand_core::Role::User)
            .collect();
        // 5 historical user turns + the inbound
        assert_eq!(user_history.len(), 6);
    }

    #[test]
    fn deterministic_given_identical_inputs() {
        let turns = vec![turn(1)];
        let datasets = vec![dataset("D", vec![json!({"k": "v"})])];
        let a = assemble("info", &datasets, &turns, "q");
        let b = assemble("info", &datasets, &turns, "q");
        assert_eq!(a, b);
    }
}
