use crate::guard::Verdict;
use crate::platform::memory::DispatchOutcome;
use serde_json::json;

/// Format a check result for display (human or JSON)
pub fn format_verdict(verdict: &Verdict, default_message: &str, json: bool) -> String {
    if json {
        let value = json!({
            "blocking": verdict.is_blocking(),
            "message": verdict.resolve(default_message),
            "custom": verdict.message().is_some(),
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    match verdict.resolve(default_message) {
        None => "Clear: nothing blocks leaving the page.".to_string(),
        Some(message) => format!("Blocked: {}", message),
    }
}

/// Format the outcome of an unload dispatch (human or JSON)
pub fn format_unload(outcome: &DispatchOutcome, json: bool) -> String {
    if json {
        let value = json!({
            "event": outcome.event,
            "listeners": outcome.returned.len(),
            "warning": outcome.warning(),
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    let mut output = format!(
        "Dispatched '{}' to {} listener(s)\n",
        outcome.event.event_type,
        outcome.returned.len()
    );
    match outcome.warning() {
        Some(warning) => output.push_str(&format!("Warning shown: {}", warning)),
        None => output.push_str("Page unloads without a warning."),
    }
    output
}

/// Format the subscriptions left after a second registration
pub fn format_register(policy: &str, listeners: usize, json: bool) -> String {
    if json {
        let value = json!({
            "policy": policy,
            "listeners": listeners,
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    format!(
        "Registered again with policy '{}': {} active listener(s)",
        policy, listeners
    )
}

/// Format the result of a gated action
pub fn format_action(label: &str, ran: bool, still_registered: bool) -> String {
    let mut output = if ran {
        format!("Action '{}' ran.", label)
    } else {
        format!("Action '{}' cancelled by the user.", label)
    };

    output.push_str(if still_registered {
        "\nUnload guard: registered"
    } else {
        "\nUnload guard: unregistered"
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{EventModel, UnloadEvent};

    #[test]
    fn test_format_verdict_human() {
        assert_eq!(
            format_verdict(&Verdict::Clear, "Default", false),
            "Clear: nothing blocks leaving the page."
        );
        assert_eq!(
            format_verdict(&Verdict::Blocked, "Default", false),
            "Blocked: Default"
        );
        assert_eq!(
            format_verdict(&Verdict::with_message("Draft"), "Default", false),
            "Blocked: Draft"
        );
    }

    #[test]
    fn test_format_verdict_json() {
        let output = format_verdict(&Verdict::with_message("Draft"), "Default", true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["blocking"], true);
        assert_eq!(value["message"], "Draft");
        assert_eq!(value["custom"], true);

        let output = format_verdict(&Verdict::Clear, "Default", true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["blocking"], false);
        assert!(value["message"].is_null());
    }

    #[test]
    fn test_format_unload() {
        let mut event = UnloadEvent::new(EventModel::Standard);
        event.return_value = Some("Unsaved".to_string());
        let outcome = DispatchOutcome {
            event,
            returned: vec![Some("Unsaved".to_string())],
        };

        let output = format_unload(&outcome, false);
        assert!(output.starts_with("Dispatched 'beforeunload' to 1 listener(s)"));
        assert!(output.ends_with("Warning shown: Unsaved"));

        let value: serde_json::Value =
            serde_json::from_str(&format_unload(&outcome, true)).unwrap();
        assert_eq!(value["event"]["returnValue"], "Unsaved");
        assert_eq!(value["warning"], "Unsaved");
    }

    #[test]
    fn test_format_register() {
        assert_eq!(
            format_register("replace", 2, false),
            "Registered again with policy 'replace': 2 active listener(s)"
        );
        let value: serde_json::Value =
            serde_json::from_str(&format_register("unregister_first", 1, true)).unwrap();
        assert_eq!(value["policy"], "unregister_first");
        assert_eq!(value["listeners"], 1);
    }

    #[test]
    fn test_format_action() {
        assert_eq!(
            format_action("publish", true, false),
            "Action 'publish' ran.\nUnload guard: unregistered"
        );
        assert!(format_action("publish", false, true).contains("cancelled"));
    }
}
