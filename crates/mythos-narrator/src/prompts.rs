//! Prompt construction and reply parsing for the generative narrator.

use std::fmt::Write as _;

use mythos_session::application::narrator::{NarratorError, TurnRequest};
use serde::de::DeserializeOwned;

/// Marker prefixed to the player input that reports a check outcome.
pub const CHECK_RESULT_MARKER: &str = "[check result]";

const GM_ROLE: &str = "You are the game master of a single-player investigative horror \
tabletop game. The player controls one investigator. Keep the tone tense and grounded. \
Never decide the outcome of a skill check yourself: request a check and wait for its result.";

/// System prompt for the opening scenario.
#[must_use]
pub fn scenario_system_prompt() -> String {
    format!(
        "{GM_ROLE}\n\n\
         Reply with a single JSON object and nothing else:\n\
         {{\n  \"outline\": \"five-scene outline of the scenario\",\n  \
         \"guidance\": \"hidden truth, obstacles, key clues and endings\",\n  \
         \"introductionText\": \"opening narration shown to the player\",\n  \
         \"objective\": \"the player's first goal\",\n  \
         \"initialFlags\": [],\n  \
         \"initialInventory\": [\"up to three starting items\"]\n}}"
    )
}

/// User prompt for the opening scenario.
#[must_use]
pub fn scenario_user_prompt(character_name: &str, theme: &str) -> String {
    format!("Investigator: {character_name}\nTheme: {theme}\n\nCreate the scenario.")
}

/// System prompt for a turn.
#[must_use]
pub fn turn_system_prompt() -> String {
    format!(
        "{GM_ROLE}\n\n\
         Reply with a single JSON object and nothing else:\n\
         {{\n  \"playerFacingText\": \"narration for the player\",\n  \
         \"choices\": [\"optional suggested actions\"],\n  \
         \"checkRequest\": {{\"skill\": \"Spot Hidden\", \"difficulty\": \"normal|hard|extreme\", \
         \"purpose\": \"...\", \"failureHint\": \"...\"}},\n  \
         \"statePatch\": {{\"resources\": {{\"currentSAN\": 0, \"currentHP\": 0, \"currentMP\": 0}}, \
         \"flagsAdd\": [], \"flagsRemove\": [], \"inventoryAdd\": [], \"inventoryRemove\": [], \
         \"objective\": \"...\"}},\n  \
         \"endSignal\": {{\"type\": \"success|fail|time_up\", \"reason\": \"...\"}}\n}}\n\
         Omit any field you do not need. Resource values are absolute, not deltas.\n\
         When the input starts with \"{CHECK_RESULT_MARKER}\", narrate that outcome and do not \
         request another check."
    )
}

/// User prompt for a turn, summarising the state the narrator may see.
#[must_use]
pub fn turn_user_prompt(request: &TurnRequest<'_>) -> String {
    let state = request.state;
    let character = &state.character;
    let resources = &character.resources;
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Scenario outline: {}", state.session.outline);
    let _ = writeln!(prompt, "Guidance: {}", state.session.guidance);
    let _ = writeln!(prompt, "Objective: {}", state.world.objective);
    let _ = writeln!(
        prompt,
        "Investigator: {} | SAN {}/{} | HP {}/{} | MP {}/{}",
        character.profile.name,
        resources.sanity.current,
        resources.sanity.max,
        resources.hit_points.current,
        resources.hit_points.max,
        resources.magic_points.current,
        resources.magic_points.max,
    );
    let _ = writeln!(prompt, "Inventory: {}", join_or_none(&character.inventory));
    let _ = writeln!(prompt, "Flags: {}", join_or_none(&state.world.flags));
    let skills: Vec<String> = character
        .skills
        .iter()
        .map(|(name, rating)| format!("{name} {rating}"))
        .collect();
    let _ = writeln!(prompt, "Skills: {}", join_or_none(&skills));

    prompt.push_str("\nRecent log:\n");
    for message in request.recent_messages() {
        let _ = writeln!(prompt, "[{}] {}", message.kind.as_str(), message.text);
    }

    let _ = write!(prompt, "\nPlayer input: {}", request.player_input);
    if request.player_input.starts_with(CHECK_RESULT_MARKER) {
        prompt.push_str("\n\nThis is a check result. Do not include a checkRequest.");
    }
    prompt
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_owned()
    } else {
        items.join(", ")
    }
}

/// Slices the JSON object out of a model reply, tolerating code fences
/// and surrounding prose.
#[must_use]
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parses a model reply into `T`.
///
/// # Errors
///
/// Returns `NarratorError::Malformed` if the reply holds no JSON object or
/// the object does not match `T`.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T, NarratorError> {
    let json = extract_json(text)
        .ok_or_else(|| NarratorError::Malformed("no JSON object in reply".to_owned()))?;
    serde_json::from_str(json).map_err(|e| NarratorError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mythos_session::application::narrator::TurnResponse;
    use mythos_session::domain::log::MessageKind;
    use mythos_session::domain::state::SessionState;
    use mythos_rules::domain::resolution::Difficulty;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn state() -> SessionState {
        let mut state = SessionState::new(Uuid::new_v4(), "fog");
        state.world.objective = "Find the cellar".to_owned();
        state.character.inventory = vec!["lamp".to_owned()];
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        for n in 0..7 {
            state.log.append(MessageKind::Gm, format!("beat {n}"), now);
        }
        state
    }

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nEnjoy.";

        assert_eq!(extract_json(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_json_none_without_object() {
        assert_eq!(extract_json("no braces here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_parse_reply_turn_response() {
        let reply = r#"```json
{"playerFacingText":"The lock clicks.","checkRequest":{"skill":"Locksmith","difficulty":"hard"}}
```"#;

        let response: TurnResponse = parse_reply(reply).unwrap();

        assert_eq!(response.player_facing_text, "The lock clicks.");
        assert_eq!(response.check_request.unwrap().difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_parse_reply_rejects_unknown_difficulty() {
        let reply =
            r#"{"playerFacingText":"x","checkRequest":{"skill":"Dodge","difficulty":"heroic"}}"#;

        let result: Result<TurnResponse, _> = parse_reply(reply);

        assert!(matches!(result, Err(NarratorError::Malformed(_))));
    }

    #[test]
    fn test_parse_reply_without_json_is_malformed() {
        let result: Result<TurnResponse, _> = parse_reply("I cannot do that.");

        assert!(matches!(result, Err(NarratorError::Malformed(_))));
    }

    #[test]
    fn test_turn_prompt_includes_window_only() {
        let state = state();
        let request = TurnRequest::new(&state, "open the door", 5);

        let prompt = turn_user_prompt(&request);

        assert!(prompt.contains("Objective: Find the cellar"));
        assert!(prompt.contains("Inventory: lamp"));
        assert!(prompt.contains("Flags: (none)"));
        assert!(!prompt.contains("[gm] beat 1"));
        assert!(prompt.contains("[gm] beat 2"));
        assert!(prompt.contains("[gm] beat 6"));
        assert!(prompt.ends_with("Player input: open the door"));
    }

    #[test]
    fn test_turn_prompt_forbids_check_after_check_result() {
        let state = state();
        let request = TurnRequest::new(&state, "[check result] Spot Hidden: Failure", 5);

        let prompt = turn_user_prompt(&request);

        assert!(prompt.ends_with("Do not include a checkRequest."));
    }
}
