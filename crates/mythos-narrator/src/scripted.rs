//! Deterministic narrator that plays a fixed haunted-mansion scenario.
//!
//! Beats are keyed by the number of player inputs logged so far, counting
//! check results, so the script exercises every kind of narrator output:
//! choices, check requests, state patches and the end signal.

use async_trait::async_trait;
use mythos_rules::domain::resolution::Difficulty;
use mythos_session::application::narrator::{
    InitialScenario, Narrator, NarratorError, TurnRequest, TurnResponse,
};
use mythos_session::domain::patch::{ResourcePatch, StatePatch};
use mythos_session::domain::signals::{CheckRequest, EndKind, EndSignal};

/// Theme used when the player leaves it blank.
pub const DEFAULT_THEME: &str = "a mystery set in a strange old mansion";

/// Sanity assumed when the character has none recorded.
const FALLBACK_SANITY: i32 = 50;

/// Sanity lost when the box is opened.
const BOX_SANITY_LOSS: i32 = 3;

/// The built-in scenario.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedNarrator;

impl ScriptedNarrator {
    /// Creates the scripted narrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Opening scenario for `theme`.
    #[must_use]
    pub fn scenario(theme: &str) -> InitialScenario {
        let theme = match theme.trim() {
            "" => DEFAULT_THEME,
            t => t,
        };
        InitialScenario {
            outline: format!("[SCRIPTED OUTLINE] A five-scene scenario on the theme \"{theme}\"."),
            guidance: "Truth: the master of the house hid a secret. Obstacles: a sealed room and a \
                       silent servant. Key: an old diary. Ending: the truth is reached or time runs out."
                .to_owned(),
            introduction_text: "You stand before an old mansion.\n\n\
                Fog hangs over the dusk. An invitation led you here. The heavy door stands \
                half open, and faint candlelight spills from within.\n\n\
                Somewhere inside, a piano is playing."
                .to_owned(),
            objective: "Enter the mansion and find whoever sent the invitation".to_owned(),
            initial_flags: Vec::new(),
            initial_inventory: vec![
                "Invitation".to_owned(),
                "Flashlight".to_owned(),
                "Notebook".to_owned(),
            ],
        }
    }

    /// Beat for player turn `turn` given the character's current sanity.
    #[must_use]
    pub fn beat(turn: usize, current_sanity: i32) -> TurnResponse {
        match turn {
            0 | 1 => TurnResponse::narration(
                "You step into the entrance hall. Only half the candles in the chandelier are lit.\n\n\
                 A wide staircase rises ahead, a study door waits to the left, and a corridor \
                 to the right leads toward the dining room.",
            )
            .with_choices(["Climb the stairs", "Open the study door", "Head to the dining room"]),
            2 => TurnResponse::narration(
                "The study smells of dust. An old diary lies open on the desk, its ink badly \
                 faded. A careful eye might pick out something important.",
            )
            .with_check(
                CheckRequest::new("Spot Hidden", Difficulty::Normal)
                    .with_purpose("Find the important passage in the diary")
                    .with_failure_hint("You may overlook the clue and lose time"),
            ),
            3 => TurnResponse::narration(
                "The diary reveals that the master hid something precious in the cellar.\n\n\
                 At the same moment, an unsettling noise echoes from the end of the corridor. \
                 Something is behind you.",
            )
            .with_patch(StatePatch {
                flags_add: vec!["Learned of the cellar".to_owned()],
                objective: Some("Find the cellar and see what is hidden there".to_owned()),
                ..StatePatch::default()
            })
            .with_choices(["Check the noise", "Search for the cellar entrance"]),
            4 => TurnResponse::narration(
                "You find the stairs down, but the cellar door is held by an old lock. The \
                 keyhole looks simple. With the right tools it might give.",
            )
            .with_check(
                CheckRequest::new("Locksmith", Difficulty::Hard)
                    .with_purpose("Open the cellar door")
                    .with_failure_hint("You might break the lock"),
            ),
            5 => {
                let base = if current_sanity == 0 {
                    FALLBACK_SANITY
                } else {
                    current_sanity
                };
                TurnResponse::narration(
                    "A single old box waits in the cellar.\n\n\
                     When you lift the lid an eerie light pours out and your mind slips away for \
                     a moment. When you come to, a strange stone rests in your hand.\n\n\
                     This must be what the sender of the invitation hid.",
                )
                .with_patch(StatePatch {
                    resources: Some(ResourcePatch {
                        current_san: Some((base - BOX_SANITY_LOSS).max(0)),
                        ..ResourcePatch::default()
                    }),
                    inventory_add: vec!["Strange glowing stone".to_owned()],
                    flags_add: vec![
                        "Opened the box".to_owned(),
                        "Obtained the glowing stone".to_owned(),
                    ],
                    objective: Some(
                        "Learn what the glowing stone is and escape the mansion".to_owned(),
                    ),
                    ..StatePatch::default()
                })
            }
            6 => TurnResponse::narration(
                "Back upstairs, the mansion has changed. The lights are out and a cold wind \
                 blows through the halls. The front door is shut.\n\n\
                 A faint voice calls from the second floor: \"...this way...\"",
            )
            .with_choices([
                "Follow the voice upstairs",
                "Force the front door",
                "Hold the glowing stone aloft",
            ]),
            _ => TurnResponse::narration(
                "You raise the glowing stone and light fills the mansion. The shadows clinging \
                 to the walls burn away.\n\n\
                 When the glow fades the front door swings open onto the morning sun. The \
                 spirit bound to this house has been granted its wish and departs in peace.",
            )
            .with_end(EndSignal::new(
                EndKind::Success,
                "Solved the mystery of the mansion and freed the bound spirit",
            ))
            .with_patch(StatePatch {
                flags_add: vec!["Freed the spirit".to_owned()],
                ..StatePatch::default()
            }),
        }
    }
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn request_initial_scenario(
        &self,
        _character_name: &str,
        theme: &str,
    ) -> Result<InitialScenario, NarratorError> {
        Ok(Self::scenario(theme))
    }

    async fn request_turn(&self, request: &TurnRequest<'_>) -> Result<TurnResponse, NarratorError> {
        let turn = request.player_turns();
        let sanity = request.state.character.resources.sanity.current;
        tracing::debug!(turn, "scripted narrator beat");
        Ok(Self::beat(turn, sanity))
    }
}
