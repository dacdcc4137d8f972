//! Flavor texts for the duel narration. `{name}` is replaced by a mention.

pub(crate) const ACCEPT: &str = "👍 Accept the challenge";
pub(crate) const DECLINE: &str = "👎 Flee in disgrace";

pub(crate) const SURVIVED: &[&str] = &[
    "{name} is still alive. Hm... maybe the powder got damp?",
    "Silence hangs in the air. {name} is still alive.",
    "{name} was born again today.",
    "{name} is still alive. Hm... did I actually load it?",
    "{name} is still alive. Neat, shall we try it on somebody else?",
];

pub(crate) const INVINCIBLE: &[&str] = &[
    "the bullet bounced off {name}'s head and flew into another chat.",
    "{name} frowned and peeled the flattened bullet off their forehead.",
    "but nothing happened. {name} looked at the revolver; it was broken.",
    "the bullet went clean through without leaving a mark on {name}.",
];

pub(crate) const FATAL: &[&str] = &[
    "{name}'s brains are all over the chat!",
    "{name} fell off the chair and bled all over the thread.",
    "{name} froze and a second later slumped onto the table.",
    "the bullet nearly hit somebody else in the chat! Huh? What? Oh, {name} is dead, yes.",
    "silence hung in the air. Everyone looked around, but {name} was already dead.",
];

pub(crate) const SELF_ELIMINATED: &[&str] = &[
    "💥 {name} took the easy way out.",
    "💥 {name} decided the revolver was faster than an argument.",
];

/// Substitute a mention into a flavor line.
pub(crate) fn fill(line: &str, mention: &str) -> String {
    line.replace("{name}", mention)
}

pub(crate) fn challenge(challenger: &str, challenged: &str) -> String {
    format!("{challenged}! {challenger} challenges you to a duel!")
}

pub(crate) fn table_header(a: &str, b: &str) -> String {
    format!("Duel! {a} vs {b}!\n")
}

pub(crate) fn round_header(other: &str, shooter: &str, round: u32) -> String {
    format!(
        "Duel! {other} vs {shooter}, round {round}:\n{shooter} picks up the revolver, puts it to their head and...\n"
    )
}

pub(crate) fn shot(shooter: &str, target: &str, minutes: i64) -> String {
    format!("💥 {shooter} shot {target}.\n{target} is off to respawn for {minutes} minutes.")
}

pub(crate) fn respawn(minutes: i64) -> String {
    format!("Respawn in {minutes} minutes.")
}
