//! Flavor texts for the daily lottery.

/// Announcement stages, each escalating in conviction. The last stage is
/// followed directly by the winner's mention.
pub(crate) const STAGES: [&[&str]; 4] = [
    &[
        "Initiating the search for today's winner...",
        "Playing your little games again? Fine...",
        "Woop-woop! That's the sound of the lottery police!",
        "System breached. Damage dealt. Countermeasures being planned.",
        "Let's do some magic...",
        "Why did you wake me up...",
        "Who's the lucky one today?",
    ],
    &[
        "Hm...",
        "Scanning...",
        "Searching the database",
        "Sleepily looks through the papers",
        "(Grumbles) You could be doing actual work instead",
        "Military satellite launched, access codes inside...",
        "Come on, let's see who's cool around here...",
    ],
    &[
        "High priority to the mobile unit.",
        "Oh...",
        "Whoa...",
        "So, what have we got here?",
        "This makes absolutely no sense...",
        "What have we become...",
        "A thousand devils!",
        "Apprehending the suspect...",
    ],
    &[
        "Freeze! Don't move! You are declared today's winner, ",
        "Wow, look at that! Today's winner is ",
        "Winner of the day, common variety, 1 pc. - ",
        "Aha! Congratulations! Today you win, ",
        "Looks like today's winner is ",
        "Analysis complete. You win, ",
    ],
];

pub(crate) const RULES: &str = "Rules of <b>Winner of the Day</b>:\n\
<b>1.</b> Join the game with /register\n\
<b>2.</b> Wait until everyone (or most people :) has joined\n\
<b>3.</b> Run the draw with /lottery\n\
<b>4.</b> Chat statistics with /top or /top {year}\n\
<b>5.</b> Personal statistics with /me\n\
<b>6. (chat administrators only)</b>: remove a player with /remove {ID or @username}; /pool sends you the list of players privately.\n\n\
The draw happens once a day; asking again shows <b>today's result</b>.\n\n\
The draw resets every night.";

pub(crate) fn already_drawn(name: &str) -> String {
    format!("According to my info, today's winner is {name}!")
}

pub(crate) fn left(mention: &str) -> String {
    format!(
        "I found today's winner, but it looks like {mention} has left this chat, so try again while I remove them from the game!"
    )
}

pub(crate) fn kicked(mention: &str) -> String {
    format!(
        "I found today's winner, but it looks like {mention} was banned from this chat, so try again while I remove them from the game!"
    )
}

pub(crate) fn unreachable(mention: &str, error: &str) -> String {
    format!(
        "I found today's winner, but something is wrong with {mention}, so try again while I remove them from the game! Error:\n<code>{error}</code>"
    )
}
