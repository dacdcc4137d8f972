use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use saloon_core::memory::{MemoryStore, StoreSnapshot};
use saloon_core::{
    AffordanceAction, ButtonPress, ChatId, MessageHandle, Messenger, Participant,
};
use saloon_games::{
    Announcement, ChallengeRequest, Collaborators, DuelHandle, GameHost, GameResult,
    LotteryOutcome, PressOutcome, Target,
};

use crate::roster::Roster;
use crate::terminal::{SkewedClock, TerminalMembership, TerminalMessenger};

fn notice(text: &str) {
    println!("{}", text.yellow());
}

fn load_state(path: &Path) -> Result<StoreSnapshot, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read state {}: {e}", path.display()))?;
    let snapshot: StoreSnapshot = serde_json::from_str(&text)
        .map_err(|e| format!("invalid state {}: {e}", path.display()))?;
    info!(
        path = %path.display(),
        participants = snapshot.participants.len(),
        pool = snapshot.pool.len(),
        "state loaded"
    );
    Ok(snapshot)
}

fn save_state(path: &Path, snapshot: &StoreSnapshot) -> Result<(), String> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| e.to_string())?;
    std::fs::write(path, json)
        .map_err(|e| format!("cannot write state {}: {e}", path.display()))?;
    info!(path = %path.display(), picks = snapshot.picks.len(), "state saved");
    Ok(())
}

/// The simulated chat: who is in it, and what is still running.
struct Chat {
    host: GameHost,
    roster: Roster,
    messenger: Arc<TerminalMessenger>,
    clock: Arc<SkewedClock>,
    anchor: Option<MessageHandle>,
    presses: u64,
    duels: Vec<DuelHandle>,
    announcements: Vec<Announcement>,
}

impl Chat {
    async fn reply(&self, text: &str) {
        if let Err(e) = self.messenger.send(self.roster.chat_id, text, &[]).await {
            notice(&e.to_string());
        }
    }

    /// Wait for every narration still playing out.
    async fn settle(&mut self) {
        for duel in std::mem::take(&mut self.duels) {
            if let Err(e) = duel.outcome().await {
                notice(&e.to_string());
            }
        }
        for announcement in std::mem::take(&mut self.announcements) {
            if let Err(e) = announcement.finished().await {
                notice(&e.to_string());
            }
        }
    }

    async fn handle(&mut self, line: &str) {
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return;
        };
        match first {
            "/wait" => return self.settle().await,
            "/advance" => {
                match words.next().and_then(|s| s.parse::<i64>().ok()) {
                    Some(secs) => {
                        self.clock.advance(Duration::seconds(secs));
                        println!("{}", format!("(clock advanced {secs}s)").dimmed());
                    }
                    None => notice("usage: /advance <seconds>"),
                }
                return;
            }
            _ => {}
        }

        let Some(sender) = self
            .roster
            .by_username(first)
            .map(|m| m.participant.clone())
        else {
            notice(&format!("unknown member: {first}"));
            return;
        };
        let Some(command) = words.next() else {
            notice(&format!("{first} says nothing"));
            return;
        };
        let arg = words.next();
        println!(
            "{}",
            format!("{}: {}", sender.display_name(), line[first.len()..].trim()).bold()
        );

        if let Err(e) = self.host.remember(&sender).await {
            notice(&e.to_string());
        }
        if let Err(e) = self.dispatch(&sender, command, arg).await {
            if e.is_user_facing() {
                self.reply(&e.to_string()).await;
            } else {
                notice(&e.to_string());
            }
        }
    }

    async fn dispatch(
        &mut self,
        sender: &Participant,
        command: &str,
        arg: Option<&str>,
    ) -> GameResult<()> {
        let chat = self.roster.chat_id;
        match command {
            "/duel" => {
                let target = arg.map_or(Target::Missing, |a| Target::Lookup(a.to_string()));
                let issued = self
                    .host
                    .challenge(ChallengeRequest {
                        chat,
                        challenger: sender.clone(),
                        target,
                        origin: None,
                    })
                    .await?;
                self.anchor = Some(issued.anchor);
            }
            "/accept" => self.press(sender, AffordanceAction::AcceptDuel).await?,
            "/decline" => self.press(sender, AffordanceAction::DeclineDuel).await?,
            "/lottery" => {
                if let LotteryOutcome::Drawn { announcement, .. } =
                    self.host.draw_lottery(chat).await?
                {
                    self.announcements.push(announcement);
                }
            }
            "/register" => {
                let text = self.host.register(sender).await?;
                self.reply(&text).await;
            }
            "/unregister" => {
                let text = self.host.unregister(sender).await?;
                self.reply(&text).await;
            }
            "/remove" => {
                let text = self.host.remove_from_pool(chat, sender, arg).await?;
                self.reply(&text).await;
            }
            "/pool" => {
                let private = ChatId(sender.id.0);
                for chunk in self.host.pool_listing(chat, sender).await? {
                    if let Err(e) = self.messenger.send(private, &chunk, &[]).await {
                        notice(&e.to_string());
                    }
                }
            }
            "/me" => {
                let text = self.host.lottery_personal(sender).await?;
                self.reply(&text).await;
            }
            "/top" => {
                let year = match arg.map(str::parse::<i32>) {
                    None => None,
                    Some(Ok(year)) => Some(year),
                    Some(Err(_)) => {
                        self.reply("Give the year as a number, e.g. /top 2024.").await;
                        return Ok(());
                    }
                };
                let text = self.host.lottery_leaderboard(year).await?;
                self.reply(&text).await;
            }
            "/rules" => self.reply(self.host.lottery_rules()).await,
            "/duelstats" => {
                let text = self.host.duel_stats(sender).await?;
                self.reply(&text).await;
            }
            "/kill" => {
                let target = arg.map_or(Target::Missing, |a| Target::Lookup(a.to_string()));
                let text = self.host.eliminate(chat, sender, target).await?;
                self.reply(&text).await;
            }
            "/suicide" => {
                let text = self.host.self_eliminate(chat, sender).await?;
                self.reply(&text).await;
            }
            other => notice(&format!("unknown command: {other}")),
        }
        Ok(())
    }

    async fn press(&mut self, sender: &Participant, action: AffordanceAction) -> GameResult<()> {
        let Some(anchor) = self.anchor else {
            notice("there is no challenge to answer");
            return Ok(());
        };
        self.presses += 1;
        let press = ButtonPress {
            id: format!("press-{}", self.presses),
            presser: sender.clone(),
            message: anchor,
        };
        match self.host.press(action, &press).await? {
            PressOutcome::Accepted(duel) => self.duels.push(duel),
            PressOutcome::Declined => {}
            PressOutcome::Ignored => println!("{}", "(nothing happens)".dimmed()),
        }
        Ok(())
    }
}

pub async fn run(
    config: &Path,
    seed: Option<u64>,
    fast: bool,
    state: Option<&Path>,
) -> Result<(), String> {
    let roster = Roster::load(config)?;
    let mut game = roster.game.clone();
    if let Some(seed) = seed {
        game = game.with_seed(seed);
    }
    if fast {
        game = game.instant();
    }

    let store = Arc::new(match state {
        Some(path) if path.exists() => MemoryStore::from_snapshot(load_state(path)?),
        _ => MemoryStore::new(),
    });
    let mut membership = TerminalMembership::default();
    for member in &roster.members {
        membership.add(
            roster.chat_id,
            member.participant.id,
            member.participant.full_name(),
            member.role,
        );
    }
    let messenger = Arc::new(TerminalMessenger::default());
    let clock = Arc::new(SkewedClock::default());
    let host = GameHost::new(
        game,
        Collaborators {
            messenger: messenger.clone(),
            membership: Arc::new(membership),
            store: store.clone(),
            clock: clock.clone(),
        },
    );
    for member in &roster.members {
        host.remember(&member.participant)
            .await
            .map_err(|e| e.to_string())?;
    }

    println!(
        "  {} chat {} with {} members",
        "Saloon open:".bold(),
        roster.chat_id,
        roster.members.len()
    );

    let mut chat = Chat {
        host,
        roster,
        messenger,
        clock,
        anchor: None,
        presses: 0,
        duels: Vec::new(),
        announcements: Vec::new(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        chat.handle(line.trim()).await;
    }
    chat.settle().await;

    if let Some(path) = state {
        save_state(path, &store.snapshot())?;
    }
    Ok(())
}
