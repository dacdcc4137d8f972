//! The duel session machine.
//!
//! Challenges are evaluated in the caller's task. Once accepted, the
//! simulation and its narration run in a spawned task that owns the
//! in-progress flag and a lease on the session; both are given back when
//! the task ends, whatever the outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use saloon_core::{
    Affordance, AffordanceAction, ButtonPress, ChatId, MessageHandle, Participant, ParticipantId,
};

use super::ledger::{self, Casualty};
use super::session::{DuelEvent, DuelPhase, DuelSession, DuelState};
use super::simulation::{Simulation, simulate};
use super::texts;
use super::verdict::{Verdict, judge};
use crate::error::{GameError, GameKind, GameResult, ValidationError};
use crate::gate::{GateFlag, GateGuard};
use crate::narration::Narration;
use crate::services::Services;

/// Who a challenge is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Already resolved, e.g. the author of a replied-to message.
    Participant(Participant),
    /// `@username` or numeric id to look up.
    Lookup(String),
    /// The command named nobody.
    Missing,
}

/// A challenge command.
#[derive(Debug, Clone)]
pub struct ChallengeRequest {
    /// Chat the challenge was issued in.
    pub chat: ChatId,
    /// Who issued it.
    pub challenger: Participant,
    /// Who it is aimed at.
    pub target: Target,
    /// The command message, deleted when the challenge is posted.
    pub origin: Option<MessageHandle>,
}

/// A challenge now waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeIssued {
    /// The message the duel narrates through.
    pub anchor: MessageHandle,
    /// Session generation.
    pub generation: u64,
}

/// What a button press did.
#[derive(Debug)]
pub enum PressOutcome {
    /// Not addressed to the presser, or no matching challenge; only acknowledged.
    Ignored,
    /// The duel is running in the background.
    Accepted(DuelHandle),
    /// The challenge was declined.
    Declined,
}

/// Everything a finished duel changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuelReport {
    /// Session generation.
    pub generation: u64,
    /// How it ended.
    pub verdict: Verdict,
    /// The drawn rounds.
    pub simulation: Simulation,
    /// Participant who did not find the bullet.
    pub survivor: ParticipantId,
    /// Participant who did.
    pub eliminated: ParticipantId,
    /// Participant credited with a death, if any.
    pub casualty: Option<ParticipantId>,
    /// Participant credited with a kill, if any.
    pub credited_kill: Option<ParticipantId>,
    /// End of the casualty's restriction.
    pub restricted_until: Option<DateTime<FixedOffset>>,
}

/// A duel running in the background.
#[derive(Debug)]
pub struct DuelHandle {
    generation: u64,
    anchor: MessageHandle,
    task: JoinHandle<GameResult<DuelReport>>,
}

impl DuelHandle {
    /// Session generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The message being narrated through.
    pub fn anchor(&self) -> MessageHandle {
        self.anchor
    }

    /// Wait for the duel to end.
    pub async fn outcome(self) -> GameResult<DuelReport> {
        self.task
            .await
            .map_err(|e| GameError::Interrupted(e.to_string()))?
    }
}

enum Staleness {
    Fresh,
    Abandoned(DuelSession),
    Lost(DuelSession),
}

/// Returns the duel slot to idle when a running session ends, unless a
/// watchdog already moved the slot on to a newer session.
struct SessionLease {
    phase: Arc<Mutex<DuelPhase>>,
    generation: u64,
    _in_progress: GateGuard,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        finish(&self.phase, self.generation, DuelEvent::Resolve);
    }
}

fn finish(phase: &Mutex<DuelPhase>, generation: u64, event: DuelEvent) -> bool {
    let mut phase = phase.lock();
    if phase.session().is_some_and(|s| s.generation == generation) {
        phase.apply(event)
    } else {
        false
    }
}

fn buttons() -> [Affordance; 2] {
    [
        Affordance::new(texts::ACCEPT, AffordanceAction::AcceptDuel),
        Affordance::new(texts::DECLINE, AffordanceAction::DeclineDuel),
    ]
}

/// Drives duels from challenge to verdict.
#[derive(Clone)]
pub(crate) struct DuelMachine {
    services: Services,
    phase: Arc<Mutex<DuelPhase>>,
    generation: Arc<AtomicU64>,
}

impl DuelMachine {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            phase: Arc::new(Mutex::new(DuelPhase::Idle)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> DuelState {
        let s = &self.services;
        match s.gate.held_since(GateFlag::NarratorDown) {
            Some(since) if s.clock.now() - since <= s.config.narrator_down() => DuelState::Disabled,
            _ => self.phase.lock().state(),
        }
    }

    pub async fn challenge(&self, request: ChallengeRequest) -> GameResult<ChallengeIssued> {
        let s = &self.services;
        if s.gate.is_held(GateFlag::NarratorDown)
            && !s
                .gate
                .clear_if_stale(GateFlag::NarratorDown, s.config.narrator_down())
        {
            return Err(GameError::NarratorDown);
        }
        self.sweep().await;

        let Some(_overall) = s.gate.guard(GateFlag::DuelOverall) else {
            return Err(GameError::Busy(GameKind::Duel));
        };
        if !self.phase.lock().is_idle() {
            return Err(GameError::Busy(GameKind::Duel));
        }

        let ChallengeRequest {
            chat,
            challenger,
            target,
            origin,
        } = request;
        let challenged = self.resolve(target).await?;
        if challenged.id == challenger.id {
            return Err(ValidationError::SelfChallenge.into());
        }
        if challenged.is_bot {
            return Err(ValidationError::NonPlayer.into());
        }
        let role = s
            .membership
            .role_of(chat, challenged.id)
            .await
            .map_err(|e| ValidationError::UnknownParticipant(e.to_string()))?;
        if !role.is_present() {
            return Err(ValidationError::NotInChat.into());
        }

        let Some(pending) = s.gate.guard(GateFlag::DuelPending) else {
            return Err(GameError::Busy(GameKind::Duel));
        };
        if let Some(origin) = origin {
            if let Err(e) = s.messenger.delete(origin).await {
                warn!(error = %e, "could not delete challenge command");
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let text = texts::challenge(&challenger.mention(), &challenged.mention());
        let narration = s.sequencer.begin(chat, &text, &buttons(), generation).await?;
        let anchor = narration.anchor();

        info!(
            generation,
            challenger = %challenger.id,
            challenged = %challenged.id,
            "duel challenge issued"
        );
        let session = DuelSession {
            generation,
            chat,
            challenger,
            challenged,
            anchor,
            created_at: s.clock.now(),
            pending_ticket: pending.keep(),
        };
        let ticket = session.pending_ticket;
        if !self
            .phase
            .lock()
            .apply(DuelEvent::Challenge(Box::new(session)))
        {
            if let Some(ticket) = ticket {
                s.gate.release_ticket(ticket);
            }
            return Err(GameError::Busy(GameKind::Duel));
        }
        Ok(ChallengeIssued { anchor, generation })
    }

    async fn resolve(&self, target: Target) -> GameResult<Participant> {
        match target {
            Target::Participant(p) => Ok(p),
            Target::Missing => Err(ValidationError::MissingTarget.into()),
            Target::Lookup(query) => match self.services.store.find_participant(&query).await? {
                Some(p) => Ok(p),
                None => Err(ValidationError::UnknownParticipant(query).into()),
            },
        }
    }

    /// Lazy watchdog: retire a session that outlived its timeout, then
    /// clear any duel flag left behind without a session.
    async fn sweep(&self) {
        let s = &self.services;
        let now = s.clock.now();
        let staleness = {
            let mut phase = self.phase.lock();
            match phase.session().cloned() {
                Some(session) => {
                    let age = now - session.created_at;
                    match phase.state() {
                        DuelState::Pending if age > s.config.pending_timeout() => {
                            phase.apply(DuelEvent::Abandon);
                            Staleness::Abandoned(session)
                        }
                        DuelState::InProgress if age > s.config.in_progress_timeout() => {
                            phase.apply(DuelEvent::ForceClear);
                            Staleness::Lost(session)
                        }
                        _ => Staleness::Fresh,
                    }
                }
                None => Staleness::Fresh,
            }
        };

        match staleness {
            Staleness::Fresh => {}
            Staleness::Abandoned(session) => {
                if let Some(ticket) = session.pending_ticket {
                    s.gate.release_ticket(ticket);
                }
                info!(generation = session.generation, "duel challenge abandoned");
                let text = format!(
                    "{} didn't show up to the duel.",
                    session.challenged.full_name()
                );
                let mut narration = s.sequencer.resume(session.anchor, session.generation);
                if let Err(e) = narration.update(&text).await {
                    s.report("duel abandonment", &e.into()).await;
                }
            }
            Staleness::Lost(session) => {
                warn!(generation = session.generation, "stale session recovered");
                s.gate.release(GateFlag::DuelPending);
                s.gate.release(GateFlag::DuelInProgress);
            }
        }

        s.gate
            .clear_if_stale(GateFlag::DuelPending, s.config.pending_timeout());
        s.gate
            .clear_if_stale(GateFlag::DuelInProgress, s.config.in_progress_timeout());
        s.gate
            .clear_if_stale(GateFlag::DuelOverall, s.config.in_progress_timeout());
    }

    async fn acknowledge(&self, press: &ButtonPress) {
        if let Err(e) = self.services.messenger.acknowledge(press).await {
            self.services.report("button acknowledgement", &e.into()).await;
        }
    }

    /// Move the pending session addressed by `press` with `event`, or
    /// return `None` when the press does not belong to it.
    fn answer(&self, press: &ButtonPress, event: DuelEvent) -> Option<DuelSession> {
        let mut phase = self.phase.lock();
        let session = match phase.session() {
            Some(s)
                if phase.state() == DuelState::Pending
                    && s.anchor == press.message
                    && s.challenged.id == press.presser.id =>
            {
                s.clone()
            }
            _ => {
                debug!(presser = %press.presser.id, "button press ignored");
                return None;
            }
        };
        phase.apply(event).then_some(session)
    }

    pub async fn accept(&self, press: &ButtonPress) -> GameResult<PressOutcome> {
        self.acknowledge(press).await;
        let Some(session) = self.answer(press, DuelEvent::Accept) else {
            return Ok(PressOutcome::Ignored);
        };
        let gate = &self.services.gate;
        if let Some(ticket) = session.pending_ticket {
            gate.release_ticket(ticket);
        }
        let guard = gate.guard(GateFlag::DuelInProgress).or_else(|| {
            warn!("clearing leftover in-progress flag");
            gate.release(GateFlag::DuelInProgress);
            gate.guard(GateFlag::DuelInProgress)
        });
        let Some(guard) = guard else {
            finish(&self.phase, session.generation, DuelEvent::ForceClear);
            return Err(GameError::Busy(GameKind::Duel));
        };
        info!(generation = session.generation, "duel accepted");

        let lease = SessionLease {
            phase: Arc::clone(&self.phase),
            generation: session.generation,
            _in_progress: guard,
        };
        let services = self.services.clone();
        let narration = services
            .sequencer
            .resume(session.anchor, session.generation);
        let generation = session.generation;
        let anchor = session.anchor;
        let task = tokio::spawn(async move {
            let result = run(&services, &session, narration).await;
            drop(lease);
            if let Err(e) = &result {
                services.report("duel narration", e).await;
            }
            result
        });
        Ok(PressOutcome::Accepted(DuelHandle {
            generation,
            anchor,
            task,
        }))
    }

    pub async fn decline(&self, press: &ButtonPress) -> GameResult<PressOutcome> {
        self.acknowledge(press).await;
        let Some(session) = self.answer(press, DuelEvent::Decline) else {
            return Ok(PressOutcome::Ignored);
        };
        if let Some(ticket) = session.pending_ticket {
            self.services.gate.release_ticket(ticket);
        }
        info!(generation = session.generation, "duel declined");
        let text = format!("{} declined the duel.", session.challenged.full_name());
        self.services
            .sequencer
            .resume(session.anchor, session.generation)
            .update(&text)
            .await?;
        Ok(PressOutcome::Declined)
    }

    pub async fn stats(&self, participant: &Participant) -> GameResult<String> {
        let stats = self.services.store.duelist(participant.id).await?;
        let (kills, deaths) = stats.map_or((0, 0), |s| (s.kills, s.deaths));
        Ok(format!("Wins: {kills}\nDeaths: {deaths}"))
    }

    pub async fn self_eliminate(
        &self,
        chat: ChatId,
        participant: &Participant,
    ) -> GameResult<String> {
        let s = &self.services;
        let mention = participant.mention();
        let role = s.membership.role_of(chat, participant.id).await?;
        if role.is_protected() {
            return Ok(format!("👻 {mention} respawned at the bonfire."));
        }
        let Casualty { minutes, .. } = ledger::record_death(s, chat, participant.id).await?;
        let line = texts::fill(s.pick(texts::SELF_ELIMINATED), &mention);
        Ok(format!("{line}\n{}", texts::respawn(minutes)))
    }

    /// Administrative shot: `actor` eliminates `target` outside any duel.
    pub async fn eliminate(
        &self,
        chat: ChatId,
        actor: &Participant,
        target: Target,
    ) -> GameResult<String> {
        let s = &self.services;
        if !s.membership.role_of(chat, actor.id).await?.is_protected() {
            return Err(ValidationError::NotAuthorized.into());
        }
        let target = match target {
            Target::Missing => return Err(ValidationError::MissingUser.into()),
            target => self.resolve(target).await?,
        };
        let Casualty { minutes, .. } = ledger::record_death(s, chat, target.id).await?;
        info!(actor = %actor.id, target = %target.id, "participant shot by an administrator");
        Ok(texts::shot(&actor.full_name(), &target.full_name(), minutes))
    }

    #[cfg(test)]
    fn force_phase(&self, phase: DuelPhase) {
        *self.phase.lock() = phase;
    }
}

async fn run(
    services: &Services,
    session: &DuelSession,
    mut narration: Narration,
) -> GameResult<DuelReport> {
    let config = &services.config;
    let step = config.step_delay();
    let table = texts::table_header(&session.challenger.mention(), &session.challenged.mention());

    narration
        .step(
            &format!("{table}I load one round into the revolver and spin the cylinder."),
            step,
        )
        .await?;
    narration
        .step(
            &format!("{table}I lay the revolver on the table and give it a spin."),
            step,
        )
        .await?;

    let simulation = services.draw(simulate);
    debug!(
        generation = session.generation,
        bullet = simulation.bullet,
        "duel drawn"
    );
    narration
        .update(&format!(
            "{table}The revolver stops on {}, the first turn is theirs.",
            session.seat(simulation.first).mention()
        ))
        .await?;

    let mut header = String::new();
    for round in &simulation.rounds {
        narration.pause(step).await;
        let shooter = session.seat(round.shooter).mention();
        let other = session.seat(round.shooter.other()).mention();
        header = texts::round_header(&other, &shooter, round.number);
        narration.update(&header).await?;
        if round.survived {
            narration.pause(step).await;
            let line = texts::fill(services.pick(texts::SURVIVED), &shooter);
            narration.update(&format!("{header}🍾 {line}")).await?;
        }
    }
    narration.pause(step).await;

    let survivor = session.seat(simulation.survivor());
    let eliminated = session.seat(simulation.eliminated());
    let survivor_role = services.membership.role_of(session.chat, survivor.id).await?;
    let eliminated_role = services
        .membership
        .role_of(session.chat, eliminated.id)
        .await?;
    let verdict = judge(
        survivor_role,
        eliminated_role,
        config.is_protected_username(eliminated.username.as_deref()),
    );
    info!(generation = session.generation, ?verdict, "duel resolved");

    let mut report = DuelReport {
        generation: session.generation,
        verdict,
        simulation: simulation.clone(),
        survivor: survivor.id,
        eliminated: eliminated.id,
        casualty: None,
        credited_kill: None,
        restricted_until: None,
    };
    let (winner, loser) = (survivor.mention(), eliminated.mention());

    match verdict {
        Verdict::NarratorDown => {
            narration
                .step(
                    &format!("{header}The bullet bounces off {loser} and flies at {winner}."),
                    step,
                )
                .await?;
            narration
                .step(
                    &format!("{header}The bullet bounces off {winner} and flies at {loser}."),
                    step,
                )
                .await?;
            narration
                .update(&format!(
                    "{header}The bullet bounces off {loser} and flies into my head... damn."
                ))
                .await?;
            if let Some(guard) = services.gate.guard(GateFlag::NarratorDown) {
                guard.keep();
            }
            warn!(generation = session.generation, "narrator is down");
        }
        Verdict::Paradox => {
            let shot = format!("{header}😈 Points the revolver at {winner} and fires.");
            narration.update(&shot).await?;
            narration.pause(config.long_step_delay()).await;
            let casualty = ledger::record_death(services, session.chat, survivor.id).await?;
            report.casualty = Some(survivor.id);
            report.restricted_until = Some(casualty.until);
            narration
                .update(&format!(
                    "{shot}\nI have no idea how to explain this, but {loser} is the winner!\n{winner} is off to respawn for {} minutes.",
                    casualty.minutes
                ))
                .await?;
        }
        Verdict::Draw => {
            let line = format!(
                "{header}💥 {}",
                texts::fill(services.pick(texts::INVINCIBLE), &loser)
            );
            narration.step(&line, step).await?;
            narration
                .update(&format!("{line}\nLooks like a draw."))
                .await?;
        }
        Verdict::Elimination => {
            let line = format!(
                "{header}💥 {}",
                texts::fill(services.pick(texts::FATAL), &loser)
            );
            narration.step(&line, step).await?;
            let casualty = ledger::record_death(services, session.chat, eliminated.id).await?;
            ledger::record_kill(services, survivor.id).await?;
            report.casualty = Some(eliminated.id);
            report.credited_kill = Some(survivor.id);
            report.restricted_until = Some(casualty.until);
            narration
                .update(&format!(
                    "{line}\nDuel winner: {winner}.\n{loser} is off to respawn for {} minutes.",
                    casualty.minutes
                ))
                .await?;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use saloon_core::memory::Delivery;
    use saloon_core::{ChatRole, Store};

    use crate::config::GameConfig;
    use crate::testing::{CHAT, Fixture, press, start};

    async fn duelists(fx: &Fixture) -> (Participant, Participant) {
        (
            fx.member(1, "Ada", ChatRole::Member).await,
            fx.member(2, "Bob", ChatRole::Member).await,
        )
    }

    fn request(challenger: &Participant, target: Target) -> ChallengeRequest {
        ChallengeRequest {
            chat: CHAT,
            challenger: challenger.clone(),
            target,
            origin: None,
        }
    }

    async fn accepted(machine: &DuelMachine, by: &Participant, anchor: MessageHandle) -> DuelHandle {
        match machine.accept(&press(by, anchor)).await.unwrap() {
            PressOutcome::Accepted(handle) => handle,
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_challenge_is_busy() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let cat = fx.member(3, "Cat", ChatRole::Member).await;
        let dan = fx.member(4, "Dan", ChatRole::Member).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));

        machine
            .challenge(request(&ada, Target::Participant(bob)))
            .await
            .unwrap();
        let err = machine
            .challenge(request(&cat, Target::Participant(dan)))
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Busy(GameKind::Duel)));
        assert_eq!(fx.messenger.sent_texts().len(), 1);
        assert_eq!(machine.state(), DuelState::Pending);
    }

    #[tokio::test]
    async fn rejections_leave_no_trace() {
        let fx = Fixture::new();
        let (ada, _) = duelists(&fx).await;
        let bot = Participant::new(9, "Robot").as_bot();
        let ghost = Participant::new(7, "Ghost");
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));

        let cases = [
            (Target::Participant(ada.clone()), ValidationError::SelfChallenge),
            (Target::Participant(bot), ValidationError::NonPlayer),
            (Target::Participant(ghost), ValidationError::NotInChat),
            (Target::Missing, ValidationError::MissingTarget),
            (
                Target::Lookup("@nobody".into()),
                ValidationError::UnknownParticipant("@nobody".into()),
            ),
        ];
        for (target, expected) in cases {
            match machine.challenge(request(&ada, target)).await {
                Err(GameError::Validation(v)) => assert_eq!(v, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
        }
        assert!(fx.messenger.deliveries().is_empty());
        assert_eq!(machine.state(), DuelState::Idle);
        for flag in GateFlag::DUEL {
            assert!(!machine.services.gate.is_held(flag));
        }
    }

    #[tokio::test]
    async fn lookup_resolves_and_origin_is_deleted() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));
        let origin = MessageHandle::new(CHAT, 500);

        let mut req = request(&ada, Target::Lookup("@bob".into()));
        req.origin = Some(origin);
        let issued = machine.challenge(req).await.unwrap();

        let deliveries = fx.messenger.deliveries();
        assert_eq!(deliveries[0], Delivery::Deleted { message: origin });
        let text = fx.messenger.text_of(issued.anchor).unwrap();
        assert!(text.contains(&bob.mention()));
        assert!(text.contains("challenges you to a duel"));
        assert!(machine.services.gate.is_held(GateFlag::DuelPending));
        assert!(!machine.services.gate.is_held(GateFlag::DuelOverall));
    }

    #[tokio::test]
    async fn only_the_challenged_may_answer() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob)))
            .await
            .unwrap();

        let outcome = machine.accept(&press(&ada, issued.anchor)).await.unwrap();
        assert!(matches!(outcome, PressOutcome::Ignored));
        let outcome = machine.decline(&press(&ada, issued.anchor)).await.unwrap();
        assert!(matches!(outcome, PressOutcome::Ignored));

        assert_eq!(machine.state(), DuelState::Pending);
        let acks = fx
            .messenger
            .deliveries()
            .into_iter()
            .filter(|d| matches!(d, Delivery::Acknowledged { .. }))
            .count();
        assert_eq!(acks, 2);
    }

    #[tokio::test]
    async fn decline_returns_to_idle() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();

        let outcome = machine.decline(&press(&bob, issued.anchor)).await.unwrap();
        assert!(matches!(outcome, PressOutcome::Declined));
        assert_eq!(machine.state(), DuelState::Idle);
        assert!(!machine.services.gate.is_held(GateFlag::DuelPending));
        assert_eq!(
            fx.messenger.text_of(issued.anchor).unwrap(),
            "Bob declined the duel."
        );

        let again = machine.accept(&press(&bob, issued.anchor)).await.unwrap();
        assert!(matches!(again, PressOutcome::Ignored));
    }

    #[tokio::test]
    async fn elimination_credits_one_death_and_one_kill() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        // Bullet in chamber 1, challenger shoots first.
        let machine = DuelMachine::new(fx.services(GameConfig::default(), [1, 1]));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();

        let handle = accepted(&machine, &bob, issued.anchor).await;
        assert_eq!(machine.state(), DuelState::InProgress);
        let report = handle.outcome().await.unwrap();

        assert_eq!(report.verdict, Verdict::Elimination);
        assert_eq!(report.casualty, Some(ada.id));
        assert_eq!(report.credited_kill, Some(bob.id));
        assert_eq!(report.restricted_until, Some(start() + Duration::seconds(600)));
        let loser = fx.store.duelist(ada.id).await.unwrap().unwrap();
        let winner = fx.store.duelist(bob.id).await.unwrap().unwrap();
        assert_eq!((loser.kills, loser.deaths), (0, 1));
        assert_eq!((winner.kills, winner.deaths), (1, 0));

        let restrictions = fx.membership.restrictions();
        assert_eq!(restrictions.len(), 1);
        assert!(!restrictions[0].can_send_messages);

        let text = fx.messenger.text_of(issued.anchor).unwrap();
        assert!(text.contains("Duel winner"));
        assert!(text.contains("10 minutes"));
        assert_eq!(machine.state(), DuelState::Idle);
        for flag in GateFlag::DUEL {
            assert!(!machine.services.gate.is_held(flag));
        }
    }

    #[tokio::test]
    async fn narration_edits_only_the_anchor() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        // Bullet in chamber 3, challenged first: Bob, Ada, Bob.
        let machine = DuelMachine::new(fx.services(GameConfig::default(), [3, 0]));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();
        let report = accepted(&machine, &bob, issued.anchor)
            .await
            .outcome()
            .await
            .unwrap();

        assert_eq!(report.eliminated, bob.id);
        assert_eq!(report.simulation.rounds.len(), 3);
        let edits: Vec<_> = fx
            .messenger
            .deliveries()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Edited { message, text, .. } => Some((message, text)),
                _ => None,
            })
            .collect();
        assert!(edits.iter().all(|(m, _)| *m == issued.anchor));
        let rounds: Vec<_> = edits
            .iter()
            .filter(|(_, t)| t.contains(", round ") && !t.contains("🍾") && !t.contains("💥"))
            .collect();
        assert_eq!(rounds.len(), 3);
        assert!(rounds[1].1.contains(&format!("{} picks up", ada.mention())));
    }

    #[tokio::test]
    async fn protected_loser_draws_without_credit() {
        let fx = Fixture::new();
        let ada = fx.member(1, "Ada", ChatRole::Administrator).await;
        let bob = fx.member(2, "Bob", ChatRole::Member).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), [1, 1]));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();
        let report = accepted(&machine, &bob, issued.anchor)
            .await
            .outcome()
            .await
            .unwrap();

        assert_eq!(report.verdict, Verdict::Draw);
        assert_eq!(report.casualty, None);
        assert_eq!(report.credited_kill, None);
        assert!(fx.store.duelist(ada.id).await.unwrap().is_none());
        assert!(fx.store.duelist(bob.id).await.unwrap().is_none());
        assert!(
            fx.messenger
                .text_of(issued.anchor)
                .unwrap()
                .ends_with("Looks like a draw.")
        );
    }

    #[tokio::test]
    async fn allow_listed_loser_deflects_onto_survivor() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let config = GameConfig::default().with_protected_username("@Ada");
        let machine = DuelMachine::new(fx.services(config, [1, 1]));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();
        let report = accepted(&machine, &bob, issued.anchor)
            .await
            .outcome()
            .await
            .unwrap();

        assert_eq!(report.verdict, Verdict::Paradox);
        assert_eq!(report.casualty, Some(bob.id));
        assert_eq!(report.credited_kill, None);
        let bob_stats = fx.store.duelist(bob.id).await.unwrap().unwrap();
        assert_eq!(bob_stats.deaths, 1);
        assert!(fx.store.duelist(ada.id).await.unwrap().is_none());
        assert_eq!(fx.membership.restrictions()[0].participant, bob.id);
    }

    #[tokio::test]
    async fn both_protected_takes_the_narrator_down() {
        let fx = Fixture::new();
        let ada = fx.member(1, "Ada", ChatRole::Creator).await;
        let bob = fx.member(2, "Bob", ChatRole::Administrator).await;
        let cat = fx.member(3, "Cat", ChatRole::Member).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), [2, 0]));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();
        let report = accepted(&machine, &bob, issued.anchor)
            .await
            .outcome()
            .await
            .unwrap();

        assert_eq!(report.verdict, Verdict::NarratorDown);
        assert_eq!(report.casualty, None);
        assert_eq!(machine.state(), DuelState::Disabled);
        let err = machine
            .challenge(request(&cat, Target::Participant(ada.clone())))
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::NarratorDown));

        fx.clock.advance(Duration::seconds(3601));
        assert_eq!(machine.state(), DuelState::Idle);
        machine
            .challenge(request(&cat, Target::Participant(ada)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unanswered_challenge_is_abandoned_before_the_next_one() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let cat = fx.member(3, "Cat", ChatRole::Member).await;
        let dan = fx.member(4, "Dan", ChatRole::Member).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));
        let first = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();

        fx.clock.advance(Duration::seconds(61));
        let second = machine
            .challenge(request(&cat, Target::Participant(dan)))
            .await
            .unwrap();

        assert_eq!(
            fx.messenger.text_of(first.anchor).unwrap(),
            "Bob didn't show up to the duel."
        );
        assert!(second.generation > first.generation);
        assert_eq!(machine.state(), DuelState::Pending);
        let late = machine.accept(&press(&bob, first.anchor)).await.unwrap();
        assert!(matches!(late, PressOutcome::Ignored));
    }

    #[tokio::test]
    async fn stuck_duel_is_force_cleared() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));
        machine.force_phase(DuelPhase::InProgress(DuelSession {
            generation: 40,
            chat: CHAT,
            challenger: ada.clone(),
            challenged: bob.clone(),
            anchor: MessageHandle::new(CHAT, 99),
            created_at: start(),
            pending_ticket: None,
        }));
        machine.services.gate.try_acquire(GateFlag::DuelInProgress);

        fx.clock.advance(Duration::seconds(100));
        assert!(matches!(
            machine
                .challenge(request(&ada, Target::Participant(bob.clone())))
                .await,
            Err(GameError::Busy(GameKind::Duel))
        ));

        fx.clock.advance(Duration::seconds(21));
        machine
            .challenge(request(&ada, Target::Participant(bob)))
            .await
            .unwrap();
        assert!(!machine.services.gate.is_held(GateFlag::DuelInProgress));
        assert!(fx.messenger.text_of(MessageHandle::new(CHAT, 99)).is_none());
    }

    #[tokio::test]
    async fn late_narration_leaves_the_next_session_alone() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let cat = fx.member(3, "Cat", ChatRole::Member).await;
        let dan = fx.member(4, "Dan", ChatRole::Member).await;
        let config = GameConfig {
            step_delay_ms: 20,
            long_step_delay_ms: 20,
            ..GameConfig::default()
        };
        // Bullet in chamber 6, challenger first: six rounds of narration.
        let machine = DuelMachine::new(fx.paced_services(config, [6, 1]));
        let old = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();
        let stuck = accepted(&machine, &bob, old.anchor).await;

        fx.clock.advance(Duration::seconds(121));
        let new = machine
            .challenge(request(&cat, Target::Participant(dan.clone())))
            .await
            .unwrap();
        let challenge_text = texts::challenge(&cat.mention(), &dan.mention());

        let report = stuck.outcome().await.unwrap();
        assert_eq!(report.generation, old.generation);
        assert_eq!(machine.state(), DuelState::Pending);
        assert!(machine.services.gate.is_held(GateFlag::DuelPending));
        assert!(!machine.services.gate.is_held(GateFlag::DuelInProgress));
        assert_eq!(fx.messenger.text_of(new.anchor).unwrap(), challenge_text);
        assert!(
            fx.messenger
                .deliveries()
                .iter()
                .all(|d| !matches!(d, Delivery::Edited { message, .. } if *message == new.anchor))
        );

        let report = accepted(&machine, &dan, new.anchor)
            .await
            .outcome()
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Elimination);
        assert_eq!(machine.state(), DuelState::Idle);
        for flag in GateFlag::DUEL {
            assert!(!machine.services.gate.is_held(flag));
        }
    }

    #[tokio::test]
    async fn restriction_grows_with_each_death() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), [1, 1, 0, 1, 1]));

        for _ in 0..2 {
            let issued = machine
                .challenge(request(&ada, Target::Participant(bob.clone())))
                .await
                .unwrap();
            accepted(&machine, &bob, issued.anchor)
                .await
                .outcome()
                .await
                .unwrap();
        }
        let lengths: Vec<_> = fx
            .membership
            .restrictions()
            .iter()
            .map(|r| r.until - start())
            .collect();
        assert_eq!(lengths, vec![Duration::seconds(600), Duration::seconds(1200)]);
    }

    #[tokio::test]
    async fn failed_narration_still_frees_the_slot() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), [1, 1]));
        let issued = machine
            .challenge(request(&ada, Target::Participant(bob.clone())))
            .await
            .unwrap();
        fx.messenger.fail_edits(true);

        let err = accepted(&machine, &bob, issued.anchor)
            .await
            .outcome()
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Collaborator(_)));
        assert_eq!(machine.state(), DuelState::Idle);
        assert!(!machine.services.gate.is_held(GateFlag::DuelInProgress));
    }

    #[tokio::test]
    async fn self_elimination_respects_protection() {
        let fx = Fixture::new();
        let ada = fx.member(1, "Ada", ChatRole::Member).await;
        let boss = fx.member(2, "Boss", ChatRole::Creator).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));

        let text = machine.self_eliminate(CHAT, &boss).await.unwrap();
        assert!(text.contains("respawned at the bonfire"));
        assert!(fx.store.duelist(boss.id).await.unwrap().is_none());

        let text = machine.self_eliminate(CHAT, &ada).await.unwrap();
        assert!(text.ends_with("Respawn in 10 minutes."));
        let text = machine.self_eliminate(CHAT, &ada).await.unwrap();
        assert!(text.ends_with("Respawn in 20 minutes."));
        assert_eq!(machine.stats(&ada).await.unwrap(), "Wins: 0\nDeaths: 2");
    }

    #[tokio::test]
    async fn administrators_shoot_with_growing_restriction() {
        let fx = Fixture::new();
        let (ada, bob) = duelists(&fx).await;
        let sheriff = fx.member(3, "Sheriff", ChatRole::Administrator).await;
        let machine = DuelMachine::new(fx.services(GameConfig::default(), []));

        let err = machine
            .eliminate(CHAT, &ada, Target::Participant(bob.clone()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::Validation(ValidationError::NotAuthorized)
        ));
        let err = machine
            .eliminate(CHAT, &sheriff, Target::Missing)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::Validation(ValidationError::MissingUser)
        ));
        assert!(fx.membership.restrictions().is_empty());

        let text = machine
            .eliminate(CHAT, &sheriff, Target::Lookup("@bob".into()))
            .await
            .unwrap();
        assert_eq!(
            text,
            "💥 Sheriff shot Bob.\nBob is off to respawn for 10 minutes."
        );
        let text = machine
            .eliminate(CHAT, &sheriff, Target::Lookup("2".into()))
            .await
            .unwrap();
        assert!(text.ends_with("respawn for 20 minutes."));

        let lengths: Vec<_> = fx
            .membership
            .restrictions()
            .iter()
            .map(|r| (r.participant, r.until - start()))
            .collect();
        assert_eq!(
            lengths,
            vec![
                (bob.id, Duration::seconds(600)),
                (bob.id, Duration::seconds(1200)),
            ]
        );
        assert_eq!(machine.stats(&bob).await.unwrap(), "Wins: 0\nDeaths: 2");
        assert!(fx.store.duelist(sheriff.id).await.unwrap().is_none());
    }
}
