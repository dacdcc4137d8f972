//! The game host: one entry point per chat command.
//!
//! Every operation returns either a reply for the dispatcher to post or a
//! [`GameError`]. User-facing errors carry their reply text; everything
//! else has already been logged and forwarded to the operator chat by the
//! time the caller sees it.

use std::sync::Arc;

use saloon_core::{
    AffordanceAction, ButtonPress, ChatId, Participant, RandomSource, SeededRandom,
};

use crate::config::GameConfig;
use crate::duel::{
    ChallengeIssued, ChallengeRequest, DuelMachine, DuelState, PressOutcome, Target,
};
use crate::error::{GameError, GameResult};
use crate::gate::ExclusionGate;
use crate::lottery::{Lottery, LotteryOutcome};
use crate::services::{Collaborators, Services};

/// Hosts the duel and the daily lottery for any number of chats.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct GameHost {
    services: Services,
    duel: DuelMachine,
    lottery: Lottery,
}

impl GameHost {
    /// A host seeded from `config.seed`, or from the OS when unset.
    pub fn new(config: GameConfig, collaborators: Collaborators) -> Self {
        let random: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::from_seed(seed)),
            None => Box::new(SeededRandom::from_entropy()),
        };
        Self::with_random(config, collaborators, random)
    }

    /// A host drawing from an explicit random source.
    pub fn with_random(
        config: GameConfig,
        collaborators: Collaborators,
        random: Box<dyn RandomSource>,
    ) -> Self {
        let services = Services::new(config, collaborators, random);
        Self {
            duel: DuelMachine::new(services.clone()),
            lottery: Lottery::new(services.clone()),
            services,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.services.config
    }

    /// The shared exclusion gate.
    pub fn gate(&self) -> &Arc<ExclusionGate> {
        &self.services.gate
    }

    /// Current state of the duel slot.
    pub fn duel_state(&self) -> DuelState {
        self.duel.state()
    }

    /// Random draws taken since the host was created.
    pub fn random_draws(&self) -> u64 {
        self.services.draws()
    }

    /// Forward non-user-facing failures to the operator.
    async fn checked<T>(&self, context: &str, result: GameResult<T>) -> GameResult<T> {
        if let Err(e) = &result {
            if !e.is_user_facing() {
                self.services.report(context, e).await;
            }
        }
        result
    }

    /// Issue a duel challenge.
    pub async fn challenge(&self, request: ChallengeRequest) -> GameResult<ChallengeIssued> {
        let result = self.duel.challenge(request).await;
        self.checked("challenge", result).await
    }

    /// Handle a press of the accept button.
    pub async fn accept_challenge(&self, press: &ButtonPress) -> GameResult<PressOutcome> {
        let result = self.duel.accept(press).await;
        self.checked("accept challenge", result).await
    }

    /// Handle a press of the decline button.
    pub async fn decline_challenge(&self, press: &ButtonPress) -> GameResult<PressOutcome> {
        let result = self.duel.decline(press).await;
        self.checked("decline challenge", result).await
    }

    /// Route a button press by its action.
    pub async fn press(
        &self,
        action: AffordanceAction,
        press: &ButtonPress,
    ) -> GameResult<PressOutcome> {
        match action {
            AffordanceAction::AcceptDuel => self.accept_challenge(press).await,
            AffordanceAction::DeclineDuel => self.decline_challenge(press).await,
        }
    }

    /// Draw (or read back) today's lottery winner.
    pub async fn draw_lottery(&self, chat: ChatId) -> GameResult<LotteryOutcome> {
        let result = self.lottery.draw(chat).await;
        self.checked("lottery", result).await
    }

    /// Record a participant in the directory so they can be looked up later.
    pub async fn remember(&self, participant: &Participant) -> GameResult<()> {
        let result = self
            .services
            .store
            .remember(participant)
            .await
            .map_err(GameError::from);
        self.checked("remember participant", result).await
    }

    /// Join the lottery pool.
    pub async fn register(&self, participant: &Participant) -> GameResult<String> {
        let result = self.lottery.register(participant).await;
        self.checked("lottery registration", result).await
    }

    /// Leave the lottery pool.
    pub async fn unregister(&self, participant: &Participant) -> GameResult<String> {
        let result = self.lottery.unregister(participant).await;
        self.checked("lottery deregistration", result).await
    }

    /// Remove somebody else from the pool. Administrators only.
    pub async fn remove_from_pool(
        &self,
        chat: ChatId,
        actor: &Participant,
        query: Option<&str>,
    ) -> GameResult<String> {
        let result = self.lottery.remove(chat, actor, query).await;
        self.checked("lottery removal", result).await
    }

    /// Registered participants, split into messages. Administrators only.
    pub async fn pool_listing(
        &self,
        chat: ChatId,
        actor: &Participant,
    ) -> GameResult<Vec<String>> {
        let result = self.lottery.listing(chat, actor).await;
        self.checked("lottery listing", result).await
    }

    /// A participant's own lottery record.
    pub async fn lottery_personal(&self, participant: &Participant) -> GameResult<String> {
        let result = self.lottery.personal(participant).await;
        self.checked("lottery personal stats", result).await
    }

    /// Top winners of `year`, or of all time.
    pub async fn lottery_leaderboard(&self, year: Option<i32>) -> GameResult<String> {
        let result = self.lottery.leaderboard(year).await;
        self.checked("lottery leaderboard", result).await
    }

    /// The lottery rules.
    pub fn lottery_rules(&self) -> &'static str {
        self.lottery.rules()
    }

    /// A participant's duel record.
    pub async fn duel_stats(&self, participant: &Participant) -> GameResult<String> {
        let result = self.duel.stats(participant).await;
        self.checked("duel stats", result).await
    }

    /// Shoot somebody outright. Administrators only.
    pub async fn eliminate(
        &self,
        chat: ChatId,
        actor: &Participant,
        target: Target,
    ) -> GameResult<String> {
        let result = self.duel.eliminate(chat, actor, target).await;
        self.checked("administrative elimination", result).await
    }

    /// Shoot yourself. Protected roles respawn at once.
    pub async fn self_eliminate(
        &self,
        chat: ChatId,
        participant: &Participant,
    ) -> GameResult<String> {
        let result = self.duel.self_eliminate(chat, participant).await;
        self.checked("self elimination", result).await
    }
}
