//! A room: membership, delivery, readiness, and the tournament state.
//!
//! Every operation takes the room's lock, mutates, and collects the
//! messages it wants to send as an [`Outbox`]. The outbox is pushed into
//! the members' unbounded channels before the lock is released, so every
//! member observes the room's messages in the order its state changed.
//! Channel sends never block; socket writes happen in each client's own
//! writer task.

use std::collections::{HashMap, HashSet};

use skirmish_protocol::{
    Choice, ClientId, FightStatus, Outcome, Recipient, RoomId, ServerMessage,
};
use tokio::sync::{Mutex, mpsc};

use crate::tournament::{self, Round};
use crate::{RoomError, RoomState};

/// Channel sender for delivering outbound messages to one client.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// Receiving half of a client's outbound channel.
pub type ClientReceiver = mpsc::UnboundedReceiver<ServerMessage>;

type Envelopes = Vec<(Recipient, ServerMessage)>;

/// Messages resolved to member channels.
#[must_use]
struct Outbox(Vec<(ClientSender, ServerMessage)>);

impl Outbox {
    /// Pushes every message into its channel. A closed channel means the
    /// client is disconnecting; the message is dropped.
    fn deliver(self) {
        for (sender, msg) in self.0 {
            let _ = sender.send(msg);
        }
    }
}

/// Per-member state. Readiness and the current move live here, so they
/// exist exactly as long as the membership does.
struct Member {
    sender: ClientSender,
    ready: bool,
    choice: Choice,
}

/// State guarded by the room lock.
struct RoomInner {
    id: RoomId,
    state: RoomState,
    members: HashMap<ClientId, Member>,
    /// Players still alive in the tournament. `Some` iff `Playing`.
    active: Option<HashSet<ClientId>>,
}

/// A named group of clients sharing signaling and one tournament.
///
/// Created and destroyed by [`RoomRegistry`](crate::RoomRegistry).
pub struct Room {
    id: RoomId,
    inner: Mutex<RoomInner>,
}

impl Room {
    pub(crate) fn new(id: RoomId) -> Self {
        Self {
            inner: Mutex::new(RoomInner {
                id: id.clone(),
                state: RoomState::Waiting,
                members: HashMap::new(),
                active: None,
            }),
            id,
        }
    }

    /// Returns the room's join key.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Runs `op` under the lock and delivers what it produced before
    /// releasing it.
    async fn mutate<F>(&self, op: F) -> Result<(), RoomError>
    where
        F: FnOnce(&mut RoomInner) -> Result<Envelopes, RoomError>,
    {
        let mut inner = self.inner.lock().await;
        let envelopes = op(&mut inner)?;
        inner.route(envelopes).deliver();
        Ok(())
    }

    /// Delivers envelopes that change no state.
    async fn deliver_now(&self, envelopes: Envelopes) {
        self.inner.lock().await.route(envelopes).deliver();
    }

    // -- Membership -------------------------------------------------------

    /// Adds a client, announces it to the other members, and confirms
    /// the join to the client itself.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the client is already a member.
    pub(crate) async fn join(&self, client: ClientId, sender: ClientSender) -> Result<(), RoomError> {
        self.mutate(|inner| inner.join(client, sender)).await
    }

    /// Removes a client and returns how many members remain.
    ///
    /// # Errors
    /// [`RoomError::NotInRoom`] if the client is not a member.
    pub(crate) async fn leave(&self, client: &ClientId) -> Result<usize, RoomError> {
        let mut inner = self.inner.lock().await;
        let envelopes = inner.leave(client)?;
        inner.route(envelopes).deliver();
        Ok(inner.members.len())
    }

    // -- Delivery ---------------------------------------------------------

    /// Delivers `msg` to every current member.
    pub async fn broadcast(&self, msg: ServerMessage) {
        self.deliver_now(vec![(Recipient::All, msg)]).await;
    }

    /// Delivers `msg` to every member except `exclude`.
    pub async fn broadcast_except(&self, msg: ServerMessage, exclude: &ClientId) {
        self.deliver_now(vec![(Recipient::AllExcept(exclude.clone()), msg)])
            .await;
    }

    /// Delivers `msg` to `target` if it is a current member; silently
    /// drops it otherwise.
    pub async fn send_to(&self, target: &ClientId, msg: ServerMessage) {
        self.deliver_now(vec![(Recipient::Client(target.clone()), msg)])
            .await;
    }

    // -- Tournament -------------------------------------------------------

    /// Marks `client` ready. Starts the tournament (or the next round)
    /// once every eligible player is ready.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] if the client is not a member.
    /// - [`RoomError::NotActivePlayer`] if a tournament is running and
    ///   the client is not in it.
    pub async fn fight(&self, client: &ClientId) -> Result<(), RoomError> {
        self.mutate(|inner| inner.fight(client)).await
    }

    /// Records `client`'s move and resolves the round once every active
    /// player has moved.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] if the client is not a member.
    /// - [`RoomError::NotPlaying`] if no tournament is running.
    /// - [`RoomError::NotActivePlayer`] if the client was eliminated.
    /// - [`RoomError::Invariant`] if resolution hits an impossible state.
    pub async fn shoot(&self, client: &ClientId, choice: Choice) -> Result<(), RoomError> {
        self.mutate(|inner| inner.shoot(client, choice)).await
    }

    // -- Inspection -------------------------------------------------------

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> RoomState {
        self.inner.lock().await.state
    }

    /// Returns the number of members.
    pub async fn member_count(&self) -> usize {
        self.inner.lock().await.members.len()
    }

    /// Returns `true` if `client` is a member.
    pub async fn contains(&self, client: &ClientId) -> bool {
        self.inner.lock().await.members.contains_key(client)
    }

    /// Returns the sorted active players, or `None` while waiting.
    pub async fn active_players(&self) -> Option<Vec<ClientId>> {
        let inner = self.inner.lock().await;
        inner.active.as_ref().map(|active| {
            let mut players: Vec<ClientId> = active.iter().cloned().collect();
            players.sort();
            players
        })
    }

    /// Returns whether `client` is ready, or `None` if not a member.
    pub async fn is_ready(&self, client: &ClientId) -> Option<bool> {
        self.inner.lock().await.members.get(client).map(|m| m.ready)
    }

    /// Returns `client`'s move this round, or `None` if not a member.
    pub async fn choice(&self, client: &ClientId) -> Option<Choice> {
        self.inner.lock().await.members.get(client).map(|m| m.choice)
    }
}

impl RoomInner {
    fn join(&mut self, client: ClientId, sender: ClientSender) -> Result<Envelopes, RoomError> {
        if self.members.contains_key(&client) {
            return Err(RoomError::AlreadyInRoom(client, self.id.clone()));
        }

        self.members.insert(
            client.clone(),
            Member {
                sender,
                ready: false,
                choice: Choice::None,
            },
        );
        tracing::info!(
            room_id = %self.id,
            client_id = %client,
            members = self.members.len(),
            "client joined"
        );

        Ok(vec![
            (
                Recipient::AllExcept(client.clone()),
                ServerMessage::new_member(client.clone()),
            ),
            (Recipient::Client(client.clone()), ServerMessage::joined(client)),
        ])
    }

    fn leave(&mut self, client: &ClientId) -> Result<Envelopes, RoomError> {
        if self.members.remove(client).is_none() {
            return Err(RoomError::NotInRoom(client.clone(), self.id.clone()));
        }
        tracing::info!(
            room_id = %self.id,
            client_id = %client,
            members = self.members.len(),
            "client left"
        );

        let was_active = self
            .active
            .as_mut()
            .is_some_and(|active| active.remove(client));
        if !was_active {
            return Ok(Vec::new());
        }

        let remaining: Vec<ClientId> = self
            .active
            .iter()
            .flatten()
            .cloned()
            .collect();
        match remaining.as_slice() {
            [] => {
                self.reset_game();
                Ok(Vec::new())
            }
            [champion] => {
                let champion = champion.clone();
                tracing::info!(
                    room_id = %self.id,
                    winner = %champion,
                    "last opponent left, walkover"
                );
                self.reset_game();
                Ok(vec![(Recipient::All, ServerMessage::final_win(champion))])
            }
            _ => self.resolve_if_complete(),
        }
    }

    fn fight(&mut self, client: &ClientId) -> Result<Envelopes, RoomError> {
        if !self.members.contains_key(client) {
            return Err(RoomError::NotInRoom(client.clone(), self.id.clone()));
        }
        if let Some(active) = &self.active {
            if !active.contains(client) {
                return Err(RoomError::NotActivePlayer(client.clone(), self.id.clone()));
            }
        }
        if let Some(member) = self.members.get_mut(client) {
            member.ready = true;
        }

        if !self.all_ready() {
            tracing::debug!(room_id = %self.id, client_id = %client, "client ready, waiting for others");
            return Ok(vec![(
                Recipient::AllExcept(client.clone()),
                ServerMessage::fight(FightStatus::Waiting),
            )]);
        }

        self.state = RoomState::Playing;
        let active = self
            .active
            .get_or_insert_with(|| self.members.keys().cloned().collect());
        tracing::info!(room_id = %self.id, players = active.len(), "round started");

        Ok(vec![(Recipient::All, ServerMessage::fight(FightStatus::Start))])
    }

    fn shoot(&mut self, client: &ClientId, choice: Choice) -> Result<Envelopes, RoomError> {
        if !self.members.contains_key(client) {
            return Err(RoomError::NotInRoom(client.clone(), self.id.clone()));
        }
        if !self.state.is_playing() {
            return Err(RoomError::NotPlaying(self.id.clone()));
        }
        if !self.active.as_ref().is_some_and(|active| active.contains(client)) {
            return Err(RoomError::NotActivePlayer(client.clone(), self.id.clone()));
        }
        if let Some(member) = self.members.get_mut(client) {
            member.choice = choice;
        }
        tracing::debug!(room_id = %self.id, client_id = %client, %choice, "move recorded");

        self.resolve_if_complete()
    }

    /// "All ready" is judged over the active players when a tournament
    /// is running, otherwise over every member.
    fn all_ready(&self) -> bool {
        match &self.active {
            Some(active) => active
                .iter()
                .all(|id| self.members.get(id).is_some_and(|m| m.ready)),
            None => self.members.values().all(|m| m.ready),
        }
    }

    fn resolve_if_complete(&mut self) -> Result<Envelopes, RoomError> {
        let Some(active) = &self.active else {
            return Ok(Vec::new());
        };
        let picks: Vec<(ClientId, Choice)> = active
            .iter()
            .map(|id| {
                let choice = self.members.get(id).map_or(Choice::None, |m| m.choice);
                (id.clone(), choice)
            })
            .collect();
        if picks.iter().any(|(_, choice)| !choice.is_some()) {
            return Ok(Vec::new());
        }

        let round = tournament::resolve(picks).inspect_err(|e| {
            tracing::warn!(room_id = %self.id, error = %e, "round resolution failed");
        })?;
        Ok(self.apply(round))
    }

    fn apply(&mut self, round: Round) -> Envelopes {
        match round {
            Round::Draw => {
                tracing::info!(room_id = %self.id, "round drawn");
                let players: Vec<ClientId> = self.active.iter().flatten().cloned().collect();
                self.clear_round(&players);
                vec![(Recipient::All, ServerMessage::outcome(Outcome::Draw))]
            }
            Round::Elimination {
                winning,
                winners,
                losers,
            } => {
                if let [champion] = winners.as_slice() {
                    let champion = champion.clone();
                    tracing::info!(room_id = %self.id, winner = %champion, %winning, "tournament won");
                    self.reset_game();
                    return vec![(Recipient::All, ServerMessage::final_win(champion))];
                }

                tracing::info!(
                    room_id = %self.id,
                    %winning,
                    survivors = winners.len(),
                    eliminated = losers.len(),
                    "round resolved"
                );
                self.active = Some(winners.iter().cloned().collect());
                self.clear_round(&winners);
                self.clear_round(&losers);

                winners
                    .into_iter()
                    .map(|id| (Recipient::Client(id), ServerMessage::outcome(Outcome::Win)))
                    .chain(
                        losers
                            .into_iter()
                            .map(|id| (Recipient::Client(id), ServerMessage::outcome(Outcome::Lose))),
                    )
                    .collect()
            }
        }
    }

    /// Clears readiness and moves for the given players.
    fn clear_round(&mut self, players: &[ClientId]) {
        for id in players {
            if let Some(member) = self.members.get_mut(id) {
                member.ready = false;
                member.choice = Choice::None;
            }
        }
    }

    /// Back to `Waiting`: no active players, every member unready.
    fn reset_game(&mut self) {
        self.state = RoomState::Waiting;
        self.active = None;
        for member in self.members.values_mut() {
            member.ready = false;
            member.choice = Choice::None;
        }
    }

    /// Resolves recipients to member channels.
    fn route(&self, envelopes: Envelopes) -> Outbox {
        let mut out = Vec::new();
        for (recipient, msg) in envelopes {
            match recipient {
                Recipient::All => {
                    for member in self.members.values() {
                        out.push((member.sender.clone(), msg.clone()));
                    }
                }
                Recipient::Client(id) => {
                    if let Some(member) = self.members.get(&id) {
                        out.push((member.sender.clone(), msg));
                    }
                }
                Recipient::AllExcept(excluded) => {
                    for (id, member) in &self.members {
                        if *id != excluded {
                            out.push((member.sender.clone(), msg.clone()));
                        }
                    }
                }
            }
        }
        Outbox(out)
    }
}
