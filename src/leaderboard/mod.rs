//! Leaderboard proxy
//!
//! Thin wrapper over an external leaderboard SDK. Every SDK call is
//! fire-and-forget with a single completion callback; the proxy caches what
//! comes back (member id, player name, downloaded scores) and tells
//! listeners about it. Failures are logged and otherwise ignored.

mod memory;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub use memory::MemoryLeaderboard;

pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

pub const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResponse {
    pub success: bool,
    pub member_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardMember {
    pub member_id: String,
    pub rank: u32,
    pub score: i64,
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreListResponse {
    pub status_code: u16,
    pub error: Option<String>,
    pub items: Vec<LeaderboardMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankResponse {
    pub status_code: u16,
    pub error: Option<String>,
    pub rank: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerNameResponse {
    pub success: bool,
    pub name: String,
    pub error: Option<String>,
}

/// Shape of the external SDK. Implementations may answer on any thread.
pub trait LeaderboardSdk: Send + Sync + 'static {
    fn start_guest_session(&self, callback: Callback<SessionResponse>);
    fn submit_score(&self, member_id: &str, score: i64, key: &str, callback: Callback<Response>);
    /// Download `count` entries starting after rank offset `after`.
    fn get_score_list(
        &self,
        key: &str,
        count: usize,
        after: u32,
        callback: Callback<ScoreListResponse>,
    );
    fn get_member_rank(&self, key: &str, member_id: &str, callback: Callback<RankResponse>);
    fn get_player_name(&self, callback: Callback<PlayerNameResponse>);
    fn set_player_name(&self, name: &str, callback: Callback<PlayerNameResponse>);
}

fn default_key() -> String {
    "blobs_leaderboard".to_string()
}

fn default_download_count() -> usize {
    11
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSettings {
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_download_count")]
    pub download_count: usize,
    #[serde(default)]
    pub show_debug: bool,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            key: default_key(),
            download_count: default_download_count(),
            show_debug: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardEvent {
    PlayerNameSet(String),
    SessionReady,
    TopScoresUpdated,
    NearbyScoresUpdated,
}

type Listener = Box<dyn FnMut(&LeaderboardEvent) + Send>;

#[derive(Debug, Default)]
struct State {
    member_id: String,
    player_name: String,
    members: Vec<LeaderboardMember>,
}

/// Listeners plus the events waiting for them. Events raised while a
/// delivery is in progress are queued and handed out by that same delivery.
#[derive(Default)]
struct Dispatch {
    listeners: Vec<Listener>,
    queue: VecDeque<LeaderboardEvent>,
    delivering: bool,
}

struct Shared {
    settings: LeaderboardSettings,
    state: Mutex<State>,
    dispatch: Mutex<Dispatch>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self) -> MutexGuard<'_, Dispatch> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: LeaderboardEvent) {
        {
            let mut dispatch = self.dispatch();
            dispatch.queue.push_back(event);
            if dispatch.delivering {
                return;
            }
            dispatch.delivering = true;
        }
        loop {
            // Listeners run outside the lock so they may emit or register listeners.
            let (event, mut listeners) = {
                let mut dispatch = self.dispatch();
                let Some(event) = dispatch.queue.pop_front() else {
                    dispatch.delivering = false;
                    return;
                };
                (event, std::mem::take(&mut dispatch.listeners))
            };
            for listener in listeners.iter_mut() {
                listener(&event);
            }
            let mut dispatch = self.dispatch();
            listeners.append(&mut dispatch.listeners);
            dispatch.listeners = listeners;
        }
    }

    fn verbose(&self, message: std::fmt::Arguments<'_>) {
        if self.settings.show_debug {
            info!("{message}");
        } else {
            debug!("{message}");
        }
    }

    fn store_members(&self, members: Vec<LeaderboardMember>, label: &str) {
        self.verbose(format_args!(
            "leaderboard {label} downloaded: {} member(s)",
            members.len()
        ));
        if self.settings.show_debug {
            for member in &members {
                info!("  #{} {} {}", member.rank, member.member_id, member.score);
            }
        }
        self.state().members = members;
    }
}

pub struct LeaderboardTool<S: LeaderboardSdk> {
    sdk: Arc<S>,
    shared: Arc<Shared>,
}

impl<S: LeaderboardSdk> Clone for LeaderboardTool<S> {
    fn clone(&self) -> Self {
        Self {
            sdk: Arc::clone(&self.sdk),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: LeaderboardSdk> LeaderboardTool<S> {
    pub fn new(sdk: S, settings: LeaderboardSettings) -> Self {
        Self {
            sdk: Arc::new(sdk),
            shared: Arc::new(Shared {
                settings,
                state: Mutex::new(State::default()),
                dispatch: Mutex::new(Dispatch::default()),
            }),
        }
    }

    pub fn on_event(&self, listener: impl FnMut(&LeaderboardEvent) + Send + 'static) {
        self.shared.dispatch().listeners.push(Box::new(listener));
    }

    /// Open a guest session, then pull the player name and top scores.
    pub fn start(&self) {
        let tool = self.clone();
        self.sdk.start_guest_session(Box::new(move |response| {
            if !response.success {
                warn!(
                    "error starting leaderboard session: {}",
                    response.error.as_deref().unwrap_or("unknown error")
                );
                return;
            }
            if let Some(member_id) = response.member_id {
                tool.shared.state().member_id = member_id;
            }
            tool.shared
                .verbose(format_args!("leaderboard session started"));
            tool.fetch_player_name();
            tool.refresh_top_scores();
            tool.shared.emit(LeaderboardEvent::SessionReady);
        }));
    }

    /// Submit under the session's member id, or `"Test"` before a session exists.
    pub fn submit_score(&self, score: i64) {
        let member_id = {
            let state = self.shared.state();
            if state.member_id.trim().is_empty() {
                "Test".to_string()
            } else {
                state.member_id.clone()
            }
        };
        let shared = Arc::clone(&self.shared);
        let key = self.shared.settings.key.clone();
        let submitted_as = member_id.clone();
        self.sdk.submit_score(
            &member_id,
            score,
            &self.shared.settings.key,
            Box::new(move |response| {
                if response.status_code == STATUS_OK {
                    shared.verbose(format_args!(
                        "score submitted: member {submitted_as}, score {score}, leaderboard {key}"
                    ));
                } else {
                    warn!(
                        "submit score failed ({}): {}",
                        response.status_code,
                        response.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }),
        );
    }

    pub fn refresh_top_scores(&self) {
        let shared = Arc::clone(&self.shared);
        let settings = &self.shared.settings;
        self.sdk.get_score_list(
            &settings.key,
            settings.download_count,
            0,
            Box::new(move |response| {
                if response.status_code != STATUS_OK {
                    warn!(
                        "get top scores failed ({}): {}",
                        response.status_code,
                        response.error.as_deref().unwrap_or("unknown error")
                    );
                    return;
                }
                shared.store_members(response.items, "top scores");
                shared.emit(LeaderboardEvent::TopScoresUpdated);
            }),
        );
    }

    /// Look up the member's rank, then download the page centred on it.
    pub fn refresh_scores_around_member(&self) {
        let member_id = self.shared.state().member_id.clone();
        let sdk = Arc::clone(&self.sdk);
        let shared = Arc::clone(&self.shared);
        self.sdk.get_member_rank(
            &self.shared.settings.key,
            &member_id,
            Box::new(move |response| {
                if response.status_code != STATUS_OK {
                    warn!(
                        "get member rank failed ({}): {}",
                        response.status_code,
                        response.error.as_deref().unwrap_or("unknown error")
                    );
                    return;
                }
                let after = scores_after(response.rank);
                let inner = Arc::clone(&shared);
                sdk.get_score_list(
                    &shared.settings.key,
                    shared.settings.download_count,
                    after,
                    Box::new(move |scores| {
                        if scores.status_code != STATUS_OK {
                            warn!(
                                "get scores around member failed ({}): {}",
                                scores.status_code,
                                scores.error.as_deref().unwrap_or("unknown error")
                            );
                            return;
                        }
                        inner.store_members(scores.items, "scores around member");
                        inner.emit(LeaderboardEvent::NearbyScoresUpdated);
                    }),
                );
            }),
        );
    }

    pub fn fetch_player_name(&self) {
        let shared = Arc::clone(&self.shared);
        self.sdk.get_player_name(Box::new(move |response| {
            if !response.success {
                warn!(
                    "error getting player name: {}",
                    response.error.as_deref().unwrap_or("unknown error")
                );
                return;
            }
            info!("retrieved player name: {}", response.name);
            shared.state().player_name = response.name.clone();
            shared.emit(LeaderboardEvent::PlayerNameSet(response.name));
        }));
    }

    pub fn update_player_name(&self, name: &str) {
        let shared = Arc::clone(&self.shared);
        let requested = name.to_string();
        self.sdk.set_player_name(
            name,
            Box::new(move |response| {
                if !response.success {
                    warn!(
                        "error setting player name: {}",
                        response.error.as_deref().unwrap_or("unknown error")
                    );
                    return;
                }
                let member_id = {
                    let mut state = shared.state();
                    state.player_name = requested.clone();
                    state.member_id.clone()
                };
                info!("player name set to {requested} ({member_id})");
                shared.emit(LeaderboardEvent::PlayerNameSet(requested));
            }),
        );
    }

    pub fn member_id(&self) -> String {
        self.shared.state().member_id.clone()
    }

    pub fn player_name(&self) -> String {
        self.shared.state().player_name.clone()
    }

    pub fn members(&self) -> Vec<LeaderboardMember> {
        self.shared.state().members.clone()
    }

    pub fn settings(&self) -> &LeaderboardSettings {
        &self.shared.settings
    }
}

/// Rank offset for a page of scores around `rank`: five places above it, clamped at the top.
pub fn scores_after(rank: u32) -> u32 {
    if rank < 6 {
        0
    } else {
        rank - 5
    }
}
