use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    Callback, LeaderboardMember, LeaderboardSdk, PlayerNameResponse, RankResponse, Response,
    ScoreListResponse, SessionResponse, STATUS_OK,
};

const STATUS_NOT_FOUND: u16 = 404;
const STATUS_UNAVAILABLE: u16 = 503;

#[derive(Default)]
struct Board {
    /// Best score per member, per leaderboard key.
    scores: HashMap<String, HashMap<String, i64>>,
    names: HashMap<String, String>,
    session: Option<String>,
    guests: u32,
}

/// In-process SDK that answers every call immediately on the caller's thread.
///
/// Keeps the highest score per member. `offline()` builds one that fails
/// every request, for exercising error paths.
#[derive(Default)]
pub struct MemoryLeaderboard {
    board: Mutex<Board>,
    offline: bool,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            board: Mutex::default(),
            offline: true,
        }
    }

    /// Seed a score directly, bypassing any session.
    pub fn insert(&self, key: &str, member_id: &str, score: i64) {
        record(&mut self.board(), key, member_id, score);
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ranked(&self, key: &str) -> Vec<LeaderboardMember> {
        let board = self.board();
        let mut entries: Vec<(&String, &i64)> = board
            .scores
            .get(key)
            .map(|scores| scores.iter().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (member_id, score))| LeaderboardMember {
                member_id: member_id.clone(),
                rank: index as u32 + 1,
                score: *score,
                player_name: board.names.get(member_id).cloned(),
            })
            .collect()
    }

    fn unavailable() -> Option<String> {
        Some("leaderboard service unavailable".to_string())
    }
}

fn record(board: &mut Board, key: &str, member_id: &str, score: i64) {
    let best = board
        .scores
        .entry(key.to_string())
        .or_default()
        .entry(member_id.to_string())
        .or_insert(score);
    *best = (*best).max(score);
}

impl LeaderboardSdk for MemoryLeaderboard {
    fn start_guest_session(&self, callback: Callback<SessionResponse>) {
        if self.offline {
            callback(SessionResponse {
                success: false,
                member_id: None,
                error: Self::unavailable(),
            });
            return;
        }
        let member_id = {
            let mut board = self.board();
            board.guests += 1;
            let member_id = format!("guest-{}", board.guests);
            board.session = Some(member_id.clone());
            member_id
        };
        callback(SessionResponse {
            success: true,
            member_id: Some(member_id),
            error: None,
        });
    }

    fn submit_score(&self, member_id: &str, score: i64, key: &str, callback: Callback<Response>) {
        if self.offline {
            callback(Response {
                status_code: STATUS_UNAVAILABLE,
                error: Self::unavailable(),
            });
            return;
        }
        record(&mut self.board(), key, member_id, score);
        callback(Response {
            status_code: STATUS_OK,
            error: None,
        });
    }

    fn get_score_list(
        &self,
        key: &str,
        count: usize,
        after: u32,
        callback: Callback<ScoreListResponse>,
    ) {
        if self.offline {
            callback(ScoreListResponse {
                status_code: STATUS_UNAVAILABLE,
                error: Self::unavailable(),
                items: Vec::new(),
            });
            return;
        }
        let items = self
            .ranked(key)
            .into_iter()
            .skip(after as usize)
            .take(count)
            .collect();
        callback(ScoreListResponse {
            status_code: STATUS_OK,
            error: None,
            items,
        });
    }

    fn get_member_rank(&self, key: &str, member_id: &str, callback: Callback<RankResponse>) {
        if self.offline {
            callback(RankResponse {
                status_code: STATUS_UNAVAILABLE,
                error: Self::unavailable(),
                rank: 0,
            });
            return;
        }
        let rank = self
            .ranked(key)
            .into_iter()
            .find(|member| member.member_id == member_id)
            .map(|member| member.rank);
        callback(match rank {
            Some(rank) => RankResponse {
                status_code: STATUS_OK,
                error: None,
                rank,
            },
            None => RankResponse {
                status_code: STATUS_NOT_FOUND,
                error: Some(format!("member {member_id} has no score on {key}")),
                rank: 0,
            },
        });
    }

    fn get_player_name(&self, callback: Callback<PlayerNameResponse>) {
        if self.offline {
            callback(PlayerNameResponse {
                success: false,
                name: String::new(),
                error: Self::unavailable(),
            });
            return;
        }
        let name = {
            let board = self.board();
            board
                .session
                .as_ref()
                .and_then(|member_id| board.names.get(member_id).cloned())
                .unwrap_or_default()
        };
        callback(PlayerNameResponse {
            success: true,
            name,
            error: None,
        });
    }

    fn set_player_name(&self, name: &str, callback: Callback<PlayerNameResponse>) {
        let stored = {
            let mut board = self.board();
            match (self.offline, board.session.clone()) {
                (false, Some(member_id)) => {
                    board.names.insert(member_id, name.to_string());
                    true
                }
                _ => false,
            }
        };
        callback(if stored {
            PlayerNameResponse {
                success: true,
                name: name.to_string(),
                error: None,
            }
        } else {
            PlayerNameResponse {
                success: false,
                name: String::new(),
                error: Some("no active session".to_string()),
            }
        });
    }
}
