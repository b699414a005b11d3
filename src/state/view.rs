//! Field-to-label translation of the merged state.
//!
//! Nothing here decides game behaviour; it only turns a `ViewState` into text
//! a frontend can show.

use super::{Decision, ViewState};
use crate::types::*;

/// Which top-level view is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Home,
    /// Picking a display name for `party_id`
    Name { party_id: PartyId },
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Shown next to the input that caused it
    Inline,
    /// Non-fatal popup
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Inline,
            text: text.into(),
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Alert,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub party_id: PartyId,
    pub player_name: String,
    pub role: &'static str,
    pub stars: u32,
    pub questions_left: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    pub state: &'static str,
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerChoice {
    pub id: PlayerId,
    pub label: String,
}

/// Phase-critical content; rebuilt only when the fingerprint changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainPanel {
    Placeholder(String),
    Vote {
        title: String,
        question: String,
        choices: Vec<PlayerChoice>,
    },
    PickTask {
        title: String,
        prompt: String,
        /// Indexed by task index
        options: Vec<String>,
    },
    Result {
        title: String,
        headline: String,
        task: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankRow {
    pub rank: usize,
    pub name: String,
    pub stars: u32,
}

/// Everything a frontend needs to draw one update
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub screen: Screen,
    pub header: Option<Header>,
    pub status: Option<StatusInfo>,
    /// Last built main panel
    pub main: Option<MainPanel>,
    /// Whether `main` was rebuilt since the previous frame
    pub main_rebuilt: bool,
    pub selection: LocalSelection,
    pub has_voted: bool,
    pub action: Decision,
    /// Present while the ranking panel is open
    pub ranking: Option<Vec<RankRow>>,
    pub notices: Vec<Notice>,
}

pub fn header(view: &ViewState, session: &ClientSession) -> Header {
    Header {
        party_id: if view.party_id.is_empty() {
            session.party_id.clone()
        } else {
            view.party_id.clone()
        },
        player_name: if view.name.is_empty() {
            session.player_name.clone()
        } else {
            view.name.clone()
        },
        role: if session.is_host { "Host" } else { "Player" },
        stars: view.stars,
        questions_left: view.questions_left,
    }
}

pub fn status(view: &ViewState, session: &ClientSession) -> StatusInfo {
    let is_host = session.is_host;
    let (state, primary, secondary) = match view.phase {
        Phase::Idle => (
            "Lobby",
            "Lobby".to_string(),
            if is_host {
                "Tap Start round when everyone is ready."
            } else {
                "Waiting for host."
            }
            .to_string(),
        ),
        Phase::Voting => (
            "Voting",
            "Vote for one person.".to_string(),
            if view.has_voted {
                "You voted. Waiting for others."
            } else {
                "Tap one name and confirm."
            }
            .to_string(),
        ),
        Phase::TaskChoice if view.is_star(&session.player_id) => (
            "Task choice",
            "Pick one task.".to_string(),
            "Tap a task then confirm.".to_string(),
        ),
        Phase::TaskChoice => (
            "Task choice",
            "Waiting for the star.".to_string(),
            match view.star_name() {
                Some(name) => format!("Waiting for {} to choose.", name),
                None => "Star is choosing.".to_string(),
            },
        ),
        Phase::TaskResult => (
            "Result",
            "Task revealed.".to_string(),
            if is_host {
                "Tap Next round when you are ready."
            } else {
                "Wait for host to start next round."
            }
            .to_string(),
        ),
        Phase::Finished => (
            "Finished",
            "No more questions.".to_string(),
            "Open ranking and tap Exit.".to_string(),
        ),
    };

    StatusInfo {
        state,
        primary,
        secondary,
    }
}

pub fn main_panel(view: &ViewState, session: &ClientSession) -> MainPanel {
    match view.phase {
        Phase::Finished => MainPanel::Placeholder(
            "No more questions. Open ranking and tap Exit when you are done.".to_string(),
        ),
        Phase::Idle => MainPanel::Placeholder(
            if session.is_host {
                "Tap Start round to begin."
            } else {
                "Waiting for host to start the next round."
            }
            .to_string(),
        ),
        Phase::Voting => MainPanel::Vote {
            title: "In this party".to_string(),
            question: view.question_text.clone().unwrap_or_default(),
            choices: view
                .players
                .iter()
                .map(|p| PlayerChoice {
                    id: p.id.clone(),
                    label: p.name.clone(),
                })
                .collect(),
        },
        Phase::TaskChoice if view.is_star(&session.player_id) => MainPanel::PickTask {
            title: "You are the star of this round.".to_string(),
            prompt: "Choose one task and confirm.".to_string(),
            options: view.task_options.clone(),
        },
        Phase::TaskChoice => MainPanel::Placeholder(match view.star_name() {
            Some(name) => format!("{} has the majority votes and is choosing a task.", name),
            None => "The star is choosing a task.".to_string(),
        }),
        Phase::TaskResult => match (view.star_name(), &view.selected_task) {
            (Some(name), Some(task)) => MainPanel::Result {
                title: "Result".to_string(),
                headline: format!("{} selected:", name),
                task: Some(task.clone()),
            },
            _ => MainPanel::Result {
                title: "Result".to_string(),
                headline: "Waiting for host to start the next round.".to_string(),
                task: None,
            },
        },
    }
}

pub fn ranking(view: &ViewState) -> Vec<RankRow> {
    view.players
        .iter()
        .enumerate()
        .map(|(i, p)| RankRow {
            rank: i + 1,
            name: p.name.clone(),
            stars: p.stars,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::reconcile;
    use super::*;

    #[test]
    fn test_idle_copy_depends_on_role() {
        let view = reconcile(None, snapshot(Phase::Idle, 0));

        assert_eq!(
            main_panel(&view, &session("p1", true)),
            MainPanel::Placeholder("Tap Start round to begin.".to_string())
        );
        assert_eq!(
            status(&view, &session("p2", false)).secondary,
            "Waiting for host."
        );
    }

    #[test]
    fn test_voting_panel_lists_players() {
        let view = reconcile(None, snapshot(Phase::Voting, 1));
        match main_panel(&view, &session("p1", false)) {
            MainPanel::Vote {
                question, choices, ..
            } => {
                assert_eq!(question, "Who is the most kind?");
                let ids: Vec<_> = choices.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids, vec!["p1", "p2", "p3"]);
            }
            other => panic!("Expected vote panel, got {:?}", other),
        }
    }

    #[test]
    fn test_voting_status_after_vote() {
        let mut view = reconcile(None, snapshot(Phase::Voting, 1));
        view.select_vote_target("p2");
        view.mark_vote_sent();
        assert_eq!(
            status(&view, &session("p1", false)).secondary,
            "You voted. Waiting for others."
        );
    }

    #[test]
    fn test_task_choice_for_star_and_others() {
        let mut snap = with_star(snapshot(Phase::TaskChoice, 1), "p2", "Bob");
        snap.task_options_for_star = vec!["Sing".to_string(), "Dance".to_string()];
        let view = reconcile(None, snap);

        match main_panel(&view, &session("p2", false)) {
            MainPanel::PickTask { options, .. } => assert_eq!(options.len(), 2),
            other => panic!("Expected task panel, got {:?}", other),
        }
        assert_eq!(
            main_panel(&view, &session("p1", true)),
            MainPanel::Placeholder("Bob has the majority votes and is choosing a task.".to_string())
        );
        assert_eq!(
            status(&view, &session("p1", true)).secondary,
            "Waiting for Bob to choose."
        );
    }

    #[test]
    fn test_unknown_star_copy_is_generic() {
        let view = reconcile(None, with_star(snapshot(Phase::TaskChoice, 1), "ghost", "Ghost"));

        assert_eq!(
            main_panel(&view, &session("p1", true)),
            MainPanel::Placeholder("The star is choosing a task.".to_string())
        );
        assert_eq!(status(&view, &session("p1", true)).secondary, "Star is choosing.");
    }

    #[test]
    fn test_result_panel() {
        let mut snap = with_star(snapshot(Phase::TaskResult, 1), "p2", "Bob");
        snap.selected_task = Some("Sing a chorus".to_string());
        let view = reconcile(None, snap);

        assert_eq!(
            main_panel(&view, &session("p1", true)),
            MainPanel::Result {
                title: "Result".to_string(),
                headline: "Bob selected:".to_string(),
                task: Some("Sing a chorus".to_string()),
            }
        );

        let view = reconcile(None, snapshot(Phase::TaskResult, 1));
        match main_panel(&view, &session("p1", true)) {
            MainPanel::Result { task, headline, .. } => {
                assert!(task.is_none());
                assert_eq!(headline, "Waiting for host to start the next round.");
            }
            other => panic!("Expected result panel, got {:?}", other),
        }
    }

    #[test]
    fn test_ranking_rows() {
        let mut snap = snapshot(Phase::Idle, 0);
        snap.players = vec![player("p2", "Bob", 3), player("p1", "Alice", 1)];
        let view = reconcile(None, snap);

        let rows = ranking(&view);
        assert_eq!(rows[0], RankRow { rank: 1, name: "Bob".to_string(), stars: 3 });
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn test_header_falls_back_to_session() {
        let snap: PartySnapshot = serde_json::from_str(r#"{"state": "idle"}"#).unwrap();
        let view = reconcile(None, snap);

        let header = header(&view, &session("p1", true));
        assert_eq!(header.party_id, "0421");
        assert_eq!(header.player_name, "Alice");
        assert_eq!(header.role, "Host");
    }
}
