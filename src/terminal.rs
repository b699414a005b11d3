//! Line-oriented terminal frontend.
//!
//! Prints only what changed between frames: the main panel when the client
//! rebuilt it, the header/status/action lines when their text differs.

use crate::client::{ClientResult, Frontend, Input};
use crate::protocol::UiEvent;
use crate::state::view::{Frame, MainPanel, NoticeKind, RankRow, Screen};
use crate::types::*;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HOME_HELP: &str = "Commands: create | join <party id> | quit";
const NAME_HELP: &str = "Type your name | back";
const GAME_HELP: &str =
    "Commands: vote <n> | task <n> | ok | ranking | close | exit | quit";

pub struct TerminalFrontend<W: Write> {
    out: W,
    screen: Option<Screen>,
    header_line: Option<String>,
    status_line: Option<String>,
    action_line: Option<String>,
    ranking: Option<Vec<RankRow>>,
    /// Player ids of the last vote panel, in display order
    vote_choices: Vec<PlayerId>,
    task_count: usize,
    hint: Option<String>,
}

impl<W: Write> TerminalFrontend<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            screen: None,
            header_line: None,
            status_line: None,
            action_line: None,
            ranking: None,
            vote_choices: Vec::new(),
            task_count: 0,
            hint: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// 1-based choice number from the rest of a command line
    fn choice(&mut self, arg: &str, len: usize) -> Option<usize> {
        match arg.parse::<usize>() {
            Ok(n) if n >= 1 && n <= len => Some(n - 1),
            _ => {
                self.hint = Some(format!("Pick a number between 1 and {}", len));
                None
            }
        }
    }

    fn print_if_changed(&mut self, line: String, last: LineSlot) -> ClientResult<()> {
        let slot = match last {
            LineSlot::Header => &mut self.header_line,
            LineSlot::Status => &mut self.status_line,
            LineSlot::Action => &mut self.action_line,
        };
        if slot.as_deref() != Some(line.as_str()) {
            writeln!(self.out, "{}", line)?;
            *slot = Some(line);
        }
        Ok(())
    }

    fn reset_game_lines(&mut self) {
        self.header_line = None;
        self.status_line = None;
        self.action_line = None;
        self.ranking = None;
        self.vote_choices.clear();
        self.task_count = 0;
    }
}

#[derive(Clone, Copy)]
enum LineSlot {
    Header,
    Status,
    Action,
}

/// Text lines for a main panel, choices numbered from 1
pub fn panel_lines(panel: &MainPanel) -> Vec<String> {
    match panel {
        MainPanel::Placeholder(text) => vec![text.clone()],
        MainPanel::Vote {
            title,
            question,
            choices,
        } => {
            let mut lines = vec![question.clone(), format!("{}:", title)];
            lines.extend(
                choices
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!("  {}) {}", i + 1, c.label)),
            );
            lines
        }
        MainPanel::PickTask {
            title,
            prompt,
            options,
        } => {
            let mut lines = vec![title.clone(), prompt.clone()];
            lines.extend(
                options
                    .iter()
                    .enumerate()
                    .map(|(i, task)| format!("  {}) {}", i + 1, task)),
            );
            lines
        }
        MainPanel::Result {
            title,
            headline,
            task,
        } => {
            let mut lines = vec![format!("{}: {}", title, headline)];
            if let Some(task) = task {
                lines.push(format!("  {}", task));
            }
            lines
        }
    }
}

fn action_line(frame: &Frame) -> String {
    let mut line = if frame.action.is_enabled() {
        format!("Action: [{}] (type ok)", frame.action.label)
    } else {
        format!("Action: ({})", frame.action.label)
    };
    if let Some(target) = &frame.selection.vote_target_id {
        line.push_str(&format!(" | vote: {}", target));
    }
    if let Some(index) = frame.selection.task_index {
        line.push_str(&format!(" | task: {}", index + 1));
    }
    line
}

impl<W: Write> Frontend for TerminalFrontend<W> {
    fn render(&mut self, frame: &Frame) -> ClientResult<()> {
        if self.screen.as_ref() != Some(&frame.screen) {
            match &frame.screen {
                Screen::Home => writeln!(self.out, "== Actrix ==\n{}", HOME_HELP)?,
                Screen::Name { party_id } => {
                    writeln!(self.out, "Party {}. Choose a name (max {} characters).", party_id, MAX_NAME_CHARS)?;
                    writeln!(self.out, "{}", NAME_HELP)?;
                }
                Screen::Game => writeln!(self.out, "{}", GAME_HELP)?,
            }
            self.reset_game_lines();
            self.screen = Some(frame.screen.clone());
        }

        for notice in &frame.notices {
            match notice.kind {
                NoticeKind::Alert => writeln!(self.out, "! {}", notice.text)?,
                NoticeKind::Inline => writeln!(self.out, "  > {}", notice.text)?,
            }
        }

        if frame.screen == Screen::Game {
            if let Some(header) = &frame.header {
                let line = format!(
                    "[{}] {} ({}) stars: {} | questions left: {}",
                    header.party_id,
                    header.player_name,
                    header.role,
                    header.stars,
                    header.questions_left
                );
                self.print_if_changed(line, LineSlot::Header)?;
            }

            let status = match &frame.status {
                Some(status) => format!(
                    "{}: {} {}",
                    status.state, status.primary, status.secondary
                ),
                None => "Waiting".to_string(),
            };
            self.print_if_changed(status, LineSlot::Status)?;

            if frame.main_rebuilt {
                if let Some(panel) = &frame.main {
                    match panel {
                        MainPanel::Vote { choices, .. } => {
                            self.vote_choices = choices.iter().map(|c| c.id.clone()).collect();
                            self.task_count = 0;
                        }
                        MainPanel::PickTask { options, .. } => {
                            self.vote_choices.clear();
                            self.task_count = options.len();
                        }
                        _ => {
                            self.vote_choices.clear();
                            self.task_count = 0;
                        }
                    }
                    writeln!(self.out)?;
                    for line in panel_lines(panel) {
                        writeln!(self.out, "{}", line)?;
                    }
                }
            }

            self.print_if_changed(action_line(frame), LineSlot::Action)?;

            if frame.ranking != self.ranking {
                if let Some(rows) = &frame.ranking {
                    writeln!(self.out, "Ranking:")?;
                    for row in rows {
                        writeln!(self.out, "  {}. {}  {}", row.rank, row.name, row.stars)?;
                    }
                }
                self.ranking = frame.ranking.clone();
            }
        }

        if let Some(hint) = self.hint.take() {
            writeln!(self.out, "  > {}", hint)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn interpret(&mut self, line: &str) -> Input {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let command = command.to_ascii_lowercase();

        // Anything but these few words is a name on the name screen
        if matches!(self.screen, Some(Screen::Name { .. }))
            && !matches!(command.as_str(), "" | "back" | "quit" | "q" | "help" | "?")
        {
            return Input::Event(UiEvent::SubmitName {
                name: line.to_string(),
            });
        }

        let event = match command.as_str() {
            "" => return Input::Ignored,
            "quit" | "q" => return Input::Quit,
            "help" | "?" => {
                self.hint = Some(
                    match self.screen {
                        Some(Screen::Game) => GAME_HELP,
                        Some(Screen::Name { .. }) => NAME_HELP,
                        _ => HOME_HELP,
                    }
                    .to_string(),
                );
                return Input::Ignored;
            }
            "create" => UiEvent::CreateParty,
            "join" => UiEvent::JoinParty {
                party_id: rest.to_string(),
            },
            "name" => UiEvent::SubmitName {
                name: rest.to_string(),
            },
            "back" => UiEvent::BackToHome,
            "vote" => {
                let len = self.vote_choices.len();
                match self.choice(rest, len) {
                    Some(i) => UiEvent::SelectVoteTarget {
                        player_id: self.vote_choices[i].clone(),
                    },
                    None => return Input::Ignored,
                }
            }
            "task" => match self.choice(rest, self.task_count) {
                Some(index) => UiEvent::SelectTask { index },
                None => return Input::Ignored,
            },
            "ok" | "confirm" => UiEvent::ConfirmAction,
            "ranking" => UiEvent::OpenRanking,
            "close" => UiEvent::CloseRanking,
            "exit" => UiEvent::Exit,
            other => {
                self.hint = Some(format!("Unknown command '{}', type help", other));
                return Input::Ignored;
            }
        };
        Input::Event(event)
    }
}

/// Forward stdin lines into a channel until EOF
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlayerAction;
    use crate::state::view::{Header, Notice, PlayerChoice, StatusInfo};
    use crate::state::Decision;

    fn vote_frame(rebuilt: bool) -> Frame {
        Frame {
            screen: Screen::Game,
            header: Some(Header {
                party_id: "0421".to_string(),
                player_name: "Alice".to_string(),
                role: "Host",
                stars: 1,
                questions_left: 38,
            }),
            status: Some(StatusInfo {
                state: "Voting",
                primary: "Vote for one person.".to_string(),
                secondary: "Tap one name and confirm.".to_string(),
            }),
            main: Some(MainPanel::Vote {
                title: "In this party".to_string(),
                question: "Who is the most kind?".to_string(),
                choices: vec![
                    PlayerChoice {
                        id: "p1".to_string(),
                        label: "Alice".to_string(),
                    },
                    PlayerChoice {
                        id: "p2".to_string(),
                        label: "Bob".to_string(),
                    },
                ],
            }),
            main_rebuilt: rebuilt,
            selection: LocalSelection::default(),
            has_voted: false,
            action: Decision {
                label: "Confirm vote",
                action: None,
            },
            ranking: None,
            notices: Vec::new(),
        }
    }

    fn output(frontend: TerminalFrontend<Vec<u8>>) -> String {
        String::from_utf8(frontend.into_inner()).unwrap()
    }

    #[test]
    fn test_main_panel_printed_only_when_rebuilt() {
        let mut frontend = TerminalFrontend::new(Vec::new());
        frontend.render(&vote_frame(true)).unwrap();
        frontend.render(&vote_frame(false)).unwrap();

        let out = output(frontend);
        assert_eq!(out.matches("Who is the most kind?").count(), 1);
        assert_eq!(out.matches("Action: (Confirm vote)").count(), 1);
        assert!(out.contains("  2) Bob"));
    }

    #[test]
    fn test_action_line_follows_selection() {
        let mut frontend = TerminalFrontend::new(Vec::new());
        frontend.render(&vote_frame(true)).unwrap();

        let mut frame = vote_frame(false);
        frame.selection.vote_target_id = Some("p2".to_string());
        frame.action = Decision {
            label: "Confirm vote",
            action: Some(PlayerAction::SubmitVote {
                target_player_id: "p2".to_string(),
            }),
        };
        frontend.render(&frame).unwrap();

        assert!(output(frontend).contains("Action: [Confirm vote] (type ok) | vote: p2"));
    }

    #[test]
    fn test_vote_number_maps_to_player_id() {
        let mut frontend = TerminalFrontend::new(Vec::new());
        frontend.render(&vote_frame(true)).unwrap();

        assert_eq!(
            frontend.interpret("vote 2"),
            Input::Event(UiEvent::SelectVoteTarget {
                player_id: "p2".to_string()
            })
        );
        assert_eq!(frontend.interpret("vote 3"), Input::Ignored);
        assert_eq!(frontend.interpret("task 1"), Input::Ignored);
    }

    #[test]
    fn test_commands() {
        let mut frontend = TerminalFrontend::new(Vec::new());
        assert_eq!(frontend.interpret("create"), Input::Event(UiEvent::CreateParty));
        assert_eq!(
            frontend.interpret("join 0421"),
            Input::Event(UiEvent::JoinParty {
                party_id: "0421".to_string()
            })
        );
        assert_eq!(frontend.interpret("OK"), Input::Event(UiEvent::ConfirmAction));
        assert_eq!(frontend.interpret("quit"), Input::Quit);
        assert_eq!(frontend.interpret("   "), Input::Ignored);
        assert_eq!(frontend.interpret("dance"), Input::Ignored);
    }

    #[test]
    fn test_bare_line_is_name_on_name_screen() {
        let mut frontend = TerminalFrontend::new(Vec::new());
        let mut frame = vote_frame(false);
        frame.screen = Screen::Name {
            party_id: "0421".to_string(),
        };
        frontend.render(&frame).unwrap();

        assert_eq!(
            frontend.interpret("Mary Ann"),
            Input::Event(UiEvent::SubmitName {
                name: "Mary Ann".to_string()
            })
        );
    }

    #[test]
    fn test_command_words_are_names_on_name_screen() {
        let mut frontend = TerminalFrontend::new(Vec::new());
        let mut frame = vote_frame(false);
        frame.screen = Screen::Name {
            party_id: "0421".to_string(),
        };
        frontend.render(&frame).unwrap();

        for name in ["Ok", "exit", "create", "vote"] {
            assert_eq!(
                frontend.interpret(name),
                Input::Event(UiEvent::SubmitName {
                    name: name.to_string()
                })
            );
        }
        assert_eq!(frontend.interpret("back"), Input::Event(UiEvent::BackToHome));
        assert_eq!(frontend.interpret("quit"), Input::Quit);
        assert_eq!(frontend.interpret("help"), Input::Ignored);
    }

    #[test]
    fn test_notices_and_ranking() {
        let mut frontend = TerminalFrontend::new(Vec::new());
        let mut frame = vote_frame(true);
        frame.notices = vec![Notice::alert("Could not submit vote")];
        frame.ranking = Some(vec![RankRow {
            rank: 1,
            name: "Bob".to_string(),
            stars: 3,
        }]);
        frontend.render(&frame).unwrap();

        let out = output(frontend);
        assert!(out.contains("! Could not submit vote"));
        assert!(out.contains("  1. Bob  3"));
    }

    #[test]
    fn test_panel_lines_for_result() {
        let panel = MainPanel::Result {
            title: "Result".to_string(),
            headline: "Bob selected:".to_string(),
            task: Some("Sing a chorus".to_string()),
        };
        assert_eq!(
            panel_lines(&panel),
            vec!["Result: Bob selected:".to_string(), "  Sing a chorus".to_string()]
        );
    }
}
