use super::{StarRef, ViewState};
use crate::types::*;

/// Merge a fresh snapshot with what the previous merge held locally.
///
/// Pure: the result depends only on the arguments. Local fields survive only
/// while the phase instance `(phase, round_number)` stays the same.
pub fn reconcile(prev: Option<&ViewState>, snapshot: PartySnapshot) -> ViewState {
    let PartySnapshot {
        party_id,
        phase,
        round_number,
        questions_left,
        host_id,
        me_is_host,
        players,
        you,
        question_text,
        is_positive,
        star_player_id,
        star_player_name,
        task_options_for_star,
        selected_task,
    } = snapshot;

    let round_number = resolve_round(prev, phase, round_number);
    let held = prev.filter(|p| p.phase_instance() == (phase, round_number));

    let (has_voted, vote_target_id) = match phase {
        // Server confirmed the vote: mirror it from now on
        Phase::Voting if you.has_voted => (true, you.vote_target_id),
        // Still deliberating, or locked locally by an earlier poll/submit
        Phase::Voting => match held {
            Some(p) => (p.has_voted, p.selection.vote_target_id.clone()),
            None => (false, None),
        },
        _ => (you.has_voted, you.vote_target_id),
    };

    let task_index = match (phase, held) {
        (Phase::TaskChoice, Some(p)) => p
            .selection
            .task_index
            .filter(|i| *i < task_options_for_star.len()),
        _ => None,
    };

    let star = star_player_id.map(|id| {
        let name = players
            .iter()
            .find(|p| p.id == id)
            .map(|p| star_player_name.unwrap_or_else(|| p.name.clone()));
        StarRef { id, name }
    });

    ViewState {
        party_id,
        phase,
        round_number,
        questions_left,
        host_id,
        is_host: me_is_host,
        players,
        name: you.name,
        stars: you.stars,
        question_text,
        is_positive,
        star,
        task_options: task_options_for_star,
        selected_task,
        has_voted,
        selection: LocalSelection {
            vote_target_id,
            task_index,
        },
    }
}

/// Round of the merged view. A missing round keeps the previous one, and the
/// round never moves backwards while the phase stays the same.
fn resolve_round(prev: Option<&ViewState>, phase: Phase, round_number: Option<u32>) -> u32 {
    match (round_number, prev) {
        (Some(round), Some(p)) if p.phase == phase => round.max(p.round_number),
        (Some(round), _) => round,
        (None, Some(p)) => p.round_number,
        (None, None) => 0,
    }
}
