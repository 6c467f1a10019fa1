//! Enumeration of part multisets that can satisfy numeric effect goals.
//!
//! This phase runs ahead of placement: it answers which combinations of
//! parts are worth arranging at all. Whether a part's contribution counts as
//! bugged or bugless depends on where it eventually lands, so every goal is
//! tracked as a pair of running bounds and the returned multisets
//! over-approximate; the placement solver has the final word.

use std::rc::Rc;

use genawaiter::yield_;

/// What one part contributes to one tracked variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    /// Contribution when the part ends up bugless.
    pub bugless: usize,

    /// Contribution when the part ends up bugged.
    pub bugged: usize,
}

/// Bounds one tracked variable must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Value every returned multiset must be able to reach.
    pub target: usize,

    /// Value the guaranteed contributions may never exceed.
    pub limit: usize,
}

/// Running bounds for one goal over the parts selected so far.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    /// Applies regardless of arrangement; the lower bound.
    guaranteed: usize,

    /// May apply depending on arrangement; the upper bound.
    worst_case: usize,
}

/// Lazily yields part-count vectors whose effects can meet every goal, using
/// at most `part_limit` parts in total.
pub fn gather<'a>(
    parts: &'a [&'a [Effect]],
    part_limit: usize,
    goals: &'a [Goal],
) -> impl Iterator<Item = Vec<usize>> + 'a {
    let parts_by_goal = {
        let mut by_goal = std::collections::HashMap::new();
        for (part_idx, effects) in parts.iter().enumerate() {
            for (goal_idx, effect) in effects.iter().enumerate() {
                if effect.bugless == 0 && effect.bugged == 0 {
                    continue;
                }

                by_goal
                    .entry(goal_idx)
                    .or_insert_with(Vec::new)
                    .push(part_idx);
            }
        }

        let mut by_goal = (0..goals.len())
            .map(|goal_idx| by_goal.remove(&goal_idx).unwrap_or_default())
            .collect::<Vec<_>>();

        // Largest contributors first keeps the search from drowning in
        // single-increment selections.
        for (goal_idx, part_indexes) in by_goal.iter_mut().enumerate() {
            part_indexes.sort_unstable_by_key(|&part_idx| {
                let effect = &parts[part_idx][goal_idx];
                std::cmp::Reverse(effect.bugless.min(effect.bugged))
            });
        }

        by_goal
    };

    inner(
        parts,
        part_limit,
        Rc::new(parts_by_goal),
        goals.iter().map(|goal| (goal, Tally::default())).collect(),
    )
}

fn inner<'a>(
    parts: &'a [&'a [Effect]],
    part_limit: usize,
    parts_by_goal: Rc<Vec<Vec<usize>>>,
    tallies: Vec<(&'a Goal, Tally)>,
) -> Box<dyn Iterator<Item = Vec<usize>> + 'a> {
    Box::new(
        genawaiter::rc::gen!({
            let goal_idx = match tallies
                .iter()
                .position(|(goal, tally)| tally.worst_case < goal.target && tally.guaranteed < goal.limit)
            {
                Some(goal_idx) => goal_idx,
                None => {
                    // Every goal is reachable; counts fill in on the unwind.
                    yield_!(vec![0; parts.len()]);
                    return;
                }
            };

            if part_limit == 0 {
                return;
            }

            'part_loop: for &part_idx in parts_by_goal[goal_idx].iter() {
                let effects = parts[part_idx];

                let mut tallies = tallies.clone();
                for ((goal, tally), effect) in tallies.iter_mut().zip(effects.iter()) {
                    tally.guaranteed += effect.bugless.min(effect.bugged);
                    if tally.guaranteed > goal.limit {
                        continue 'part_loop;
                    }

                    tally.worst_case += effect.bugless.max(effect.bugged);
                }

                for mut counts in inner(parts, part_limit - 1, parts_by_goal.clone(), tallies) {
                    counts[part_idx] += 1;
                    yield_!(counts);
                }
            }
        })
        .into_iter(),
    )
}
