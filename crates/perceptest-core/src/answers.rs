//! Answer vocabulary and the per-subtype visible answer sets.

use crate::model::Subtype;

/// Global answer order. Visible sets are filtered from this list.
pub const ALL_ANSWERS: [&str; 18] = [
    "square", "circle", "bottom", "right", "top", "left", "1", "2", "3", "4", "5", "6", "green",
    "yellow", "pink", "red", "blue", "orange",
];

/// The answers valid for a subtype, or the full vocabulary when undefined.
pub fn answers_for(subtype: Option<Subtype>) -> &'static [&'static str] {
    match subtype {
        Some(Subtype::Closest) => &["pink", "red", "blue", "green", "yellow", "orange"],
        Some(Subtype::Farthest) | Some(Subtype::Shape) => &["square", "circle"],
        Some(Subtype::Count) => &["1", "2", "3", "4", "5", "6"],
        Some(Subtype::TopBottom) => &["top", "bottom"],
        Some(Subtype::LeftRight) => &["left", "right"],
        None => &ALL_ANSWERS,
    }
}

/// The answers shown for a question, in display order.
pub fn visible_answers(subtype: Option<Subtype>) -> Vec<&'static str> {
    let valid = answers_for(subtype);
    let filtered = ALL_ANSWERS
        .iter()
        .copied()
        .filter(|a| valid.contains(a))
        .collect();
    order_visible(subtype, filtered)
}

/// Apply the display-order exceptions to an already filtered answer list.
///
/// `leftright` always shows "left" before "right"; `count` sorts numerically.
/// Every other subtype keeps the incoming order.
pub fn order_visible<'a>(subtype: Option<Subtype>, mut answers: Vec<&'a str>) -> Vec<&'a str> {
    match subtype {
        Some(Subtype::LeftRight) => {
            let left = answers.iter().position(|a| *a == "left");
            let right = answers.iter().position(|a| *a == "right");
            if let (Some(l), Some(r)) = (left, right) {
                if r < l {
                    answers.swap(l, r);
                }
            }
        }
        Some(Subtype::Count) => {
            // Non-numeric labels sort after the numbers, keeping their relative order.
            answers.sort_by_key(|a| a.parse::<u32>().unwrap_or(u32::MAX));
        }
        _ => {}
    }
    answers
}
