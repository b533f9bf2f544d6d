//! Multiple-choice formatting over a pruned tree's candidates.
//!
//! After pruning, the only nodes still carrying a backend identifier are
//! the candidates, so "every id-bearing node in document order" is the
//! choice list. Each choice is labeled with the first tokens of the
//! candidate's own serialized subtree, rendered with the step's shared
//! [`IdentifierMap`] so integers match the full-tree text.

use crate::error::Result;
use crate::letters::letter_of;
use dom_compact::utils::cap_tokens;
use dom_compact::{serialize_subtree, DomArena, IdentifierMap, SerializeConfig};
use serde::{Deserialize, Serialize};

/// Tokens kept from a candidate's serialized subtree for its label.
pub const CHOICE_LABEL_TOKENS: usize = 10;

/// The fixed first option; its letter is the answer when no candidate
/// applies or the ground truth is unresolved.
pub const NONE_OF_THE_ABOVE: &str = "None of the above";

/// Fixed non-element actions appended by the extended enumeration.
pub const EXTENDED_ACTIONS: &[&str] = &[
    "None of the other options match the correct element",
    "Scroll (up or down)",
    "Go back to the previous page (similar to clicking on the back button)",
    "Go to a specific URL (for example Wikipedia.com)",
    "Execute a query in a search engine (Google.com)",
];

/// One selectable element: its opaque backend identifier and a short
/// serialized label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub backend_id: String,
    pub label: String,
}

/// Collect the pruned tree's candidates as `(identifier, label)` pairs in
/// document order.
pub fn collect_choices(
    tree: &DomArena,
    ids: &mut IdentifierMap,
    config: &SerializeConfig,
) -> Result<Vec<Choice>> {
    let mut choices = Vec::new();
    for node_id in tree.document_order()? {
        let backend_id = match &tree.get(node_id)?.backend_id {
            Some(backend_id) => backend_id.clone(),
            None => continue,
        };
        let repr = serialize_subtree(tree, node_id, ids, config)?;
        choices.push(Choice {
            backend_id,
            label: cap_tokens(&repr, CHOICE_LABEL_TOKENS),
        });
    }
    Ok(choices)
}

/// Lettered enumeration: the fixed "none of the above" option at `A`,
/// candidates from `B`.
pub fn format_choices(choices: &[Choice]) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("{}. {}\n", letter_of(0)?, NONE_OF_THE_ABOVE));
    for (index, choice) in choices.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", letter_of(index + 1)?, choice.label));
    }
    Ok(out)
}

/// Letter answering for the ground-truth identifier: its position among
/// the enumerated candidates, or the "none of the above" letter when the
/// identifier is absent or was never mapped.
pub fn ground_truth_letter(ids: &IdentifierMap, ground_truth: Option<&str>) -> Result<String> {
    match ground_truth.and_then(|backend_id| ids.get(backend_id)) {
        Some(mapped) => letter_of(mapped as usize + 1),
        None => letter_of(0),
    }
}

/// Extended enumeration: candidates first, then the agent's fixed
/// non-element actions, each with the next letters in sequence, preceded
/// by a short usage note naming the action letters.
pub fn format_extended_choices(choices: &[Choice]) -> Result<String> {
    let none_match = letter_of(choices.len())?;
    let scroll = letter_of(choices.len() + 1)?;
    let go_url = letter_of(choices.len() + 3)?;
    let search = letter_of(choices.len() + 4)?;

    let mut out = format!(
        "If none of these elements match your target element, please select {none_match}. \
         {}. If you want to scroll up or down the page, select {scroll}. {}. \
         If you want to go to a different URL, please select {go_url}. \
         Go to a different URL and pass the full URL as the value. \
         If you want to run a query in a search engine, please select {search}. \
         Execute a query in a search engine and pass the query as the value.\n",
        EXTENDED_ACTIONS[0], EXTENDED_ACTIONS[1]
    );
    for (index, choice) in choices.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", letter_of(index)?, choice.label));
    }
    for (offset, action) in EXTENDED_ACTIONS.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", letter_of(choices.len() + offset)?, action));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letters::index_of;
    use dom_compact::{parse_snapshot, prune_tree, sanitize_tree, serialize_tree, PruneLimits};

    fn pruned_fixture() -> (DomArena, IdentifierMap, String) {
        let snapshot = r#"<div role="main"><a backend_node_id="n1" title="Home">Home</a><a backend_node_id="n2" title="Cart">Cart</a><button backend_node_id="n3" role="button">Buy</button></div>"#;
        let candidates = ["n1", "n2", "n3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let tree = parse_snapshot(snapshot).unwrap();
        let sanitized = sanitize_tree(&tree, &candidates).unwrap();
        let (pruned, _) = prune_tree(&sanitized, &candidates, &PruneLimits::default()).unwrap();

        let mut ids = IdentifierMap::new();
        let repr = serialize_tree(&pruned, &mut ids, &SerializeConfig::default()).unwrap();
        (pruned, ids, repr)
    }

    #[test]
    fn choices_follow_document_order_with_shared_integers() {
        let (pruned, mut ids, _) = pruned_fixture();
        let choices = collect_choices(&pruned, &mut ids, &SerializeConfig::default()).unwrap();

        let backend_ids: Vec<&str> = choices.iter().map(|c| c.backend_id.as_str()).collect();
        assert_eq!(backend_ids, ["n1", "n2", "n3"]);
        assert!(choices[0].label.contains("(a id=0"), "label: {}", choices[0].label);
        assert!(choices[2].label.contains("(button id=2"), "label: {}", choices[2].label);
        // labels must not have grown the step map
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn labels_are_token_capped() {
        let snapshot = format!(
            r#"<div role="main"><p backend_node_id="p1">{}</p></div>"#,
            "word ".repeat(30)
        );
        let candidates = ["p1"].iter().map(|s| s.to_string()).collect();
        let tree = sanitize_tree(&parse_snapshot(&snapshot).unwrap(), &candidates).unwrap();
        let (pruned, _) = prune_tree(&tree, &candidates, &PruneLimits::default()).unwrap();

        let mut ids = IdentifierMap::new();
        let choices = collect_choices(&pruned, &mut ids, &SerializeConfig::default()).unwrap();
        assert_eq!(choices.len(), 1);
        assert_eq!(
            choices[0].label.split_whitespace().count(),
            CHOICE_LABEL_TOKENS
        );
    }

    #[test]
    fn enumeration_starts_with_none_of_the_above() {
        let (pruned, mut ids, _) = pruned_fixture();
        let choices = collect_choices(&pruned, &mut ids, &SerializeConfig::default()).unwrap();
        let formatted = format_choices(&choices).unwrap();

        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "A. None of the above");
        assert!(lines[1].starts_with("B. "));
        assert!(lines[3].starts_with("D. "));
    }

    #[test]
    fn ground_truth_maps_to_its_choice_letter() {
        let (_, ids, _) = pruned_fixture();
        assert_eq!(ground_truth_letter(&ids, Some("n2")).unwrap(), "C");
        assert_eq!(ground_truth_letter(&ids, Some("unknown")).unwrap(), "A");
        assert_eq!(ground_truth_letter(&ids, None).unwrap(), "A");
    }

    #[test]
    fn letters_extend_past_z() {
        let choices: Vec<Choice> = (0..30)
            .map(|i| Choice {
                backend_id: format!("b{i}"),
                label: format!("choice {i}"),
            })
            .collect();
        let formatted = format_choices(&choices).unwrap();
        let last = formatted.lines().last().unwrap();
        assert!(last.starts_with("AE. "), "last line: {last}");
        assert_eq!(index_of("AE").unwrap(), 30);
    }

    #[test]
    fn extended_enumeration_appends_fixed_actions() {
        let (pruned, mut ids, _) = pruned_fixture();
        let choices = collect_choices(&pruned, &mut ids, &SerializeConfig::default()).unwrap();
        let formatted = format_extended_choices(&choices).unwrap();

        let lines: Vec<&str> = formatted.lines().collect();
        // guidance + 3 candidates + 5 fixed actions
        assert_eq!(lines.len(), 9);
        assert!(lines[1].starts_with("A. "));
        assert_eq!(lines[4], "D. None of the other options match the correct element");
        assert_eq!(lines[8], "H. Execute a query in a search engine (Google.com)");
    }
}
