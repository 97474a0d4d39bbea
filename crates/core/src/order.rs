//! Per-sibling position metadata handed to every rendered element.

use serde::Serialize;

/// Tag name used as the predecessor of a parent's first child.
pub const ROOT_SIBLING_NAME: &str = "root";

/// Position of a rendered child among its rendered siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
    /// Zero-based index among rendered siblings.
    pub index: usize,
    /// First rendered sibling.
    pub first_child: bool,
    /// Last rendered sibling.
    pub last_child: bool,
    /// Starts a run: the previous element sibling has a different name.
    pub first_of_type: bool,
    /// Name of the previous element sibling, or `"root"`.
    pub prev_sibling_name: String,
}

/// Computes metadata for a row of rendered siblings in one left-to-right pass.
///
/// `None` entries are text: they count towards `index`, `first_child`, and
/// `last_child` but do not break or start a run. Names should already have
/// the tag prefix removed.
pub fn sibling_order<'a, I>(names: I) -> Vec<OrderMetadata>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let names: Vec<Option<&str>> = names.into_iter().collect();
    let count = names.len();
    let mut previous = ROOT_SIBLING_NAME;
    let mut out = Vec::with_capacity(count);

    for (index, name) in names.into_iter().enumerate() {
        let first_of_type = name.is_some_and(|name| name != previous);
        out.push(OrderMetadata {
            index,
            first_child: index == 0,
            last_child: index + 1 == count,
            first_of_type,
            prev_sibling_name: previous.to_string(),
        });
        if let Some(name) = name {
            previous = name;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_of_type_marks_run_boundaries() {
        let order = sibling_order(["p", "p", "h1", "h1", "p"].map(Some));
        let flags: Vec<bool> = order.iter().map(|o| o.first_of_type).collect();
        assert_eq!(flags, vec![true, false, true, false, true]);
        assert_eq!(order[0].prev_sibling_name, "root");
        assert_eq!(order[2].prev_sibling_name, "p");
        assert!(order[0].first_child && !order[0].last_child);
        assert!(order[4].last_child);
    }

    #[test]
    fn text_between_elements_does_not_break_a_run() {
        let order = sibling_order([Some("li"), None, Some("li")]);
        assert_eq!(order[1].prev_sibling_name, "li");
        assert!(!order[1].first_of_type);
        assert!(!order[2].first_of_type);
        assert_eq!(order[2].index, 2);
    }

    #[test]
    fn serializes_camel_case() {
        let order = sibling_order([Some("p")]);
        let value = serde_json::to_value(&order[0]).expect("serialize should succeed");
        assert_eq!(
            value,
            serde_json::json!({
                "index": 0,
                "firstChild": true,
                "lastChild": true,
                "firstOfType": true,
                "prevSiblingName": "root"
            })
        );
    }
}
