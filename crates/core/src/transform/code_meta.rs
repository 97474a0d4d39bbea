use crate::error::PassError;
use crate::parse::{AstTransform, visit_mdast_mut};
use markdown::mdast::Node;

/// Wraps the fence meta inside folded code values.
pub const CODE_META_DELIMITER: &str = "@@@";

/// `@@@<meta>@@@<value>`
pub fn fold_code_meta(meta: &str, value: &str) -> String {
    format!("{CODE_META_DELIMITER}{meta}{CODE_META_DELIMITER}{value}")
}

/// Splits a folded value back into `(meta, code)`.
///
/// Values that were never folded come back with no meta.
pub fn split_code_meta(value: &str) -> (Option<&str>, &str) {
    let Some(rest) = value.strip_prefix(CODE_META_DELIMITER) else {
        return (None, value);
    };
    match rest.split_once(CODE_META_DELIMITER) {
        Some((meta, code)) => (Some(meta), code),
        None => (None, value),
    }
}

/// Folds fenced code meta into the code value.
///
/// Opt-in; the compiler only runs it when `codeMeta` is enabled or the pass is
/// added explicitly. The meta is moved, so a second run changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeMetaPass;

impl AstTransform for CodeMetaPass {
    fn name(&self) -> &str {
        "code-meta"
    }

    fn transform(&self, root: &mut Node) -> Result<(), PassError> {
        visit_mdast_mut(root, &mut |node| {
            if let Node::Code(code) = node
                && let Some(meta) = code.meta.take()
            {
                code.value = fold_code_meta(&meta, &code.value);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ParseOptions, parse_mdast};

    fn first_code(root: &Node) -> &markdown::mdast::Code {
        root.children()
            .and_then(|children| children.iter().find_map(|child| match child {
                Node::Code(code) => Some(code),
                _ => None,
            }))
            .expect("code block should exist")
    }

    #[test]
    fn folds_meta_into_value_once() {
        let mut root = parse_mdast("```js title=\"a.js\"\nlet a;\n```", &ParseOptions::mdx())
            .expect("parse should succeed");
        CodeMetaPass.transform(&mut root).expect("pass should succeed");
        CodeMetaPass.transform(&mut root).expect("pass should succeed");
        let code = first_code(&root);
        assert_eq!(code.value, "@@@title=\"a.js\"@@@let a;");
        assert_eq!(code.meta, None);
    }

    #[test]
    fn blocks_without_meta_are_untouched() {
        let mut root =
            parse_mdast("```js\nlet a;\n```", &ParseOptions::mdx()).expect("parse should succeed");
        CodeMetaPass.transform(&mut root).expect("pass should succeed");
        assert_eq!(first_code(&root).value, "let a;");
    }

    #[test]
    fn split_recovers_both_parts() {
        assert_eq!(
            split_code_meta("@@@title=x@@@body"),
            (Some("title=x"), "body")
        );
        assert_eq!(split_code_meta("plain"), (None, "plain"));
        assert_eq!(split_code_meta("@@@unterminated"), (None, "@@@unterminated"));
    }
}
