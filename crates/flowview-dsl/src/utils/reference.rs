use flowview_core::Binding;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Innermost `{{...}}`, nested references are matched from the inside out
    static ref BINDING_REF_REGEX: Regex = Regex::new(r"\{\{([^{}]*)\}\}").unwrap();

    // `@[...]@` expression blocks
    static ref EXPRESSION_REF_REGEX: Regex = Regex::new(r"@\[(.*?)\]@").unwrap();
}

/// Contents of every `{{...}}` reference in `text`, outside expression blocks
pub fn extract_binding_references(text: &str) -> Vec<&str> {
    let mut references = Vec::new();
    let mut last = 0;
    for block in EXPRESSION_REF_REGEX.find_iter(text) {
        collect_bindings(&text[last..block.start()], &mut references);
        last = block.end();
    }
    collect_bindings(&text[last..], &mut references);
    references
}

fn collect_bindings<'a>(text: &'a str, references: &mut Vec<&'a str>) {
    references.extend(
        BINDING_REF_REGEX
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|inner| inner.as_str()),
    );
}

/// Whether the contents of a `{{...}}` reference parse as a binding
pub fn is_valid_binding_reference(reference: &str) -> bool {
    Binding::parse(reference).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_binding_references() {
        assert_eq!(
            extract_binding_references("Hello {{user.name}}, you owe {{ amounts[0] }}"),
            vec!["user.name", " amounts[0] "]
        );
        assert_eq!(
            extract_binding_references("{{foo.{{bar}}}}"),
            vec!["bar"]
        );
        assert!(extract_binding_references("no references").is_empty());
        assert_eq!(
            extract_binding_references("@[ {{a}} == {{b}} ]@ and {{c}}"),
            vec!["c"]
        );
    }

    #[test]
    fn test_binding_reference_validity() {
        assert!(is_valid_binding_reference("foo.bar"));
        assert!(is_valid_binding_reference(" foo[0].bar "));
        assert!(!is_valid_binding_reference(""));
        assert!(!is_valid_binding_reference("   "));
        assert!(!is_valid_binding_reference("a..b"));
        assert!(!is_valid_binding_reference("list[0"));
    }
}
