//! Key-exact `{{placeholder}}` interpolation.
//!
//! Only `{{key}}` spans whose `key` is literally present in `vars` are
//! replaced; everything else — including single-brace JSON examples
//! embedded in a template — passes through untouched.

use std::collections::HashMap;

pub fn interpolate(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(end) = rest[start..].find("}}") else {
            out.push_str(rest);
            return out;
        };
        let end = start + end;
        let key = rest[start + 2..end].trim();

        out.push_str(&rest[..start]);
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..end + 2]),
        }
        rest = &rest[end + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_only_keys_present_in_vars() {
        let mut vars = HashMap::new();
        vars.insert("file_name".to_string(), "ingest.sql".to_string());

        let template = "Analyze {{file_name}} and return {{unknown_key}}.";
        assert_eq!(
            interpolate(template, &vars),
            "Analyze ingest.sql and return {{unknown_key}}."
        );
    }

    #[test]
    fn leaves_single_brace_json_examples_untouched() {
        let vars = HashMap::new();
        let template = r#"Return JSON like {"nodes": [], "edges": []}."#;
        assert_eq!(interpolate(template, &vars), template);
    }

    #[test]
    fn trims_whitespace_inside_braces() {
        let mut vars = HashMap::new();
        vars.insert("action".to_string(), "extract.schema".to_string());
        assert_eq!(interpolate("do {{ action }}", &vars), "do extract.schema");
    }
}
