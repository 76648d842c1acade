//! Turns the generic syntax tree into values. No evaluation happens here.

use crate::{error::EvalError, parser::Node, value::Value};

pub fn read(node: &Node) -> Value {
    if node.tag.contains("number") {
        return read_number(&node.contents);
    }
    if node.tag.contains("symbol") {
        return Value::Symbol(node.contents.clone());
    }
    if node.tag.contains("string") {
        return read_string(&node.contents);
    }

    let cells = node
        .children
        .iter()
        .filter(|child| !is_structural(child))
        .map(read)
        .collect();

    if node.tag.contains("qexpr") {
        Value::QExpr(cells)
    } else {
        // The root (`>`) and `sexpr` nodes.
        Value::SExpr(cells)
    }
}

fn is_structural(node: &Node) -> bool {
    matches!(node.contents.as_str(), "(" | ")" | "{" | "}")
        || node.tag == "regex"
        || node.tag.contains("comment")
}

fn read_number(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(n) => Value::Number(n),
        Err(_) => EvalError::InvalidNumber(text.to_string()).into(),
    }
}

fn read_string(literal: &str) -> Value {
    let inner = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(literal);
    Value::String(unescape(inner))
}

pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\x0b'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::LangResult, parser::parse, value::escape};
    use pretty_assertions::assert_eq;

    fn read_source(source: &str) -> LangResult<Value> {
        Ok(read(&parse(source)?))
    }

    #[test]
    fn reads_atoms_into_a_root_sexpr() -> LangResult<()> {
        assert_eq!(
            read_source("42 -7 foo \"bar\"")?,
            Value::SExpr(vec![
                Value::Number(42),
                Value::Number(-7),
                Value::symbol("foo"),
                Value::string("bar"),
            ])
        );
        Ok(())
    }

    #[test]
    fn reads_nested_forms_without_delimiters() -> LangResult<()> {
        assert_eq!(
            read_source("(def {x y} (list 1))")?,
            Value::SExpr(vec![Value::SExpr(vec![
                Value::symbol("def"),
                Value::QExpr(vec![Value::symbol("x"), Value::symbol("y")]),
                Value::SExpr(vec![Value::symbol("list"), Value::Number(1)]),
            ])])
        );
        Ok(())
    }

    #[test]
    fn comments_are_skipped() -> LangResult<()> {
        assert_eq!(
            read_source("; heading\n{1 ; inside\n 2}")?,
            Value::SExpr(vec![Value::QExpr(vec![
                Value::Number(1),
                Value::Number(2)
            ])])
        );
        Ok(())
    }

    #[test]
    fn oversized_number_reads_as_error() -> LangResult<()> {
        assert_eq!(
            read_source("99999999999999999999")?,
            Value::SExpr(vec![Value::error("invalid number")])
        );
        Ok(())
    }

    #[test]
    fn strings_are_unescaped() -> LangResult<()> {
        assert_eq!(
            read_source(r#""tab\there \"quoted\"\n""#)?,
            Value::SExpr(vec![Value::string("tab\there \"quoted\"\n")])
        );
        Ok(())
    }

    #[test]
    fn unknown_escapes_are_kept() {
        assert_eq!(unescape(r"a\qb"), r"a\qb");
    }

    #[test]
    fn escape_and_unescape_agree() {
        let text = "line\nquote\" slash\\ nul\0";
        assert_eq!(unescape(&escape(text)), text);
    }
}
