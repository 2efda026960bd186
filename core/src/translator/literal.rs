//! Parser for Python literal structures
//!
//! Models often answer with a Python dict instead of JSON (single quotes,
//! `True`/`None`, tuples, trailing commas). The grammar lives in
//! `literal.pest`; this module turns its parse tree into the equivalent
//! `serde_json::Value`.

use crate::error::TranslationError;
use pest::error::{Error as PestError, InputLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use serde_json::{Map, Number, Value};

type ParseResult<T> = std::result::Result<T, TranslationError>;

/// Deepest bracket nesting accepted, the same limit serde_json applies
pub const MAX_NESTING: usize = 128;

#[derive(pest_derive::Parser)]
#[grammar = "translator/literal.pest"]
struct LiteralGrammar;

/// Parse a complete Python literal. Trailing non-whitespace is an error.
pub fn parse_python_literal(text: &str) -> ParseResult<Value> {
    check_nesting(text)?;

    let mut pairs = LiteralGrammar::parse(Rule::literal, text).map_err(syntax_error)?;
    let literal = pairs.next().ok_or_else(|| malformed(0))?;
    let value = literal
        .into_inner()
        .find(|pair| pair.as_rule() != Rule::EOI)
        .ok_or_else(|| malformed(0))?;
    build_value(value)
}

/// Reject input nested deeper than [`MAX_NESTING`] before it reaches the
/// recursive grammar. Brackets inside quoted strings do not count.
fn check_nesting(text: &str) -> ParseResult<()> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (position, c) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open || c == '\n' {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => quote = Some(c),
            '{' | '[' | '(' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(TranslationError::Syntax {
                        position,
                        message: format!("nesting deeper than {} levels", MAX_NESTING),
                    });
                }
            }
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn syntax_error(err: PestError<Rule>) -> TranslationError {
    let position = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    TranslationError::Syntax {
        position,
        message: err.variant.message().into_owned(),
    }
}

fn malformed(position: usize) -> TranslationError {
    TranslationError::Syntax {
        position,
        message: "malformed literal".to_string(),
    }
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, position: usize) -> ParseResult<Pair<'i, Rule>> {
    pairs.next().ok_or_else(|| malformed(position))
}

fn build_value(pair: Pair<Rule>) -> ParseResult<Value> {
    let position = pair.as_span().start();

    match pair.as_rule() {
        Rule::dict => {
            let mut map = Map::new();
            for entry in pair.into_inner() {
                let entry_start = entry.as_span().start();
                let mut parts = entry.into_inner();
                let key = dict_key(next_pair(&mut parts, entry_start)?)?;
                let value = build_value(next_pair(&mut parts, entry_start)?)?;
                map.insert(key, value);
            }
            Ok(Value::Object(map))
        }
        Rule::list => pair
            .into_inner()
            .map(build_value)
            .collect::<ParseResult<Vec<_>>>()
            .map(Value::Array),
        Rule::paren => {
            let mut is_tuple = false;
            let mut items = Vec::new();
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::tuple_comma => is_tuple = true,
                    _ => items.push(build_value(inner)?),
                }
            }
            match items.len() {
                1 if !is_tuple => Ok(items.remove(0)),
                _ => Ok(Value::Array(items)),
            }
        }
        Rule::string => {
            let inner = next_pair(&mut pair.into_inner(), position)?;
            unescape(inner.as_str(), inner.as_span().start()).map(Value::String)
        }
        Rule::number => parse_number(pair.as_str(), position),
        Rule::keyword => Ok(match pair.as_str() {
            "True" | "true" => Value::Bool(true),
            "False" | "false" => Value::Bool(false),
            _ => Value::Null,
        }),
        _ => Err(malformed(position)),
    }
}

fn dict_key(pair: Pair<Rule>) -> ParseResult<String> {
    let position = pair.as_span().start();
    match build_value(pair)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok((if b { "True" } else { "False" }).to_string()),
        _ => Err(TranslationError::Syntax {
            position,
            message: "dict keys must be strings, numbers or booleans".to_string(),
        }),
    }
}

/// Decode escapes the grammar has already validated
fn unescape(raw: &str, position: usize) -> ParseResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let decoded = match chars.next() {
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('0') => Some('\0'),
            Some('x') => hex_char(&mut chars, 2),
            Some('u') => hex_char(&mut chars, 4),
            Some('U') => hex_char(&mut chars, 8),
            other => other,
        };
        out.push(decoded.ok_or_else(|| TranslationError::Syntax {
            position,
            message: "invalid escape in string".to_string(),
        })?);
    }
    Ok(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let code: String = chars.by_ref().take(digits).collect();
    u32::from_str_radix(&code, 16).ok().and_then(char::from_u32)
}

fn parse_number(raw: &str, position: usize) -> ParseResult<Value> {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if let Ok(i) = cleaned.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| TranslationError::Syntax {
            position,
            message: format!("invalid number '{}'", raw),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_python_dict() {
        let value = parse_python_literal(
            "{'ArithmeticOperations': ['add', 'multiply'], 'StringUtils': [],}",
        )
        .unwrap();
        assert_eq!(
            value,
            json!({"ArithmeticOperations": ["add", "multiply"], "StringUtils": []})
        );
    }

    #[test]
    fn test_scalars_and_tuples() {
        let value = parse_python_literal(
            "{'a': True, 'b': None, 'c': -2.5, 'd': (1, 2), 'e': (3), 'f': 1_000, 'g': (4,), 'h': ()}",
        )
        .unwrap();
        assert_eq!(
            value,
            json!({"a": true, "b": null, "c": -2.5, "d": [1, 2], "e": 3, "f": 1000, "g": [4], "h": []})
        );
    }

    #[test]
    fn test_string_escapes() {
        let value =
            parse_python_literal(r#"['it\'s', "say \"hi\"", 'tab\tend', 'é', '\x41é']"#)
                .unwrap();
        assert_eq!(value, json!(["it's", "say \"hi\"", "tab\tend", "é", "Aé"]));
    }

    #[test]
    fn test_brackets_inside_strings() {
        let value = parse_python_literal("{'text': '[[(not nested'}").unwrap();
        assert_eq!(value, json!({"text": "[[(not nested"}));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_python_literal("1e3").unwrap(), json!(1000.0));
        assert_eq!(parse_python_literal("+7").unwrap(), json!(7));
        assert!(parse_python_literal("1.2.3").is_err());
    }

    #[test]
    fn test_keywords_need_word_boundary() {
        assert_eq!(parse_python_literal("[None, false]").unwrap(), json!([null, false]));
        assert!(parse_python_literal("Truest").is_err());
    }

    #[test]
    fn test_trailing_text_is_rejected() {
        let err = parse_python_literal("{'a': 1} and that's it").unwrap_err();
        assert!(matches!(err, TranslationError::Syntax { position, .. } if position >= 8));
    }

    #[test]
    fn test_errors_carry_position() {
        assert!(matches!(
            parse_python_literal("{'a' 1}"),
            Err(TranslationError::Syntax { position: 5, .. })
        ));
        assert!(parse_python_literal("['open").is_err());
        assert!(parse_python_literal("'line\nbreak'").is_err());
        assert!(parse_python_literal("").is_err());
        assert!(parse_python_literal("Here is the dict").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}1{}", "[".repeat(MAX_NESTING), "]".repeat(MAX_NESTING));
        assert!(parse_python_literal(&ok).is_ok());

        let too_deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(
            parse_python_literal(&too_deep),
            Err(TranslationError::Syntax { position, .. }) if position == MAX_NESTING
        ));
    }
}
