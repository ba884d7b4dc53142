use crate::{ParseError, PythonVersion, normalize_name};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerTree {
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
    Expression(MarkerExpression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerExpression {
    pub lhs: MarkerValue,
    pub op: MarkerOperator,
    pub rhs: MarkerValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerValue {
    Variable(MarkerVariable),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerVariable {
    PythonVersion,
    PythonFullVersion,
    Extra,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOperator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Compatible,
    Arbitrary,
    In,
    NotIn,
}

impl MarkerVariable {
    fn from_ident(ident: &str) -> Self {
        match ident {
            "python_version" => MarkerVariable::PythonVersion,
            "python_full_version" => MarkerVariable::PythonFullVersion,
            "extra" => MarkerVariable::Extra,
            other => MarkerVariable::Other(other.to_string()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            MarkerVariable::PythonVersion => "python_version",
            MarkerVariable::PythonFullVersion => "python_full_version",
            MarkerVariable::Extra => "extra",
            MarkerVariable::Other(name) => name,
        }
    }
}

impl MarkerOperator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "<" => MarkerOperator::Less,
            "<=" => MarkerOperator::LessEqual,
            ">" => MarkerOperator::Greater,
            ">=" => MarkerOperator::GreaterEqual,
            "==" => MarkerOperator::Equal,
            "!=" => MarkerOperator::NotEqual,
            "~=" => MarkerOperator::Compatible,
            "===" => MarkerOperator::Arbitrary,
            _ => return None,
        };
        Some(op)
    }

    fn as_str(&self) -> &'static str {
        match self {
            MarkerOperator::Less => "<",
            MarkerOperator::LessEqual => "<=",
            MarkerOperator::Greater => ">",
            MarkerOperator::GreaterEqual => ">=",
            MarkerOperator::Equal => "==",
            MarkerOperator::NotEqual => "!=",
            MarkerOperator::Compatible => "~=",
            MarkerOperator::Arbitrary => "===",
            MarkerOperator::In => "in",
            MarkerOperator::NotIn => "not in",
        }
    }

    /// The operator that keeps `a op b` equivalent to `b op' a`.
    fn flipped(self) -> Self {
        match self {
            MarkerOperator::Less => MarkerOperator::Greater,
            MarkerOperator::LessEqual => MarkerOperator::GreaterEqual,
            MarkerOperator::Greater => MarkerOperator::Less,
            MarkerOperator::GreaterEqual => MarkerOperator::LessEqual,
            other => other,
        }
    }
}

impl MarkerTree {
    pub fn parse(input: &str) -> Result<MarkerTree, ParseError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
        };

        let tree = parser.parse_or()?;

        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing tokens"));
        }

        Ok(tree)
    }

    pub fn evaluate(
        &self,
        target_python: Option<&PythonVersion>,
        requested_extras: &BTreeSet<String>,
    ) -> bool {
        match self {
            MarkerTree::And(items) => items
                .iter()
                .all(|item| item.evaluate(target_python, requested_extras)),
            MarkerTree::Or(items) => items
                .iter()
                .any(|item| item.evaluate(target_python, requested_extras)),
            MarkerTree::Expression(expr) => expr.evaluate(target_python, requested_extras),
        }
    }

    /// First `extra == "NAME"` clause in the tree, normalized.
    pub fn extra_name(&self) -> Option<String> {
        match self {
            MarkerTree::And(items) | MarkerTree::Or(items) => {
                items.iter().find_map(|item| item.extra_name())
            }
            MarkerTree::Expression(expr) => expr.extra_name(),
        }
    }
}

impl MarkerExpression {
    fn evaluate(
        &self,
        target_python: Option<&PythonVersion>,
        requested_extras: &BTreeSet<String>,
    ) -> bool {
        match (&self.lhs, &self.rhs) {
            (MarkerValue::Variable(var), MarkerValue::Literal(value)) => {
                evaluate_variable(var, self.op, value, false, target_python, requested_extras)
            }
            (MarkerValue::Literal(value), MarkerValue::Variable(var)) => {
                evaluate_variable(var, self.op, value, true, target_python, requested_extras)
            }
            (MarkerValue::Literal(lhs), MarkerValue::Literal(rhs)) => compare_strings(lhs, self.op, rhs),
            (MarkerValue::Variable(_), MarkerValue::Variable(_)) => true,
        }
    }

    fn extra_name(&self) -> Option<String> {
        if self.op != MarkerOperator::Equal {
            return None;
        }

        match (&self.lhs, &self.rhs) {
            (MarkerValue::Variable(MarkerVariable::Extra), MarkerValue::Literal(value))
            | (MarkerValue::Literal(value), MarkerValue::Variable(MarkerVariable::Extra)) => {
                Some(normalize_name(value))
            }
            _ => None,
        }
    }
}

fn evaluate_variable(
    var: &MarkerVariable,
    op: MarkerOperator,
    value: &str,
    reversed: bool,
    target_python: Option<&PythonVersion>,
    requested_extras: &BTreeSet<String>,
) -> bool {
    match var {
        MarkerVariable::Extra => {
            let present = requested_extras.contains(&normalize_name(value));
            match op {
                MarkerOperator::Equal | MarkerOperator::Arbitrary | MarkerOperator::In => present,
                MarkerOperator::NotEqual | MarkerOperator::NotIn => !present,
                _ => false,
            }
        }
        MarkerVariable::PythonVersion => match target_python {
            Some(target) => compare_python(&target.major_minor(), op, value, reversed),
            None => true,
        },
        MarkerVariable::PythonFullVersion => match target_python {
            Some(target) => compare_python(target, op, value, reversed),
            None => true,
        },
        MarkerVariable::Other(_) => true,
    }
}

fn compare_python(target: &PythonVersion, op: MarkerOperator, value: &str, reversed: bool) -> bool {
    let value = value.trim();

    match op {
        MarkerOperator::In | MarkerOperator::NotIn => {
            let contained = if reversed {
                target.as_str().contains(value)
            } else {
                value.split_whitespace().any(|v| v == target.as_str())
            };
            return contained == (op == MarkerOperator::In);
        }
        MarkerOperator::Arbitrary => return target.as_str() == value,
        _ => {}
    }

    if let Some(prefix) = value.strip_suffix(".*")
        && matches!(op, MarkerOperator::Equal | MarkerOperator::NotEqual)
    {
        let Ok(prefix) = PythonVersion::parse(prefix) else {
            return true;
        };
        return target.matches_prefix(&prefix) == (op == MarkerOperator::Equal);
    }

    let Ok(other) = PythonVersion::parse(value) else {
        return true;
    };

    let op = if reversed { op.flipped() } else { op };

    match op {
        MarkerOperator::Less => *target < other,
        MarkerOperator::LessEqual => *target <= other,
        MarkerOperator::Greater => *target > other,
        MarkerOperator::GreaterEqual => *target >= other,
        MarkerOperator::Equal => *target == other,
        MarkerOperator::NotEqual => *target != other,
        MarkerOperator::Compatible if reversed => other.is_compatible_with(target),
        MarkerOperator::Compatible => target.is_compatible_with(&other),
        MarkerOperator::Arbitrary | MarkerOperator::In | MarkerOperator::NotIn => true,
    }
}

fn compare_strings(lhs: &str, op: MarkerOperator, rhs: &str) -> bool {
    match op {
        MarkerOperator::Equal | MarkerOperator::Arbitrary => lhs == rhs,
        MarkerOperator::NotEqual => lhs != rhs,
        MarkerOperator::In => rhs.contains(lhs),
        MarkerOperator::NotIn => !rhs.contains(lhs),
        _ => true,
    }
}

impl fmt::Display for MarkerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerTree::And(items) => write_joined(f, items, " and "),
            MarkerTree::Or(items) => write_joined(f, items, " or "),
            MarkerTree::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[MarkerTree], sep: &str) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(sep)?;
        }

        match item {
            MarkerTree::Expression(_) => write!(f, "{}", item)?,
            _ => write!(f, "({})", item)?,
        }
    }

    Ok(())
}

impl fmt::Display for MarkerExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.as_str(), self.rhs)
    }
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerValue::Variable(var) => f.write_str(var.as_str()),
            MarkerValue::Literal(value) => write!(f, "\"{}\"", value),
        }
    }
}

impl Serialize for MarkerTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Str(String),
    Ident(String),
    Op(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        match ch {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|c| *c == ch)
                    .map(|offset| start + offset)
                    .ok_or_else(|| ParseError::Marker {
                        input: input.to_string(),
                        reason: "unterminated string".to_string(),
                    })?;
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '<' | '>' | '=' | '!' | '~' => {
                let start = i;
                while i < chars.len() && matches!(chars[i], '<' | '>' | '=' | '!' | '~') {
                    i += 1;
                }
                tokens.push(Token::Op(chars[start..i].iter().collect()));
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(ParseError::Marker {
                    input: input.to_string(),
                    reason: format!("unexpected character {:?}", other),
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn parse_or(&mut self) -> Result<MarkerTree, ParseError> {
        let mut items = vec![self.parse_and()?];

        while self.eat_keyword("or") {
            items.push(self.parse_and()?);
        }

        Ok(collapse(items, MarkerTree::Or))
    }

    fn parse_and(&mut self) -> Result<MarkerTree, ParseError> {
        let mut items = vec![self.parse_atom()?];

        while self.eat_keyword("and") {
            items.push(self.parse_atom()?);
        }

        Ok(collapse(items, MarkerTree::And))
    }

    fn parse_atom(&mut self) -> Result<MarkerTree, ParseError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            if self.next() != Some(Token::RParen) {
                return Err(self.error("expected ')'"));
            }
            return Ok(inner);
        }

        let lhs = self.parse_value()?;
        let op = self.parse_operator()?;
        let rhs = self.parse_value()?;

        Ok(MarkerTree::Expression(MarkerExpression { lhs, op, rhs }))
    }

    fn parse_value(&mut self) -> Result<MarkerValue, ParseError> {
        match self.next() {
            Some(Token::Str(value)) => Ok(MarkerValue::Literal(value)),
            Some(Token::Ident(ident)) if !is_keyword(&ident) => {
                Ok(MarkerValue::Variable(MarkerVariable::from_ident(&ident)))
            }
            _ => Err(self.error("expected a marker variable or quoted string")),
        }
    }

    fn parse_operator(&mut self) -> Result<MarkerOperator, ParseError> {
        match self.next() {
            Some(Token::Op(symbol)) => MarkerOperator::from_symbol(&symbol)
                .ok_or_else(|| self.error(&format!("unknown operator {:?}", symbol))),
            Some(Token::Ident(ident)) if ident == "in" => Ok(MarkerOperator::In),
            Some(Token::Ident(ident)) if ident == "not" => {
                if self.eat_keyword("in") {
                    Ok(MarkerOperator::NotIn)
                } else {
                    Err(self.error("expected 'in' after 'not'"))
                }
            }
            _ => Err(self.error("expected a comparison operator")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Ident(ident)) if ident == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn error(&self, reason: &str) -> ParseError {
        ParseError::Marker {
            input: self.input.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn is_keyword(ident: &str) -> bool {
    matches!(ident, "and" | "or" | "in" | "not")
}

fn collapse(mut items: Vec<MarkerTree>, wrap: fn(Vec<MarkerTree>) -> MarkerTree) -> MarkerTree {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn py(s: &str) -> PythonVersion {
        PythonVersion::parse(s).unwrap()
    }

    fn none() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn parses_precedence() {
        let tree = MarkerTree::parse("a == '1' or b == '2' and c == '3'").unwrap();
        match tree {
            MarkerTree::Or(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(items[1], MarkerTree::And(_)));
            }
            other => panic!("expected or, got {:?}", other),
        }
    }

    #[test]
    fn reversed_operands_flip_comparison() {
        let tree = MarkerTree::parse("'3.10' > python_version").unwrap();
        assert!(tree.evaluate(Some(&py("3.9")), &none()));
        assert!(!tree.evaluate(Some(&py("3.10")), &none()));
    }

    #[test]
    fn python_version_uses_major_minor_of_target() {
        let tree = MarkerTree::parse("python_version == '3.11'").unwrap();
        assert!(tree.evaluate(Some(&py("3.11.4")), &none()));

        let full = MarkerTree::parse("python_full_version >= '3.11.2'").unwrap();
        assert!(full.evaluate(Some(&py("3.11.4")), &none()));
        assert!(!full.evaluate(Some(&py("3.11.1")), &none()));
    }

    #[test]
    fn wildcard_and_membership() {
        let tree = MarkerTree::parse("python_version == '3.*'").unwrap();
        assert!(tree.evaluate(Some(&py("3.8")), &none()));
        assert!(!tree.evaluate(Some(&py("2.7")), &none()));

        let listed = MarkerTree::parse("python_version in '2.7 3.6'").unwrap();
        assert!(listed.evaluate(Some(&py("3.6")), &none()));
        assert!(!listed.evaluate(Some(&py("3.7")), &none()));

        let excluded = MarkerTree::parse("python_version not in '3.4, 3.5'").unwrap();
        assert!(excluded.evaluate(Some(&py("3.12")), &none()));
    }

    #[test]
    fn unknown_environment_variables_are_satisfied() {
        let tree = MarkerTree::parse("sys_platform == 'win32'").unwrap();
        assert!(tree.evaluate(Some(&py("3.12")), &none()));

        let dotted = MarkerTree::parse("platform.python_implementation == 'CPython'").unwrap();
        assert!(dotted.evaluate(None, &none()));
    }

    #[test]
    fn finds_extra_name_in_nested_tree() {
        let tree =
            MarkerTree::parse("(python_version < '3.8') and extra == 'Socks_Proxy'").unwrap();
        assert_eq!(tree.extra_name().as_deref(), Some("socks-proxy"));

        let negated = MarkerTree::parse("extra != 'test'").unwrap();
        assert_eq!(negated.extra_name(), None);
    }

    #[test]
    fn renders_round_trippable_text() {
        let tree = MarkerTree::parse("extra=='a' and (python_version<'3.9' or os_name=='nt')")
            .unwrap();
        let rendered = tree.to_string();
        assert_eq!(
            rendered,
            "extra == \"a\" and (python_version < \"3.9\" or os_name == \"nt\")"
        );
        assert_eq!(MarkerTree::parse(&rendered).unwrap(), tree);
    }

    #[test]
    fn rejects_malformed_markers() {
        assert!(MarkerTree::parse("python_version <").is_err());
        assert!(MarkerTree::parse("python_version < '3.8").is_err());
        assert!(MarkerTree::parse("(extra == 'a'").is_err());
        assert!(MarkerTree::parse("extra == 'a' extra").is_err());
        assert!(MarkerTree::parse("python_version <> '3'").is_err());
    }
}
