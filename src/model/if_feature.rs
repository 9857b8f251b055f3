//! `if-feature` expressions.

use std::fmt;

use super::kind::YangVersion;
use super::qname::PrefixedName;

/// A parsed `if-feature` argument. YANG 1.0 only allows a single feature
/// name; YANG 1.1 adds `not`, `and`, `or` and parentheses.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum IfFeatureExpr {
    Feature(PrefixedName),
    Not(Box<IfFeatureExpr>),
    And(Vec<IfFeatureExpr>),
    Or(Vec<IfFeatureExpr>),
}

impl IfFeatureExpr {
    pub fn parse(text: &str, version: YangVersion) -> Result<Self, String> {
        let tokens = tokenize(text);
        if version == YangVersion::V1 {
            return match tokens.as_slice() {
                [single] => PrefixedName::parse(single).map(IfFeatureExpr::Feature),
                _ => Err(format!(
                    "if-feature expression '{text}' requires yang-version 1.1"
                )),
            };
        }
        let mut parser = ExprParser {
            tokens: &tokens,
            pos: 0,
        };
        let expr = parser.or_expr()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected '{token}' in if-feature expression '{text}'")),
        }
    }

    /// Every feature referenced, in textual order.
    pub fn features(&self) -> Vec<&PrefixedName> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a PrefixedName>) {
        match self {
            IfFeatureExpr::Feature(name) => out.push(name),
            IfFeatureExpr::Not(inner) => inner.collect(out),
            IfFeatureExpr::And(terms) | IfFeatureExpr::Or(terms) => {
                terms.iter().for_each(|t| t.collect(out));
            }
        }
    }

    pub fn evaluate(&self, supported: &mut impl FnMut(&PrefixedName) -> bool) -> bool {
        match self {
            IfFeatureExpr::Feature(name) => supported(name),
            IfFeatureExpr::Not(inner) => !inner.evaluate(supported),
            IfFeatureExpr::And(terms) => terms.iter().all(|t| t.evaluate(supported)),
            IfFeatureExpr::Or(terms) => terms.iter().any(|t| t.evaluate(supported)),
        }
    }
}

impl fmt::Display for IfFeatureExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, terms: &[IfFeatureExpr], op: &str| {
            f.write_str("(")?;
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{term}")?;
            }
            f.write_str(")")
        };
        match self {
            IfFeatureExpr::Feature(name) => write!(f, "{name}"),
            IfFeatureExpr::Not(inner) => write!(f, "not {inner}"),
            IfFeatureExpr::And(terms) => join(f, terms, "and"),
            IfFeatureExpr::Or(terms) => join(f, terms, "or"),
        }
    }
}

impl fmt::Debug for IfFeatureExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IfFeatureExpr({self})")
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

struct ExprParser<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn or_expr(&mut self) -> Result<IfFeatureExpr, String> {
        let mut terms = vec![self.and_expr()?];
        while self.peek() == Some("or") {
            self.pos += 1;
            terms.push(self.and_expr()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            IfFeatureExpr::Or(terms)
        })
    }

    fn and_expr(&mut self) -> Result<IfFeatureExpr, String> {
        let mut terms = vec![self.factor()?];
        while self.peek() == Some("and") {
            self.pos += 1;
            terms.push(self.factor()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            IfFeatureExpr::And(terms)
        })
    }

    fn factor(&mut self) -> Result<IfFeatureExpr, String> {
        let token = self
            .peek()
            .ok_or_else(|| "unexpected end of if-feature expression".to_string())?
            .to_string();
        self.pos += 1;
        match token.as_str() {
            "not" => Ok(IfFeatureExpr::Not(Box::new(self.factor()?))),
            "(" => {
                let inner = self.or_expr()?;
                if self.peek() != Some(")") {
                    return Err("missing ')' in if-feature expression".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            ")" | "and" | "or" => Err(format!("unexpected '{token}' in if-feature expression")),
            name => PrefixedName::parse(name).map(IfFeatureExpr::Feature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str, enabled: &[&str]) -> bool {
        IfFeatureExpr::parse(text, YangVersion::V1_1)
            .unwrap()
            .evaluate(&mut |name| enabled.contains(&name.name.as_str()))
    }

    #[test]
    fn test_boolean_expressions() {
        assert!(eval("a", &["a"]));
        assert!(!eval("not a", &["a"]));
        assert!(eval("a and (b or c)", &["a", "c"]));
        assert!(!eval("a and b or c", &["a"]));
        assert!(eval("a and b or c", &["c"]));
    }

    #[test]
    fn test_features_listed_in_order() {
        let expr = IfFeatureExpr::parse("x:a or not b", YangVersion::V1_1).unwrap();
        let names: Vec<_> = expr.features().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["x:a", "b"]);
    }

    #[test]
    fn test_yang_1_0_rejects_expressions() {
        assert!(IfFeatureExpr::parse("a", YangVersion::V1).is_ok());
        assert!(IfFeatureExpr::parse("not a", YangVersion::V1).is_err());
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(IfFeatureExpr::parse("(a or b", YangVersion::V1_1).is_err());
        assert!(IfFeatureExpr::parse("a and", YangVersion::V1_1).is_err());
        assert!(IfFeatureExpr::parse("a b", YangVersion::V1_1).is_err());
    }
}
