//! Restricted boolean expressions over token values
//!
//! Conditional directives carry expressions in a deliberately small grammar:
//! equality and inequality comparisons against literals, combined with
//! AND/OR/NOT and parentheses. Token references are written `$TokenName`.
//!
//! ```text
//! expr       := or
//! or         := and ( ("OR" | "||") and )*
//! and        := unary ( ("AND" | "&&") unary )*
//! unary      := ("NOT" | "!") unary | primary
//! primary    := "(" expr ")" | comparison
//! comparison := operand ( ("=" | "==" | "!=" | "<>") operand )?
//! operand    := "$" identifier | literal
//! ```
//!
//! An absent token resolves to the empty string; a bare `$Token` predicate is
//! true iff its value is non-empty.

use std::collections::BTreeSet;

use confweave_domain::TokenDataset;

use crate::error::ExpressionError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Literal(String),
    Eq,
    Ne,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("${name}"),
            Token::Literal(value) => format!("'{value}'"),
            Token::Eq => "=".to_string(),
            Token::Ne => "!=".to_string(),
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::Not => "NOT".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn is_bare_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '/' | ':')
}

fn lex(expression: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '$' => {
                chars.next();
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if is_ident_char(n) {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(ExpressionError::MissingTokenName);
                }
                tokens.push(Token::Ident(name));
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'>') {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    return Err(ExpressionError::UnexpectedCharacter('<'));
                }
            }
            '&' => {
                chars.next();
                if chars.peek() == Some(&'&') {
                    chars.next();
                    tokens.push(Token::And);
                } else {
                    return Err(ExpressionError::UnexpectedCharacter('&'));
                }
            }
            '|' => {
                chars.next();
                if chars.peek() == Some(&'|') {
                    chars.next();
                    tokens.push(Token::Or);
                } else {
                    return Err(ExpressionError::UnexpectedCharacter('|'));
                }
            }
            quote @ ('\'' | '"') => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err(ExpressionError::UnterminatedLiteral),
                    }
                }
                tokens.push(Token::Literal(value));
            }
            c if is_bare_char(c) => {
                let mut word = String::new();
                while let Some(&n) = chars.peek() {
                    if is_bare_char(n) {
                        word.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.to_ascii_lowercase().as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    _ => tokens.push(Token::Literal(word)),
                }
            }
            c => return Err(ExpressionError::UnexpectedCharacter(c)),
        }
    }

    Ok(tokens)
}

/// Referenced token names, extracted without evaluating.
///
/// The scan is purely lexical and never fails, so token usage can be
/// recorded even for expressions that later fail to parse or reference
/// tokens absent from the dataset. Quoted literals are skipped.
pub fn extract_referenced_tokens(expression: &str) -> BTreeSet<String> {
    let mut referenced = BTreeSet::new();
    let mut chars = expression.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            quote @ ('\'' | '"') => {
                for inner in chars.by_ref() {
                    if inner == quote {
                        break;
                    }
                }
            }
            '$' => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if is_ident_char(n) {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !name.is_empty() {
                    referenced.insert(name);
                }
            }
            _ => {}
        }
    }

    referenced
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Token(String),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Comparison {
        left: Operand,
        negated: bool,
        right: Operand,
    },
    Truthy(Operand),
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, ExpressionError> {
        let expr = self.or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(ExpressionError::Unexpected {
                found: token.describe(),
                expected: "end of expression",
            }),
        }
    }

    fn or(&mut self) -> Result<Expr, ExpressionError> {
        let mut operands = vec![self.and()?];
        while self.peek() == Some(&Token::Or) {
            self.position += 1;
            operands.push(self.and()?);
        }
        if operands.len() == 1 {
            Ok(operands.remove(0))
        } else {
            Ok(Expr::Or(operands))
        }
    }

    fn and(&mut self) -> Result<Expr, ExpressionError> {
        let mut operands = vec![self.unary()?];
        while self.peek() == Some(&Token::And) {
            self.position += 1;
            operands.push(self.unary()?);
        }
        if operands.len() == 1 {
            Ok(operands.remove(0))
        } else {
            Ok(Expr::And(operands))
        }
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::Not) {
            self.position += 1;
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::LParen) {
            self.position += 1;
            let expr = self.or()?;
            match self.peek() {
                Some(Token::RParen) => {
                    self.position += 1;
                    Ok(expr)
                }
                Some(token) => Err(ExpressionError::Unexpected {
                    found: token.describe(),
                    expected: "')'",
                }),
                None => Err(ExpressionError::UnexpectedEnd("')'")),
            }
        } else {
            self.comparison()
        }
    }

    fn comparison(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.operand()?;
        let negated = match self.peek() {
            Some(Token::Eq) => false,
            Some(Token::Ne) => true,
            _ => return Ok(Expr::Truthy(left)),
        };
        self.position += 1;
        let right = self.operand()?;
        Ok(Expr::Comparison {
            left,
            negated,
            right,
        })
    }

    fn operand(&mut self) -> Result<Operand, ExpressionError> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.position += 1;
                Ok(Operand::Token(name))
            }
            Some(Token::Literal(value)) => {
                self.position += 1;
                Ok(Operand::Literal(value))
            }
            Some(token) => Err(ExpressionError::Unexpected {
                found: token.describe(),
                expected: "a token reference or literal",
            }),
            None => Err(ExpressionError::UnexpectedEnd("a token reference or literal")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }
}

/// Evaluate `expression` against `dataset`.
///
/// Token absence is not fatal: unknown tokens resolve to the empty string.
/// Only lexically or syntactically malformed expressions fail.
pub fn evaluate(expression: &str, dataset: &TokenDataset<'_>) -> Result<bool, ExpressionError> {
    let tokens = lex(expression)?;
    if tokens.is_empty() {
        return Err(ExpressionError::UnexpectedEnd("an expression"));
    }
    let ast = Parser::new(tokens).parse()?;
    Ok(eval(&ast, dataset))
}

fn resolve(operand: &Operand, dataset: &TokenDataset<'_>) -> String {
    match operand {
        Operand::Token(name) => dataset
            .try_get(name)
            .flatten()
            .unwrap_or_default()
            .to_string(),
        Operand::Literal(value) => value.clone(),
    }
}

fn eval(expr: &Expr, dataset: &TokenDataset<'_>) -> bool {
    match expr {
        Expr::Or(operands) => operands.iter().any(|e| eval(e, dataset)),
        Expr::And(operands) => operands.iter().all(|e| eval(e, dataset)),
        Expr::Not(inner) => !eval(inner, dataset),
        Expr::Comparison {
            left,
            negated,
            right,
        } => {
            let equal = resolve(left, dataset) == resolve(right, dataset);
            equal != *negated
        }
        Expr::Truthy(operand) => !resolve(operand, dataset).is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confweave_domain::Configuration;

    fn configuration() -> Configuration {
        Configuration::new(
            "C1",
            vec![
                ("Environment".to_string(), Some("PROD".to_string())),
                ("Region".to_string(), Some("eu-west".to_string())),
                ("Feature".to_string(), Some("".to_string())),
                ("Unset".to_string(), None),
            ],
        )
    }

    fn eval_with(expression: &str) -> Result<bool, ExpressionError> {
        let configuration = configuration();
        let dataset = TokenDataset::new(&configuration);
        evaluate(expression, &dataset)
    }

    #[test]
    fn test_equality_against_literals() {
        assert_eq!(eval_with("$Environment = 'PROD'"), Ok(true));
        assert_eq!(eval_with("$Environment = 'UAT'"), Ok(false));
        assert_eq!(eval_with("$Environment == \"PROD\""), Ok(true));
        assert_eq!(eval_with("$Environment = PROD"), Ok(true));
    }

    #[test]
    fn test_inequality_forms() {
        assert_eq!(eval_with("$Environment != 'UAT'"), Ok(true));
        assert_eq!(eval_with("$Environment <> 'PROD'"), Ok(false));
    }

    #[test]
    fn test_logical_combinators() {
        assert_eq!(
            eval_with("$Environment = 'PROD' AND $Region = 'eu-west'"),
            Ok(true)
        );
        assert_eq!(
            eval_with("$Environment = 'UAT' OR $Region = 'eu-west'"),
            Ok(true)
        );
        assert_eq!(eval_with("NOT $Environment = 'PROD'"), Ok(false));
        assert_eq!(
            eval_with("$Environment = 'UAT' || $Environment = 'PROD'"),
            Ok(true)
        );
        assert_eq!(eval_with("!($Environment = 'UAT')"), Ok(true));
    }

    #[test]
    fn test_parentheses_group() {
        assert_eq!(
            eval_with("($Environment = 'UAT' OR $Environment = 'PROD') AND $Region = 'eu-west'"),
            Ok(true)
        );
        assert_eq!(
            eval_with("$Environment = 'UAT' OR ($Environment = 'PROD' AND $Region = 'us-east')"),
            Ok(false)
        );
    }

    #[test]
    fn test_absent_token_resolves_to_empty() {
        assert_eq!(eval_with("$Missing = ''"), Ok(true));
        assert_eq!(eval_with("$Unset = ''"), Ok(true));
        assert_eq!(eval_with("$Missing = 'anything'"), Ok(false));
    }

    #[test]
    fn test_bare_token_is_non_empty_check() {
        assert_eq!(eval_with("$Environment"), Ok(true));
        assert_eq!(eval_with("$Feature"), Ok(false));
        assert_eq!(eval_with("$Missing"), Ok(false));
        assert_eq!(eval_with("NOT $Missing"), Ok(true));
    }

    #[test]
    fn test_malformed_expressions_fail() {
        assert!(eval_with("$Environment =").is_err());
        assert!(eval_with("= 'PROD'").is_err());
        assert!(eval_with("($Environment = 'PROD'").is_err());
        assert!(eval_with("$Environment = 'PROD' extra garbage ,").is_err());
        assert!(eval_with("$Environment = 'unterminated").is_err());
        assert!(eval_with("$ = 'PROD'").is_err());
        assert!(eval_with("").is_err());
    }

    #[test]
    fn test_extraction_is_lexical_and_total() {
        let referenced = extract_referenced_tokens("$A = '1' AND ($B != $C or not $D)");
        let names: Vec<&str> = referenced.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);

        // extraction still works on expressions that do not parse
        let referenced = extract_referenced_tokens("$Broken = = = $Also");
        assert!(referenced.contains("Broken"));
        assert!(referenced.contains("Also"));
    }

    #[test]
    fn test_extraction_skips_quoted_literals() {
        let referenced = extract_referenced_tokens("$Price = '$100'");
        let names: Vec<&str> = referenced.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["Price"]);
    }
}
