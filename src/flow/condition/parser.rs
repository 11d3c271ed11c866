//! Condition expression parser
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparison.
//! Parentheses group sub-expressions.

use super::ast::{CompareOp, Expression, Literal};
use thiserror::Error;

/// Deepest nesting of parentheses, `not` and `and`/`or` chains
pub const MAX_DEPTH: usize = 64;

/// Errors raised while parsing a condition
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConditionError {
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Unterminated string starting at position {0}")]
    UnterminatedString(usize),

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("Unexpected end of condition")]
    UnexpectedEnd,

    #[error("Empty condition")]
    Empty,

    #[error("Condition nests deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Path(String),
    Str(String),
    Num(f64),
    Op(CompareOp),
    And,
    Or,
    Not,
    True,
    False,
    Null,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Path(p) => write!(f, "{}", p),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Num(n) => write!(f, "{}", n),
            Token::Op(op) => write!(f, "{}", op),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let start = i;
                i += 1;
                let mut s = String::new();
                while i < chars.len() && chars[i] != c {
                    s.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(ConditionError::UnterminatedString(start));
                }
                i += 1;
                tokens.push(Token::Str(s));
            }
            '=' | '!' | '>' | '<' => {
                let next = chars.get(i + 1).copied();
                let (op, width) = match (c, next) {
                    ('=', Some('=')) => (CompareOp::Eq, 2),
                    ('!', Some('=')) => (CompareOp::NotEq, 2),
                    ('>', Some('=')) => (CompareOp::Gte, 2),
                    ('<', Some('=')) => (CompareOp::Lte, 2),
                    ('>', _) => (CompareOp::Gt, 1),
                    ('<', _) => (CompareOp::Lt, 1),
                    _ => return Err(ConditionError::UnexpectedChar { ch: c, pos: i }),
                };
                tokens.push(Token::Op(op));
                i += width;
            }
            c if c.is_ascii_digit() || c == '-' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ConditionError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    "contains" => Token::Op(CompareOp::Contains),
                    _ => Token::Path(word),
                });
            }
            _ => return Err(ConditionError::UnexpectedChar { ch: c, pos: i }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn check_depth(&self, extra: usize) -> Result<(), ConditionError> {
        if self.depth + extra > MAX_DEPTH {
            return Err(ConditionError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn descend(&mut self) -> Result<(), ConditionError> {
        self.depth += 1;
        self.check_depth(0)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ConditionError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ConditionError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn or(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.and()?;
        let mut links = 0;
        while self.peek() == Some(&Token::Or) {
            links += 1;
            self.check_depth(links)?;
            self.pos += 1;
            let right = self.and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.unary()?;
        let mut links = 0;
        while self.peek() == Some(&Token::And) {
            links += 1;
            self.check_depth(links)?;
            self.pos += 1;
            let right = self.unary()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression, ConditionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            self.descend()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression, ConditionError> {
        match self.next()? {
            Token::LParen => {
                self.descend()?;
                let expr = self.or()?;
                self.depth -= 1;
                match self.next()? {
                    Token::RParen => Ok(expr),
                    other => Err(ConditionError::UnexpectedToken(other.to_string())),
                }
            }
            Token::True => Ok(Expression::True),
            Token::False => Ok(Expression::False),
            Token::Path(path) => match self.peek() {
                Some(Token::Op(op)) => {
                    let op = *op;
                    self.pos += 1;
                    let right = self.literal()?;
                    Ok(Expression::Compare { path, op, right })
                }
                _ => Ok(Expression::Truthy(path)),
            },
            other => Err(ConditionError::UnexpectedToken(other.to_string())),
        }
    }

    fn literal(&mut self) -> Result<Literal, ConditionError> {
        match self.next()? {
            Token::Str(s) => Ok(Literal::String(s)),
            Token::Num(n) => Ok(Literal::Number(n)),
            Token::True => Ok(Literal::Boolean(true)),
            Token::False => Ok(Literal::Boolean(false)),
            Token::Null => Ok(Literal::Null),
            other => Err(ConditionError::UnexpectedToken(other.to_string())),
        }
    }
}

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, ConditionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ConditionError::Empty);
    }

    let mut parser = Parser::new(tokens);
    let expr = parser.or()?;
    if let Some(extra) = parser.peek() {
        return Err(ConditionError::UnexpectedToken(extra.to_string()));
    }
    Ok(expr)
}
