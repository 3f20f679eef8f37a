//! Constraint expression parsing.
//!
//! Grammar (`and` binds tighter than `or`):
//!
//! ```text
//! expr       := and_expr ("or" and_expr)*
//! and_expr   := unary ("and" unary)*
//! unary      := "not" "(" expr ")" | primary
//! primary    := "(" expr ")" | "regex" "(" "." "," string ")" | comparison
//! comparison := operand op operand
//! operand    := "." | number | string | "string-length" "(" "." ")"
//!             | "date" "(" string ")" | "today" "(" ")"
//! ```

use chrono::NaiveDate;
use regex::Regex;
use xlsform_model::{CompareOp, Expr, Literal, Operand, Pattern};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Dot,
    Number(f64),
    Str(String),
    Ident(String),
    Op(CompareOp),
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Dot => "'.'".to_string(),
            Token::Number(n) => format!("number {n}"),
            Token::Str(s) => format!("string '{s}'"),
            Token::Ident(name) => format!("'{name}'"),
            Token::Op(op) => format!("operator '{op}'"),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }

    /// Whether a `-` following this token starts a negative number.
    fn allows_sign(prev: Option<&Token>) -> bool {
        matches!(
            prev,
            None | Some(Token::Op(_) | Token::LParen | Token::Comma | Token::Ident(_))
        )
    }
}

/// Parse a constraint expression into an [`Expr`].
///
/// The error string describes what went wrong, for use in schema errors.
pub(crate) fn parse_expression(source: &str) -> Result<Expr, String> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(format!("unexpected {} after expression", token.describe())),
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
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
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| ch == quote)
                    .map(|offset| start + offset)
                    .ok_or_else(|| "unterminated string literal".to_string())?;
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '=' | '!' | '<' | '>' => {
                let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
                let (op, width) = match CompareOp::parse(&two) {
                    Some(op) if two.len() == 2 => (op, 2),
                    _ => {
                        let op = CompareOp::parse(&c.to_string())
                            .ok_or_else(|| format!("unexpected character '{c}'"))?;
                        (op, 1)
                    }
                };
                tokens.push(Token::Op(op));
                i += width;
            }
            '.' if !chars.get(i + 1).is_some_and(char::is_ascii_digit) => {
                tokens.push(Token::Dot);
                i += 1;
            }
            c if c.is_ascii_digit()
                || c == '.'
                || (c == '-'
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit() || *n == '.')
                    && Token::allows_sign(tokens.last())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{text}'"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '$' => return Err("references to other fields are not supported".to_string()),
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(format!(
                "expected {}, found {}",
                expected.describe(),
                token.describe()
            )),
            None => Err(format!(
                "expected {}, found end of expression",
                expected.describe()
            )),
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name == keyword)
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and_expr()?;
        while self.at_keyword("or") {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::or(lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        while self.at_keyword("and") {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::and(lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.at_keyword("not") && self.peek_at(1) == Some(&Token::LParen) {
            self.pos += 2;
            let inner = self.expr()?;
            self.expect(&Token::RParen)?;
            return Ok(Expr::negate(inner));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.expr()?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }
        if self.at_keyword("regex") {
            self.pos += 1;
            return self.regex_call();
        }
        self.comparison()
    }

    fn regex_call(&mut self) -> Result<Expr, String> {
        self.expect(&Token::LParen)?;
        self.expect(&Token::Dot)?;
        self.expect(&Token::Comma)?;
        let pattern = match self.next() {
            Some(Token::Str(pattern)) => pattern,
            Some(token) => {
                return Err(format!(
                    "regex pattern must be a string, found {}",
                    token.describe()
                ));
            }
            None => return Err("regex pattern missing".to_string()),
        };
        self.expect(&Token::RParen)?;
        let regex =
            Regex::new(&pattern).map_err(|e| format!("invalid regex '{pattern}': {e}"))?;
        Ok(Expr::Regex(Pattern::new(regex)))
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let lhs = self.operand()?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            Some(token) => {
                return Err(format!(
                    "expected comparison operator, found {}",
                    token.describe()
                ));
            }
            None => {
                return Err("expected comparison operator, found end of expression".to_string());
            }
        };
        let rhs = self.operand()?;
        let references_value = |operand: &Operand| {
            matches!(operand, Operand::Value | Operand::StringLength)
        };
        if !references_value(&lhs) && !references_value(&rhs) {
            return Err("comparison must reference the current value '.'".to_string());
        }
        Ok(Expr::Compare { lhs, op, rhs })
    }

    fn operand(&mut self) -> Result<Operand, String> {
        match self.next() {
            Some(Token::Dot) => Ok(Operand::Value),
            Some(Token::Number(n)) => Ok(Operand::Literal(Literal::Number(n))),
            Some(Token::Str(s)) => Ok(Operand::Literal(Literal::Text(s))),
            Some(Token::Ident(name)) => match name.as_str() {
                "string-length" => {
                    self.expect(&Token::LParen)?;
                    self.expect(&Token::Dot)?;
                    self.expect(&Token::RParen)?;
                    Ok(Operand::StringLength)
                }
                "today" => {
                    self.expect(&Token::LParen)?;
                    self.expect(&Token::RParen)?;
                    Ok(Operand::Literal(Literal::Today))
                }
                "date" => {
                    self.expect(&Token::LParen)?;
                    let text = match self.next() {
                        Some(Token::Str(text)) => text,
                        _ => return Err("date() expects a 'YYYY-MM-DD' string".to_string()),
                    };
                    self.expect(&Token::RParen)?;
                    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                        .map_err(|_| format!("invalid date literal '{text}'"))?;
                    Ok(Operand::Literal(Literal::Date(date)))
                }
                other => Err(format!("unsupported function or name '{other}'")),
            },
            Some(token) => Err(format!("expected a value, found {}", token.describe())),
            None => Err("expected a value, found end of expression".to_string()),
        }
    }
}
