//! Arithmetic expression evaluator for `variable.math_calc`.
//!
//! Recursive descent over a fixed grammar: `+ - * / %`, right-associative
//! `**`, unary minus, parentheses, the constants `pi` and `e`, and a small
//! whitelist of functions. Exponentiation binds tighter than unary minus, so
//! `-2 ** 2` is `-4`.

use anyhow::{Result, bail};

/// Evaluates an arithmetic expression to a number.
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, position: 0 };
    let value = parser.expression()?;
    if parser.position != parser.tokens.len() {
        bail!("unexpected trailing input in expression");
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LeftParen,
    RightParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&digit) = chars.peek() {
                    if digit.is_ascii_digit() || digit == '.' {
                        literal.push(digit);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let Ok(number) = literal.parse() else {
                    bail!("invalid number literal: '{literal}'");
                };
                tokens.push(Token::Number(number));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut name = String::new();
                while let Some(&letter) = chars.peek() {
                    if letter.is_ascii_alphanumeric() || letter == '_' {
                        name.push(letter);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Power);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LeftParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RightParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            other => bail!("unexpected character in expression: '{other}'"),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            other => bail!("expected {expected:?}, found {other:?}"),
        }
    }

    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        bail!("division by zero");
                    }
                    value /= divisor;
                }
                Some(Token::Percent) => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        bail!("modulo by zero");
                    }
                    value %= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Power) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64> {
        match self.advance() {
            Some(Token::Number(number)) => Ok(number),
            Some(Token::LeftParen) => {
                let value = self.expression()?;
                self.expect(Token::RightParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LeftParen) {
                    self.advance();
                    let args = self.arguments()?;
                    self.call(&name, &args)
                } else {
                    self.constant(&name)
                }
            }
            other => bail!("unexpected token in expression: {other:?}"),
        }
    }

    fn arguments(&mut self) -> Result<Vec<f64>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RightParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RightParen) => return Ok(args),
                other => bail!("expected ',' or ')' in argument list, found {other:?}"),
            }
        }
    }

    fn constant(&self, name: &str) -> Result<f64> {
        match name {
            "pi" => Ok(std::f64::consts::PI),
            "e" => Ok(std::f64::consts::E),
            other => bail!("unknown name in expression: '{other}'"),
        }
    }

    fn call(&self, name: &str, args: &[f64]) -> Result<f64> {
        let unary = |args: &[f64]| -> Result<f64> {
            match args {
                [value] => Ok(*value),
                _ => bail!("'{name}' takes exactly one argument"),
            }
        };
        match name {
            "abs" => Ok(unary(args)?.abs()),
            "sqrt" => {
                let value = unary(args)?;
                if value < 0.0 {
                    bail!("sqrt of a negative number");
                }
                Ok(value.sqrt())
            }
            "floor" => Ok(unary(args)?.floor()),
            "ceil" => Ok(unary(args)?.ceil()),
            "int" => Ok(unary(args)?.trunc()),
            "float" => unary(args),
            "round" => match args {
                [value] => Ok(value.round()),
                [value, places] => {
                    let factor = 10f64.powi(*places as i32);
                    Ok((value * factor).round() / factor)
                }
                _ => bail!("'round' takes one or two arguments"),
            },
            "pow" => match args {
                [base, exponent] => Ok(base.powf(*exponent)),
                _ => bail!("'pow' takes exactly two arguments"),
            },
            "min" => {
                if args.is_empty() {
                    bail!("'min' needs at least one argument");
                }
                Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
            }
            "max" => {
                if args.is_empty() {
                    bail!("'max' needs at least one argument");
                }
                Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
            other => bail!("unknown function in expression: '{other}'"),
        }
    }
}
