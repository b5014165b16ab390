//! Arithmetic expression tool.
//!
//! Evaluates model-supplied expressions with a restricted
//! recursive-descent parser: numeric literals, `+ - * /`, parentheses,
//! and unary minus. Nothing else is accepted, so there is no code
//! execution path for injected input.

use serde::Deserialize;
use serde_json::{Value, json};

use super::ToolError;
use gateway::ToolDefinition;

pub const NAME: &str = "calculate_math_expression";

const MAX_DEPTH: usize = 64;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Evaluate an arithmetic expression".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression to evaluate, e.g. '2 + 2 * 3'. \
                                    Only numbers, + - * / and parentheses are allowed.",
                }
            },
            "required": ["expression"],
        }),
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    expression: String,
}

pub fn run(arguments: &Value) -> Result<String, ToolError> {
    let args: Args = serde_json::from_value(arguments.clone())
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    let value = evaluate(&args.expression)?;
    Ok(format!(
        "{} = {}",
        args.expression.trim(),
        format_number(value)
    ))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expression[start..end];
                let number: f64 = literal.parse().map_err(|_| {
                    ToolError::InvalidExpression(format!("invalid number '{literal}'"))
                })?;
                tokens.push(Token::Number(number));
            }
            _ => {
                return Err(ToolError::InvalidExpression(format!(
                    "unexpected character '{c}'"
                )));
            }
        }
    }

    if tokens.is_empty() {
        return Err(ToolError::InvalidExpression("empty expression".into()));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self, depth: usize) -> Result<f64, ToolError> {
        let mut value = self.term(depth)?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.next();
            let rhs = self.term(depth)?;
            value = match op {
                Token::Plus => value + rhs,
                _ => value - rhs,
            };
        }
        Ok(value)
    }

    fn term(&mut self, depth: usize) -> Result<f64, ToolError> {
        let mut value = self.factor(depth)?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.next();
            let rhs = self.factor(depth)?;
            value = match op {
                Token::Star => value * rhs,
                _ => {
                    if rhs == 0.0 {
                        return Err(ToolError::InvalidExpression("division by zero".into()));
                    }
                    value / rhs
                }
            };
        }
        Ok(value)
    }

    fn factor(&mut self, depth: usize) -> Result<f64, ToolError> {
        if depth >= MAX_DEPTH {
            return Err(ToolError::InvalidExpression(
                "expression too deeply nested".into(),
            ));
        }
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Minus) => Ok(-self.factor(depth + 1)?),
            Some(Token::LParen) => {
                let value = self.expr(depth + 1)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(ToolError::InvalidExpression(
                        "missing closing parenthesis".into(),
                    )),
                }
            }
            _ => Err(ToolError::InvalidExpression(
                "expected a number or parenthesized expression".into(),
            )),
        }
    }
}

fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr(0)?;
    if parser.pos != parser.tokens.len() {
        return Err(ToolError::InvalidExpression(
            "unexpected trailing input".into(),
        ));
    }
    Ok(value)
}
