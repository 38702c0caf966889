//! Action expressions: lexing, parsing and evaluation.
//!
//! ```text
//! pipeline := command ( '|' command )*
//! command  := operand+
//! operand  := '.' | '.' path | literal | function | '(' pipeline ')'
//! ```
//!
//! A command whose first operand is a function name calls it with the
//! remaining operands as arguments. The result of the previous command in a
//! pipeline is passed as the final argument.

use serde_json::Value;

use super::funcs;
use super::path::{self, Segment};
use crate::error::TemplateErrorKind;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Dot,
    Field(String),
    Ident(String),
    Literal(Value),
    LParen,
    RParen,
    Pipe,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Context,
    Field { raw: String, segments: Vec<Segment> },
    Literal(Value),
    Function(String),
    Group(Pipeline),
}

type Command = Vec<Operand>;

/// A parsed action body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    commands: Vec<Command>,
}

fn syntax(message: impl Into<String>) -> TemplateErrorKind {
    TemplateErrorKind::Syntax(message.into())
}

fn lex(source: &str) -> Result<Vec<Token>, TemplateErrorKind> {
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
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '.' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_path_char(chars[end]) {
                    end += 1;
                }
                if end == start {
                    tokens.push(Token::Dot);
                } else {
                    tokens.push(Token::Field(chars[start..end].iter().collect()));
                }
                i = end;
            }
            '"' => {
                let (text, next) = lex_quoted(&chars, i + 1)?;
                tokens.push(Token::Literal(Value::String(text)));
                i = next;
            }
            '`' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|c| *c == '`')
                    .ok_or_else(|| syntax("unterminated raw string"))?;
                let text: String = chars[i + 1..i + 1 + close].iter().collect();
                tokens.push(Token::Literal(Value::String(text)));
                i += close + 2;
            }
            c if c.is_ascii_digit()
                || (matches!(c, '-' | '+')
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Literal(parse_number(&text)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Literal(Value::Bool(true)),
                    "false" => Token::Literal(Value::Bool(false)),
                    _ => Token::Ident(word),
                });
            }
            other => return Err(syntax(format!("unexpected character {other:?}"))),
        }
    }

    Ok(tokens)
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']')
}

fn lex_quoted(chars: &[char], mut i: usize) -> Result<(String, usize), TemplateErrorKind> {
    let mut text = String::new();
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((text, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| syntax("unterminated quoted string"))?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '"' => '"',
                    '\\' => '\\',
                    other => return Err(syntax(format!("unknown escape \\{other}"))),
                });
                i += 2;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(syntax("unterminated quoted string"))
}

fn parse_number(text: &str) -> Result<Value, TemplateErrorKind> {
    if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| syntax(format!("bad number syntax: {text:?}")))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn pipeline(&mut self) -> Result<Pipeline, TemplateErrorKind> {
        let mut commands = vec![self.command()?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            commands.push(self.command()?);
        }
        Ok(Pipeline { commands })
    }

    fn command(&mut self) -> Result<Command, TemplateErrorKind> {
        let mut operands = Vec::new();
        while let Some(token) = self.peek() {
            if matches!(token, Token::Pipe | Token::RParen) {
                break;
            }
            operands.push(self.operand()?);
        }
        if operands.is_empty() {
            return Err(syntax("missing value for command"));
        }
        Ok(operands)
    }

    fn operand(&mut self) -> Result<Operand, TemplateErrorKind> {
        match self.next() {
            Some(Token::Dot) => Ok(Operand::Context),
            Some(Token::Field(raw)) => {
                let segments = path::parse_path(&raw).map_err(TemplateErrorKind::Syntax)?;
                Ok(Operand::Field { raw, segments })
            }
            Some(Token::Literal(value)) => Ok(Operand::Literal(value)),
            Some(Token::Ident(name)) => Ok(Operand::Function(name)),
            Some(Token::LParen) => {
                let inner = self.pipeline()?;
                match self.next() {
                    Some(Token::RParen) => Ok(Operand::Group(inner)),
                    _ => Err(syntax("unclosed left paren")),
                }
            }
            Some(token) => Err(syntax(format!("unexpected {token:?}"))),
            None => Err(syntax("unexpected end of action")),
        }
    }
}

/// Parse an action body.
pub(crate) fn parse(source: &str) -> Result<Pipeline, TemplateErrorKind> {
    let tokens = lex(source)?;
    if tokens.is_empty() {
        return Err(TemplateErrorKind::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let pipeline = parser.pipeline()?;
    match parser.next() {
        None => Ok(pipeline),
        Some(Token::RParen) => Err(syntax("unexpected right paren")),
        Some(token) => Err(syntax(format!("unexpected {token:?}"))),
    }
}

impl Pipeline {
    /// Evaluate against `context`.
    pub(crate) fn eval(&self, context: &Value) -> Result<Value, TemplateErrorKind> {
        let mut piped = None;
        for command in &self.commands {
            piped = Some(eval_command(command, piped, context)?);
        }
        piped.ok_or(TemplateErrorKind::Empty)
    }
}

fn eval_command(
    command: &[Operand],
    piped: Option<Value>,
    context: &Value,
) -> Result<Value, TemplateErrorKind> {
    match command {
        [Operand::Function(name), args @ ..] => {
            let mut values = args
                .iter()
                .map(|arg| eval_operand(arg, context))
                .collect::<Result<Vec<_>, _>>()?;
            values.extend(piped);
            funcs::call(name, values)
        }
        [single] => {
            if piped.is_some() {
                return Err(syntax("can't give argument to non-function"));
            }
            eval_operand(single, context)
        }
        _ => Err(syntax("can't give argument to non-function")),
    }
}

fn eval_operand(operand: &Operand, context: &Value) -> Result<Value, TemplateErrorKind> {
    match operand {
        Operand::Context => Ok(context.clone()),
        Operand::Field { raw, segments } => path::lookup(context, segments)
            .cloned()
            .ok_or_else(|| TemplateErrorKind::UndefinedPath(format!(".{raw}"))),
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Function(name) => funcs::call(name, Vec::new()),
        Operand::Group(pipeline) => pipeline.eval(context),
    }
}
