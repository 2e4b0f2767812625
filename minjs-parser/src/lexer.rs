//! Lexer for the JavaScript subset using logos

use logos::{Lexer as LogosLexer, Logos};
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    // Declaration keywords
    #[token("var", priority = 10)]
    Var,
    #[token("let", priority = 10)]
    Let,
    #[token("const", priority = 10)]
    Const,
    #[token("function", priority = 10)]
    Function,

    // Control flow keywords
    #[token("return", priority = 10)]
    Return,
    #[token("if", priority = 10)]
    If,
    #[token("else", priority = 10)]
    Else,
    #[token("for", priority = 10)]
    For,
    #[token("in", priority = 10)]
    In,
    #[token("while", priority = 10)]
    While,
    #[token("do", priority = 10)]
    Do,
    #[token("break", priority = 10)]
    Break,
    #[token("continue", priority = 10)]
    Continue,

    // Operator keywords
    #[token("typeof", priority = 10)]
    TypeOf,
    #[token("void", priority = 10)]
    Void,
    #[token("delete", priority = 10)]
    Delete,

    // Other keywords
    #[token("true", priority = 10)]
    True,
    #[token("false", priority = 10)]
    False,
    #[token("null", priority = 10)]
    Null,
    #[token("this", priority = 10)]
    This,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Operators - Arithmetic
    #[token("+", priority = 8)]
    Plus,
    #[token("-", priority = 8)]
    Minus,
    #[token("*", priority = 8)]
    Star,
    #[token("/", priority = 8)]
    Slash,
    #[token("%", priority = 8)]
    Percent,
    #[token("++", priority = 8)]
    PlusPlus,
    #[token("--", priority = 8)]
    MinusMinus,

    // Operators - Comparison
    #[token("==", priority = 8)]
    EqEq,
    #[token("!=", priority = 8)]
    NotEq,
    #[token("===", priority = 8)]
    EqEqEq,
    #[token("!==", priority = 8)]
    NotEqEq,
    #[token("<", priority = 8)]
    Less,
    #[token(">", priority = 8)]
    Greater,
    #[token("<=", priority = 8)]
    LessEq,
    #[token(">=", priority = 8)]
    GreaterEq,

    // Operators - Logical
    #[token("&&", priority = 8)]
    AndAnd,
    #[token("||", priority = 8)]
    OrOr,
    #[token("??", priority = 8)]
    QuestionQuestion,
    #[token("!", priority = 8)]
    Bang,
    #[token("~", priority = 8)]
    Tilde,

    // Operators - Assignment
    #[token("=", priority = 8)]
    Eq,
    #[token("+=", priority = 8)]
    PlusEq,
    #[token("-=", priority = 8)]
    MinusEq,
    #[token("*=", priority = 8)]
    StarEq,
    #[token("/=", priority = 8)]
    SlashEq,
    #[token("%=", priority = 8)]
    PercentEq,

    // Operators - Other
    #[token("=>", priority = 8)]
    FatArrow,
    #[token(".", priority = 9)]
    Dot,

    // Punctuation
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", priority = 5, callback = |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", priority = 5, callback = |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", priority = 6, callback = |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok().map(|n| n as f64))]
    Number(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, priority = 5, callback = |lex| {
        let s = lex.slice();
        process_string_escapes(&s[1..s.len()-1])
    })]
    #[regex(r"'([^'\\\n]|\\.)*'", priority = 5, callback = |lex| {
        let s = lex.slice();
        process_string_escapes(&s[1..s.len()-1])
    })]
    String(String),

    // Identifiers (after keywords to avoid conflicts)
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", priority = 3)]
    Ident(&'a str),

    // Comments and whitespace (automatically skipped)
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    #[regex(r"[ \t\n\r]+", logos::skip)]
    // Error token
    Error,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Number(n) => write!(f, "number {n}"),
            Token::String(s) => write!(f, "string {s:?}"),
            Token::Error => write!(f, "invalid token"),
            other => match other.keyword() {
                Some(keyword) => write!(f, "keyword '{keyword}'"),
                None => write!(f, "'{}'", other.punctuation()),
            },
        }
    }
}

impl Token<'_> {
    pub(crate) fn keyword(&self) -> Option<&'static str> {
        Some(match self {
            Token::Var => "var",
            Token::Let => "let",
            Token::Const => "const",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::In => "in",
            Token::While => "while",
            Token::Do => "do",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::TypeOf => "typeof",
            Token::Void => "void",
            Token::Delete => "delete",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::This => "this",
            _ => return None,
        })
    }

    fn punctuation(&self) -> &'static str {
        match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::EqEqEq => "===",
            Token::NotEqEq => "!==",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEq => "<=",
            Token::GreaterEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::QuestionQuestion => "??",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::FatArrow => "=>",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Question => "?",
            _ => "?",
        }
    }
}

/// Process escape sequences in strings
pub fn process_string_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('0') => result.push('\0'),
                // Any other escaped character stands for itself
                Some(c) => result.push(c),
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[derive(Clone)]
pub struct Lexer<'a> {
    inner: LogosLexer<'a, Token<'a>>,
    peeked: Option<(Token<'a>, Range<usize>)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    /// Next token; input that matches no token comes back as
    /// [`Token::Error`] rather than ending the stream.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if let Some((token, _)) = self.peeked.take() {
            Some(token)
        } else {
            self.inner.next().map(|token| token.unwrap_or(Token::Error))
        }
    }

    pub fn peek_token(&mut self) -> Option<&Token<'a>> {
        if self.peeked.is_none() {
            if let Some(token) = self.inner.next() {
                let span = self.inner.span();
                self.peeked = Some((token.unwrap_or(Token::Error), span));
            }
        }
        self.peeked.as_ref().map(|(token, _)| token)
    }

    pub fn span(&self) -> Range<usize> {
        if let Some((_, span)) = &self.peeked {
            span.clone()
        } else {
            self.inner.span()
        }
    }

    /// Source text of the most recently lexed token
    pub fn slice(&self) -> &'a str {
        let source = self.inner.source();
        &source[self.span()]
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
