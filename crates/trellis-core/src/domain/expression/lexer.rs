use super::ExpressionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Int(i64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Question,
    Colon,
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Int(i) => format!("integer {i}"),
            Self::Str(s) => format!("string '{s}'"),
            Self::Ident(name) => format!("identifier '{name}'"),
            Self::Eof => "end of expression".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::And => "&&",
            Self::Or => "||",
            Self::Not => "!",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Dot => ".",
            Self::Comma => ",",
            Self::Question => "?",
            Self::Colon => ":",
            Self::Int(_) | Self::Str(_) | Self::Ident(_) | Self::Eof => "",
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split an expression into tokens. The result always ends with `Eof`.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '0'..='9' => {
                let mut literal = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '_' {
                        if d != '_' {
                            literal.push(d);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal.parse::<i64>().map_err(|_| ExpressionError::Syntax {
                    position: pos,
                    message: format!("integer literal '{literal}' is out of range"),
                })?;
                tokens.push(Spanned {
                    token: Token::Int(value),
                    position: pos,
                });
                continue;
            }
            '\'' | '"' => {
                chars.next();
                let value = read_string(&mut chars, c, pos)?;
                tokens.push(Spanned {
                    token: Token::Str(value),
                    position: pos,
                });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match ident.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(ident),
                };
                tokens.push(Spanned {
                    token,
                    position: pos,
                });
                continue;
            }
            _ => {
                chars.next();
                let next = chars.peek().map(|&(_, n)| n);
                let mut two = |token: Token| {
                    chars.next();
                    token
                };
                match (c, next) {
                    ('&', Some('&')) => two(Token::And),
                    ('|', Some('|')) => two(Token::Or),
                    ('=', Some('=')) => two(Token::EqEq),
                    ('!', Some('=')) => two(Token::NotEq),
                    ('<', Some('=')) => two(Token::Le),
                    ('>', Some('=')) => two(Token::Ge),
                    ('!', _) => Token::Not,
                    ('<', _) => Token::Lt,
                    ('>', _) => Token::Gt,
                    ('+', _) => Token::Plus,
                    ('-', _) => Token::Minus,
                    ('*', _) => Token::Star,
                    ('/', _) => Token::Slash,
                    ('%', _) => Token::Percent,
                    ('(', _) => Token::LParen,
                    (')', _) => Token::RParen,
                    ('[', _) => Token::LBracket,
                    (']', _) => Token::RBracket,
                    ('.', _) => Token::Dot,
                    (',', _) => Token::Comma,
                    ('?', _) => Token::Question,
                    (':', _) => Token::Colon,
                    _ => {
                        return Err(ExpressionError::Syntax {
                            position: pos,
                            message: format!("unexpected character '{c}'"),
                        });
                    }
                }
            }
        };

        tokens.push(Spanned {
            token,
            position: pos,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        position: input.len(),
    });
    Ok(tokens)
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    start: usize,
) -> Result<String, ExpressionError> {
    let mut value = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            c if c == quote => return Ok(value),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped @ ('\\' | '\'' | '"' | '$'))) => value.push(escaped),
                Some((pos, other)) => {
                    return Err(ExpressionError::Syntax {
                        position: pos,
                        message: format!("unknown escape sequence '\\{other}'"),
                    });
                }
                None => break,
            },
            c => value.push(c),
        }
    }
    Err(ExpressionError::Syntax {
        position: start,
        message: "unterminated string literal".into(),
    })
}
