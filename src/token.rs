#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Def,
    Return,
    Pass,
    Break,
    Continue,
    Fn,
    Lambda,
    And,
    Or,
    Not,

    // Literals and Identifiers
    Ident(String),
    Number(f64),
    String(String),
    True,
    False,
    None,

    // Arithmetic Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison Operators
    Eq,
    NotEq,
    Greater,
    Less,
    GreaterEq,
    LessEq,

    // Special Operators
    Assign,
    Arrow,
    Comma,
    Colon,

    // Delimiters
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

impl Token {
    /// Human readable form used in parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier `{}`", name),
            Token::Number(n) => format!("number `{}`", n),
            Token::String(s) => format!("string \"{}\"", s),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::If => "if",
            Token::Elif => "elif",
            Token::Else => "else",
            Token::While => "while",
            Token::For => "for",
            Token::In => "in",
            Token::Def => "def",
            Token::Return => "return",
            Token::Pass => "pass",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Fn => "fn",
            Token::Lambda => "lambda",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::True => "true",
            Token::False => "false",
            Token::None => "none",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Eq => "==",
            Token::NotEq => "!=",
            Token::Greater => ">",
            Token::Less => "<",
            Token::GreaterEq => ">=",
            Token::LessEq => "<=",
            Token::Assign => "=",
            Token::Arrow => "->",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Ident(_) | Token::Number(_) | Token::String(_) => "",
        }
    }
}
