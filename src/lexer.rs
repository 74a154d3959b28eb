use chumsky::prelude::*;

pub use crate::token::Token;

pub fn lexer<'a>()
-> impl Parser<'a, &'a str, Vec<(Token, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    let number = text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| Token::Number(s.parse().unwrap_or_default()));

    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('/'),
        just('"'),
        just('\''),
        just('n').to('\n'),
        just('r').to('\r'),
        just('t').to('\t'),
    )));

    let double_quoted = just('"')
        .ignore_then(none_of("\\\"").or(escape.clone()).repeated().collect::<String>())
        .then_ignore(just('"'))
        .map(Token::String);

    let single_quoted = just('\'')
        .ignore_then(none_of("\\'").or(escape).repeated().collect::<String>())
        .then_ignore(just('\''))
        .map(Token::String);

    let ident = text::ident().map(|s: &str| match s {
        "if" => Token::If,
        "elif" => Token::Elif,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "in" => Token::In,
        "def" => Token::Def,
        "return" => Token::Return,
        "pass" => Token::Pass,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "fn" => Token::Fn,
        "lambda" => Token::Lambda,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" | "True" => Token::True,
        "false" | "False" => Token::False,
        "none" | "None" => Token::None,
        _ => Token::Ident(s.to_string()),
    });

    let op_double = choice((
        just("==").to(Token::Eq),
        just("!=").to(Token::NotEq),
        just(">=").to(Token::GreaterEq),
        just("<=").to(Token::LessEq),
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just("->").to(Token::Arrow),
    ));

    let op_single = choice((
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('>').to(Token::Greater),
        just('<').to(Token::Less),
        just('!').to(Token::Not),
        just('=').to(Token::Assign),
        just(',').to(Token::Comma),
        just(':').to(Token::Colon),
        just(';').to(Token::Semicolon),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
    ));

    let op = op_double.or(op_single);

    // Trailing `# ...` comments are dropped with the surrounding whitespace.
    let comment = just('#').then(none_of("\n").repeated()).padded();

    let token = number
        .or(double_quoted)
        .or(single_quoted)
        .or(ident)
        .or(op)
        .map_with(|tok, e| (tok, e.span()))
        .padded()
        .then_ignore(comment.clone().repeated());

    comment
        .repeated()
        .ignore_then(token.repeated().collect())
        .then_ignore(end())
}
