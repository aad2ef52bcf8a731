pub mod schema;

use anyhow::{anyhow, Result};

/// The restricted SELECT shape the engine executes: projected columns (or
/// a single `COUNT(*)`), a table, and at most one equality predicate with
/// a single-quoted literal.
#[derive(Debug, PartialEq)]
pub struct SelectStatement {
    pub columns: Vec<String>,
    pub table: String,
    pub condition: Option<EqualityCondition>,
}

impl SelectStatement {
    pub fn is_count(&self) -> bool {
        self.columns.len() == 1 && self.columns[0].to_lowercase().starts_with("count(")
    }
}

#[derive(Debug, PartialEq)]
pub struct EqualityCondition {
    pub column: String,
    pub value: String,
}

// a parser peels its match off the front and hands back the rest
type ParseResult<'a, Output> = Result<(&'a str, Output), String>;

pub trait Parser<'a, Output> {
    fn parse(&self, input: &'a str) -> ParseResult<'a, Output>;
}

pub struct BoxedParser<'a, Output> {
    f: Box<dyn Fn(&'a str) -> ParseResult<'a, Output> + 'a>,
}

impl<'a, Output> BoxedParser<'a, Output> {
    fn new<F>(f: F) -> BoxedParser<'a, Output>
    where
        F: Fn(&'a str) -> ParseResult<'a, Output> + 'a,
    {
        BoxedParser { f: Box::new(f) }
    }
}

impl<'a, Output> Parser<'a, Output> for BoxedParser<'a, Output> {
    fn parse(&self, input: &'a str) -> ParseResult<'a, Output> {
        (self.f)(input)
    }
}

pub trait ParserExt<'a, Output>: Parser<'a, Output> + Sized {
    fn then<P2, Output2>(self, next: P2) -> BoxedParser<'a, (Output, Output2)>
    where
        P2: Parser<'a, Output2> + 'a,
        Output2: 'a,
        Output: 'a,
        Self: 'a,
    {
        BoxedParser::new(move |input| {
            self.parse(input).and_then(|(next_input, result)| {
                next.parse(next_input)
                    .map(|(final_input, next_result)| (final_input, (result, next_result)))
            })
        })
    }

    fn or<OtherParser>(self, other: OtherParser) -> BoxedParser<'a, Output>
    where
        OtherParser: Parser<'a, Output> + 'a,
        Self: 'a,
    {
        BoxedParser::new(move |input| match self.parse(input) {
            Ok(res) => Ok(res),
            Err(_) => other.parse(input),
        })
    }

    fn map<F, Output2>(self, f: F) -> BoxedParser<'a, Output2>
    where
        F: Fn(Output) -> Output2 + 'a,
        Output: 'a,
        Output2: 'a,
        Self: 'a,
    {
        BoxedParser::new(move |input| self.parse(input).map(|(rest, val)| (rest, f(val))))
    }
}

impl<'a, Output, P> ParserExt<'a, Output> for P where P: Parser<'a, Output> + Sized {}

fn keyword<'a>(word: &'static str) -> impl Parser<'a, ()> {
    BoxedParser::new(move |input: &'a str| {
        let bytes = input.as_bytes();
        if bytes.len() >= word.len() && bytes[..word.len()].eq_ignore_ascii_case(word.as_bytes()) {
            Ok((&input[word.len()..], ()))
        } else {
            Err(format!("expected keyword '{word}'"))
        }
    })
}

// at least one whitespace character
fn whitespace1<'a>() -> impl Parser<'a, ()> {
    BoxedParser::new(|input: &'a str| {
        let end = input
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(input.len());
        if end == 0 {
            Err("expected whitespace".into())
        } else {
            Ok((&input[end..], ()))
        }
    })
}

fn whitespace0<'a>() -> impl Parser<'a, ()> {
    BoxedParser::new(|input: &'a str| {
        let end = input
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(input.len());
        Ok((&input[end..], ()))
    })
}

fn identifier<'a>() -> impl Parser<'a, &'a str> {
    BoxedParser::new(|input: &'a str| {
        let end = input
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(input.len());
        if end == 0 {
            Err("expected identifier".into())
        } else {
            Ok((&input[end..], &input[..end]))
        }
    })
}

// COUNT(...) kept as written; the executor only looks at the prefix
fn count_projection<'a>() -> impl Parser<'a, &'a str> {
    BoxedParser::new(|input: &'a str| {
        let bytes = input.as_bytes();
        if bytes.len() < 6 || !bytes[..5].eq_ignore_ascii_case(b"count") {
            return Err("expected COUNT".into());
        }
        if bytes[5] != b'(' {
            return Err("expected '(' after COUNT".into());
        }
        let Some(close) = input.find(')') else {
            return Err("unclosed COUNT(".into());
        };
        Ok((&input[close + 1..], &input[..close + 1]))
    })
}

fn projection<'a>() -> impl Parser<'a, String> {
    count_projection()
        .map(str::to_string)
        .or(identifier().map(str::to_string))
}

fn projection_list<'a>() -> impl Parser<'a, Vec<String>> {
    BoxedParser::new(|mut input: &'a str| {
        let item = projection();
        let comma = whitespace0().then(keyword(",")).then(whitespace0());

        let mut columns: Vec<String> = Vec::new();
        let (next, first) = item.parse(input)?;
        columns.push(first);
        input = next;

        while let Ok((next, _)) = comma.parse(input) {
            let (next, column) = item.parse(next)?;
            columns.push(column);
            input = next;
        }
        Ok((input, columns))
    })
}

// '...' with no escape handling
fn quoted_literal<'a>() -> impl Parser<'a, String> {
    BoxedParser::new(|input: &'a str| {
        if !input.starts_with('\'') {
            return Err("expected string literal".into());
        }
        let Some(close) = input[1..].find('\'') else {
            return Err("unterminated string literal".into());
        };
        Ok((&input[close + 2..], input[1..close + 1].to_string()))
    })
}

fn equality_condition<'a>() -> impl Parser<'a, EqualityCondition> {
    identifier()
        .then(whitespace0())
        .then(keyword("="))
        .then(whitespace0())
        .then(quoted_literal())
        .map(|((((column, _), _), _), value)| EqualityCondition {
            column: column.to_string(),
            value,
        })
}

fn where_clause<'a>() -> impl Parser<'a, Option<EqualityCondition>> {
    whitespace1()
        .then(keyword("where"))
        .then(whitespace1())
        .then(equality_condition())
        .map(|((_, _), condition)| Some(condition))
        .or(BoxedParser::new(|input| Ok((input, None))))
}

fn select_statement<'a>() -> impl Parser<'a, SelectStatement> {
    keyword("select")
        .then(whitespace1())
        .then(projection_list())
        .then(whitespace1())
        .then(keyword("from"))
        .then(whitespace1())
        .then(identifier())
        .then(where_clause())
        .map(
            |(((((((_, _), columns), _), _), _), table), condition)| SelectStatement {
                columns,
                table: table.to_string(),
                condition,
            },
        )
}

pub fn parse_select(input: &str) -> Result<SelectStatement> {
    let trimmed = input.trim().trim_end_matches(';').trim_end();
    let (rest, statement) = select_statement()
        .parse(trimmed)
        .map_err(|e| anyhow!("unsupported query: {e}"))?;
    if !rest.trim().is_empty() {
        return Err(anyhow!("unsupported query: trailing input '{rest}'"));
    }
    Ok(statement)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_column() {
        let statement = parse_select("SELECT name FROM apples").unwrap();
        assert_eq!(
            statement,
            SelectStatement {
                columns: vec!["name".into()],
                table: "apples".into(),
                condition: None,
            }
        );
    }

    #[test]
    fn multiple_columns() {
        let statement = parse_select("select id, name from apples").unwrap();
        assert_eq!(statement.columns, vec!["id", "name"]);
        assert_eq!(statement.table, "apples");
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let statement = parse_select("SeLeCt name FrOm apples").unwrap();
        assert_eq!(statement.table, "apples");
    }

    #[test]
    fn count_star() {
        let statement = parse_select("SELECT COUNT(*) FROM apples").unwrap();
        assert_eq!(statement.columns, vec!["COUNT(*)"]);
        assert!(statement.is_count());

        let statement = parse_select("select count(*) from apples").unwrap();
        assert!(statement.is_count());
    }

    #[test]
    fn plain_projection_is_not_count() {
        let statement = parse_select("SELECT name FROM apples").unwrap();
        assert!(!statement.is_count());
    }

    #[test]
    fn where_equality() {
        let statement =
            parse_select("SELECT color FROM apples WHERE name = 'Granny Smith'").unwrap();
        assert_eq!(
            statement.condition,
            Some(EqualityCondition {
                column: "name".into(),
                value: "Granny Smith".into(),
            })
        );
    }

    #[test]
    fn where_without_spaces_around_equals() {
        let statement = parse_select("SELECT color FROM apples WHERE name='Fuji'").unwrap();
        assert_eq!(statement.condition.unwrap().value, "Fuji");
    }

    #[test]
    fn trailing_semicolon() {
        let statement = parse_select("SELECT name FROM apples;").unwrap();
        assert_eq!(statement.table, "apples");
    }

    #[test]
    fn unterminated_literal_is_an_error() {
        assert!(parse_select("SELECT color FROM apples WHERE name = 'oops").is_err());
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        assert!(parse_select("SELECT name FROM apples ORDER BY name").is_err());
    }

    #[test]
    fn not_a_select_is_an_error() {
        assert!(parse_select("DELETE FROM apples").is_err());
    }
}
