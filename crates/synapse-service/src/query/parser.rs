//! Recursive-descent parser with one token of lookahead.

use super::lexer::{Keyword, Lexer, Token, TokenKind};
use super::statement::{FieldRef, Filter, FilterValue, QueryStatement};
use super::{ParseError, QueryError};

/// Optional clauses in the order they may appear after `from`.
const TRAILING_CLAUSES: [Keyword; 4] = [
    Keyword::Where,
    Keyword::Order,
    Keyword::Limit,
    Keyword::Offset,
];

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.current.kind == TokenKind::Keyword(kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> Result<bool, ParseError> {
        if self.at_keyword(kw) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Syntax {
            line: self.current.line,
            column: self.current.column,
            found: self.current.describe(),
            expected: expected.to_owned(),
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(kw)? {
            Ok(())
        } else {
            Err(self.unexpected(&format!("\"{}\"", kw.as_str())))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        let TokenKind::Identifier(name) = &self.current.kind else {
            return Err(self.unexpected("<identifier>"));
        };
        let name = name.clone();
        self.advance()?;
        Ok(name)
    }

    /// A bare identifier or a quoted name such as `"Number of Samples"`.
    fn expect_name(&mut self) -> Result<String, ParseError> {
        let (TokenKind::Identifier(name) | TokenKind::Quoted(name)) = &self.current.kind else {
            return Err(self.unexpected("<identifier> | <string literal>"));
        };
        let name = name.clone();
        self.advance()?;
        Ok(name)
    }

    fn expect_integer(&mut self) -> Result<i64, ParseError> {
        match self.current.kind {
            TokenKind::Integer(n) => {
                self.advance()?;
                Ok(n)
            }
            _ => Err(self.unexpected("<integer>")),
        }
    }

    fn field_ref(&mut self) -> Result<FieldRef, ParseError> {
        let first = self.expect_name()?;
        if self.current.kind == TokenKind::Dot {
            self.advance()?;
            let name = self.expect_name()?;
            Ok(FieldRef::new(Some(first), name))
        } else {
            Ok(FieldRef::new(None, first))
        }
    }

    pub fn parse(mut self) -> Result<QueryStatement, QueryError> {
        self.expect_keyword(Keyword::Select)?;
        let select = self.select_list()?;
        self.expect_keyword(Keyword::From)?;
        let from = self.expect_identifier()?;

        let mut stmt = QueryStatement {
            from,
            select,
            filters: Vec::new(),
            sort_table: None,
            sort_field: None,
            ascending: true,
            limit: None,
            offset: None,
        };

        // Index into TRAILING_CLAUSES of the first clause still allowed.
        let mut next_clause = 0;

        if self.eat_keyword(Keyword::Where)? {
            stmt.filters = self.conditions()?;
            next_clause = 1;
        }

        if self.eat_keyword(Keyword::Order)? {
            self.expect_keyword(Keyword::By)?;
            let field = self.field_ref()?;
            stmt.sort_table = field.table;
            stmt.sort_field = Some(field.name);
            if self.eat_keyword(Keyword::Desc)? {
                stmt.ascending = false;
            } else {
                self.eat_keyword(Keyword::Asc)?;
            }
            next_clause = 2;
        }

        if self.eat_keyword(Keyword::Limit)? {
            let limit = u64::try_from(self.expect_integer()?)
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| {
                    QueryError::InvalidArgument("pagination limit must be 1 or greater".to_owned())
                })?;
            stmt.limit = Some(limit);
            next_clause = 3;
        }

        if self.eat_keyword(Keyword::Offset)? {
            let offset = u64::try_from(self.expect_integer()?).map_err(|_| {
                QueryError::InvalidArgument("pagination offset must be 0 or greater".to_owned())
            })?;
            stmt.offset = Some(offset);
            next_clause = 4;
        }

        if self.current.kind != TokenKind::Eof {
            let mut expected: Vec<String> = Vec::new();
            if next_clause == 1 {
                expected.push("\"and\"".to_owned());
            }
            expected.extend(
                TRAILING_CLAUSES[next_clause..]
                    .iter()
                    .map(|kw| format!("\"{}\"", kw.as_str())),
            );
            expected.push("<EOF>".to_owned());
            return Err(self.unexpected(&expected.join(" | ")).into());
        }

        Ok(stmt)
    }

    fn select_list(&mut self) -> Result<Option<Vec<String>>, ParseError> {
        if self.current.kind == TokenKind::Star {
            self.advance()?;
            return Ok(None);
        }

        let mut columns = vec![self.field_ref()?.to_string()];
        while self.current.kind == TokenKind::Comma {
            self.advance()?;
            columns.push(self.field_ref()?.to_string());
        }
        Ok(Some(columns))
    }

    fn conditions(&mut self) -> Result<Vec<Filter>, ParseError> {
        let mut filters = vec![self.condition()?];
        while self.eat_keyword(Keyword::And)? {
            filters.push(self.condition()?);
        }
        Ok(filters)
    }

    fn condition(&mut self) -> Result<Filter, ParseError> {
        let field = self.field_ref()?;

        let comparator = match self.current.kind {
            TokenKind::Comparator(cmp) => {
                self.advance()?;
                cmp
            }
            _ => return Err(self.unexpected("\"==\" | \"!=\" | \">\" | \"<\" | \">=\" | \"<=\"")),
        };

        let value = match &self.current.kind {
            TokenKind::Quoted(s) => FilterValue::String(s.clone()),
            TokenKind::Integer(n) => FilterValue::Long(*n),
            TokenKind::Keyword(Keyword::Null) => FilterValue::Null,
            _ => return Err(self.unexpected("<string literal> | <integer> | \"null\"")),
        };
        self.advance()?;

        Ok(Filter {
            field,
            comparator,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Comparator;

    fn parse(q: &str) -> QueryStatement {
        QueryStatement::parse(q).unwrap()
    }

    fn only_filter(stmt: &QueryStatement) -> &Filter {
        assert_eq!(stmt.filters.len(), 1);
        &stmt.filters[0]
    }

    #[test]
    fn select_star() {
        let stmt = parse("select * from folder");
        assert_eq!(stmt.from, "folder");
        assert_eq!(stmt.select, None);
        assert!(stmt.filters.is_empty());
        assert!(stmt.ascending);
        assert_eq!(stmt.limit, None);
        assert_eq!(stmt.offset, None);
    }

    #[test]
    fn quoted_values_stay_strings() {
        let stmt = parse(
            "select * from dataset where dataset.id == '4494' and dataset.parentId == '4492'",
        );
        assert_eq!(stmt.from, "dataset");
        assert_eq!(stmt.filters.len(), 2);
        assert_eq!(
            stmt.filters[0].field,
            FieldRef::new(Some("dataset".into()), "id")
        );
        assert_eq!(stmt.filters[0].value, FilterValue::String("4494".into()));
        assert_eq!(
            stmt.filters[1].field,
            FieldRef::new(Some("dataset".into()), "parentId")
        );
        assert_eq!(stmt.filters[1].value, FilterValue::String("4492".into()));
    }

    #[test]
    fn bare_numbers_are_longs() {
        let stmt = parse("select * from dataset where dataset.Number_of_Samples > 100");
        let filter = only_filter(&stmt);
        assert_eq!(filter.field.name, "Number_of_Samples");
        assert_eq!(filter.comparator, Comparator::GreaterThan);
        assert_eq!(filter.value, FilterValue::Long(100));
    }

    #[test]
    fn every_comparator() {
        for (text, cmp) in [
            ("==", Comparator::Equals),
            ("!=", Comparator::NotEquals),
            (">", Comparator::GreaterThan),
            ("<", Comparator::LessThan),
            (">=", Comparator::GreaterThanOrEquals),
            ("<=", Comparator::LessThanOrEquals),
        ] {
            let stmt = parse(&format!(
                "select * from datasets where datasets.Number_of_Samples {text} 101"
            ));
            let filter = only_filter(&stmt);
            assert_eq!(filter.comparator, cmp, "{text}");
            assert_eq!(filter.value.as_long(), Some(101));
        }
    }

    #[test]
    fn double_quoted_string_value() {
        let stmt = parse("select * from datasets where datasets.SomeString != \"Value String\"");
        let filter = only_filter(&stmt);
        assert_eq!(filter.comparator, Comparator::NotEquals);
        assert_eq!(filter.value.as_str(), Some("Value String"));
    }

    #[test]
    fn quoted_field_names() {
        let stmt = parse("select * from dataset where \"Number of Samples\" == 100");
        let filter = only_filter(&stmt);
        assert_eq!(filter.field, FieldRef::new(None, "Number of Samples"));
        assert_eq!(filter.value, FilterValue::Long(100));

        let stmt = parse("select * from dataset where dataset.\"Number of Samples\" == 100");
        let filter = only_filter(&stmt);
        assert_eq!(
            filter.field,
            FieldRef::new(Some("dataset".into()), "Number of Samples")
        );
    }

    #[test]
    fn conditions_keep_source_order() {
        let stmt = parse(
            "select * from dataset where dataset.Species == \"Human\" and dataset.Disease == \"Cancer\"",
        );
        assert_eq!(stmt.filters.len(), 2);
        assert_eq!(stmt.filters[0].field.name, "Species");
        assert_eq!(stmt.filters[0].value.as_str(), Some("Human"));
        assert_eq!(stmt.filters[1].field.name, "Disease");
        assert_eq!(stmt.filters[1].value.as_str(), Some("Cancer"));
    }

    #[test]
    fn null_literal() {
        let stmt = parse("select * from entity where parentId == null");
        assert!(only_filter(&stmt).value.is_null());
    }

    #[test]
    fn project_id_filter() {
        let stmt = parse("select * from entity where projectId == 'syn123'");
        assert_eq!(stmt.from, "entity");
        assert_eq!(only_filter(&stmt).value.as_str(), Some("syn123"));
    }

    #[test]
    fn date_strings_are_not_interpreted() {
        let stmt = parse("select * from layer where creationDate == \"2011-01-31\"");
        assert_eq!(only_filter(&stmt).value.as_str(), Some("2011-01-31"));
    }

    #[test]
    fn explicit_select_list() {
        let stmt = parse("select id from entity where parentId == null");
        assert_eq!(stmt.select, Some(vec!["id".to_owned()]));

        let stmt = parse("select etag, name, id from entity where parentId == null");
        assert_eq!(
            stmt.select,
            Some(vec!["etag".to_owned(), "name".to_owned(), "id".to_owned()])
        );
    }

    #[test]
    fn order_by() {
        let stmt = parse("select * from dataset order by id");
        assert_eq!(stmt.sort_field.as_deref(), Some("id"));
        assert_eq!(stmt.sort_table, None);
        assert!(stmt.ascending);

        let stmt = parse("select * from dataset order by id desc");
        assert!(!stmt.ascending);

        let stmt = parse("select * from dataset order by dataset.name asc");
        assert_eq!(stmt.sort_table.as_deref(), Some("dataset"));
        assert_eq!(stmt.sort_field.as_deref(), Some("name"));
        assert!(stmt.ascending);
    }

    #[test]
    fn order_by_with_limit() {
        let stmt = parse("select * from dataset order by dataset.\"name\" limit 30");
        assert_eq!(stmt.sort_table.as_deref(), Some("dataset"));
        assert_eq!(stmt.sort_field.as_deref(), Some("name"));
        assert_eq!(stmt.limit, Some(30));
    }

    #[test]
    fn limit_and_offset() {
        assert_eq!(parse("select * from dataset limit 10").limit, Some(10));
        assert_eq!(parse("select * from dataset offset 12").offset, Some(12));

        let stmt = parse("select * from dataset limit 10 offset 0");
        assert_eq!(stmt.limit, Some(10));
        assert_eq!(stmt.offset, Some(0));
    }

    #[test]
    fn translation_is_idempotent() {
        let q = "select * from dataset where dataset.id == '4494' order by name desc limit 5";
        assert_eq!(parse(q), parse(q));
    }

    #[test]
    fn keywords_ignore_case() {
        let stmt = parse("SELECT * FROM dataset WHERE id == 1 ORDER BY name DESC LIMIT 2");
        assert_eq!(stmt.from, "dataset");
        assert!(!stmt.ascending);
        assert_eq!(stmt.limit, Some(2));
    }

    #[test]
    fn unterminated_string_is_a_lexical_error() {
        let err = QueryStatement::parse("select * from layer where type == \"C").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Lexical error at line 1, column 37. Encountered: <EOF> after : "\"C""#
        );

        let err = QueryStatement::parse(
            "select * from dataset where name == \"Pediatric AML TARGET",
        )
        .unwrap_err();
        match err {
            QueryError::Parse(ParseError::Lexical { line, column, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(column, 58);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_table_is_a_syntax_error() {
        let err = QueryStatement::parse("select * from order by creationDate desc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Encountered \"order\" at line 1, column 15. Was expecting: <identifier>"
        );
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = QueryStatement::parse("select * from dataset limit 0").unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidArgument("pagination limit must be 1 or greater".into())
        );
    }

    #[test]
    fn negative_offset_is_rejected() {
        let err = QueryStatement::parse("select * from dataset offset -1").unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn clauses_out_of_order_are_rejected() {
        let err = QueryStatement::parse("select * from dataset limit 5 where id == 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Encountered \"where\" at line 1, column 31. Was expecting: \"offset\" | <EOF>"
        );
    }

    #[test]
    fn trailing_garbage_after_where_mentions_and() {
        let err = QueryStatement::parse("select * from dataset where id == 1 id").unwrap_err();
        assert!(err.to_string().contains("\"and\""));
    }

    #[test]
    fn missing_literal() {
        let err = QueryStatement::parse("select * from dataset where id ==").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Encountered <EOF> at line 1, column 34. Was expecting: <string literal> | <integer> | \"null\""
        );
    }

    #[test]
    fn empty_query() {
        let err = QueryStatement::parse("").unwrap_err();
        assert!(err.to_string().starts_with("Encountered <EOF> at line 1, column 1."));
    }
}
