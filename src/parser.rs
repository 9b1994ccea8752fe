use crate::ast::*;
use crate::error::{Error, Result};
use crate::tokenizer::Token;

static EOF: Token = Token::Eof;

/// Recursive descent parser turning a token stream into a single [Statement].
///
/// Grammar, keywords case-insensitive, trailing `;` optional:
///
/// ```text
/// CREATE TABLE name (col, col, ...)
/// DROP TABLE name
/// INSERT INTO name VALUES (literal, literal, ...)
/// SELECT * FROM name [WHERE chain]
/// UPDATE name SET col = literal [WHERE chain]
/// DELETE FROM name [WHERE chain]
/// UNDO
/// HISTORY
/// EXECUTE n
/// CLEAR HISTORY
///
/// chain     := predicate ((AND | OR) predicate)*
/// predicate := col (= | != | <> | < | <= | > | >=) literal
/// ```
///
/// A quoted literal keeps its quotes in the stored cell (`'Alice'`), numbers
/// keep the text they were written with and a bare word is taken as is.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// # Errors
    /// Returns [Error::Syntax] describing the first unexpected token.
    pub fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current_token() {
            Token::Create => self.parse_create_table(),
            Token::Drop => self.parse_drop_table(),
            Token::Insert => self.parse_insert(),
            Token::Select => self.parse_select(),
            Token::Update => self.parse_update(),
            Token::Delete => self.parse_delete(),
            Token::Undo => {
                self.advance();
                Ok(Statement::Undo)
            }
            Token::History => {
                self.advance();
                Ok(Statement::History)
            }
            Token::Execute => self.parse_execute(),
            Token::Clear => {
                self.advance();
                self.consume(Token::History)?;
                Ok(Statement::ClearHistory)
            }
            other => Err(Error::Syntax(format!("unexpected token: {other:?}"))),
        }?;

        // semicolon is optional
        if matches!(self.current_token(), Token::Semicolon) {
            self.advance();
        }

        if !self.is_at_end() {
            return Err(Error::Syntax(format!(
                "unexpected token after statement: {:?}",
                self.current_token()
            )));
        }

        Ok(statement)
    }

    // helpers
    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&EOF)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(Error::Syntax(format!(
                "expected {:?}, found {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    fn consume_ident(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Ident(ident) => {
                let ident = ident.clone();
                self.advance();
                Ok(ident)
            }
            other => Err(Error::Syntax(format!("expected identifier, found {other:?}"))),
        }
    }

    /// Reads a cell literal and returns the text stored for it.
    fn consume_literal(&mut self) -> Result<String> {
        let literal = match self.current_token() {
            Token::Number(number) => number.clone(),
            Token::String(string) => format!("'{string}'"),
            Token::Ident(word) => word.clone(),
            other => return Err(Error::Syntax(format!("expected a value, found {other:?}"))),
        };
        self.advance();
        Ok(literal)
    }

    fn consume_operator(&mut self) -> Result<Operator> {
        let op = match self.current_token() {
            Token::Equal => Operator::Eq,
            Token::NotEqual => Operator::NotEq,
            Token::Lower => Operator::Lt,
            Token::LowerEqual => Operator::LtEq,
            Token::Greater => Operator::Gt,
            Token::GreaterEqual => Operator::GtEq,
            other => return Err(Error::Syntax(format!("expected an operator, found {other:?}"))),
        };
        self.advance();
        Ok(op)
    }

    /// Parses `( item, item, ... )` with at least one item.
    fn parse_list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        self.consume(Token::LeftParen)?;
        let mut items = vec![];
        loop {
            items.push(item(self)?);
            match self.current_token() {
                Token::RightParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                    continue;
                }
                other => return Err(Error::Syntax(format!("expected ',' or ')', found {other:?}"))),
            }
        }
        Ok(items)
    }

    fn parse_predicate(&mut self) -> Result<Predicate> {
        let column = self.consume_ident()?;
        let op = self.consume_operator()?;
        let value = self.consume_literal()?;
        Ok(Predicate::new(column, op, value))
    }

    /// An absent WHERE keyword yields a clause matching every row.
    fn parse_where(&mut self) -> Result<WhereClause> {
        if !matches!(self.current_token(), Token::Where) {
            return Ok(WhereClause::all());
        }
        self.advance();

        let mut clause = WhereClause::new(self.parse_predicate()?);
        loop {
            let combinator = match self.current_token() {
                Token::And => Combinator::And,
                Token::Or => Combinator::Or,
                _ => break,
            };
            self.advance();
            clause = clause.push(combinator, self.parse_predicate()?);
        }
        Ok(clause)
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.consume(Token::Create)?;
        self.consume(Token::Table)?;
        let name = self.consume_ident()?;
        let columns = self.parse_list(Self::consume_ident)?;
        Ok(Statement::CreateTable(CreateTable { name, columns }))
    }

    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.consume(Token::Drop)?;
        self.consume(Token::Table)?;
        let name = self.consume_ident()?;
        Ok(Statement::DropTable(DropTable { name }))
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.consume(Token::Insert)?;
        self.consume(Token::Into)?;
        let table = self.consume_ident()?;
        self.consume(Token::Values)?;
        let values = self.parse_list(Self::consume_literal)?;
        Ok(Statement::InsertInto(InsertInto { table, values }))
    }

    fn parse_select(&mut self) -> Result<Statement> {
        self.consume(Token::Select)?;
        self.consume(Token::Star)?;
        self.consume(Token::From)?;
        let table = self.consume_ident()?;
        let filter = self.parse_where()?;
        Ok(Statement::Select(Select { table, filter }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.consume(Token::Update)?;
        let table = self.consume_ident()?;
        self.consume(Token::Set)?;
        let column = self.consume_ident()?;
        self.consume(Token::Equal)?;
        let value = self.consume_literal()?;
        let filter = self.parse_where()?;
        Ok(Statement::Update(Update {
            table,
            column,
            value,
            filter,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.consume(Token::Delete)?;
        self.consume(Token::From)?;
        let table = self.consume_ident()?;
        let filter = self.parse_where()?;
        Ok(Statement::Delete(Delete { table, filter }))
    }

    fn parse_execute(&mut self) -> Result<Statement> {
        self.consume(Token::Execute)?;
        let position = match self.current_token() {
            Token::Number(number) => number
                .parse::<usize>()
                .map_err(|_| Error::Syntax(format!("invalid history position {number:?}")))?,
            other => return Err(Error::Syntax(format!("expected a history position, found {other:?}"))),
        };
        self.advance();
        Ok(Statement::Execute(position))
    }
}
