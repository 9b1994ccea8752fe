use crate::error::{Error, Result};

/// Represents the smallest meaningful units (atoms) of the command language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // --- Keywords ---
    Create,
    Drop,
    Table,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Undo,
    History,
    Execute,
    Clear,
    And,
    Or,

    // --- Identifiers & Literals ---
    /// A name representing a table or a column (e.g., `student`, `gpa`), or a
    /// bare word used as a value.
    Ident(String),
    /// A numeric literal, kept as written (e.g., `3.50`, `-2`).
    Number(String),
    /// The content of a string literal defined between single quotes.
    String(String),

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Wildcard `*`
    Star,
    /// `=`
    Equal,
    /// `!=` or `<>`
    NotEqual,
    /// `<`
    Lower,
    /// `<=`
    LowerEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

/// A lexical scanner that converts a raw command string into a sequence of
/// [Token]s.
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens ending with
    /// [Token::Eof].
    ///
    /// # Errors
    /// Returns [Error::Syntax] if an invalid character is encountered or if a
    /// literal is malformed.
    ///
    /// # Example
    /// ```
    /// # use rowdb::tokenizer::{Tokenizer, Token};
    /// let tokens = Tokenizer::new("SELECT *").tokenize().unwrap();
    /// assert_eq!(tokens, vec![Token::Select, Token::Star, Token::Eof]);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Equal),
            '>' => {
                self.advance();
                Ok(self.followed_by('=', Token::GreaterEqual, Token::Greater))
            }
            '<' => {
                self.advance();
                if self.peek_is('>') {
                    self.advance();
                    return Ok(Token::NotEqual);
                }
                Ok(self.followed_by('=', Token::LowerEqual, Token::Lower))
            }
            '!' => {
                self.advance();
                if self.peek_is('=') {
                    self.advance();
                    Ok(Token::NotEqual)
                } else {
                    Err(Error::Syntax("expected '=' after '!'".into()))
                }
            }
            '-' => self.read_number(),
            c if c.is_ascii_digit() || c == '.' => self.read_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            '\'' => self.read_string(),
            _ => Err(Error::Syntax(format!("character {ch:?} is not supported"))),
        }
    }

    // --- Navigation Helpers ---

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek_is(&self, expected: char) -> bool {
        !self.is_at_end() && self.current_char() == expected
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    /// Consumes `next` if it is the current character and returns `matched`,
    /// otherwise returns `alone`.
    fn followed_by(&mut self, next: char, matched: Token, alone: Token) -> Token {
        if self.peek_is(next) {
            self.advance();
            matched
        } else {
            alone
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    // --- Extraction Logic ---

    /// Reads a sequence of alphanumeric characters and determines if it's
    /// a reserved keyword or an identifier.
    ///
    /// Keywords are matched case-insensitively; identifiers keep their case.
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        match ident.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "DROP" => Token::Drop,
            "TABLE" => Token::Table,
            "INSERT" => Token::Insert,
            "INTO" => Token::Into,
            "VALUES" => Token::Values,
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "UPDATE" => Token::Update,
            "SET" => Token::Set,
            "DELETE" => Token::Delete,
            "UNDO" => Token::Undo,
            "HISTORY" => Token::History,
            "EXECUTE" => Token::Execute,
            "CLEAR" => Token::Clear,
            "AND" => Token::And,
            "OR" => Token::Or,
            _ => Token::Ident(ident),
        }
    }

    /// Reads a numeric literal with an optional leading minus and at most one
    /// decimal point. The text is kept as written since cells compare equal
    /// by their exact text.
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();
        if self.peek_is('-') {
            number.push('-');
            self.advance();
        }

        let mut has_dot = false;
        while !self.is_at_end()
            && (self.current_char().is_ascii_digit() || (self.current_char() == '.' && !has_dot))
        {
            if self.current_char() == '.' {
                has_dot = true;
            }
            number.push(self.current_char());
            self.advance();
        }

        if self.peek_is('.') {
            return Err(Error::Syntax("multiple dots are not allowed in a number".into()));
        }
        if !number.chars().any(|c| c.is_ascii_digit()) {
            return Err(Error::Syntax(format!("invalid number {number:?}")));
        }

        Ok(Token::Number(number))
    }

    /// Reads a string literal enclosed in single quotes.
    fn read_string(&mut self) -> Result<Token> {
        self.advance(); // opening quote

        let mut string = String::new();
        while !self.is_at_end() && self.current_char() != '\'' {
            string.push(self.current_char());
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::Syntax("unterminated string".into()));
        }
        self.advance(); // closing quote

        Ok(Token::String(string))
    }
}
