//! Formula parser
//!
//! A recursive descent parser for calculated-field formulas with proper
//! operator precedence. Field references are written `[Field name]`, string
//! literals use double or single quotes (a doubled quote escapes itself) and
//! keep every other character verbatim, so regex patterns such as `"[0-9]+"`
//! or a lone `"("` survive untouched.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult, ParseErrorKind};

/// Stack guard for nested groups, calls, unary signs and powers
///
/// Flat operator chains such as `[a] + [b] + ...` are built in a loop and
/// are not counted.
pub const MAX_PARSE_DEPTH: usize = 256;

/// Parse a formula string into an AST
///
/// A leading `=` is optional.
///
/// # Example
/// ```rust
/// use rowcalc_formula::parse_formula;
///
/// let ast = parse_formula("[Prix] * [Qte]").unwrap();
/// let ast = parse_formula("REMPLACER([text], \"(\", \"X\")").unwrap();
/// let ast = parse_formula("=SI([Age] > 18, 'Grand', 'Petit')").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(formula)?;

    if parser.current == Token::Eof {
        return Err(FormulaError::parse(
            ParseErrorKind::EmptyFormula,
            parser.token_start,
        ));
    }

    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    match parser.current {
        Token::Eof => Ok(expr),
        Token::RightParen => Err(FormulaError::parse(
            ParseErrorKind::UnbalancedParenthesis,
            parser.token_start,
        )),
        _ => Err(FormulaError::parse(
            ParseErrorKind::TrailingInput(parser.input[parser.token_start..].to_string()),
            parser.token_start,
        )),
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),

    // Identifiers and references
    Identifier(String), // Function name
    FieldRef(String),   // [Field]

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Boolean(b) => format!("boolean {}", if *b { "TRUE" } else { "FALSE" }),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::FieldRef(name) => format!("field [{}]", name),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Caret => "'^'".into(),
            Token::Ampersand => "'&'".into(),
            Token::Equal => "'='".into(),
            Token::NotEqual => "'<>'".into(),
            Token::LessThan => "'<'".into(),
            Token::LessEqual => "'<='".into(),
            Token::GreaterThan => "'>'".into(),
            Token::GreaterEqual => "'>='".into(),
            Token::Comma => "','".into(),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
            Token::Eof => "end of formula".into(),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current: Token,
    /// Byte offset where `current` starts
    token_start: usize,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current: Token::Eof,
            token_start: 0,
            depth: 0,
        };

        parser.skip_whitespace();
        if parser.peek_char() == Some('=') {
            parser.advance();
        }

        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '&' => Some(Token::Ampersand),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // One- or two-character operators
        match c {
            '<' => {
                self.advance();
                return Ok(match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                });
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::GreaterEqual);
                }
                return Ok(Token::GreaterThan);
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                }
                return Ok(Token::Equal);
            }
            '!' if self.peek_char_at(1) == Some('=') => {
                self.advance();
                self.advance();
                return Ok(Token::NotEqual);
            }
            _ => {}
        }

        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        if c == '[' {
            return self.scan_field_ref();
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return Ok(self.scan_number());
        }

        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(FormulaError::parse(
            ParseErrorKind::UnexpectedToken(format!("character '{}'", c)),
            self.pos,
        ))
    }

    fn scan_string(&mut self, quote: char) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(FormulaError::parse(
                        ParseErrorKind::UnterminatedString,
                        start,
                    ))
                }
                Some(c) if c == quote => {
                    // A doubled quote is an escaped quote
                    if self.peek_char_at(1) == Some(quote) {
                        s.push(quote);
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        return Ok(Token::String(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_field_ref(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip '['

        let name_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == ']' {
                let name = self.input[name_start..self.pos].to_string();
                self.advance();
                return Ok(Token::FieldRef(name));
            }
            self.advance();
        }

        Err(FormulaError::parse(
            ParseErrorKind::UnterminatedFieldRef,
            start,
        ))
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let digits_at = match self.peek_char_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self
                .peek_char_at(digits_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digits_at {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        Token::Number(num_str.parse().unwrap_or(0.0))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let upper = self.input[start..self.pos].to_uppercase();

        // Boolean literals, unless used as a function name
        if self.next_non_whitespace() != Some('(') {
            match upper.as_str() {
                "TRUE" | "VRAI" => return Token::Boolean(true),
                "FALSE" | "FAUX" => return Token::Boolean(false),
                _ => {}
            }
        }

        Token::Identifier(upper)
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn next_non_whitespace(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn unexpected(&self) -> FormulaError {
        let kind = match self.current {
            Token::Eof => ParseErrorKind::UnexpectedEnd,
            _ => ParseErrorKind::UnexpectedToken(self.current.describe()),
        };
        FormulaError::parse(kind, self.token_start)
    }

    /// Account for one more level of tree depth
    fn deepen(&mut self) -> FormulaResult<()> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(FormulaError::parse(
                ParseErrorKind::NestingTooDeep,
                self.token_start,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run a recursive production under the nesting guard
    fn nested<T>(
        &mut self,
        production: impl FnOnce(&mut Self) -> FormulaResult<T>,
    ) -> FormulaResult<T> {
        self.deepen()?;
        let result = production(self);
        self.depth -= 1;
        result
    }

    /// Expect the `)` closing a group or argument list opened at `open_pos`
    fn expect_closing_paren(&mut self, open_pos: usize) -> FormulaResult<()> {
        match self.current {
            Token::RightParen => {
                self.consume()?;
                Ok(())
            }
            Token::Eof => Err(FormulaError::parse(
                ParseErrorKind::UnbalancedParenthesis,
                open_pos,
            )),
            _ => Err(self.unexpected()),
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^ (right associative)
    // 6. Unary: -, +
    // 7. Primary: literals, field references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.nested(|p| p.parse_comparison())
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_concatenation()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while self.current == Token::Ampersand {
            self.consume()?;
            let right = self.parse_additive()?;
            left = FormulaExpr::BinaryOp {
                op: BinaryOperator::Concat,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_power()?;

        loop {
            let op = match self.current {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_power()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_unary()?;

        if self.current == Token::Caret {
            self.consume()?;
            let right = self.nested(|p| p.parse_power())?; // Right associative
            return Ok(FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current {
            Token::Minus => {
                self.consume()?;
                let operand = self.nested(|p| p.parse_unary())?;
                Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            // Prefix plus (no-op)
            Token::Plus => {
                self.consume()?;
                self.nested(|p| p.parse_unary())
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current.clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(FormulaExpr::Number(n))
            }

            Token::String(s) => {
                self.consume()?;
                Ok(FormulaExpr::String(s))
            }

            Token::Boolean(b) => {
                self.consume()?;
                Ok(FormulaExpr::Boolean(b))
            }

            Token::FieldRef(name) => {
                self.consume()?;
                Ok(FormulaExpr::FieldRef(name))
            }

            Token::LeftParen => self.parse_group(),

            Token::Identifier(name) => {
                let name_pos = self.token_start;
                self.consume()?;
                if self.current == Token::LeftParen {
                    self.parse_function_call(name)
                } else {
                    Err(FormulaError::parse(
                        ParseErrorKind::MissingArgumentList(name),
                        name_pos,
                    ))
                }
            }

            _ => Err(self.unexpected()),
        }
    }

    fn parse_group(&mut self) -> FormulaResult<FormulaExpr> {
        let open_pos = self.token_start;
        self.consume()?; // (

        let expr = self.parse_expression()?;

        // "(a, b)" is an argument list that lost its function name
        if self.current == Token::Comma {
            return Err(FormulaError::parse(
                ParseErrorKind::EmptyFunctionName,
                open_pos,
            ));
        }

        self.expect_closing_paren(open_pos)?;
        Ok(expr)
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        let open_pos = self.token_start;
        self.consume()?; // (

        let mut args = Vec::new();

        // Parse arguments
        if self.current != Token::RightParen {
            args.push(self.parse_expression()?);

            while self.current == Token::Comma {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }

        self.expect_closing_paren(open_pos)?;

        Ok(FormulaExpr::Function { name, args })
    }
}
