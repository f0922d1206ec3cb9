//! Expression trees for symbolic answer comparison
//!
//! Answers are parsed either as LaTeX (`\frac{1}{2}`, `2x^{2}`, `\sqrt[3]{8}`)
//! or as plain math (`sqrt(2)/2`, `x**2`). Two expressions are equivalent when
//! their difference vanishes: constants are evaluated directly, expressions
//! with free variables are evaluated at a fixed set of sample points.
//!
//! Every parse and evaluation step checks a wall-clock [`Budget`]; running out
//! of budget makes the comparison fail closed.

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{E, PI};
use std::time::{Duration, Instant};

/// Absolute tolerance for comparing constant expressions
const NUMERIC_TOLERANCE: f64 = 1e-3;

/// Relative tolerance for the sample-point identity check
const IDENTITY_TOLERANCE: f64 = 1e-9;

/// Values substituted for free variables
const SAMPLE_POINTS: [f64; 6] = [0.7317, 1.2913, 2.0719, -0.4146, 3.3167, -1.8571];

/// Maximum nesting depth accepted by the parser
const MAX_DEPTH: usize = 200;

/// Maximum number of tokens in one answer; bounds the depth of operator chains
const MAX_TOKENS: usize = 1024;

/// Words that make a LaTeX letter run plain math rather than a product of variables
const PLAIN_WORDS: [&str; 11] = [
    "pi", "sqrt", "sin", "cos", "tan", "ln", "log", "exp", "abs", "Abs", "factorial",
];

/// Wall-clock budget for one symbolic check
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    deadline: Option<Instant>,
}

impl Budget {
    /// Budget expiring `limit` from now
    pub fn new(limit: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(limit),
        }
    }

    /// Whether the budget has run out
    pub fn exhausted(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Functions understood by both parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Ln,
    Exp,
    Abs,
    Factorial,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Func::Sqrt),
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "ln" | "log" => Some(Func::Ln),
            "exp" => Some(Func::Exp),
            "abs" | "Abs" => Some(Func::Abs),
            "factorial" => Some(Func::Factorial),
            _ => None,
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Func::Sqrt => x.sqrt(),
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Ln => x.ln(),
            Func::Exp => x.exp(),
            Func::Abs => x.abs(),
            Func::Factorial => factorial(x),
        }
    }
}

fn factorial(x: f64) -> f64 {
    if x < 0.0 || x.fract() != 0.0 || x > 170.0 {
        return f64::NAN;
    }
    (1..=x as u32).fold(1.0, |acc, k| acc * k as f64)
}

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    fn binary(ctor: fn(Box<Expr>, Box<Expr>) -> Expr, lhs: Expr, rhs: Expr) -> Expr {
        ctor(Box::new(lhs), Box::new(rhs))
    }

    /// Evaluate with the given variable bindings.
    ///
    /// Returns `None` when the budget runs out or a variable is unbound.
    pub fn eval(&self, env: &HashMap<String, f64>, budget: &Budget) -> Option<f64> {
        if budget.exhausted() {
            return None;
        }
        let value = match self {
            Expr::Num(v) => *v,
            Expr::Var(name) => *env.get(name)?,
            Expr::Neg(e) => -e.eval(env, budget)?,
            Expr::Add(a, b) => a.eval(env, budget)? + b.eval(env, budget)?,
            Expr::Sub(a, b) => a.eval(env, budget)? - b.eval(env, budget)?,
            Expr::Mul(a, b) => a.eval(env, budget)? * b.eval(env, budget)?,
            Expr::Div(a, b) => a.eval(env, budget)? / b.eval(env, budget)?,
            Expr::Pow(a, b) => a.eval(env, budget)?.powf(b.eval(env, budget)?),
            Expr::Call(func, arg) => func.apply(arg.eval(env, budget)?),
        };
        Some(value)
    }

    /// Names of all free variables
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expr::Num(_) => {}
            Expr::Var(name) => {
                vars.insert(name.clone());
            }
            Expr::Neg(e) | Expr::Call(_, e) => e.collect_variables(vars),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => {
                a.collect_variables(vars);
                b.collect_variables(vars);
            }
        }
    }
}

/// Input notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// LaTeX math: single-letter variables, implicit multiplication, `\commands`
    Latex,
    /// Plain math: multi-letter identifiers, `**` powers, `f(x)` calls
    Plain,
}

/// Parse an answer, trying LaTeX first and plain math second
pub fn parse(input: &str, budget: &Budget) -> Option<Expr> {
    parse_as(input, Syntax::Latex, budget).or_else(|| parse_as(input, Syntax::Plain, budget))
}

/// Parse an answer in one notation
pub fn parse_as(input: &str, syntax: Syntax, budget: &Budget) -> Option<Expr> {
    let source = match syntax {
        Syntax::Latex => strip_latex_decorations(input),
        Syntax::Plain => input.to_string(),
    };
    let tokens = tokenize(&source, syntax, budget)?;
    if tokens.is_empty() {
        return None;
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        syntax,
        budget,
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    (parser.pos == parser.tokens.len()).then_some(expr)
}

/// Whether two expressions are mathematically the same
pub fn equivalent(a: &Expr, b: &Expr, budget: &Budget) -> bool {
    let mut vars = a.variables();
    vars.extend(b.variables());

    if vars.is_empty() {
        let empty = HashMap::new();
        return match (a.eval(&empty, budget), b.eval(&empty, budget)) {
            (Some(x), Some(y)) => x == y || (x - y).abs() <= NUMERIC_TOLERANCE,
            _ => false,
        };
    }

    let mut agreed = 0;
    for k in 0..SAMPLE_POINTS.len() {
        let env: HashMap<String, f64> = vars
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = SAMPLE_POINTS[(k + i) % SAMPLE_POINTS.len()] + 0.1 * i as f64;
                (name.clone(), value)
            })
            .collect();

        let (Some(x), Some(y)) = (a.eval(&env, budget), b.eval(&env, budget)) else {
            return false;
        };
        if !x.is_finite() || !y.is_finite() {
            // outside the domain of one side at this point
            continue;
        }
        if (x - y).abs() > IDENTITY_TOLERANCE * (1.0 + x.abs() + y.abs()) {
            return false;
        }
        agreed += 1;
    }
    agreed > 0
}

/// Remove LaTeX markup that carries no value: text/unit annotations, degree
/// marks, sizing commands and math-mode dollars.
fn strip_latex_decorations(input: &str) -> String {
    let mut out = input.replace("^{\\circ}", "").replace("^\\circ", "");
    for command in ["\\text", "\\mathrm", "\\mbox", "\\textbf"] {
        out = remove_braced_command(&out, command);
    }
    for noise in ["\\left", "\\right", "\\displaystyle", "$"] {
        out = out.replace(noise, "");
    }
    out
}

fn remove_braced_command(input: &str, command: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(command) {
        let after = &rest[start + command.len()..];
        if !after.starts_with('{') {
            out.push_str(&rest[..start + command.len()]);
            rest = after;
            continue;
        }
        let mut depth = 0usize;
        let mut end = None;
        for (i, c) in after.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i + 1);
                        break;
                    }
                }
                _ => {}
            }
        }
        out.push_str(&rest[..start]);
        match end {
            Some(end) => rest = &after[end..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(String),
    Ident(String),
    Command(String),
    Op(char),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

fn tokenize(input: &str, syntax: Syntax, budget: &Budget) -> Option<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    // end of the letter run already checked against PLAIN_WORDS
    let mut run_end = 0;

    while i < chars.len() {
        if tokens.len() >= MAX_TOKENS || budget.exhausted() {
            return None;
        }
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            let mut seen_dot = false;
            while i < chars.len() && (chars[i].is_ascii_digit() || (chars[i] == '.' && !seen_dot))
            {
                seen_dot |= chars[i] == '.';
                i += 1;
            }
            tokens.push(Token::Num(chars[start..i].iter().collect()));
        } else if c == 'π' {
            tokens.push(Token::Command("pi".to_string()));
            i += 1;
        } else if c.is_alphabetic() || (c == '_' && syntax == Syntax::Plain) {
            match syntax {
                Syntax::Latex => {
                    // `sqrt(2)` or `pi` written without backslashes is plain math,
                    // not a product of single-letter variables
                    if i >= run_end {
                        run_end = i + chars[i..]
                            .iter()
                            .take_while(|ch| ch.is_ascii_alphabetic())
                            .count();
                        let word: String = chars[i..run_end].iter().collect();
                        if PLAIN_WORDS.iter().any(|plain| word.ends_with(plain)) {
                            return None;
                        }
                    }
                    let mut name = c.to_string();
                    i += 1;
                    if chars.get(i) == Some(&'_') {
                        i += 1;
                        name.push('_');
                        match chars.get(i) {
                            Some('{') => {
                                i += 1;
                                while i < chars.len() && chars[i] != '}' {
                                    name.push(chars[i]);
                                    i += 1;
                                }
                                i += 1;
                            }
                            Some(sub) if sub.is_alphanumeric() => {
                                name.push(*sub);
                                i += 1;
                            }
                            _ => return None,
                        }
                    }
                    tokens.push(Token::Ident(name));
                }
                Syntax::Plain => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    tokens.push(Token::Ident(chars[start..i].iter().collect()));
                }
            }
        } else if c == '\\' {
            if syntax == Syntax::Plain {
                return None;
            }
            i += 1;
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            if i > start {
                tokens.push(Token::Command(chars[start..i].iter().collect()));
                continue;
            }
            match chars.get(i) {
                // spacing commands
                Some(',' | ';' | ':' | '!' | ' ') => {}
                Some('%') => tokens.push(Token::Op('%')),
                Some('{') => tokens.push(Token::LParen),
                Some('}') => tokens.push(Token::RParen),
                _ => return None,
            }
            i += 1;
        } else {
            let token = match c {
                '+' | '-' | '/' | '^' | '!' | '%' => Token::Op(c),
                '*' if syntax == Syntax::Plain && chars.get(i + 1) == Some(&'*') => {
                    i += 1;
                    Token::Op('^')
                }
                '*' | '·' | '×' => Token::Op('*'),
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                '{' if syntax == Syntax::Latex => Token::LBrace,
                '}' if syntax == Syntax::Latex => Token::RBrace,
                _ => return None,
            };
            tokens.push(token);
            i += 1;
        }
    }
    Some(tokens)
}

struct Parser<'b> {
    tokens: Vec<Token>,
    pos: usize,
    syntax: Syntax,
    budget: &'b Budget,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token) -> Option<()> {
        (self.advance()? == token).then_some(())
    }

    /// Count one level of recursion; fails past `MAX_DEPTH` or the budget
    fn enter(&mut self) -> Option<()> {
        self.depth += 1;
        (self.depth <= MAX_DEPTH && !self.budget.exhausted()).then_some(())
    }

    fn parse_expr(&mut self) -> Option<Expr> {
        self.enter()?;
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Op('+')) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::binary(Expr::Add, lhs, rhs);
                }
                Some(Token::Op('-')) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::binary(Expr::Sub, lhs, rhs);
                }
                _ => break,
            }
        }
        self.depth -= 1;
        Some(lhs)
    }

    fn parse_term(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Op('*')) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::binary(Expr::Mul, lhs, rhs);
                }
                Some(Token::Command(name)) if name == "cdot" || name == "times" => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::binary(Expr::Mul, lhs, rhs);
                }
                Some(Token::Op('/')) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::binary(Expr::Div, lhs, rhs);
                }
                Some(Token::Command(name)) if name == "div" => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::binary(Expr::Div, lhs, rhs);
                }
                _ if self.starts_implicit_factor() => {
                    let rhs = self.parse_power()?;
                    lhs = Expr::binary(Expr::Mul, lhs, rhs);
                }
                _ => break,
            }
        }
        Some(lhs)
    }

    fn starts_implicit_factor(&self) -> bool {
        if self.syntax != Syntax::Latex {
            return false;
        }
        match self.peek() {
            Some(Token::Num(_) | Token::Ident(_) | Token::LParen | Token::LBrace) => true,
            Some(Token::Command(name)) => !matches!(name.as_str(), "cdot" | "times" | "div"),
            _ => false,
        }
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        self.enter()?;
        let expr = match self.peek() {
            Some(Token::Op('-')) => {
                self.advance();
                Expr::Neg(Box::new(self.parse_unary()?))
            }
            Some(Token::Op('+')) => {
                self.advance();
                self.parse_unary()?
            }
            _ => self.parse_power()?,
        };
        self.depth -= 1;
        Some(expr)
    }

    fn parse_power(&mut self) -> Option<Expr> {
        self.enter()?;
        let base = self.parse_postfix()?;
        if self.peek() != Some(&Token::Op('^')) {
            self.depth -= 1;
            return Some(base);
        }
        self.advance();
        let exponent = match self.syntax {
            Syntax::Latex => match self.peek() {
                Some(Token::Op('-')) => {
                    self.advance();
                    Expr::Neg(Box::new(self.parse_latex_arg()?))
                }
                _ => self.parse_latex_arg()?,
            },
            Syntax::Plain => self.parse_unary()?,
        };
        self.depth -= 1;
        Some(Expr::binary(Expr::Pow, base, exponent))
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Op('!')) => {
                    self.advance();
                    expr = Expr::Call(Func::Factorial, Box::new(expr));
                }
                Some(Token::Op('%')) => {
                    self.advance();
                    expr = Expr::binary(Expr::Div, expr, Expr::Num(100.0));
                }
                _ => return Some(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        if self.budget.exhausted() {
            return None;
        }
        match self.advance()? {
            Token::Num(text) => text.parse().ok().map(Expr::Num),
            Token::Ident(name) => self.parse_identifier(name),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Some(inner)
            }
            Token::LBracket if self.syntax == Syntax::Latex => {
                let inner = self.parse_expr()?;
                self.expect(Token::RBracket)?;
                Some(inner)
            }
            Token::LBrace => {
                let inner = self.parse_expr()?;
                self.expect(Token::RBrace)?;
                Some(inner)
            }
            Token::Command(name) => self.parse_command(&name),
            _ => None,
        }
    }

    fn parse_identifier(&mut self, name: String) -> Option<Expr> {
        if self.syntax == Syntax::Latex {
            return Some(Expr::Var(name));
        }
        match name.as_str() {
            "pi" => return Some(Expr::Num(PI)),
            "E" => return Some(Expr::Num(E)),
            "oo" => return Some(Expr::Num(f64::INFINITY)),
            _ => {}
        }
        if let Some(func) = Func::from_name(&name) {
            if self.peek() == Some(&Token::LParen) {
                self.advance();
                let arg = self.parse_expr()?;
                self.expect(Token::RParen)?;
                return Some(Expr::Call(func, Box::new(arg)));
            }
        }
        Some(Expr::Var(name))
    }

    fn parse_command(&mut self, name: &str) -> Option<Expr> {
        match name {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.parse_latex_arg()?;
                let denominator = self.parse_latex_arg()?;
                Some(Expr::binary(Expr::Div, numerator, denominator))
            }
            "sqrt" => {
                if self.peek() == Some(&Token::LBracket) {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    let radicand = self.parse_latex_arg()?;
                    let exponent = Expr::binary(Expr::Div, Expr::Num(1.0), index);
                    Some(Expr::binary(Expr::Pow, radicand, exponent))
                } else {
                    Some(Expr::Call(Func::Sqrt, Box::new(self.parse_latex_arg()?)))
                }
            }
            "pi" => Some(Expr::Num(PI)),
            "infty" => Some(Expr::Num(f64::INFINITY)),
            "sin" | "cos" | "tan" | "ln" | "log" | "exp" => {
                let func = Func::from_name(name)?;
                Some(Expr::Call(func, Box::new(self.parse_power()?)))
            }
            _ => None,
        }
    }

    /// A LaTeX argument: a braced group or a single character/command.
    ///
    /// `\frac12` reads `1` and `2` as separate arguments, so a multi-digit
    /// number token gives up only its first digit.
    fn parse_latex_arg(&mut self) -> Option<Expr> {
        match self.peek()?.clone() {
            Token::LBrace => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RBrace)?;
                Some(inner)
            }
            Token::Num(text) => {
                self.advance();
                let mut chars = text.chars();
                let first = chars.next()?;
                let rest: String = chars.collect();
                if first == '.' || rest.is_empty() || rest.starts_with('.') {
                    return text.parse().ok().map(Expr::Num);
                }
                self.tokens.insert(self.pos, Token::Num(rest));
                first.to_digit(10).map(|d| Expr::Num(d as f64))
            }
            Token::Ident(name) => {
                self.advance();
                Some(Expr::Var(name))
            }
            Token::Command(name) => {
                self.advance();
                self.parse_command(&name)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> Budget {
        Budget::new(Duration::from_secs(5))
    }

    fn value(input: &str) -> f64 {
        let b = budget();
        parse(input, &b)
            .unwrap_or_else(|| panic!("failed to parse {input:?}"))
            .eval(&HashMap::new(), &b)
            .unwrap()
    }

    fn same(a: &str, b: &str) -> bool {
        let budget = budget();
        match (parse(a, &budget), parse(b, &budget)) {
            (Some(x), Some(y)) => equivalent(&x, &y, &budget),
            _ => false,
        }
    }

    #[test]
    fn test_latex_values() {
        assert_eq!(value(r"\frac{1}{2}"), 0.5);
        assert_eq!(value(r"\dfrac{3}{4}"), 0.75);
        assert_eq!(value(r"\frac12"), 0.5);
        assert_eq!(value(r"2^{10}"), 1024.0);
        assert_eq!(value(r"2^3"), 8.0);
        assert!((value(r"\sqrt{2}") - 2f64.sqrt()).abs() < 1e-12);
        assert!((value(r"\sqrt[3]{27}") - 3.0).abs() < 1e-12);
        assert!((value(r"2\pi") - 2.0 * PI).abs() < 1e-12);
        assert_eq!(value(r"3 \cdot 4"), 12.0);
        assert_eq!(value(r"\left(1+2\right) \times 3"), 9.0);
        assert_eq!(value(r"5\text{ cm}"), 5.0);
        assert_eq!(value(r"90^\circ"), 90.0);
        assert_eq!(value("5!"), 120.0);
        assert_eq!(value("50%"), 0.5);
    }

    #[test]
    fn test_plain_values() {
        assert_eq!(value("2**10"), 1024.0);
        assert!((value("sqrt(2)/2") - 2f64.sqrt() / 2.0).abs() < 1e-12);
        assert!((value("pi/2") - PI / 2.0).abs() < 1e-12);
        assert_eq!(value("-3 + 4*2"), 5.0);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(value("2+3*4"), 14.0);
        assert_eq!(value("-2^2"), -4.0);
        assert_eq!(value("2^3^2"), 2f64.powf(9.0));
        assert_eq!(value("(1+1)/4"), 0.5);
    }

    #[test]
    fn test_rejects_garbage() {
        let b = budget();
        assert!(parse("", &b).is_none());
        assert!(parse("(1+2", &b).is_none());
        assert!(parse(r"\unknown{2}", &b).is_none());
        assert!(parse("x = = 3", &b).is_none());
    }

    #[test]
    fn test_equivalence_with_variables() {
        assert!(same("(x+1)^2", "x^2+2x+1"));
        assert!(same("2(x+y)", "2x+2y"));
        assert!(same(r"\frac{x}{2}", "x/2"));
        assert!(!same("x^2", "2x"));
        assert!(!same("x", "y"));
    }

    #[test]
    fn test_equivalence_of_constants() {
        assert!(same(r"\frac{1}{2}", "0.5"));
        assert!(same(r"\sqrt{2}", "1.4142"));
        assert!(!same(r"\sqrt{2}", "1.41"));
    }

    #[test]
    fn test_letter_runs() {
        let b = budget();
        assert!(parse_as("ab", Syntax::Latex, &b).is_some());
        assert!(parse_as("2pi", Syntax::Latex, &b).is_none());
        assert!(parse_as("xsin(2)", Syntax::Latex, &b).is_none());
        assert!(parse_as("x_1y", Syntax::Latex, &b).is_some());
    }

    #[test]
    fn test_long_word_fails_fast() {
        let b = Budget::new(Duration::from_millis(200));
        let word = "a".repeat(60_000);
        let started = Instant::now();
        assert!(parse_as(&word, Syntax::Latex, &b).is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_long_chains_are_rejected() {
        let b = budget();
        let sum = vec!["1"; 20_000].join("+");
        assert!(parse(&sum, &b).is_none());

        let negations = format!("{}1", "-".repeat(500));
        assert!(parse(&negations, &b).is_none());

        let short = vec!["1"; 300].join("+");
        assert_eq!(value(&short), 300.0);
    }

    #[test]
    fn test_exhausted_budget_fails_closed() {
        let expired = Budget::new(Duration::ZERO);
        assert!(parse("1+1", &expired).is_none());

        let live = budget();
        let a = parse("x+1", &live).unwrap();
        assert!(!equivalent(&a, &a, &expired));
    }
}
