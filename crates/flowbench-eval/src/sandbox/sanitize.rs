//! Reduce generated Python to the code an entry point actually needs
//!
//! Workflow output often carries prose, markdown fences, example calls and
//! `__main__` blocks. The sanitizer keeps imports plus every top-level
//! definition reachable from the entry point, in source order.

use std::collections::{HashMap, HashSet, VecDeque};

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("fence pattern is valid")
});

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("identifier pattern is valid"));

static DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:async\s+def|def|class)\s+([A-Za-z_][A-Za-z0-9_]*)")
        .expect("definition pattern is valid")
});

static ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(?::[^=]*)?=[^=]").expect("assignment pattern is valid")
});

/// Pull code out of markdown fences.
///
/// Prefers the first block that defines `entry_point`, then the longest
/// block. Text without fences is returned unchanged.
pub fn extract_code(text: &str, entry_point: &str) -> String {
    let blocks: Vec<&str> = FENCE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if blocks.is_empty() {
        return text.to_string();
    }

    let signature = format!("def {}", entry_point);
    blocks
        .iter()
        .find(|block| block.contains(&signature))
        .or_else(|| blocks.iter().max_by_key(|block| block.len()))
        .map(|block| block.to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
enum StatementKind {
    Import,
    Definition(String),
    Other,
}

#[derive(Debug)]
struct Statement {
    text: String,
    kind: StatementKind,
}

/// Keep imports and the definitions reachable from `entry_point`
pub fn sanitize(code: &str, entry_point: &str) -> String {
    let code = extract_code(code, entry_point);
    let statements = split_statements(&code);

    let definitions: HashMap<&str, usize> = statements
        .iter()
        .enumerate()
        .filter_map(|(i, stmt)| match &stmt.kind {
            StatementKind::Definition(name) => Some((name.as_str(), i)),
            _ => None,
        })
        .collect();

    let mut reachable: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<usize> = definitions.get(entry_point).copied().into_iter().collect();
    while let Some(index) = queue.pop_front() {
        if !reachable.insert(index) {
            continue;
        }
        for ident in IDENT.find_iter(&statements[index].text) {
            if let Some(&dep) = definitions.get(ident.as_str()) {
                if !reachable.contains(&dep) {
                    queue.push_back(dep);
                }
            }
        }
    }

    statements
        .iter()
        .enumerate()
        .filter(|(i, stmt)| stmt.kind == StatementKind::Import || reachable.contains(i))
        .map(|(_, stmt)| stmt.text.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

fn classify(text: &str) -> StatementKind {
    let head = text
        .lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty() && !line.starts_with('@') && !line.starts_with('#'))
        .unwrap_or("");

    if head.starts_with("import ") || head.starts_with("from ") {
        StatementKind::Import
    } else if let Some(caps) = DEF.captures(head).or_else(|| ASSIGN.captures(head)) {
        StatementKind::Definition(caps[1].to_string())
    } else {
        StatementKind::Other
    }
}

/// Split source into top-level statements.
///
/// A statement starts at an unindented line outside any bracket or
/// triple-quoted string. Decorators stay attached to what they decorate and
/// `elif`/`else`/`except`/`finally` stay with their opening block.
fn split_statements(code: &str) -> Vec<Statement> {
    let mut chunks: Vec<String> = Vec::new();
    let mut scanner = LineScanner::default();

    for line in code.lines() {
        let continues = scanner.is_continuation();
        scanner.scan(line);

        let starts_statement = !continues
            && !line.is_empty()
            && !line.starts_with(char::is_whitespace)
            && !line.starts_with('#')
            && !is_clause_keyword(line);

        let after_decorator = chunks.last().is_some_and(|chunk| {
            let mut lines = chunk.lines().filter(|l| !l.trim().is_empty()).peekable();
            lines.peek().is_some() && lines.all(|l| l.starts_with('@'))
        });

        match chunks.last_mut() {
            Some(chunk) if !starts_statement || after_decorator => {
                chunk.push('\n');
                chunk.push_str(line);
            }
            _ => chunks.push(line.to_string()),
        }
    }

    chunks
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|text| Statement {
            kind: classify(&text),
            text,
        })
        .collect()
}

fn is_clause_keyword(line: &str) -> bool {
    ["elif", "else", "except", "finally"].iter().any(|kw| {
        line.strip_prefix(kw)
            .is_some_and(|rest| rest.starts_with([':', ' ', '(']))
    })
}

/// Tracks open brackets and triple-quoted strings across lines
#[derive(Debug, Default)]
struct LineScanner {
    depth: i32,
    triple: Option<char>,
    backslash: bool,
}

impl LineScanner {
    fn is_continuation(&self) -> bool {
        self.depth > 0 || self.triple.is_some() || self.backslash
    }

    fn scan(&mut self, line: &str) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if let Some(quote) = self.triple {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if is_triple(&chars, i, quote) {
                    self.triple = None;
                    i += 3;
                    continue;
                }
                i += 1;
                continue;
            }

            match c {
                '#' => break,
                '"' | '\'' if is_triple(&chars, i, c) => {
                    self.triple = Some(c);
                    i += 3;
                    continue;
                }
                '"' | '\'' => {
                    i += 1;
                    while i < chars.len() && chars[i] != c {
                        if chars[i] == '\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth = (self.depth - 1).max(0),
                _ => {}
            }
            i += 1;
        }

        self.backslash = self.triple.is_none() && line.trim_end().ends_with('\\');
    }
}

fn is_triple(chars: &[char], i: usize, quote: char) -> bool {
    chars.get(i) == Some(&quote)
        && chars.get(i + 1) == Some(&quote)
        && chars.get(i + 2) == Some(&quote)
}
