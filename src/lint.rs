//! Static checks over a parsed question bank.
//!
//! Nothing here talks to a database. The dialect check is a
//! parse-and-discard round trip through `sqlparser`'s MySQL dialect, and the
//! alias check is a whole-statement scan of the AST: every qualifier used in
//! a compound identifier must be bound by some table name, table alias,
//! derived-table alias, or CTE referenced in the statement.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::ControlFlow;

use sqlparser::ast::{Expr, Statement, TableFactor, Visit, Visitor};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::document::{Document, Question};

/// The bank is defined as exactly fifty questions.
pub const EXPECTED_QUESTION_COUNT: usize = 50;

/// The individual checks the linter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCheck {
    /// Questions are numbered 1..=N contiguously, one snippet each.
    Numbering,
    /// Actual question counts match the counts stated in section headers.
    SectionCounts,
    /// The bank holds exactly fifty questions overall.
    GrandTotal,
    /// Every snippet parses under the MySQL dialect as a single statement.
    DialectParse,
    /// No two questions share the same SQL after whitespace normalization.
    Duplicates,
    /// Every qualifier in a compound identifier is bound in the statement.
    AliasBinding,
}

impl fmt::Display for LintCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LintCheck::Numbering => "numbering",
            LintCheck::SectionCounts => "section-counts",
            LintCheck::GrandTotal => "grand-total",
            LintCheck::DialectParse => "dialect-parse",
            LintCheck::Duplicates => "duplicates",
            LintCheck::AliasBinding => "alias-binding",
        };
        f.write_str(name)
    }
}

/// One lint finding. An empty findings list means the bank is clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub check: LintCheck,
    /// The offending question number, when the finding is about one.
    pub question: Option<usize>,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.question {
            Some(q) => write!(f, "[{}] Q{} (line {}): {}", self.check, q, self.line, self.message),
            None => write!(f, "[{}] line {}: {}", self.check, self.line, self.message),
        }
    }
}

/// Run every lint check and collect the findings.
pub fn lint_document(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_numbering(doc, &mut findings);
    check_section_counts(doc, &mut findings);
    check_grand_total(doc, &mut findings);
    check_dialect(doc, &mut findings);
    check_duplicates(doc, &mut findings);
    check_alias_binding(doc, &mut findings);
    findings
}

fn check_numbering(doc: &Document, findings: &mut Vec<Finding>) {
    for (question, expected) in doc.questions().zip(1..) {
        if question.number != expected {
            findings.push(Finding {
                check: LintCheck::Numbering,
                question: Some(question.number),
                line: question.line,
                message: format!("expected question number {expected}, found {}", question.number),
            });
        }
        match question.snippets.len() {
            1 => {}
            0 => findings.push(Finding {
                check: LintCheck::Numbering,
                question: Some(question.number),
                line: question.line,
                message: "question has no sql block".into(),
            }),
            n => findings.push(Finding {
                check: LintCheck::Numbering,
                question: Some(question.number),
                line: question.line,
                message: format!("question has {n} sql blocks, expected exactly one"),
            }),
        }
    }
}

fn check_section_counts(doc: &Document, findings: &mut Vec<Finding>) {
    for section in &doc.sections {
        let actual = section.questions.len();
        match section.stated_count {
            Some(stated) if stated != actual => findings.push(Finding {
                check: LintCheck::SectionCounts,
                question: None,
                line: section.line,
                message: format!(
                    "section {:?} states {stated} questions but contains {actual}",
                    section.title
                ),
            }),
            Some(_) => {}
            None => findings.push(Finding {
                check: LintCheck::SectionCounts,
                question: None,
                line: section.line,
                message: format!("section {:?} does not state a question count", section.title),
            }),
        }
    }
}

/// Per-section counts can agree with their headers while the bank still has
/// the wrong size, so the overall total is checked on its own.
fn check_grand_total(doc: &Document, findings: &mut Vec<Finding>) {
    let total = doc.question_count();
    if total != EXPECTED_QUESTION_COUNT {
        findings.push(Finding {
            check: LintCheck::GrandTotal,
            question: None,
            line: 1,
            message: format!(
                "bank contains {total} questions, expected {EXPECTED_QUESTION_COUNT}"
            ),
        });
    }
}

fn check_dialect(doc: &Document, findings: &mut Vec<Finding>) {
    for question in doc.questions() {
        let Some(snippet) = question.snippet() else {
            continue;
        };
        match parse_snippet(&snippet.sql) {
            Ok(statements) if statements.len() != 1 => findings.push(Finding {
                check: LintCheck::DialectParse,
                question: Some(question.number),
                line: snippet.line,
                message: format!(
                    "snippet contains {} statements, expected exactly one",
                    statements.len()
                ),
            }),
            Ok(_) => {}
            Err(err) => findings.push(Finding {
                check: LintCheck::DialectParse,
                question: Some(question.number),
                line: snippet.line,
                message: format!("does not parse as MySQL: {err}"),
            }),
        }
    }
}

fn check_duplicates(doc: &Document, findings: &mut Vec<Finding>) {
    let mut seen: HashMap<String, &Question> = HashMap::new();
    for question in doc.questions() {
        let Some(snippet) = question.snippet() else {
            continue;
        };
        let normalized = normalize_sql(&snippet.sql);
        match seen.get(normalized.as_str()) {
            Some(first) => findings.push(Finding {
                check: LintCheck::Duplicates,
                question: Some(question.number),
                line: snippet.line,
                message: format!("identical sql to Q{}", first.number),
            }),
            None => {
                seen.insert(normalized, question);
            }
        }
    }
}

fn check_alias_binding(doc: &Document, findings: &mut Vec<Finding>) {
    for question in doc.questions() {
        let Some(snippet) = question.snippet() else {
            continue;
        };
        // Unparseable snippets are already reported by the dialect check.
        let Ok(statements) = parse_snippet(&snippet.sql) else {
            continue;
        };
        for statement in &statements {
            let mut scan = AliasScan::default();
            let _ = statement.visit(&mut scan);
            let dangling: Vec<&String> = scan.used.difference(&scan.bound).collect();
            if !dangling.is_empty() {
                let names: Vec<&str> = dangling.iter().map(|s| s.as_str()).collect();
                findings.push(Finding {
                    check: LintCheck::AliasBinding,
                    question: Some(question.number),
                    line: snippet.line,
                    message: format!("unbound table qualifiers: {}", names.join(", ")),
                });
            }
        }
    }
}

fn parse_snippet(sql: &str) -> Result<Vec<Statement>, sqlparser::parser::ParserError> {
    Parser::parse_sql(&MySqlDialect {}, sql)
}

fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Collects table names and aliases bound anywhere in a statement, and the
/// qualifiers used by compound identifiers. CTE names need no special case:
/// referencing one in FROM binds it like any other table name.
#[derive(Default)]
struct AliasScan {
    bound: BTreeSet<String>,
    used: BTreeSet<String>,
}

impl Visitor for AliasScan {
    type Break = ();

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<()> {
        match table_factor {
            TableFactor::Table { name, alias, .. } => {
                if let Some(ident) = name.0.last() {
                    self.bound.insert(ident.value.to_lowercase());
                }
                if let Some(alias) = alias {
                    self.bound.insert(alias.name.value.to_lowercase());
                }
            }
            TableFactor::Derived {
                alias: Some(alias), ..
            } => {
                self.bound.insert(alias.name.value.to_lowercase());
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<()> {
        if let Expr::CompoundIdentifier(parts) = expr {
            if parts.len() >= 2 {
                self.used.insert(parts[0].value.to_lowercase());
            }
        }
        ControlFlow::Continue(())
    }
}
