//! Parser for the question-bank document format.
//!
//! The bank is a markdown file with a fixed shape: `##` headers open a
//! section and state how many questions it holds, `### Q<n>.` headings carry
//! each question's prompt, and every question is answered by one fenced
//! ```` ```sql ```` block. Everything else is prose and is ignored. The
//! parser records source line numbers so lint findings can point at the
//! offending spot.

use std::path::Path;

use crate::error::{HarnessError, HarnessResult};

/// A parsed question bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub sections: Vec<Section>,
}

/// One `##` section of the bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    /// The question count the header claims, e.g. the 10 in
    /// `## 1. Basics (10 questions)`. Absent when the header states none.
    pub stated_count: Option<usize>,
    pub line: usize,
    pub questions: Vec<Question>,
}

/// One numbered question and its reference solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub number: usize,
    pub prompt: String,
    pub line: usize,
    /// Every fenced sql block under this heading. The linter flags anything
    /// other than exactly one.
    pub snippets: Vec<Snippet>,
}

/// A fenced SQL block.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub sql: String,
    pub line: usize,
}

impl Question {
    /// The question's single snippet, when it has exactly one.
    pub fn snippet(&self) -> Option<&Snippet> {
        match self.snippets.as_slice() {
            [one] => Some(one),
            _ => None,
        }
    }
}

impl Document {
    /// Read and parse a question bank from disk.
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse a question bank from its markdown text.
    pub fn parse(text: &str) -> HarnessResult<Self> {
        let mut sections: Vec<Section> = Vec::new();
        let mut lines = text.lines().enumerate();

        while let Some((idx, line)) = lines.next() {
            let lineno = idx + 1;

            if let Some(header) = line.strip_prefix("## ") {
                let (title, stated_count) = parse_section_header(header);
                sections.push(Section {
                    title,
                    stated_count,
                    line: lineno,
                    questions: Vec::new(),
                });
            } else if let Some(heading) = line.strip_prefix("### ") {
                let section = sections.last_mut().ok_or_else(|| {
                    HarnessError::document(lineno, "question heading before any section header")
                })?;
                let (number, prompt) = parse_question_heading(heading)
                    .ok_or_else(|| {
                        HarnessError::document(
                            lineno,
                            format!("malformed question heading: {heading:?}"),
                        )
                    })?;
                section.questions.push(Question {
                    number,
                    prompt,
                    line: lineno,
                    snippets: Vec::new(),
                });
            } else if line.trim() == "```sql" {
                let fence_line = lineno;
                let mut sql_lines = Vec::new();
                let mut closed = false;
                for (_, body) in lines.by_ref() {
                    if body.trim() == "```" {
                        closed = true;
                        break;
                    }
                    sql_lines.push(body);
                }
                if !closed {
                    return Err(HarnessError::document(fence_line, "unterminated sql fence"));
                }
                let question = sections
                    .last_mut()
                    .and_then(|s| s.questions.last_mut())
                    .ok_or_else(|| {
                        HarnessError::document(fence_line, "sql block outside any question")
                    })?;
                question.snippets.push(Snippet {
                    sql: sql_lines.join("\n"),
                    line: fence_line,
                });
            } else if line.trim_start().starts_with("```") {
                // Non-sql fence: skip its body.
                let fence_line = lineno;
                let mut closed = false;
                for (_, body) in lines.by_ref() {
                    if body.trim() == "```" {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(HarnessError::document(fence_line, "unterminated fence"));
                }
            }
        }

        Ok(Document { sections })
    }

    /// All questions in document order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }
}

/// Split `1. Basics (10 questions)` into a title and a stated count.
fn parse_section_header(header: &str) -> (String, Option<usize>) {
    let header = header.trim();
    if let Some(open) = header.rfind('(') {
        let inner = header[open + 1..].trim_end_matches(')');
        if let Some(count) = inner
            .strip_suffix("questions")
            .or_else(|| inner.strip_suffix("question"))
            .and_then(|n| n.trim().parse::<usize>().ok())
        {
            return (header[..open].trim().to_string(), Some(count));
        }
    }
    (header.to_string(), None)
}

/// Split `Q7. List every distinct category.` into (7, prompt).
fn parse_question_heading(heading: &str) -> Option<(usize, String)> {
    let rest = heading.trim().strip_prefix('Q')?;
    let dot = rest.find('.')?;
    let number = rest[..dot].parse::<usize>().ok()?;
    let prompt = rest[dot + 1..].trim().to_string();
    if prompt.is_empty() {
        return None;
    }
    Some((number, prompt))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_BANK: &str = "\
# Title

Intro prose.

## 1. Basics (2 questions)

### Q1. Select every user.

```sql
SELECT * FROM users;
```

### Q2. Select every product.

Some explanation between heading and block.

```sql
SELECT * FROM products;
```

## 2. Cleanup (1 question)

### Q3. Delete unpriced products.

```sql
DELETE FROM products WHERE price IS NULL;
```
";

    #[test]
    fn parses_sections_questions_and_snippets() {
        let doc = Document::parse(SMALL_BANK).unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].title, "1. Basics");
        assert_eq!(doc.sections[0].stated_count, Some(2));
        assert_eq!(doc.sections[1].stated_count, Some(1));
        assert_eq!(doc.question_count(), 3);

        let q1 = &doc.sections[0].questions[0];
        assert_eq!(q1.number, 1);
        assert_eq!(q1.prompt, "Select every user.");
        assert_eq!(q1.snippet().unwrap().sql, "SELECT * FROM users;");

        let q3 = &doc.sections[1].questions[0];
        assert_eq!(q3.number, 3);
        assert!(q3.snippet().unwrap().sql.starts_with("DELETE"));
    }

    #[test]
    fn records_line_numbers() {
        let doc = Document::parse(SMALL_BANK).unwrap();
        assert_eq!(doc.sections[0].line, 5);
        assert_eq!(doc.sections[0].questions[0].line, 7);
        assert_eq!(doc.sections[0].questions[0].snippets[0].line, 9);
    }

    #[test]
    fn multiline_snippet_is_joined() {
        let doc = Document::parse(
            "## 1. S (1 question)\n\n### Q1. Two-line query.\n\n```sql\nSELECT name\nFROM users;\n```\n",
        )
        .unwrap();
        assert_eq!(
            doc.sections[0].questions[0].snippet().unwrap().sql,
            "SELECT name\nFROM users;"
        );
    }

    #[test]
    fn question_without_snippet_parses_but_has_none() {
        let doc =
            Document::parse("## 1. S (1 question)\n\n### Q1. No answer yet.\n").unwrap();
        assert!(doc.sections[0].questions[0].snippet().is_none());
    }

    #[test]
    fn question_with_two_snippets_keeps_both() {
        let doc = Document::parse(
            "## 1. S (1 question)\n\n### Q1. Doubled.\n\n```sql\nSELECT 1;\n```\n\n```sql\nSELECT 2;\n```\n",
        )
        .unwrap();
        assert_eq!(doc.sections[0].questions[0].snippets.len(), 2);
    }

    #[test]
    fn rejects_heading_before_section() {
        let err = Document::parse("### Q1. Early.\n").unwrap_err();
        assert!(matches!(err, HarnessError::Document { line: 1, .. }));
    }

    #[test]
    fn rejects_stray_sql_block() {
        let err = Document::parse("```sql\nSELECT 1;\n```\n").unwrap_err();
        assert!(matches!(err, HarnessError::Document { .. }));
    }

    #[test]
    fn rejects_unterminated_fence() {
        let input = "## 1. S (1 question)\n\n### Q1. Broken.\n\n```sql\nSELECT 1;\n";
        let err = Document::parse(input).unwrap_err();
        assert!(matches!(err, HarnessError::Document { line: 5, .. }));
    }

    #[test]
    fn rejects_malformed_question_heading() {
        let err = Document::parse("## 1. S (1 question)\n\n### Question one\n").unwrap_err();
        assert!(matches!(err, HarnessError::Document { line: 3, .. }));
    }

    #[test]
    fn skips_non_sql_fences() {
        let doc = Document::parse(
            "## 1. S (1 question)\n\n```text\nnot sql\n```\n\n### Q1. Fine.\n\n```sql\nSELECT 1;\n```\n",
        )
        .unwrap();
        assert_eq!(doc.sections[0].questions[0].snippets.len(), 1);
    }

    #[test]
    fn header_without_count_is_tolerated() {
        let doc = Document::parse("## Appendix\n").unwrap();
        assert_eq!(doc.sections[0].stated_count, None);
        assert_eq!(doc.sections[0].title, "Appendix");
    }
}
