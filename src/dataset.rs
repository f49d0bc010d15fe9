//! Analogy dataset loading.
//!
//! Two on-disk layouts are accepted, one file may mix both:
//! - CSV records `word1,word2,word3,word4,category` (an optional header
//!   line starting with `word1` is skipped);
//! - Google question-words records: `: category` section headers followed
//!   by four whitespace-separated words per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::analogy::AnalogyQuery;
use crate::error::{Error, Result};

const DEFAULT_CATEGORY: &str = "uncategorized";

/// Parse a dataset file into queries, preserving record order.
pub fn load_analogies(path: &Path) -> Result<Vec<AnalogyQuery>> {
    let file = File::open(path)?;
    parse_analogies(BufReader::new(file))
}

fn parse_analogies<R: BufRead>(reader: R) -> Result<Vec<AnalogyQuery>> {
    let mut queries = Vec::new();
    let mut category = DEFAULT_CATEGORY.to_string();

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();
        let lineno = index + 1;

        if line.is_empty() {
            continue;
        }
        // Section header, e.g. ": capital-common-countries"
        if let Some(rest) = line.strip_prefix(':') {
            category = rest.trim().to_string();
            continue;
        }

        if line.contains(',') {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != 5 {
                return Err(Error::MalformedRecord {
                    line: lineno,
                    expected: 5,
                    found: fields.len(),
                });
            }
            if lineno == 1 && fields[0].eq_ignore_ascii_case("word1") {
                continue; // header row
            }
            let expected = (!fields[3].is_empty()).then_some(fields[3]);
            queries.push(AnalogyQuery::new(
                fields[0], fields[1], fields[2], expected, fields[4],
            ));
        } else {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 4 {
                return Err(Error::MalformedRecord {
                    line: lineno,
                    expected: 4,
                    found: fields.len(),
                });
            }
            queries.push(AnalogyQuery::new(
                fields[0],
                fields[1],
                fields[2],
                Some(fields[3]),
                &category,
            ));
        }
    }

    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn csv_with_header() {
        let data = "word1,word2,word3,word4,category\n\
                    man,woman,king,queen,family\n\
                    paris,france,london,england,capitals\n";
        let queries = parse_analogies(Cursor::new(data)).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].a, "man");
        assert_eq!(queries[0].expected.as_deref(), Some("queen"));
        assert_eq!(queries[1].category, "capitals");
    }

    #[test]
    fn four_field_comma_line_is_malformed() {
        let data = "man,woman,king,queen\n";
        let err = parse_analogies(Cursor::new(data));
        assert!(matches!(
            err,
            Err(Error::MalformedRecord {
                line: 1,
                expected: 5,
                found: 4
            })
        ));
    }

    #[test]
    fn question_words_sections() {
        let data = ": family\n\
                    man woman king queen\n\
                    boy girl brother sister\n\
                    : gram3-comparative\n\
                    good better bad worse\n";
        let queries = parse_analogies(Cursor::new(data)).unwrap();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[1].category, "family");
        assert_eq!(queries[2].category, "gram3-comparative");
        assert_eq!(queries[2].expected.as_deref(), Some("worse"));
    }

    #[test]
    fn short_question_words_line_is_malformed() {
        let data = ": family\nman woman king\n";
        assert!(matches!(
            parse_analogies(Cursor::new(data)),
            Err(Error::MalformedRecord {
                line: 2,
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn empty_expected_field_is_none() {
        let data = "man,woman,king,,family\n";
        let queries = parse_analogies(Cursor::new(data)).unwrap();
        assert_eq!(queries[0].expected, None);
    }
}
