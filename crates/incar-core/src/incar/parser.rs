use crate::domain::{IncarError, ParameterSet, ParserResult};

const COMMENT_MARKERS: [char; 2] = ['#', '!'];
const STATEMENT_SEPARATOR: char = ';';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncarAssignment {
    pub source_line: usize,
    pub key: String,
    pub value: String,
}

/// Assignments in file order, duplicates kept.
pub fn tokenize_incar(source: &str) -> ParserResult<Vec<IncarAssignment>> {
    let mut assignments = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let source_line = index + 1;
        let content = strip_comment(line);
        for statement in content.split(STATEMENT_SEPARATOR) {
            if statement.trim().is_empty() {
                continue;
            }
            assignments.push(parse_statement(statement, source_line)?);
        }
    }

    Ok(assignments)
}

/// Later assignments of the same key overwrite earlier ones.
pub fn parse_incar(source: &str) -> ParserResult<ParameterSet> {
    let mut params = ParameterSet::new();
    for assignment in tokenize_incar(source)? {
        params.insert(&assignment.key, &assignment.value);
    }
    Ok(params)
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKERS) {
        Some(position) => &line[..position],
        None => line,
    }
}

fn parse_statement(statement: &str, source_line: usize) -> ParserResult<IncarAssignment> {
    let Some((key, value)) = statement.split_once('=') else {
        return Err(IncarError::input_validation(
            "INPUT.INCAR_LINE",
            format!(
                "expected 'KEY = value' at line {}, got '{}'",
                source_line,
                statement.trim()
            ),
        ));
    };

    let key = key.trim();
    if key.is_empty() {
        return Err(IncarError::input_validation(
            "INPUT.INCAR_LINE",
            format!("missing parameter name before '=' at line {}", source_line),
        ));
    }

    Ok(IncarAssignment {
        source_line,
        key: key.to_string(),
        value: value.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_incar, tokenize_incar};

    #[test]
    fn comments_blank_lines_and_headers_are_skipped() {
        let params = parse_incar(
            "SYSTEM = Generated By Q_robot\n\
             \n\
             # Task: Static\n\
             ISTART = 1   ! restart\n\
             NSW = 0\n",
        )
        .expect("document should parse");

        assert_eq!(params.len(), 3);
        assert_eq!(params.get("SYSTEM"), Some("Generated By Q_robot"));
        assert_eq!(params.get("ISTART"), Some("1"));
    }

    #[test]
    fn semicolons_separate_assignments() {
        let assignments =
            tokenize_incar("ISMEAR = 0; SIGMA = 0.05\nENCUT=520").expect("line should parse");
        let keys = assignments
            .iter()
            .map(|assignment| (assignment.key.as_str(), assignment.source_line))
            .collect::<Vec<_>>();
        assert_eq!(keys, [("ISMEAR", 1), ("SIGMA", 1), ("ENCUT", 2)]);
    }

    #[test]
    fn later_assignments_overwrite_earlier_ones() {
        let params = parse_incar("NSW = 0\nNSW = 5").expect("document should parse");
        assert_eq!(params.get("NSW"), Some("5"));
    }

    #[test]
    fn line_without_assignment_reports_its_line_number() {
        let error = parse_incar("NSW = 0\nLWAVE\n").expect_err("bare key should fail");
        assert_eq!(error.placeholder(), "INPUT.INCAR_LINE");
        assert!(error.message().contains("line 2"));
    }

    #[test]
    fn empty_key_is_rejected() {
        let error = parse_incar(" = 4").expect_err("empty key should fail");
        assert_eq!(error.placeholder(), "INPUT.INCAR_LINE");
    }
}
