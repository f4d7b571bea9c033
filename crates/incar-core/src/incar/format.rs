use crate::domain::{DocumentGroup, SYSTEM_KEY, SYSTEM_VALUE};

/// `KEY = value`. Keys and values must not contain `=` or newlines; nothing is
/// escaped.
pub fn format_line(key: &str, value: &str) -> String {
    format!("{} = {}", key, value)
}

/// Renders the SYSTEM line, a blank line, then each non-empty group as a header
/// followed by its sorted key lines and one blank separator. Trailing
/// whitespace is trimmed.
pub fn render_document(groups: &[DocumentGroup]) -> String {
    let mut lines = vec![format_line(SYSTEM_KEY, SYSTEM_VALUE), String::new()];

    for group in groups.iter().filter(|group| !group.params.is_empty()) {
        lines.push(group.header());
        lines.extend(
            group
                .params
                .iter()
                .map(|(key, value)| format_line(key, value)),
        );
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::render_document;
    use crate::domain::{DocumentGroup, GroupSource, ParameterSet, TaskCategory};

    fn group(source: GroupSource, pairs: &[(&str, &str)]) -> DocumentGroup {
        DocumentGroup {
            source,
            params: pairs.iter().copied().collect(),
        }
    }

    #[test]
    fn empty_document_is_only_the_system_line() {
        assert_eq!(render_document(&[]), "SYSTEM = Generated By Q_robot");
    }

    #[test]
    fn groups_render_with_headers_sorted_keys_and_separators() {
        let groups = [
            group(
                GroupSource::Standard {
                    section: "ncore".to_string(),
                },
                &[("NCORE", "4")],
            ),
            group(
                GroupSource::Selection {
                    display_name: "Static".to_string(),
                    category: TaskCategory::Tasks,
                },
                &[("NSW", "0"), ("ISTART", "1")],
            ),
            group(GroupSource::Custom, &[("ENCUT", "520")]),
        ];

        assert_eq!(
            render_document(&groups),
            "SYSTEM = Generated By Q_robot\n\
             \n\
             # Standard Parameters - Ncore\n\
             NCORE = 4\n\
             \n\
             # Task: Static\n\
             ISTART = 1\n\
             NSW = 0\n\
             \n\
             # Custom Parameters\n\
             ENCUT = 520"
        );
    }

    #[test]
    fn empty_groups_leave_no_dangling_header() {
        let groups = [
            DocumentGroup {
                source: GroupSource::Custom,
                params: ParameterSet::new(),
            },
            group(
                GroupSource::Standard {
                    section: "write".to_string(),
                },
                &[("LWAVE", ".FALSE.")],
            ),
        ];

        let document = render_document(&groups);
        assert!(!document.contains("# Custom Parameters"));
        assert!(document.ends_with("LWAVE = .FALSE."));
    }
}
