// src/services/extract.rs

//! Label/value extraction engine.
//!
//! Detail pages present their data as `<tr><th>label</th><td>value</td></tr>`
//! rows. A [`FieldTable`] maps each known label to a setter on a target
//! object; unknown labels and half-empty rows are logged and skipped.

use scraper::{ElementRef, Html, Selector};

/// Writes one parsed cell into a target object.
pub type Setter<T> = fn(&str, &mut T);

/// One scraped table row. A missing cell is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub header: Option<String>,
    pub value: Option<String>,
}

impl Row {
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            value: Some(value.into()),
        }
    }

    /// Both cells, if the row has them.
    pub fn pair(&self) -> Option<(&str, &str)> {
        Some((self.header.as_deref()?, self.value.as_deref()?))
    }
}

/// Dispatch table for one page section.
pub struct FieldTable<T: 'static> {
    /// Section name used in log lines
    pub section: &'static str,
    pub fields: &'static [(&'static str, Setter<T>)],
}

impl<T: 'static> FieldTable<T> {
    /// Look up the setter registered for a label.
    pub fn setter(&self, header: &str) -> Option<Setter<T>> {
        self.fields
            .iter()
            .find(|(label, _)| *label == header)
            .map(|(_, setter)| *setter)
    }

    /// Apply a single label/value pair. Returns whether the label was known.
    pub fn apply(&self, header: &str, value: &str, target: &mut T, record_id: &str) -> bool {
        match self.setter(header) {
            Some(setter) => {
                setter(value, target);
                true
            }
            None => {
                log::warn!(
                    "Unknown {} header '{}' in auction {}",
                    self.section,
                    header,
                    record_id
                );
                false
            }
        }
    }

    /// Apply every row in order, skipping rows with a missing cell.
    pub fn apply_rows<'r>(
        &self,
        rows: impl IntoIterator<Item = &'r Row>,
        target: &mut T,
        record_id: &str,
    ) {
        for row in rows {
            match row.pair() {
                Some((header, value)) => {
                    self.apply(header, value, target, record_id);
                }
                None => log::warn!("No headers found in auction {}", record_id),
            }
        }
    }
}

/// Collect the visible text of an element with whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scrape header/value rows from a page region.
///
/// Returns `None` if the region has no rows at all.
pub fn read_rows(
    document: &Html,
    rows: &Selector,
    header: &Selector,
    value: &Selector,
) -> Option<Vec<Row>> {
    let collected: Vec<Row> = document
        .select(rows)
        .map(|row| Row {
            header: row.select(header).next().map(element_text),
            value: row.select(value).next().map(element_text),
        })
        .collect();

    if collected.is_empty() {
        None
    } else {
        Some(collected)
    }
}

/// Optional text: empty cells stay unset.
pub fn text(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Target {
        name: Option<String>,
        city: Option<String>,
    }

    static TABLE: FieldTable<Target> = FieldTable {
        section: "test",
        fields: &[
            ("Nombre", |v, t| t.name = text(v)),
            ("Ciudad", |v, t| t.city = text(v)),
        ],
    };

    #[test]
    fn test_known_and_unknown_headers() {
        let rows = vec![
            Row::new("Nombre", "Juan"),
            Row::new("Color", "Azul"),
            Row::new("Ciudad", "Madrid"),
        ];
        let mut target = Target::default();
        TABLE.apply_rows(&rows, &mut target, "SUB-1");

        assert_eq!(target.name.as_deref(), Some("Juan"));
        assert_eq!(target.city.as_deref(), Some("Madrid"));
    }

    #[test]
    fn test_missing_cell_does_not_abort() {
        let rows = vec![
            Row {
                header: Some("Nombre".into()),
                value: None,
            },
            Row::new("Ciudad", "Sevilla"),
        ];
        let mut target = Target::default();
        TABLE.apply_rows(&rows, &mut target, "SUB-1");

        assert!(target.name.is_none());
        assert_eq!(target.city.as_deref(), Some("Sevilla"));
    }

    #[test]
    fn test_empty_value_stays_unset() {
        let mut target = Target::default();
        assert!(TABLE.apply("Nombre", "   ", &mut target, "SUB-1"));
        assert!(target.name.is_none());
    }

    #[test]
    fn test_read_rows() {
        let html = Html::parse_document(
            r#"<div id="b"><table>
                <tr><th> Nombre </th><td>Ana   María</td></tr>
                <tr><th>Sólo cabecera</th></tr>
            </table></div>"#,
        );
        let rows = read_rows(
            &html,
            &Selector::parse("div#b table tr").unwrap(),
            &Selector::parse("th").unwrap(),
            &Selector::parse("td").unwrap(),
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pair(), Some(("Nombre", "Ana María")));
        assert_eq!(rows[1].pair(), None);
    }

    #[test]
    fn test_read_rows_missing_region() {
        let html = Html::parse_document("<p>nothing</p>");
        let rows = read_rows(
            &html,
            &Selector::parse("div#b table tr").unwrap(),
            &Selector::parse("th").unwrap(),
            &Selector::parse("td").unwrap(),
        );
        assert!(rows.is_none());
    }
}
