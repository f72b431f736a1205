//! Non-interactive output for `--plain` and `--json`.

use std::io::{self, Write};

use crate::feed::NewsRecord;
use crate::news::Aggregation;
use crate::util::strip_control_chars;

use super::cards::{card_summary, outcome_line, NO_RESULTS};

/// Writes status lines followed by one text card per record.
pub fn write_plain<W: Write>(
    out: &mut W,
    aggregation: &Aggregation,
    summary_max_chars: usize,
) -> io::Result<()> {
    for outcome in &aggregation.outcomes {
        writeln!(out, "{}", outcome_line(outcome))?;
    }
    writeln!(out)?;

    if aggregation.records.is_empty() {
        writeln!(out, "{NO_RESULTS}")?;
        return Ok(());
    }

    for record in &aggregation.records {
        writeln!(out, "[{}] {}", record.source, strip_control_chars(&record.title))?;
        writeln!(out, "  {}", record.published)?;
        writeln!(out, "  {}", strip_control_chars(&record.link))?;
        let summary = card_summary(record, summary_max_chars);
        if !summary.is_empty() {
            writeln!(out, "  {summary}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the records as a pretty-printed JSON array.
pub fn write_json<W: Write>(out: &mut W, records: &[NewsRecord]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, records)?;
    writeln!(out).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Source;
    use crate::news::SourceOutcome;
    use pretty_assertions::assert_eq;

    fn aggregation() -> Aggregation {
        Aggregation {
            records: vec![NewsRecord {
                title: "GX推進について".to_string(),
                link: "https://www.meti.go.jp/press/a.html".to_string(),
                published: "2024/01/10".to_string(),
                source: Source::Official,
                summary: "<p>概要</p>".to_string(),
                timestamp: 1_704_844_800,
            }],
            outcomes: vec![
                SourceOutcome {
                    source: Source::Official,
                    query: None,
                    records: Some(1),
                },
                SourceOutcome {
                    source: Source::Search,
                    query: Some("経済産業省".to_string()),
                    records: None,
                },
            ],
        }
    }

    #[test]
    fn test_plain_cards() {
        let mut out = Vec::new();
        write_plain(&mut out, &aggregation(), 200).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "✅ 経済産業省: 取得成功 (1件)\n\
             ⚠️ Google News ('経済産業省'): 取得失敗 (または更新なし)\n\
             \n\
             [経済産業省] GX推進について\n  2024/01/10\n  https://www.meti.go.jp/press/a.html\n  概要\n\n"
        );
    }

    #[test]
    fn test_plain_empty_shows_message() {
        let mut out = Vec::new();
        write_plain(&mut out, &Aggregation::default(), 200).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(NO_RESULTS));
    }

    #[test]
    fn test_json_uses_source_labels() {
        let mut out = Vec::new();
        write_json(&mut out, &aggregation().records).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value[0]["source"], "経済産業省");
        assert_eq!(value[0]["published"], "2024/01/10");
        assert_eq!(value[0]["timestamp"], 1_704_844_800);
        assert_eq!(value[0]["summary"], "<p>概要</p>");
    }
}
