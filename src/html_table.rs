#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn first_table(html: &str) -> Option<HtmlTable> {
    let lc = ascii_lower(html);
    let mut from = 0;
    while let Some((start, end)) = element_span(&lc, "table", from) {
        let table = parse_table(&html[start..end]);
        if !table.headers.is_empty() && !table.rows.is_empty() {
            return Some(table);
        }
        from = end;
    }
    None
}

fn parse_table(block: &str) -> HtmlTable {
    let lc = ascii_lower(block);
    let mut table = HtmlTable::default();
    let mut from = 0;
    while let Some((start, end)) = element_span(&lc, "tr", from) {
        from = end;
        let row = &block[start..end];
        let row_lc = &lc[start..end];
        if table.headers.is_empty() && element_span(row_lc, "th", 0).is_some() {
            table.headers = cells(row, "th");
            continue;
        }
        let data = cells(row, "td");
        if !data.is_empty() {
            table.rows.push(data);
        }
    }
    table
}

fn cells(row: &str, tag: &str) -> Vec<String> {
    let lc = ascii_lower(row);
    let mut out = Vec::new();
    let mut from = 0;
    while let Some((start, end)) = element_span(&lc, tag, from) {
        out.push(cell_text(&row[start..end]));
        from = end;
    }
    out
}

// Byte span of the next `<tag ...>...</tag>` at or after `from`. `lc` must be
// the ASCII-lowercased source so offsets line up with the original.
fn element_span(lc: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut cursor = from;
    loop {
        let start = lc.get(cursor..)?.find(&open)? + cursor;
        let after = start + open.len();
        match lc.as_bytes().get(after) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') => {
                let end_rel = lc[after..].find(&close)?;
                return Some((start, after + end_rel + close.len()));
            }
            _ => cursor = after,
        }
    }
}

fn cell_text(block: &str) -> String {
    let inner = match (block.find('>'), block.rfind('<')) {
        (Some(open_end), Some(close_start)) if close_start > open_end => {
            &block[open_end + 1..close_start]
        }
        _ => "",
    };
    normalize_ws(&decode_entities(&strip_tags(inner)))
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ascii_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" || s == "--" || s.eq_ignore_ascii_case("n/a") {
        return None;
    }
    let cleaned = s.trim_end_matches('%').replace(',', "");
    let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned.as_str());
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <table class="nav"><thead><tr><th>Menu</th></tr></thead></table>
        <table class="layout"><tr><td>ad slot</td></tr></table>
        <TABLE class="tr-table datatable scrollable">
          <thead>
            <tr><th class="sort">Rank</th><th>Team</th><th>2025</th><th>Last 3</th></tr>
          </thead>
          <tbody>
            <tr><td>1</td><td><a href="/mlb/team/ny-yankees">NY Yankees</a></td><td>5.42</td><td>6.00</td></tr>
            <tr><td>2</td><td data-sort="x">St.&nbsp;Louis</td><td>4.90</td><td>--</td></tr>
          </tbody>
        </TABLE>
        </body></html>
    "#;

    #[test]
    fn extracts_first_populated_table() {
        let table = first_table(PAGE).unwrap();
        assert_eq!(table.headers, vec!["Rank", "Team", "2025", "Last 3"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "NY Yankees");
        assert_eq!(table.rows[1][1], "St. Louis");
    }

    #[test]
    fn thead_is_not_mistaken_for_th() {
        let lc = ascii_lower("<thead><tr><th>A</th></tr></thead>");
        let (start, _) = element_span(&lc, "th", 0).unwrap();
        assert_eq!(&lc[start..start + 4], "<th>");
    }

    #[test]
    fn no_table_yields_none() {
        assert!(first_table("<html><p>blocked</p></html>").is_none());
    }

    #[test]
    fn parse_number_handles_decorations() {
        assert_eq!(parse_number("4.85"), Some(4.85));
        assert_eq!(parse_number("31.5%"), Some(31.5));
        assert_eq!(parse_number("1,024"), Some(1024.0));
        assert_eq!(parse_number("+0.7"), Some(0.7));
        assert_eq!(parse_number("--"), None);
        assert_eq!(parse_number("abc"), None);
    }
}
