//! Elastic tabstop alignment, the subset `gofmt` uses for struct fields
//!
//! Every cell except the last one of a row is a terminated cell. A column is
//! aligned over each run of consecutive rows that have a terminated cell in
//! that column; a shorter row ends the run. Cells are padded to the widest
//! cell of their run plus one space, and all-empty columns take no width.

const PADDING: usize = 1;

/// Align `rows` of cells into lines
pub(crate) fn align(rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<Vec<usize>> = rows
        .iter()
        .map(|row| vec![0; row.len().saturating_sub(1)])
        .collect();
    format_column(rows, &mut widths, 0, 0, rows.len());

    rows.iter()
        .zip(widths)
        .map(|(row, widths)| {
            let mut line = String::new();
            for (index, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if let Some(width) = widths.get(index) {
                    let used = cell.chars().count();
                    line.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
                }
            }
            line.truncate(line.trim_end().len());
            line
        })
        .collect()
}

fn format_column(
    rows: &[Vec<String>],
    widths: &mut [Vec<usize>],
    column: usize,
    start: usize,
    end: usize,
) {
    let mut line = start;
    while line < end {
        if rows[line].len() <= column + 1 {
            line += 1;
            continue;
        }
        let block_start = line;
        while line < end && rows[line].len() > column + 1 {
            line += 1;
        }

        let widest = rows[block_start..line]
            .iter()
            .map(|row| row[column].chars().count())
            .max()
            .unwrap_or(0);
        let width = if widest == 0 { 0 } else { widest + PADDING };
        for row_widths in &mut widths[block_start..line] {
            row_widths[column] = width;
        }

        format_column(rows, widths, column + 1, block_start, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
        cells
            .iter()
            .map(|row| row.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[test]
    fn aligns_consecutive_rows() {
        let out = align(&rows(&[
            &["Retries", "int", "`yaml:\"retries\"`"],
            &["Region", "string", "`yaml:\"region\"`"],
        ]));
        assert_eq!(
            out,
            vec![
                "Retries int    `yaml:\"retries\"`",
                "Region  string `yaml:\"region\"`",
            ]
        );
    }

    #[test]
    fn short_row_breaks_block() {
        let out = align(&rows(&[
            &["A", "int"],
            &["// separator"],
            &["LongName", "string"],
        ]));
        assert_eq!(out, vec!["A int", "// separator", "LongName string"]);
    }

    #[test]
    fn inner_columns_align_within_their_run() {
        let out = align(&rows(&[
            &["A", "int", "`yaml:\"a\"`"],
            &["Bb", "string"],
            &["C", "bool", "`yaml:\"c\"`"],
        ]));
        // column 0 spans all rows, column 1 does not cross the short row
        assert_eq!(
            out,
            vec!["A  int `yaml:\"a\"`", "Bb string", "C  bool `yaml:\"c\"`"]
        );
    }

    #[test]
    fn empty_rows_stay_empty() {
        assert_eq!(align(&rows(&[&[""], &["X", "int"]])), vec!["", "X int"]);
    }
}
