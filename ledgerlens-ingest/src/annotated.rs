//! Annotated table I/O: the input columns untouched, followed by the five
//! annotation columns.

use ledgerlens_core::{
    AnnotatedStatement, AnnotatedTransaction, CategoryAnnotation, Confidence, RemarkAnnotation,
};
use std::io;
use std::path::Path;

use crate::columns;
use crate::error::{IngestError, Result};
use crate::statement::{read_table, statement_from_table, RawTable};

pub fn write_annotated<W: io::Write>(statement: &AnnotatedStatement, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    let header = statement
        .headers
        .iter()
        .map(|s| s.as_str())
        .chain(columns::ANNOTATIONS);
    wtr.write_record(header)?;

    // Input cells are squared to the header so annotations land under their own names
    let width = statement.headers.len();

    for row in &statement.rows {
        let annotations = [
            row.remark.cleaned_remark.as_str(),
            row.remark.notes.as_str(),
            row.category.category.as_str(),
            row.category.subcategory_str(),
            row.category.confidence.as_str(),
        ];
        let fields = &row.transaction.fields;
        let record = (0..width)
            .map(|i| fields.get(i).map(String::as_str).unwrap_or(""))
            .chain(annotations);
        wtr.write_record(record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the annotated table to `path`, creating parent directories.
pub fn save_annotated(statement: &AnnotatedStatement, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_annotated(statement, io::BufWriter::new(file))?;
    tracing::info!(path = %path.display(), rows = statement.len(), "saved annotated statement");
    Ok(())
}

/// Read a table previously written by [`write_annotated`].
pub fn read_annotated<R: io::Read>(reader: R) -> Result<AnnotatedStatement> {
    let table = read_table(reader)?;

    let find = |name: &str| columns::rposition(&table.headers, name);
    let (Some(cleaned), Some(category), Some(confidence)) = (
        find(columns::CLEANED_REMARK),
        find(columns::CATEGORY),
        find(columns::CONFIDENCE),
    ) else {
        let missing = [columns::CLEANED_REMARK, columns::CATEGORY, columns::CONFIDENCE]
            .into_iter()
            .filter(|c| find(*c).is_none())
            .map(String::from)
            .collect();
        return Err(IngestError::MissingColumns(missing));
    };
    let notes = find(columns::NOTES);
    let subcategory = find(columns::SUBCATEGORY);

    let annotation_idx: Vec<usize> = [Some(cleaned), notes, Some(category), subcategory, Some(confidence)]
        .into_iter()
        .flatten()
        .collect();

    let keep = |cells: &[String]| -> Vec<String> {
        cells
            .iter()
            .enumerate()
            .filter(|(i, _)| !annotation_idx.contains(i))
            .map(|(_, c)| c.clone())
            .collect()
    };

    let cell = |cells: &[String], i: Option<usize>| -> String {
        i.and_then(|i| cells.get(i)).cloned().unwrap_or_default()
    };

    let annotations: Vec<(RemarkAnnotation, CategoryAnnotation)> = table
        .rows
        .iter()
        .map(|r| {
            let remark = RemarkAnnotation::new(cell(r, Some(cleaned)), cell(r, notes));
            let sub = cell(r, subcategory);
            let category = CategoryAnnotation::new(
                cell(r, Some(category)),
                Some(sub),
                Confidence::from_label(&cell(r, Some(confidence))),
            );
            (remark, category)
        })
        .collect();

    let base = RawTable {
        headers: keep(&table.headers),
        rows: table.rows.iter().map(|r| keep(r)).collect(),
    };
    let statement = statement_from_table(base)?;

    let rows = statement
        .transactions
        .into_iter()
        .zip(annotations)
        .map(|(transaction, (remark, category))| AnnotatedTransaction {
            transaction,
            remark,
            category,
        })
        .collect();

    Ok(AnnotatedStatement {
        headers: statement.headers,
        rows,
    })
}

pub fn load_annotated(path: impl AsRef<Path>) -> Result<AnnotatedStatement> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    read_annotated(file)
}
